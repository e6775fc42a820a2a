//! Human-readable derivation written alongside a solution.

use std::fmt::Write;

use crate::equations::LinearSystem;
use crate::members::{member_directions, member_equations, MemberForces};
use crate::reactions::{reaction_equations, ReactionForces};
use crate::structure::Structure;

/// Accumulates the derivation text when enabled; otherwise every call is a no-op.
#[derive(Debug, Default)]
pub(crate) struct Trace {
    /// Whether anything is recorded.
    enabled: bool,
    /// Text written so far.
    text: String,
}

impl Trace {
    /// Create a trace that records only when `enabled`.
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            enabled,
            text: String::new(),
        }
    }

    /// Consume the trace and return the text.
    pub(crate) fn finish(self) -> String {
        self.text
    }

    /// Counts that feed the determinacy rule.
    pub(crate) fn overview(&mut self, structure: &Structure) {
        if !self.enabled {
            return;
        }
        writeln!(
            &mut self.text,
            "{} joints, {} members, {} reaction components, {} connected piece(s)",
            structure.joint_count(),
            structure.member_count(),
            structure.reaction_count(),
            structure.connectivity().component_count()
        )
        .expect("writing to string cannot fail");
    }

    /// A line of free text.
    pub(crate) fn note(&mut self, message: &str) {
        if self.enabled {
            writeln!(&mut self.text, "{message}").expect("writing to string cannot fail");
        }
    }

    /// Global equilibrium equations and their matrix form.
    pub(crate) fn reaction_system(&mut self, structure: &Structure) {
        if !self.enabled {
            return;
        }
        let equations = reaction_equations(structure);
        self.text.push_str("\nOutside reaction forces\n");
        for (label, equation) in ["ΣM", "ΣFx", "ΣFy"].iter().zip(&equations) {
            writeln!(&mut self.text, "  {label}: {equation:.3}")
                .expect("writing to string cannot fail");
        }
        self.system(&LinearSystem::assemble(&equations));
    }

    /// Solved reaction at every supported joint.
    pub(crate) fn reactions(&mut self, structure: &Structure, reactions: &ReactionForces) {
        if !self.enabled {
            return;
        }
        for joint in structure.joints().iter().filter(|joint| joint.support.is_supported()) {
            if let Some(reaction) = reactions.get(&joint.id) {
                writeln!(&mut self.text, "  R[{}] = {reaction:.3}", joint.label())
                    .expect("writing to string cannot fail");
            }
        }
    }

    /// Member directions at every joint, the joint equations and their matrix form.
    pub(crate) fn member_system(&mut self, structure: &Structure, reactions: &ReactionForces) {
        if !self.enabled {
            return;
        }
        self.text.push_str("\nMember forces\n");
        for joint in structure.joints() {
            writeln!(&mut self.text, "  joint {}", joint.label())
                .expect("writing to string cannot fail");
            for (member, direction) in member_directions(structure, joint.id) {
                writeln!(&mut self.text, "    member {member} -> {direction:.3}")
                    .expect("writing to string cannot fail");
            }
        }
        let equations = member_equations(structure, reactions);
        for equation in &equations {
            writeln!(&mut self.text, "  {equation:.3}").expect("writing to string cannot fail");
        }
        self.system(&LinearSystem::assemble(&equations));
    }

    /// Solved axial force in every member.
    pub(crate) fn member_forces(&mut self, forces: &MemberForces) {
        if !self.enabled {
            return;
        }
        for (member, force) in forces {
            writeln!(&mut self.text, "  F[{member}] = {force:.3}")
                .expect("writing to string cannot fail");
        }
    }

    /// Unknown ordering, coefficient matrix and right hand side.
    fn system<V: std::fmt::Display>(&mut self, system: &LinearSystem<V>) {
        let unknowns: Vec<String> = system
            .variables()
            .iter()
            .map(ToString::to_string)
            .collect();
        writeln!(&mut self.text, "  unknowns: [{}]", unknowns.join(", "))
            .expect("writing to string cannot fail");
        writeln!(&mut self.text, "  A ={:.3}", system.coefficients())
            .expect("writing to string cannot fail");
        writeln!(&mut self.text, "  b ={:.3}", system.rhs())
            .expect("writing to string cannot fail");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::vector;
    use crate::structure::Support;

    #[test]
    fn disabled_trace_stays_empty() {
        let mut structure = Structure::new();
        let a = structure.add_joint("A", vector(0.0, 0.0));
        structure.set_support(a, Support::PIN).expect("joint exists");

        let mut trace = Trace::new(false);
        trace.overview(&structure);
        trace.note("ignored");
        trace.reaction_system(&structure);
        assert!(trace.finish().is_empty());
    }

    #[test]
    fn reaction_section_names_the_unknowns() {
        let mut structure = Structure::new();
        let a = structure.add_joint("A", vector(0.0, 0.0));
        let b = structure.add_joint("B", vector(2.0, 0.0));
        structure.set_support(a, Support::PIN).expect("joint exists");
        structure.set_support(b, Support::ROLLER_Y).expect("joint exists");

        let mut trace = Trace::new(true);
        trace.overview(&structure);
        trace.reaction_system(&structure);
        let text = trace.finish();
        assert!(text.starts_with("2 joints, 0 members, 3 reaction components"));
        assert!(text.contains("unknowns: [0_x, 0_y, 1_y]"));
        assert!(text.contains("ΣFy: 1.000·0_y + 1.000·1_y + 0.000 = 0"));
    }
}
