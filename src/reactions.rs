//! Outside reaction forces from global equilibrium of the whole structure.
//!
//! Three equations are written for the structure as a rigid body: moments about
//! the origin, forces along X and forces along Y. The unknowns are the reaction
//! components offered by the supports.

use std::collections::BTreeMap;
use std::fmt;

use log::debug;

use crate::equations::{Equation, LinearSystem};
use crate::errors::EquationError;
use crate::geometry::{Axis, Vector};
use crate::structure::{JointId, Structure};

/// Reaction force at every joint; unsupported joints map to the zero vector.
pub type ReactionForces = BTreeMap<JointId, Vector>;

/// Unknown reaction component: joint `joint` along `axis`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReactionComponent {
    /// Supported joint.
    pub joint: JointId,
    /// Direction of the component.
    pub axis: Axis,
}

impl fmt::Display for ReactionComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.joint, self.axis)
    }
}

/// Global equilibrium equations: moment about the origin, then ΣFx, then ΣFy.
#[must_use]
pub fn reaction_equations(structure: &Structure) -> Vec<Equation<ReactionComponent>> {
    let moment_load: f64 = structure
        .joints()
        .iter()
        .map(|joint| joint.position.cross(joint.load))
        .sum();
    let total_load: Vector = structure.joints().iter().map(|joint| joint.load).sum();

    let mut moment = Equation::new(moment_load);
    let mut force_x = Equation::new(total_load.x);
    let mut force_y = Equation::new(total_load.y);
    for joint in structure.joints() {
        for axis in Axis::ALL.into_iter().filter(|&axis| joint.support.along(axis)) {
            let component = ReactionComponent {
                joint: joint.id,
                axis,
            };
            moment.add_term(component, joint.position.cross(axis.unit()));
            let force = match axis {
                Axis::X => &mut force_x,
                Axis::Y => &mut force_y,
            };
            force.add_term(component, 1.0);
        }
    }
    vec![moment, force_x, force_y]
}

/// Solve for the reaction force at every joint.
///
/// # Errors
///
/// Returns an [`EquationError`] when the supports do not determine a unique set
/// of reactions, for example with no supports or three parallel rollers.
///
/// # Examples
/// ```
/// use trussolve::{solve_reactions, vector, Structure, Support, DEFAULT_SINGULAR_TOLERANCE};
///
/// let mut structure = Structure::new();
/// let a = structure.add_joint("A", vector(0.0, 0.0));
/// let b = structure.add_joint("B", vector(4.0, 0.0));
/// structure.set_support(a, Support::PIN).unwrap();
/// structure.set_support(b, Support::ROLLER_Y).unwrap();
/// structure.set_load(b, vector(0.0, -8.0)).unwrap();
///
/// let reactions = solve_reactions(&structure, DEFAULT_SINGULAR_TOLERANCE).unwrap();
/// assert!((reactions[&b].y - 8.0).abs() < 1.0e-9);
/// assert!(reactions[&a].y.abs() < 1.0e-9);
/// ```
pub fn solve_reactions(
    structure: &Structure,
    tolerance: f64,
) -> Result<ReactionForces, EquationError> {
    let system = LinearSystem::assemble(&reaction_equations(structure));
    debug!(
        "solving {} reaction components",
        system.variables().len()
    );
    let solution = system.solve(tolerance)?;

    let mut reactions: ReactionForces = structure
        .joints()
        .iter()
        .map(|joint| (joint.id, Vector::ZERO))
        .collect();
    for (component, value) in solution {
        if let Some(reaction) = reactions.get_mut(&component.joint) {
            *reaction = reaction.with_component(component.axis, value);
        }
    }
    Ok(reactions)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::equations::DEFAULT_SINGULAR_TOLERANCE;
    use crate::geometry::vector;
    use crate::structure::Support;

    /// Simply supported span of 10 with a downward load of 10 at x = 5, y = 5.
    fn loaded_span() -> (Structure, [JointId; 3]) {
        let mut structure = Structure::new();
        let a = structure.add_joint("A", vector(0.0, 0.0));
        let b = structure.add_joint("B", vector(10.0, 0.0));
        let c = structure.add_joint("C", vector(5.0, 5.0));
        structure.set_support(a, Support::PIN).expect("joint exists");
        structure.set_support(b, Support::ROLLER_Y).expect("joint exists");
        structure.set_load(c, vector(0.0, -10.0)).expect("joint exists");
        (structure, [a, b, c])
    }

    #[test]
    fn equations_follow_moment_then_forces() {
        let (structure, [a, b, _]) = loaded_span();
        let equations = reaction_equations(&structure);
        assert_eq!(equations.len(), 3);

        let a_x = ReactionComponent { joint: a, axis: Axis::X };
        let a_y = ReactionComponent { joint: a, axis: Axis::Y };
        let b_y = ReactionComponent { joint: b, axis: Axis::Y };

        assert_relative_eq!(equations[0].constant(), -50.0);
        assert_relative_eq!(equations[0].coefficient(&b_y), 10.0);
        assert_relative_eq!(equations[0].coefficient(&a_x), 0.0);
        assert_eq!(equations[1].terms(), &[(a_x, 1.0)]);
        assert_eq!(equations[2].terms(), &[(a_y, 1.0), (b_y, 1.0)]);
        assert_relative_eq!(equations[2].constant(), -10.0);
    }

    #[test]
    fn simply_supported_span_shares_the_load() {
        let (structure, [a, b, c]) = loaded_span();
        let reactions = solve_reactions(&structure, DEFAULT_SINGULAR_TOLERANCE).expect("solvable");
        assert_relative_eq!(reactions[&a].x, 0.0, epsilon = 1.0e-9);
        assert_relative_eq!(reactions[&a].y, 5.0, epsilon = 1.0e-9);
        assert_relative_eq!(reactions[&b].x, 0.0);
        assert_relative_eq!(reactions[&b].y, 5.0, epsilon = 1.0e-9);
        assert_eq!(reactions[&c], Vector::ZERO);
    }

    #[test]
    fn horizontal_load_is_taken_by_the_pin() {
        let (mut structure, [a, b, c]) = loaded_span();
        structure.set_load(c, vector(4.0, 0.0)).expect("joint exists");
        let reactions = solve_reactions(&structure, DEFAULT_SINGULAR_TOLERANCE).expect("solvable");
        assert_relative_eq!(reactions[&a].x, -4.0, epsilon = 1.0e-9);
        // Overturning moment 4 · 5 is resisted by a couple between A and B.
        assert_relative_eq!(reactions[&b].y, 2.0, epsilon = 1.0e-9);
        assert_relative_eq!(reactions[&a].y, -2.0, epsilon = 1.0e-9);
    }

    #[test]
    fn unsupported_structure_has_no_reactions() {
        let (mut structure, [a, b, _]) = loaded_span();
        structure.set_support(a, Support::FREE).expect("joint exists");
        structure.set_support(b, Support::FREE).expect("joint exists");
        assert_eq!(
            solve_reactions(&structure, DEFAULT_SINGULAR_TOLERANCE),
            Err(EquationError::NotSquare {
                equations: 3,
                variables: 0
            })
        );
    }

    #[test]
    fn parallel_rollers_are_singular() {
        let (mut structure, [a, _, c]) = loaded_span();
        structure.set_support(a, Support::ROLLER_Y).expect("joint exists");
        structure.set_support(c, Support::ROLLER_Y).expect("joint exists");
        assert_eq!(
            solve_reactions(&structure, DEFAULT_SINGULAR_TOLERANCE),
            Err(EquationError::Singular)
        );
    }
}
