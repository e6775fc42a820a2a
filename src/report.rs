use serde::Serialize;
use std::fmt::Write;
use trussolve::{Fix, ForceKind, Solution, SolveState, Structure};

/// Machine readable output: the fixes applied before solving plus the solution.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    /// Fixes applied to the input, in order.
    #[serde(rename = "appliedFixes")]
    pub applied_fixes: &'a [Fix],
    /// Solution of the (possibly corrected) structure.
    #[serde(flatten)]
    pub solution: &'a Solution,
}

/// Render a textual summary of a solved (or unsolvable) structure.
///
/// Problems come first so the reader knows whether the numbers below can be
/// trusted. Positive member forces are tension and negative ones compression,
/// following the usual convention of the method of joints
/// (<https://en.wikipedia.org/wiki/Structural_analysis#Method_of_joints>).
#[must_use]
pub fn render_summary(structure: &Structure, solution: &Solution, applied: &[Fix]) -> String {
    let mut output = String::new();

    // State the size of the problem first. The counts are the ones used by the
    // determinacy rule 2 x joints = members + reactions
    // (https://en.wikipedia.org/wiki/Statically_determinate).
    writeln!(
        &mut output,
        "Truss with {} joints, {} members and {} reaction components: {}",
        structure.joint_count(),
        structure.member_count(),
        structure.reaction_count(),
        describe_state(solution.state)
    )
    .expect("writing to string cannot fail");

    // Anything changed on the way in is listed before the results so the
    // reader does not compare them against the original file by mistake.
    for fix in applied {
        writeln!(&mut output, "  applied fix: {fix}").expect("writing to string cannot fail");
    }

    for problem in &solution.problems {
        let written = match &problem.fix {
            Some(fix) => writeln!(&mut output, "  {problem} (fix: {fix})"),
            None => writeln!(&mut output, "  {problem}"),
        };
        written.expect("writing to string cannot fail");
    }

    // Reactions are only listed for supported joints; every other joint has a
    // zero reaction by construction.
    if solution.reactions.is_some() {
        output.push_str("Outside reaction forces:\n");
        for joint in structure.joints().iter().filter(|joint| joint.support.is_supported()) {
            if let Some(reaction) = solution.reaction(joint.id) {
                writeln!(
                    &mut output,
                    "  {:<8} Rx = {:+.3}, Ry = {:+.3}",
                    joint.label(),
                    reaction.x,
                    reaction.y
                )
                .expect("writing to string cannot fail");
            }
        }
    }

    // Print the sign explicitly and name the loading, since tension and
    // compression are easy to mix up when reading bare numbers.
    if solution.member_forces.is_some() {
        output.push_str("Member forces:\n");
        for member in structure.members() {
            let Some(force) = solution.member_force(member.id) else {
                continue;
            };
            let (a, b) = member.joints;
            writeln!(
                &mut output,
                "  {:<4} {}-{}: {:+.3} ({})",
                member.id,
                label(structure, a),
                label(structure, b),
                force,
                describe_kind(ForceKind::of(force))
            )
            .expect("writing to string cannot fail");
        }
    }

    if !solution.trace.is_empty() {
        output.push_str("\nDerivation\n");
        output.push_str(&solution.trace);
    }

    output
}

/// Short description of where solving stopped.
fn describe_state(state: SolveState) -> &'static str {
    match state {
        SolveState::Invalid => "invalid",
        SolveState::ReactionsUnsolvable => "reactions not solvable",
        SolveState::MembersUnsolvable => "member forces not solvable",
        SolveState::Solved => "solved",
    }
}

/// Word for a member's loading.
fn describe_kind(kind: ForceKind) -> &'static str {
    match kind {
        ForceKind::Tension => "tension",
        ForceKind::Compression => "compression",
        ForceKind::Unloaded => "zero-force",
    }
}

/// Joint label, or the raw id when the joint is missing.
fn label(structure: &Structure, joint: trussolve::JointId) -> String {
    structure
        .joint(joint)
        .map_or_else(|| format!("#{joint}"), trussolve::Joint::label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use trussolve::{solve, vector, JointId, MemberId, Support};

    fn triangle() -> Structure {
        let mut structure = Structure::new();
        let a = structure.add_joint("A", vector(0.0, 0.0));
        let b = structure.add_joint("B", vector(10.0, 0.0));
        let c = structure.add_joint("C", vector(5.0, 5.0));
        structure.set_support(a, Support::PIN).expect("joint exists");
        structure.set_support(b, Support::ROLLER_Y).expect("joint exists");
        structure.set_load(c, vector(0.0, -10.0)).expect("joint exists");
        structure.add_member(a, b).expect("joints exist");
        structure.add_member(b, c).expect("joints exist");
        structure.add_member(a, c).expect("joints exist");
        structure
    }

    #[test]
    fn formats_solved_structure() {
        let structure = triangle();
        let report = render_summary(&structure, &solve(&structure), &[]);
        assert!(report.starts_with("Truss with 3 joints, 3 members and 3 reaction components: solved"));
        assert!(report.contains("Outside reaction forces:"));
        assert!(report.contains("Ry = +5.000"));
        assert!(report.contains("A-B: +5.000 (tension)"));
        assert!(report.contains("B-C: -7.071 (compression)"));
        assert!(!report.contains("applied fix"));
        assert!(!report.contains("Derivation"));
    }

    #[test]
    fn lists_problems_with_their_fixes() {
        let mut structure = triangle();
        structure
            .add_member(JointId(0), JointId(0))
            .expect("joint exists");
        let report = render_summary(&structure, &solve(&structure), &[]);
        assert!(report.contains(": invalid"));
        assert!(report.contains("error: invalid member exists on joint A (fix: remove member 6)"));
        assert!(!report.contains("Member forces:"));
    }

    #[test]
    fn names_the_fixes_applied_before_solving() {
        let structure = triangle();
        let applied = [Fix::RemoveMember(MemberId(6))];
        let report = render_summary(&structure, &solve(&structure), &applied);
        assert!(report.contains("  applied fix: remove member 6\n"));
        assert!(report.contains(": solved"));
    }
}
