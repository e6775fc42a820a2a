//! Axial member forces by the method of joints.
//!
//! Every joint contributes one force balance per axis. A member in tension
//! pulls each of its joints toward the opposite end, so its unknown force enters
//! a joint's equations along the unit vector pointing at the far joint.

use std::collections::BTreeMap;

use log::debug;

use crate::equations::{Equation, LinearSystem};
use crate::errors::EquationError;
use crate::geometry::{Axis, Vector};
use crate::reactions::ReactionForces;
use crate::structure::{Connectivity, Joint, JointId, MemberId, Structure};

/// Axial force per member: positive is tension, negative is compression.
pub type MemberForces = BTreeMap<MemberId, f64>;

/// Unit vector from `joint` toward the far end of every member attached to it.
///
/// A zero-length member yields the zero vector.
#[must_use]
pub fn member_directions(structure: &Structure, joint: JointId) -> Vec<(MemberId, Vector)> {
    match structure.joint(joint) {
        Some(origin) => directions_from(structure, &structure.connectivity(), origin),
        None => Vec::new(),
    }
}

/// Directions of the members at `origin`, ordered by member id.
fn directions_from(
    structure: &Structure,
    connectivity: &Connectivity,
    origin: &Joint,
) -> Vec<(MemberId, Vector)> {
    connectivity
        .incident_members(origin.id)
        .into_iter()
        .filter_map(|(member, far)| {
            let far = structure.joint(far)?;
            Some((member, (far.position - origin.position).unit()))
        })
        .collect()
}

/// Force balance of every joint, X then Y, in joint order.
///
/// The constant of each equation is the applied load plus the joint's reaction
/// along that axis; a joint missing from `reactions` has no reaction.
#[must_use]
pub fn member_equations(
    structure: &Structure,
    reactions: &ReactionForces,
) -> Vec<Equation<MemberId>> {
    let connectivity = structure.connectivity();
    let mut equations = Vec::with_capacity(2 * structure.joint_count());
    for joint in structure.joints() {
        let reaction = reactions.get(&joint.id).copied().unwrap_or_default();
        let directions = directions_from(structure, &connectivity, joint);
        for axis in Axis::ALL {
            let constant = axis.component(joint.load) + axis.component(reaction);
            let mut equation = Equation::new(constant);
            for &(member, direction) in &directions {
                equation.add_term(member, axis.component(direction));
            }
            equations.push(equation);
        }
    }
    equations
}

/// Solve for the axial force in every member.
///
/// With reactions already known the joint equations outnumber the members by
/// the number of reaction components; the surplus rows restate global
/// equilibrium and must agree with the rest to within `residual_tolerance`.
///
/// # Errors
///
/// Returns an [`EquationError`] when the member forces are not uniquely
/// determined or the joint equations contradict each other.
pub fn solve_member_forces(
    structure: &Structure,
    reactions: &ReactionForces,
    tolerance: f64,
    residual_tolerance: f64,
) -> Result<MemberForces, EquationError> {
    let system = LinearSystem::assemble(&member_equations(structure, reactions));
    debug!(
        "solving {} member forces from {} joint equations",
        system.variables().len(),
        system.rhs().len()
    );
    let solution = system.solve_overdetermined(tolerance, residual_tolerance)?;
    Ok(solution.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::equations::DEFAULT_SINGULAR_TOLERANCE;
    use crate::geometry::vector;
    use crate::reactions::solve_reactions;
    use crate::structure::Support;

    /// Loaded triangle: A(0,0) pinned, B(10,0) roller, C(5,5) carrying (0,-10).
    fn triangle() -> (Structure, [JointId; 3], [MemberId; 3]) {
        let mut structure = Structure::new();
        let a = structure.add_joint("A", vector(0.0, 0.0));
        let b = structure.add_joint("B", vector(10.0, 0.0));
        let c = structure.add_joint("C", vector(5.0, 5.0));
        structure.set_support(a, Support::PIN).expect("joint exists");
        structure.set_support(b, Support::ROLLER_Y).expect("joint exists");
        structure.set_load(c, vector(0.0, -10.0)).expect("joint exists");
        let ab = structure.add_member(a, b).expect("joints exist");
        let bc = structure.add_member(b, c).expect("joints exist");
        let ac = structure.add_member(a, c).expect("joints exist");
        (structure, [a, b, c], [ab, bc, ac])
    }

    #[test]
    fn directions_point_away_from_the_joint() {
        let (structure, [a, _, c], [ab, bc, ac]) = triangle();
        let from_a = member_directions(&structure, a);
        assert_eq!(from_a[0], (ab, vector(1.0, 0.0)));
        assert_eq!(from_a[1].0, ac);
        assert_relative_eq!(from_a[1].1.x, std::f64::consts::FRAC_1_SQRT_2, epsilon = 1.0e-12);

        let from_c = member_directions(&structure, c);
        assert_eq!(from_c[0].0, bc);
        assert_relative_eq!(from_c[0].1.x, std::f64::consts::FRAC_1_SQRT_2, epsilon = 1.0e-12);
        assert_relative_eq!(from_c[0].1.y, -std::f64::consts::FRAC_1_SQRT_2, epsilon = 1.0e-12);
    }

    #[test]
    fn two_equations_per_joint() {
        let (structure, _, _) = triangle();
        let equations = member_equations(&structure, &ReactionForces::new());
        assert_eq!(equations.len(), 6);
        assert_relative_eq!(equations[5].constant(), -10.0);
        assert_relative_eq!(equations[0].constant(), 0.0);
    }

    #[test]
    fn loaded_triangle_is_symmetric() {
        let (structure, _, [ab, bc, ac]) = triangle();
        let reactions = solve_reactions(&structure, DEFAULT_SINGULAR_TOLERANCE).expect("solvable");
        let forces = solve_member_forces(&structure, &reactions, DEFAULT_SINGULAR_TOLERANCE, 1.0e-9)
            .expect("solvable");

        let diagonal = -5.0 * std::f64::consts::SQRT_2;
        assert_relative_eq!(forces[&ac], diagonal, epsilon = 1.0e-9);
        assert_relative_eq!(forces[&bc], diagonal, epsilon = 1.0e-9);
        assert_relative_eq!(forces[&ab], 5.0, epsilon = 1.0e-9);
    }

    #[test]
    fn wrong_reactions_are_inconsistent() {
        let (structure, [a, b, _], _) = triangle();
        let mut reactions = ReactionForces::new();
        reactions.insert(a, vector(0.0, 1.0));
        reactions.insert(b, vector(0.0, 1.0));
        let error = solve_member_forces(&structure, &reactions, DEFAULT_SINGULAR_TOLERANCE, 1.0e-9)
            .expect_err("unbalanced reactions");
        assert!(matches!(error, EquationError::Inconsistent { .. }));
    }

    #[test]
    fn collinear_members_cannot_carry_a_transverse_load() {
        let mut structure = Structure::new();
        let a = structure.add_joint("A", vector(0.0, 0.0));
        let b = structure.add_joint("B", vector(5.0, 0.0));
        let c = structure.add_joint("C", vector(10.0, 0.0));
        structure.set_support(a, Support::PIN).expect("joint exists");
        structure.set_support(c, Support::ROLLER_Y).expect("joint exists");
        structure.set_load(b, vector(0.0, -1.0)).expect("joint exists");
        structure.add_member(a, b).expect("joints exist");
        structure.add_member(b, c).expect("joints exist");
        structure.add_member(a, c).expect("joints exist");

        let reactions = solve_reactions(&structure, DEFAULT_SINGULAR_TOLERANCE).expect("solvable");
        assert!(
            solve_member_forces(&structure, &reactions, DEFAULT_SINGULAR_TOLERANCE, 1.0e-9).is_err()
        );
    }
}
