//! Orchestration of validation, reaction forces and member forces.
//!
//! Solving runs strictly in order and stops at the first stage that fails. Each
//! stage is a pure function of the structure, so a failure is a property of the
//! input and solving the same structure again gives the same answer.

use log::{debug, warn};
use serde::Serialize;

use crate::equations::DEFAULT_SINGULAR_TOLERANCE;
use crate::geometry::Vector;
use crate::members::{member_directions, solve_member_forces, MemberForces};
use crate::reactions::{solve_reactions, ReactionForces};
use crate::structure::{JointId, MemberId, Structure};
use crate::trace::Trace;
use crate::validate::{validate, Fix, Problem, ProblemKind};

/// Largest residual accepted by default when surplus joint equations are checked.
pub const DEFAULT_RESIDUAL_TOLERANCE: f64 = 1.0e-6;

/// Member forces smaller than this in magnitude are reported as unloaded.
pub const UNLOADED_TOLERANCE: f64 = 1.0e-9;

/// Where solving stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SolveState {
    /// Validation found a critical problem; nothing was computed.
    Invalid,
    /// The supports do not determine unique reactions.
    ReactionsUnsolvable,
    /// Reactions were found but member forces are not uniquely determined.
    MembersUnsolvable,
    /// Reactions and member forces are both available.
    Solved,
}

/// How a member is loaded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ForceKind {
    /// Positive axial force.
    Tension,
    /// Negative axial force.
    Compression,
    /// No appreciable axial force.
    Unloaded,
}

impl ForceKind {
    /// Classify an axial force using [`UNLOADED_TOLERANCE`].
    ///
    /// # Examples
    /// ```
    /// use trussolve::ForceKind;
    ///
    /// assert_eq!(ForceKind::of(2.5), ForceKind::Tension);
    /// assert_eq!(ForceKind::of(-0.1), ForceKind::Compression);
    /// assert_eq!(ForceKind::of(1.0e-12), ForceKind::Unloaded);
    /// ```
    #[must_use]
    pub fn of(force: f64) -> Self {
        if force.abs() < UNLOADED_TOLERANCE {
            ForceKind::Unloaded
        } else if force > 0.0 {
            ForceKind::Tension
        } else {
            ForceKind::Compression
        }
    }
}

/// Result of solving a structure.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Solution {
    /// Terminal state reached.
    pub state: SolveState,
    /// Every problem found, in detection order.
    pub problems: Vec<Problem>,
    /// Reaction at every joint, present once the reaction stage succeeds.
    #[serde(rename = "outsideReactionForces")]
    pub reactions: Option<ReactionForces>,
    /// Axial force per member, present only when fully solved.
    #[serde(rename = "memberForces")]
    pub member_forces: Option<MemberForces>,
    /// Derivation text; empty unless tracing was requested.
    pub trace: String,
}

impl Solution {
    /// Whether both reactions and member forces are available.
    #[must_use]
    pub fn is_solved(&self) -> bool {
        self.state == SolveState::Solved
    }

    /// Problems that block solving.
    pub fn critical_problems(&self) -> impl Iterator<Item = &Problem> {
        self.problems.iter().filter(|problem| problem.critical)
    }

    /// Fixes offered by the problems, in problem order.
    pub fn fixes(&self) -> impl Iterator<Item = Fix> + '_ {
        self.problems.iter().filter_map(|problem| problem.fix)
    }

    /// Reaction force at `joint`, if reactions were solved.
    #[must_use]
    pub fn reaction(&self, joint: JointId) -> Option<Vector> {
        self.reactions.as_ref()?.get(&joint).copied()
    }

    /// Axial force in `member`, if member forces were solved.
    #[must_use]
    pub fn member_force(&self, member: MemberId) -> Option<f64> {
        self.member_forces.as_ref()?.get(&member).copied()
    }

    /// Tension, compression or unloaded for `member`.
    #[must_use]
    pub fn force_kind(&self, member: MemberId) -> Option<ForceKind> {
        self.member_force(member).map(ForceKind::of)
    }

    /// Net force on `joint`: load, reaction and the pull of every member.
    ///
    /// Zero, to rounding, for every joint of a solved structure.
    #[must_use]
    pub fn joint_residual(&self, structure: &Structure, joint: JointId) -> Option<Vector> {
        let forces = self.member_forces.as_ref()?;
        let reaction = self.reaction(joint)?;
        let load = structure.joint(joint)?.load;
        let pull: Vector = member_directions(structure, joint)
            .into_iter()
            .map(|(member, direction)| direction * forces.get(&member).copied().unwrap_or(0.0))
            .sum();
        Some(load + reaction + pull)
    }

    /// Net external force and net moment about the origin, loads plus reactions.
    ///
    /// Both vanish, to rounding, once reactions are solved.
    #[must_use]
    pub fn global_residual(&self, structure: &Structure) -> Option<(Vector, f64)> {
        let reactions = self.reactions.as_ref()?;
        let mut force = Vector::ZERO;
        let mut moment = 0.0;
        for joint in structure.joints() {
            let external = joint.load + reactions.get(&joint.id).copied().unwrap_or_default();
            force = force + external;
            moment += joint.position.cross(external);
        }
        Some((force, moment))
    }
}

/// Tunable parameters of [`Solver`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolverOptions {
    /// Smallest accepted pivot once every equation is scaled to unit maximum.
    pub singular_tolerance: f64,
    /// Residual allowed on surplus joint equations, relative to the largest load.
    pub residual_tolerance: f64,
    /// Record a derivation in [`Solution::trace`].
    pub trace: bool,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            singular_tolerance: DEFAULT_SINGULAR_TOLERANCE,
            residual_tolerance: DEFAULT_RESIDUAL_TOLERANCE,
            trace: false,
        }
    }
}

impl SolverOptions {
    /// Set [`SolverOptions::singular_tolerance`].
    #[must_use]
    pub fn with_singular_tolerance(mut self, tolerance: f64) -> Self {
        self.singular_tolerance = tolerance;
        self
    }

    /// Set [`SolverOptions::residual_tolerance`].
    #[must_use]
    pub fn with_residual_tolerance(mut self, tolerance: f64) -> Self {
        self.residual_tolerance = tolerance;
        self
    }

    /// Set [`SolverOptions::trace`].
    #[must_use]
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }
}

/// Stateless statics solver.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Solver {
    /// Parameters applied to every solve.
    options: SolverOptions,
}

impl Solver {
    /// Create a solver with the given options.
    #[must_use]
    pub fn new(options: SolverOptions) -> Self {
        Self { options }
    }

    /// Options in use.
    #[must_use]
    pub fn options(&self) -> SolverOptions {
        self.options
    }

    /// Validate `structure` and compute its reactions and member forces.
    ///
    /// Never fails: every way a structure can be unsolvable is reported as a
    /// [`Problem`] and reflected in [`Solution::state`].
    #[must_use]
    pub fn solve(&self, structure: &Structure) -> Solution {
        let mut trace = Trace::new(self.options.trace);
        trace.overview(structure);

        let mut problems = validate(structure);
        if problems.iter().any(|problem| problem.critical) {
            debug!("structure is invalid; skipping force computation");
            trace.note("structure has critical problems; no forces computed");
            return Solution {
                state: SolveState::Invalid,
                problems,
                reactions: None,
                member_forces: None,
                trace: trace.finish(),
            };
        }

        trace.reaction_system(structure);
        let reactions = match solve_reactions(structure, self.options.singular_tolerance) {
            Ok(reactions) => reactions,
            Err(error) => {
                warn!("outside reaction forces have no unique solution: {error}");
                trace.note(&format!("  no unique solution: {error}"));
                problems.push(Problem::critical(
                    ProblemKind::ReactionsUnsolvable,
                    "could not solve for outside reaction forces",
                ));
                return Solution {
                    state: SolveState::ReactionsUnsolvable,
                    problems,
                    reactions: None,
                    member_forces: None,
                    trace: trace.finish(),
                };
            }
        };
        trace.reactions(structure, &reactions);

        trace.member_system(structure, &reactions);
        let member_forces = match solve_member_forces(
            structure,
            &reactions,
            self.options.singular_tolerance,
            self.options.residual_tolerance,
        ) {
            Ok(forces) => forces,
            Err(error) => {
                warn!("member forces have no unique solution: {error}");
                trace.note(&format!("  no unique solution: {error}"));
                problems.push(Problem::critical(
                    ProblemKind::MembersUnsolvable,
                    "could not solve for member forces",
                ));
                return Solution {
                    state: SolveState::MembersUnsolvable,
                    problems,
                    reactions: Some(reactions),
                    member_forces: None,
                    trace: trace.finish(),
                };
            }
        };
        trace.member_forces(&member_forces);
        debug!("solved {} member forces", member_forces.len());

        Solution {
            state: SolveState::Solved,
            problems,
            reactions: Some(reactions),
            member_forces: Some(member_forces),
            trace: trace.finish(),
        }
    }
}

/// Solve `structure` with default [`SolverOptions`].
///
/// # Examples
/// ```
/// use trussolve::{solve, vector, SolveState, Structure, Support};
///
/// let mut structure = Structure::new();
/// let a = structure.add_joint("A", vector(0.0, 0.0));
/// let b = structure.add_joint("B", vector(10.0, 0.0));
/// let c = structure.add_joint("C", vector(5.0, 5.0));
/// structure.set_support(a, Support::PIN).expect("joint exists");
/// structure.set_support(b, Support::ROLLER_Y).expect("joint exists");
/// structure.set_load(c, vector(0.0, -10.0)).expect("joint exists");
/// let ab = structure.add_member(a, b).expect("joints exist");
/// structure.add_member(b, c).expect("joints exist");
/// structure.add_member(a, c).expect("joints exist");
///
/// let solution = solve(&structure);
/// assert_eq!(solution.state, SolveState::Solved);
/// assert!((solution.member_force(ab).expect("solved") - 5.0).abs() < 1.0e-9);
/// ```
#[must_use]
pub fn solve(structure: &Structure) -> Solution {
    Solver::default().solve(structure)
}
