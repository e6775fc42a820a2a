#![warn(clippy::all)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_doc_code_examples)]
#![warn(clippy::missing_docs_in_private_items)]
#![doc = include_str!("../README.md")]

mod equations;
mod errors;
mod geometry;
mod members;
mod parse;
mod reactions;
mod solution;
mod structure;
mod trace;
mod validate;

pub use equations::{solve_equations, Equation, LinearSystem, DEFAULT_SINGULAR_TOLERANCE};
pub use errors::{EquationError, ParseError, StructureEditError};
pub use geometry::{vector, Axis, Vector};
pub use members::{member_directions, member_equations, solve_member_forces, MemberForces};
pub use reactions::{reaction_equations, solve_reactions, ReactionComponent, ReactionForces};
pub use solution::{
    solve, ForceKind, Solution, SolveState, Solver, SolverOptions, DEFAULT_RESIDUAL_TOLERANCE,
    UNLOADED_TOLERANCE,
};
pub use structure::{Connectivity, Joint, JointId, Member, MemberId, Structure, Support};
pub use validate::{validate, Fix, Problem, ProblemKind};
