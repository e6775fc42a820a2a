//! Error types produced while reading, editing or solving structures.

use thiserror::Error;

use crate::structure::{JointId, MemberId};

/// Error returned when a serialized structure is rejected.
///
/// Parsing never produces a partial structure: any of these variants means the
/// whole input was discarded.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ParseError {
    /// Returned when the input is not JSON of the expected shape, for example a
    /// missing `joints` array, a non-numeric id or a `jointIds` pair of the wrong
    /// length.
    #[error("malformed structure: {0}")]
    Json(String),
    /// Returned when two joints share an id.
    #[error("joint id {0} is used more than once")]
    DuplicateJointId(JointId),
    /// Returned when two members share an id.
    #[error("member id {0} is used more than once")]
    DuplicateMemberId(MemberId),
    /// Returned when a member id is also used by a joint.
    #[error("member id {0} collides with a joint id")]
    MemberIdCollidesWithJoint(MemberId),
    /// Returned when a member references a joint that does not exist.
    #[error("member {member} references unknown joint {joint}")]
    UnknownJoint {
        /// Member holding the dangling reference.
        member: MemberId,
        /// Joint id that could not be resolved.
        joint: JointId,
    },
}

impl From<serde_json::Error> for ParseError {
    fn from(error: serde_json::Error) -> Self {
        ParseError::Json(error.to_string())
    }
}

/// Error returned when editing a [`Structure`](crate::Structure) with invalid ids.
///
/// # Examples
///
/// ```
/// use trussolve::{JointId, Structure, StructureEditError};
///
/// let mut structure = Structure::new();
/// let error = structure
///     .remove_joint(JointId(42))
///     .expect_err("unknown joint is rejected");
/// assert_eq!(error, StructureEditError::UnknownJoint(JointId(42)));
/// ```
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum StructureEditError {
    /// Returned when a joint cannot be found in the structure.
    #[error("joint {0} does not exist in this structure")]
    UnknownJoint(JointId),
    /// Returned when a member cannot be found in the structure.
    #[error("member {0} does not exist in this structure")]
    UnknownMember(MemberId),
}

/// Error returned when a linear system has no unique solution.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum EquationError {
    /// Returned when the number of equations differs from the number of unknowns.
    #[error("{equations} equations cannot determine {variables} unknowns")]
    NotSquare {
        /// Number of equations supplied.
        equations: usize,
        /// Number of distinct variables referenced.
        variables: usize,
    },
    /// Returned when the coefficient matrix cannot be inverted.
    #[error("coefficient matrix is singular")]
    Singular,
    /// Returned when surplus equations contradict the solution of the rest.
    #[error("equations are inconsistent (largest residual {residual:e})")]
    Inconsistent {
        /// Largest absolute residual of the best-fit solution.
        residual: f64,
    },
}
