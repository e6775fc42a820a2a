//! Structural sanity and static-determinacy checks.
//!
//! Every finding is a [`Problem`]. Critical problems stop the solver; the rest
//! are advisory. Problems that have a mechanical remedy carry a [`Fix`].

use std::collections::{HashMap, HashSet};
use std::fmt;

use log::debug;
use serde::Serialize;

use crate::structure::{Joint, JointId, MemberId, Structure};

/// Corrective action that can be applied to a structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "id")]
pub enum Fix {
    /// Delete the member with this id.
    RemoveMember(MemberId),
}

impl Fix {
    /// Return a corrected copy of `structure`. The input is left untouched.
    ///
    /// # Examples
    /// ```
    /// use trussolve::{vector, Fix, Structure};
    ///
    /// let mut structure = Structure::new();
    /// let a = structure.add_joint("A", vector(0.0, 0.0));
    /// let looped = structure.add_member(a, a).expect("joint exists");
    ///
    /// let fixed = Fix::RemoveMember(looped).apply(&structure);
    /// assert_eq!(fixed.member_count(), 0);
    /// assert_eq!(structure.member_count(), 1);
    /// ```
    #[must_use]
    pub fn apply(&self, structure: &Structure) -> Structure {
        match *self {
            Fix::RemoveMember(member) => structure.without_member(member),
        }
    }
}

impl fmt::Display for Fix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fix::RemoveMember(member) => write!(f, "remove member {member}"),
        }
    }
}

/// What a [`Problem`] is about.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ProblemKind {
    /// The structure has no members at all.
    NoMembers,
    /// A joint has a blank name.
    MissingName {
        /// Joint with the blank name.
        joint: JointId,
    },
    /// Two or more joints share a name.
    DuplicateName {
        /// The repeated name.
        name: String,
    },
    /// Two joints sit at exactly the same position.
    OverlappingJoints {
        /// Joint that occupied the position first.
        first: JointId,
        /// Joint found at the same position later.
        second: JointId,
    },
    /// A member starts and ends at the same joint.
    DegenerateMember {
        /// Offending member.
        member: MemberId,
        /// The joint it loops on.
        joint: JointId,
    },
    /// A member connects the same pair of joints as an earlier member.
    DuplicateMember {
        /// The later of the duplicated members.
        member: MemberId,
        /// Joints connected by both members.
        joints: (JointId, JointId),
    },
    /// Joint, member and reaction counts fail `2 * joints == members + reactions`.
    NotStaticallyDeterminate {
        /// Number of joints.
        joints: usize,
        /// Number of members.
        members: usize,
        /// Number of reaction components.
        reactions: usize,
    },
    /// Global equilibrium has no unique solution for the reactions.
    ReactionsUnsolvable,
    /// Joint equilibrium has no unique solution for the member forces.
    MembersUnsolvable,
}

/// A finding about a structure.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Problem {
    /// Classification with the ids involved.
    pub kind: ProblemKind,
    /// Human readable description.
    pub message: String,
    /// Whether the problem prevents solving.
    pub critical: bool,
    /// Mechanical remedy, when one is well defined.
    pub fix: Option<Fix>,
}

impl Problem {
    /// Create a problem that blocks solving.
    #[must_use]
    pub fn critical(kind: ProblemKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            critical: true,
            fix: None,
        }
    }

    /// Create an advisory problem.
    #[must_use]
    pub fn advisory(kind: ProblemKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            critical: false,
            fix: None,
        }
    }

    /// Attach a fix.
    #[must_use]
    pub fn with_fix(mut self, fix: Fix) -> Self {
        self.fix = Some(fix);
        self
    }

    /// Apply this problem's fix to `structure`, if it has one.
    #[must_use]
    pub fn apply_fix(&self, structure: &Structure) -> Option<Structure> {
        self.fix.map(|fix| fix.apply(structure))
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = if self.critical { "error" } else { "warning" };
        write!(f, "{severity}: {}", self.message)
    }
}

/// Check `structure` and list every problem found, in detection order.
///
/// The checks run in stages. An empty structure stops after the first stage,
/// and the determinacy count only runs when the naming, overlap and member
/// checks found nothing.
///
/// # Examples
/// ```
/// use trussolve::{validate, ProblemKind, Structure};
///
/// let problems = validate(&Structure::new());
/// assert_eq!(problems.len(), 1);
/// assert_eq!(problems[0].kind, ProblemKind::NoMembers);
/// assert!(problems[0].critical);
/// ```
#[must_use]
pub fn validate(structure: &Structure) -> Vec<Problem> {
    if structure.member_count() == 0 {
        return vec![Problem::critical(
            ProblemKind::NoMembers,
            "no structural members exist",
        )];
    }

    let mut problems = Vec::new();
    check_names(structure, &mut problems);
    check_overlaps(structure, &mut problems);
    check_degenerate_members(structure, &mut problems);
    check_duplicate_members(structure, &mut problems);
    if !problems.is_empty() {
        debug!("validation found {} problem(s)", problems.len());
        return problems;
    }

    check_determinacy(structure, &mut problems);
    debug!("validation found {} problem(s)", problems.len());
    problems
}

/// Report blank and repeated joint names.
fn check_names(structure: &Structure, problems: &mut Vec<Problem>) {
    let mut seen = HashSet::new();
    for joint in structure.joints() {
        if joint.name.trim().is_empty() {
            problems.push(Problem::advisory(
                ProblemKind::MissingName { joint: joint.id },
                "joint name missing",
            ));
        } else if !seen.insert(joint.name.as_str()) {
            problems.push(Problem::advisory(
                ProblemKind::DuplicateName {
                    name: joint.name.clone(),
                },
                format!("multiple joints exist with name {}", joint.name),
            ));
        }
    }
}

/// Exact position key; `-0.0` and `0.0` compare equal.
fn position_key(x: f64, y: f64) -> (u64, u64) {
    ((x + 0.0).to_bits(), (y + 0.0).to_bits())
}

/// Report joints sharing exactly the same coordinates.
fn check_overlaps(structure: &Structure, problems: &mut Vec<Problem>) {
    let mut occupied: HashMap<(u64, u64), &Joint> = HashMap::new();
    for joint in structure.joints() {
        let key = position_key(joint.position.x, joint.position.y);
        match occupied.get(&key) {
            Some(earlier) => {
                problems.push(Problem::critical(
                    ProblemKind::OverlappingJoints {
                        first: earlier.id,
                        second: joint.id,
                    },
                    format!("joints {} and {} overlap", earlier.label(), joint.label()),
                ));
            }
            None => {
                occupied.insert(key, joint);
            }
        }
    }
}

/// Label of a joint for messages, tolerating dangling ids.
fn joint_label(structure: &Structure, joint: JointId) -> String {
    structure
        .joint(joint)
        .map_or_else(|| format!("#{joint}"), |joint| joint.label())
}

/// Report members whose two ends are the same joint.
fn check_degenerate_members(structure: &Structure, problems: &mut Vec<Problem>) {
    for member in structure.members().iter().filter(|member| member.is_degenerate()) {
        let joint = member.joints.0;
        problems.push(
            Problem::critical(
                ProblemKind::DegenerateMember {
                    member: member.id,
                    joint,
                },
                format!(
                    "invalid member exists on joint {}",
                    joint_label(structure, joint)
                ),
            )
            .with_fix(Fix::RemoveMember(member.id)),
        );
    }
}

/// Report members connecting a pair of joints that is already connected.
fn check_duplicate_members(structure: &Structure, problems: &mut Vec<Problem>) {
    let mut seen = HashSet::new();
    for member in structure.members() {
        if seen.insert(member.endpoint_key()) {
            continue;
        }
        let (a, b) = member.joints;
        problems.push(
            Problem::critical(
                ProblemKind::DuplicateMember {
                    member: member.id,
                    joints: member.joints,
                },
                format!(
                    "duplicate members exist between joints {} and {}",
                    joint_label(structure, a),
                    joint_label(structure, b)
                ),
            )
            .with_fix(Fix::RemoveMember(member.id)),
        );
    }
}

/// Counting rule for planar pin trusses. Necessary but not sufficient: a
/// structure can pass and still be unstable, which the equation solver catches.
fn check_determinacy(structure: &Structure, problems: &mut Vec<Problem>) {
    let joints = structure.joint_count();
    let members = structure.member_count();
    let reactions = structure.reaction_count();
    if 2 * joints != members + reactions {
        problems.push(Problem::critical(
            ProblemKind::NotStaticallyDeterminate {
                joints,
                members,
                reactions,
            },
            format!(
                "structure is not statically determinate: 2 x {joints} joints != \
                 {members} members + {reactions} reactions"
            ),
        ));
    }
}
