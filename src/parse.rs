//! Reading and writing the JSON form of a [`Structure`].
//!
//! The serialized shape is
//!
//! ```json
//! {
//!   "joints": [{"id": 0, "name": "A", "pos": {"x": 0, "y": 0},
//!               "load": {"x": 0, "y": 0}, "support": {"x": true, "y": true}}],
//!   "members": [{"id": 3, "jointIds": [0, 1]}]
//! }
//! ```

use std::collections::HashSet;

use serde::Deserialize;

use crate::errors::ParseError;
use crate::structure::{Joint, JointId, Member, Structure};

/// Structure as it appears on the wire, before cross-reference checks.
#[derive(Debug, Deserialize)]
pub(crate) struct RawStructure {
    /// Joints exactly as listed in the input.
    joints: Vec<Joint>,
    /// Members exactly as listed in the input.
    members: Vec<Member>,
}

impl TryFrom<RawStructure> for Structure {
    type Error = ParseError;

    fn try_from(raw: RawStructure) -> Result<Self, Self::Error> {
        Structure::from_parts(raw.joints, raw.members)
    }
}

impl Structure {
    /// Assemble a structure from joints and members, checking id invariants.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] when a joint id repeats, a member id repeats or
    /// collides with a joint id, or a member references a missing joint.
    pub fn from_parts(joints: Vec<Joint>, members: Vec<Member>) -> Result<Self, ParseError> {
        let mut joint_ids = HashSet::with_capacity(joints.len());
        for joint in &joints {
            if !joint_ids.insert(joint.id) {
                return Err(ParseError::DuplicateJointId(joint.id));
            }
        }

        let mut member_ids = HashSet::with_capacity(members.len());
        for member in &members {
            if joint_ids.contains(&JointId(member.id.0)) {
                return Err(ParseError::MemberIdCollidesWithJoint(member.id));
            }
            if !member_ids.insert(member.id) {
                return Err(ParseError::DuplicateMemberId(member.id));
            }
            let (a, b) = member.joints;
            for joint in [a, b] {
                if !joint_ids.contains(&joint) {
                    return Err(ParseError::UnknownJoint {
                        member: member.id,
                        joint,
                    });
                }
            }
        }

        Ok(Self { joints, members })
    }

    /// Parse a structure from its JSON form.
    ///
    /// Parsing is all or nothing: any malformed field or broken reference
    /// rejects the whole input.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Json`] for input of the wrong shape and the other
    /// [`ParseError`] variants for id conflicts.
    ///
    /// # Examples
    /// ```
    /// use trussolve::Structure;
    ///
    /// let structure = Structure::from_json(
    ///     r#"{"joints": [
    ///           {"id": 0, "name": "A", "pos": {"x": 0, "y": 0},
    ///            "load": {"x": 0, "y": 0}, "support": {"x": true, "y": true}},
    ///           {"id": 1, "name": "B", "pos": {"x": 4, "y": 0},
    ///            "load": {"x": 0, "y": -2}, "support": {"x": false, "y": false}}],
    ///         "members": [{"id": 2, "jointIds": [0, 1]}]}"#,
    /// )
    /// .expect("valid structure");
    /// assert_eq!(structure.member_count(), 1);
    ///
    /// assert!(Structure::from_json(r#"{"joints": []}"#).is_err());
    /// ```
    pub fn from_json(input: &str) -> Result<Self, ParseError> {
        let raw: RawStructure = serde_json::from_str(input)?;
        Structure::try_from(raw)
    }

    /// Serialize to the JSON form accepted by [`Structure::from_json`].
    ///
    /// # Errors
    ///
    /// Propagates serializer failures from `serde_json`.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
