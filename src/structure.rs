//! Joints, members and the structure that owns them.

use std::collections::HashMap;
use std::fmt;

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::errors::StructureEditError;
use crate::geometry::{Axis, Vector};

/// Identifier of a joint. Joint and member ids share one namespace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JointId(pub u32);

/// Identifier of a member. Never equal to any joint id of the same structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(pub u32);

impl fmt::Display for JointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Axes along which a support supplies a reaction force.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Support {
    /// A reaction component is available along X.
    pub x: bool,
    /// A reaction component is available along Y.
    pub y: bool,
}

impl Support {
    /// No reaction on either axis.
    pub const FREE: Support = Support::new(false, false);
    /// Pin support reacting along both axes.
    pub const PIN: Support = Support::new(true, true);
    /// Roller reacting only along Y.
    pub const ROLLER_Y: Support = Support::new(false, true);
    /// Roller reacting only along X.
    pub const ROLLER_X: Support = Support::new(true, false);

    /// Create a [`Support`] with explicit axis flags.
    #[must_use]
    pub const fn new(x: bool, y: bool) -> Self {
        Self { x, y }
    }

    /// Number of reaction components this support contributes.
    #[must_use]
    pub fn reaction_count(self) -> usize {
        usize::from(self.x) + usize::from(self.y)
    }

    /// Whether a reaction component is supplied along `axis`.
    #[must_use]
    pub fn along(self, axis: Axis) -> bool {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }

    /// Whether any reaction component is supplied.
    #[must_use]
    pub fn is_supported(self) -> bool {
        self.x || self.y
    }
}

/// Pin connection point of the truss.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Joint {
    /// Unique identifier.
    pub id: JointId,
    /// Display name. May be blank, which the validator reports.
    pub name: String,
    /// Location of the joint.
    #[serde(rename = "pos")]
    pub position: Vector,
    /// Point load applied at the joint.
    pub load: Vector,
    /// Reaction components available at the joint.
    pub support: Support,
}

impl Joint {
    /// Create an unloaded, unsupported joint.
    #[must_use]
    pub fn new(id: JointId, name: impl Into<String>, position: Vector) -> Self {
        Self {
            id,
            name: name.into(),
            position,
            load: Vector::ZERO,
            support: Support::FREE,
        }
    }

    /// Name used when reporting on this joint; falls back to the id when blank.
    #[must_use]
    pub fn label(&self) -> String {
        let trimmed = self.name.trim();
        if trimmed.is_empty() {
            format!("#{}", self.id)
        } else {
            trimmed.to_string()
        }
    }
}

/// Two-force element connecting a pair of joints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Unique identifier.
    pub id: MemberId,
    /// The two joints, in no particular order.
    #[serde(rename = "jointIds")]
    pub joints: (JointId, JointId),
}

impl Member {
    /// Create a member between `a` and `b`.
    #[must_use]
    pub const fn new(id: MemberId, a: JointId, b: JointId) -> Self {
        Self { id, joints: (a, b) }
    }

    /// Whether both ends reference the same joint.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.joints.0 == self.joints.1
    }

    /// Whether `joint` is one of the two ends.
    #[must_use]
    pub fn connects(&self, joint: JointId) -> bool {
        self.joints.0 == joint || self.joints.1 == joint
    }

    /// The end opposite `joint`, or `None` if the member does not touch `joint`.
    #[must_use]
    pub fn other_end(&self, joint: JointId) -> Option<JointId> {
        if self.joints.0 == joint {
            Some(self.joints.1)
        } else if self.joints.1 == joint {
            Some(self.joints.0)
        } else {
            None
        }
    }

    /// Order independent key of the joint pair.
    #[must_use]
    pub fn endpoint_key(&self) -> (JointId, JointId) {
        let (a, b) = self.joints;
        (a.min(b), a.max(b))
    }
}

/// Container for a planar pin-jointed truss.
///
/// A structure is a plain value: solving borrows it and edits go through the
/// methods below, so a caller that wants to keep an earlier state clones it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "crate::parse::RawStructure")]
pub struct Structure {
    /// Joints in insertion order.
    pub(crate) joints: Vec<Joint>,
    /// Members in insertion order.
    pub(crate) members: Vec<Member>,
}

impl Structure {
    /// Create an empty structure.
    ///
    /// # Examples
    /// ```
    /// use trussolve::Structure;
    ///
    /// let structure = Structure::new();
    /// assert_eq!(structure.joint_count(), 0);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self {
            joints: Vec::new(),
            members: Vec::new(),
        }
    }

    /// Joints in insertion order.
    #[must_use]
    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    /// Members in insertion order.
    #[must_use]
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Return the number of joints.
    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Return the number of members.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Total number of reaction components supplied by all supports.
    #[must_use]
    pub fn reaction_count(&self) -> usize {
        self.joints
            .iter()
            .map(|joint| joint.support.reaction_count())
            .sum()
    }

    /// Look up a joint by id.
    #[must_use]
    pub fn joint(&self, id: JointId) -> Option<&Joint> {
        self.joints.iter().find(|joint| joint.id == id)
    }

    /// Look up a member by id.
    #[must_use]
    pub fn member(&self, id: MemberId) -> Option<&Member> {
        self.members.iter().find(|member| member.id == id)
    }

    /// Add a new joint and return its freshly allocated id.
    ///
    /// # Examples
    /// ```
    /// use trussolve::{vector, Structure};
    ///
    /// let mut structure = Structure::new();
    /// let a = structure.add_joint("A", vector(0.0, 0.0));
    /// let b = structure.add_joint("B", vector(1.0, 0.0));
    /// assert_ne!(a, b);
    /// assert_eq!(structure.joint_count(), 2);
    /// ```
    pub fn add_joint(&mut self, name: impl Into<String>, position: Vector) -> JointId {
        let id = JointId(self.next_id());
        self.joints.push(Joint::new(id, name, position));
        id
    }

    /// Connect two joints with a new member.
    ///
    /// Both ends must exist. Connecting a joint to itself is accepted here and
    /// reported later by the validator.
    ///
    /// # Errors
    ///
    /// Returns [`StructureEditError::UnknownJoint`] when either end is not part of
    /// this structure.
    pub fn add_member(&mut self, a: JointId, b: JointId) -> Result<MemberId, StructureEditError> {
        for end in [a, b] {
            if self.joint(end).is_none() {
                return Err(StructureEditError::UnknownJoint(end));
            }
        }
        let id = MemberId(self.next_id());
        self.members.push(Member::new(id, a, b));
        Ok(id)
    }

    /// Update the position of an existing joint.
    ///
    /// # Errors
    ///
    /// Returns [`StructureEditError::UnknownJoint`] when `joint` is not part of this structure.
    pub fn move_joint(&mut self, joint: JointId, position: Vector) -> Result<(), StructureEditError> {
        self.joint_mut(joint)?.position = position;
        Ok(())
    }

    /// Rename an existing joint.
    ///
    /// # Errors
    ///
    /// Returns [`StructureEditError::UnknownJoint`] when `joint` is not part of this structure.
    pub fn rename_joint(
        &mut self,
        joint: JointId,
        name: impl Into<String>,
    ) -> Result<(), StructureEditError> {
        self.joint_mut(joint)?.name = name.into();
        Ok(())
    }

    /// Set the reaction components available at a joint.
    ///
    /// # Errors
    ///
    /// Returns [`StructureEditError::UnknownJoint`] when `joint` is not part of this structure.
    pub fn set_support(&mut self, joint: JointId, support: Support) -> Result<(), StructureEditError> {
        self.joint_mut(joint)?.support = support;
        Ok(())
    }

    /// Apply a point load to a joint, replacing any previous load.
    ///
    /// # Errors
    ///
    /// Returns [`StructureEditError::UnknownJoint`] when `joint` is not part of this structure.
    pub fn set_load(&mut self, joint: JointId, load: Vector) -> Result<(), StructureEditError> {
        self.joint_mut(joint)?.load = load;
        Ok(())
    }

    /// Remove a joint and every member connected to it.
    ///
    /// # Errors
    ///
    /// Returns [`StructureEditError::UnknownJoint`] when `joint` is not part of this structure.
    pub fn remove_joint(&mut self, joint: JointId) -> Result<(), StructureEditError> {
        let index = self
            .joints
            .iter()
            .position(|candidate| candidate.id == joint)
            .ok_or(StructureEditError::UnknownJoint(joint))?;
        self.joints.remove(index);
        self.members.retain(|member| !member.connects(joint));
        Ok(())
    }

    /// Remove a member.
    ///
    /// # Errors
    ///
    /// Returns [`StructureEditError::UnknownMember`] when `member` is not part of this structure.
    pub fn remove_member(&mut self, member: MemberId) -> Result<(), StructureEditError> {
        let index = self
            .members
            .iter()
            .position(|candidate| candidate.id == member)
            .ok_or(StructureEditError::UnknownMember(member))?;
        self.members.remove(index);
        Ok(())
    }

    /// Copy of this structure without `member`; everything else is unchanged.
    #[must_use]
    pub fn without_member(&self, member: MemberId) -> Structure {
        Structure {
            joints: self.joints.clone(),
            members: self
                .members
                .iter()
                .filter(|candidate| candidate.id != member)
                .copied()
                .collect(),
        }
    }

    /// Build the joint/member connectivity graph.
    #[must_use]
    pub fn connectivity(&self) -> Connectivity {
        Connectivity::new(self)
    }

    /// Mutable access to a joint by id.
    fn joint_mut(&mut self, joint: JointId) -> Result<&mut Joint, StructureEditError> {
        self.joints
            .iter_mut()
            .find(|candidate| candidate.id == joint)
            .ok_or(StructureEditError::UnknownJoint(joint))
    }

    /// Smallest id greater than every joint and member id in use.
    fn next_id(&self) -> u32 {
        let joints = self.joints.iter().map(|joint| joint.id.0);
        let members = self.members.iter().map(|member| member.id.0);
        joints.chain(members).max().map_or(0, |max| max + 1)
    }
}

/// Undirected graph view of a structure: joints are nodes, members are edges.
#[derive(Debug)]
pub struct Connectivity {
    /// Underlying graph storage; weights are the domain ids.
    graph: UnGraph<JointId, MemberId>,
    /// Node lookup by joint id.
    nodes: HashMap<JointId, NodeIndex>,
}

impl Connectivity {
    /// Build the graph for `structure`. Members with unknown ends are skipped.
    fn new(structure: &Structure) -> Self {
        let mut graph = UnGraph::with_capacity(structure.joint_count(), structure.member_count());
        let mut nodes = HashMap::with_capacity(structure.joint_count());
        for joint in &structure.joints {
            nodes.insert(joint.id, graph.add_node(joint.id));
        }
        for member in &structure.members {
            let (a, b) = member.joints;
            if let (Some(&start), Some(&end)) = (nodes.get(&a), nodes.get(&b)) {
                graph.add_edge(start, end, member.id);
            }
        }
        Self { graph, nodes }
    }

    /// Members attached to `joint`, each paired with the joint at its far end.
    ///
    /// Results are ordered by member id so the output does not depend on graph
    /// storage order.
    #[must_use]
    pub fn incident_members(&self, joint: JointId) -> Vec<(MemberId, JointId)> {
        let Some(&node) = self.nodes.get(&joint) else {
            return Vec::new();
        };
        let mut incident: Vec<(MemberId, JointId)> = self
            .graph
            .edges(node)
            .map(|edge| {
                let far = if edge.source() == node {
                    edge.target()
                } else {
                    edge.source()
                };
                (*edge.weight(), self.graph[far])
            })
            .collect();
        incident.sort_by_key(|(member, _)| *member);
        incident
    }

    /// Number of connected pieces the structure falls apart into.
    #[must_use]
    pub fn component_count(&self) -> usize {
        petgraph::algo::connected_components(&self.graph)
    }
}
