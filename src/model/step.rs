use super::value::{ParamValue, Parameters};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Process-unique identity of a step or placeholder slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepId(Uuid);

impl StepId {
    /// Generates a fresh identity. Identities are never reused.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for StepId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a branch, with the same lifetime rules as [`StepId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchId(Uuid);

impl BranchId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for BranchId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for BranchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Positional role of a step inside its sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RoleClass {
    Start,
    Middle,
    End,
}

impl fmt::Display for RoleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleClass::Start => write!(f, "START"),
            RoleClass::Middle => write!(f, "MIDDLE"),
            RoleClass::End => write!(f, "END"),
        }
    }
}

/// What may sit next to a step on one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Adjacent {
    /// The opening of the root sequence.
    Origin,
    /// The opening of a branch, fed by the branch owner.
    BranchEntry,
    Start,
    Middle,
    End,
}

impl From<RoleClass> for Adjacent {
    fn from(role: RoleClass) -> Self {
        match role {
            RoleClass::Start => Adjacent::Start,
            RoleClass::Middle => Adjacent::Middle,
            RoleClass::End => Adjacent::End,
        }
    }
}

/// Neighbor acceptance declared by a step for each side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connections {
    #[serde(default)]
    pub before: Vec<Adjacent>,
    #[serde(default)]
    pub after: Vec<Adjacent>,
}

impl Connections {
    /// Default acceptance table for a role.
    pub fn for_role(role: RoleClass) -> Self {
        use Adjacent::*;
        match role {
            RoleClass::Start => Self {
                before: vec![Origin, BranchEntry],
                after: vec![Middle, End],
            },
            RoleClass::Middle => Self {
                before: vec![Start, Middle, BranchEntry],
                after: vec![Middle, End],
            },
            RoleClass::End => Self {
                before: vec![Start, Middle, BranchEntry],
                after: vec![],
            },
        }
    }

    pub fn accepts_before(&self, adjacent: Adjacent) -> bool {
        self.before.contains(&adjacent)
    }

    pub fn accepts_after(&self, adjacent: Adjacent) -> bool {
        self.after.contains(&adjacent)
    }
}

/// One stage of a pipeline.
///
/// A step is immutable once it is part of a [`Pipeline`](super::Pipeline): the
/// tree holds it behind an `Arc`, and the engine swaps whole values instead of
/// touching fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    id: StepId,
    pub api_version: String,
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub kind: Option<String>,
    pub group: Option<String>,
    pub kamelet_type: Option<String>,
    pub sub_type: Option<String>,
    pub role: RoleClass,
    pub supports_branches: bool,
    pub connections: Option<Connections>,
    pub parameters: Parameters,
    pub(crate) branches: Vec<Branch>,
}

impl Step {
    /// Creates a step with a freshly generated identity.
    pub fn new(name: impl Into<String>, role: RoleClass) -> Self {
        Self::rehydrate(StepId::generate(), name, role)
    }

    /// Creates a step that keeps a previously assigned identity.
    ///
    /// Only meant for re-hydrating steps that were materialized before
    /// (replace flows, deserialization of persisted identities).
    pub fn rehydrate(id: StepId, name: impl Into<String>, role: RoleClass) -> Self {
        Self {
            id,
            api_version: String::new(),
            name: name.into(),
            title: None,
            description: None,
            icon: None,
            kind: None,
            group: None,
            kamelet_type: None,
            sub_type: None,
            role,
            supports_branches: false,
            connections: None,
            parameters: Parameters::new(),
            branches: Vec::new(),
        }
    }

    pub fn id(&self) -> StepId {
        self.id
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    /// The effective neighbor acceptance of this step.
    pub fn connections(&self) -> Connections {
        self.connections
            .clone()
            .unwrap_or_else(|| Connections::for_role(self.role))
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_kamelet_type(mut self, kamelet_type: impl Into<String>) -> Self {
        self.kamelet_type = Some(kamelet_type.into());
        self
    }

    pub fn with_sub_type(mut self, sub_type: impl Into<String>) -> Self {
        self.sub_type = Some(sub_type.into());
        self
    }

    pub fn with_connections(mut self, connections: Connections) -> Self {
        self.connections = Some(connections);
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn supporting_branches(mut self) -> Self {
        self.supports_branches = true;
        self
    }

    /// Adds a branch holding `steps`. The step becomes branch-capable.
    pub fn with_branch(mut self, steps: Vec<Step>) -> Self {
        self.supports_branches = true;
        let branch = Branch::with_steps(self.id, steps.into_iter().map(Node::from).collect());
        self.branches.push(branch);
        self
    }

    /// Compares everything except identities, recursively. Slots are ignored.
    pub fn same_content(&self, other: &Step) -> bool {
        self.api_version == other.api_version
            && self.name == other.name
            && self.title == other.title
            && self.description == other.description
            && self.icon == other.icon
            && self.kind == other.kind
            && self.group == other.group
            && self.kamelet_type == other.kamelet_type
            && self.sub_type == other.sub_type
            && self.role == other.role
            && self.supports_branches == other.supports_branches
            && self.connections == other.connections
            && self.parameters == other.parameters
            && self.branches.len() == other.branches.len()
            && self
                .branches
                .iter()
                .zip(&other.branches)
                .all(|(a, b)| same_sequence_content(&a.steps, &b.steps))
    }
}

/// An ordered sub-sequence of steps owned by a single step.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    id: BranchId,
    owner: StepId,
    pub(crate) steps: Vec<Node>,
}

impl Branch {
    pub(crate) fn new(owner: StepId) -> Self {
        Self::with_steps(owner, Vec::new())
    }

    pub(crate) fn with_steps(owner: StepId, steps: Vec<Node>) -> Self {
        Self::rehydrate(BranchId::generate(), owner, steps)
    }

    /// An empty `steps` is given a placeholder slot so the branch stays droppable.
    pub(crate) fn rehydrate(id: BranchId, owner: StepId, steps: Vec<Node>) -> Self {
        Self {
            id,
            owner,
            steps: with_placeholder(steps),
        }
    }

    pub fn id(&self) -> BranchId {
        self.id
    }

    /// Identity of the step declaring this branch.
    pub fn owner(&self) -> StepId {
        self.owner
    }

    pub fn steps(&self) -> &[Node] {
        &self.steps
    }
}

/// A placeholder position holding no step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    id: StepId,
}

impl Slot {
    pub(crate) fn new() -> Self {
        Self {
            id: StepId::generate(),
        }
    }

    pub fn id(&self) -> StepId {
        self.id
    }
}

/// One entry of a step sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Step(Arc<Step>),
    Slot(Slot),
}

impl Node {
    pub fn id(&self) -> StepId {
        match self {
            Node::Step(step) => step.id(),
            Node::Slot(slot) => slot.id(),
        }
    }

    pub fn as_step(&self) -> Option<&Step> {
        match self {
            Node::Step(step) => Some(step),
            Node::Slot(_) => None,
        }
    }

    pub fn is_slot(&self) -> bool {
        matches!(self, Node::Slot(_))
    }

    pub fn role(&self) -> Option<RoleClass> {
        self.as_step().map(|step| step.role)
    }
}

impl From<Step> for Node {
    fn from(step: Step) -> Self {
        Node::Step(Arc::new(step))
    }
}

/// Gives an empty sequence a single placeholder slot.
pub(crate) fn with_placeholder(mut nodes: Vec<Node>) -> Vec<Node> {
    if nodes.is_empty() {
        nodes.push(Node::Slot(Slot::new()));
    }
    nodes
}

/// Whether the sequence holds nothing but one placeholder.
pub(crate) fn is_lone_slot(nodes: &[Node]) -> bool {
    matches!(nodes, [Node::Slot(_)])
}

pub(crate) fn same_sequence_content(a: &[Node], b: &[Node]) -> bool {
    let left: Vec<&Step> = a.iter().filter_map(Node::as_step).collect();
    let right: Vec<&Step> = b.iter().filter_map(Node::as_step).collect();
    left.len() == right.len() && left.iter().zip(&right).all(|(x, y)| x.same_content(y))
}
