//! Conversion between pipelines and persisted text.
//!
//! [`PipelineSerializer`] is the contract the editor depends on; the bundled
//! [`YamlSerializer`] writes the `steps:` document format. Placeholder slots
//! are editor state and never reach the text.

use crate::error::{ParseError, SerializeError};
use crate::model::{Branch, BranchId, Connections, Node, Parameters, Pipeline, RoleClass, Step, StepId};
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

mod snapshot;

pub use snapshot::PipelineSnapshot;

/// Converts a pipeline to persisted text and back.
pub trait PipelineSerializer {
    fn serialize(&self, pipeline: &Pipeline) -> Result<String, SerializeError>;

    /// Parses `text`. Documents breaking the structural invariants are rejected.
    fn deserialize(&self, text: &str) -> Result<Pipeline, ParseError>;
}

/// YAML serializer for `steps:` documents.
#[derive(Debug, Clone, Copy)]
pub struct YamlSerializer {
    identities: bool,
}

impl Default for YamlSerializer {
    fn default() -> Self {
        Self { identities: true }
    }
}

impl YamlSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Omits `UUID` keys from the output. Reading such a document assigns fresh identities.
    pub fn without_identities(mut self) -> Self {
        self.identities = false;
        self
    }
}

impl PipelineSerializer for YamlSerializer {
    fn serialize(&self, pipeline: &Pipeline) -> Result<String, SerializeError> {
        let document = PipelineDocument {
            steps: sequence_to_documents(pipeline.steps(), self.identities),
        };
        serde_yaml::to_string(&document).map_err(|e| SerializeError::Generic(e.to_string()))
    }

    fn deserialize(&self, text: &str) -> Result<Pipeline, ParseError> {
        if text.trim().is_empty() {
            return Ok(Pipeline::empty());
        }
        let document: PipelineDocument =
            serde_yaml::from_str(text).map_err(|e| ParseError::Yaml(e.to_string()))?;

        let mut seen = AHashSet::new();
        let steps = documents_to_sequence(document.steps, &mut seen);
        let pipeline = Pipeline::from_nodes(steps);
        pipeline
            .check()
            .map_err(|e| ParseError::Structure(e.to_string()))?;

        tracing::debug!(steps = pipeline.all_steps().len(), "pipeline document parsed");
        Ok(pipeline)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PipelineDocument {
    #[serde(default)]
    steps: Vec<StepDocument>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StepDocument {
    #[serde(rename = "UUID", default, skip_serializing_if = "Option::is_none")]
    uuid: Option<Uuid>,
    name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    api_version: String,
    #[serde(rename = "type")]
    role: RoleClass,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kamelet_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sub_type: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    supports_branches: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    connections: Option<Connections>,
    #[serde(default, skip_serializing_if = "Parameters::is_empty")]
    parameters: Parameters,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    branches: Vec<BranchDocument>,
}

#[derive(Debug, Serialize, Deserialize)]
struct BranchDocument {
    #[serde(rename = "UUID", default, skip_serializing_if = "Option::is_none")]
    uuid: Option<Uuid>,
    #[serde(default)]
    steps: Vec<StepDocument>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn sequence_to_documents(nodes: &[Node], identities: bool) -> Vec<StepDocument> {
    nodes
        .iter()
        .filter_map(Node::as_step)
        .map(|step| step_to_document(step, identities))
        .collect()
}

fn step_to_document(step: &Step, identities: bool) -> StepDocument {
    StepDocument {
        uuid: identities.then(|| *step.id().as_uuid()),
        name: step.name.clone(),
        api_version: step.api_version.clone(),
        role: step.role,
        title: step.title.clone(),
        description: step.description.clone(),
        icon: step.icon.clone(),
        kind: step.kind.clone(),
        group: step.group.clone(),
        kamelet_type: step.kamelet_type.clone(),
        sub_type: step.sub_type.clone(),
        supports_branches: step.supports_branches,
        connections: step.connections.clone(),
        parameters: step.parameters.clone(),
        branches: step
            .branches()
            .iter()
            .map(|branch| BranchDocument {
                uuid: identities.then(|| *branch.id().as_uuid()),
                steps: sequence_to_documents(branch.steps(), identities),
            })
            .collect(),
    }
}

/// Keeps a persisted identity unless it is absent or already taken.
fn claim(persisted: Option<Uuid>, seen: &mut AHashSet<Uuid>) -> Uuid {
    if let Some(id) = persisted {
        if seen.insert(id) {
            return id;
        }
        tracing::debug!(identity = %id, "duplicate persisted identity replaced");
    }
    loop {
        let fresh = Uuid::new_v4();
        if seen.insert(fresh) {
            return fresh;
        }
    }
}

fn documents_to_sequence(documents: Vec<StepDocument>, seen: &mut AHashSet<Uuid>) -> Vec<Node> {
    documents
        .into_iter()
        .map(|document| Node::from(document_to_step(document, seen)))
        .collect()
}

fn document_to_step(document: StepDocument, seen: &mut AHashSet<Uuid>) -> Step {
    let id = StepId::from(claim(document.uuid, seen));
    let mut step = Step::rehydrate(id, document.name, document.role);
    step.api_version = document.api_version;
    step.title = document.title;
    step.description = document.description;
    step.icon = document.icon;
    step.kind = document.kind;
    step.group = document.group;
    step.kamelet_type = document.kamelet_type;
    step.sub_type = document.sub_type;
    step.supports_branches = document.supports_branches || !document.branches.is_empty();
    step.connections = document.connections;
    step.parameters = document.parameters;
    step.branches = document
        .branches
        .into_iter()
        .map(|branch| {
            let branch_id = BranchId::from(claim(branch.uuid, seen));
            let steps = documents_to_sequence(branch.steps, seen);
            Branch::rehydrate(branch_id, id, steps)
        })
        .collect();
    step
}
