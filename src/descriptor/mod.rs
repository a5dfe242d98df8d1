//! Step descriptors and the providers that fetch them.
//!
//! A [`StepDescriptor`] is the static metadata of a step type as offered by a
//! catalog. Steps are only ever created from descriptors: either freshly
//! materialized or re-hydrated with an identity they had before.

use crate::error::{ConfigError, EditError, ParseError};
use crate::model::{Connections, ParamValue, Parameters, RoleClass, Step, StepId};
use crate::validator::appendable_roles;
use ahash::AHashMap;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Declared type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Number,
    Integer,
    Boolean,
    Object,
}

impl ParamKind {
    fn admits(&self, value: &ParamValue) -> bool {
        match (self, value) {
            (ParamKind::String, ParamValue::String(_)) => true,
            (ParamKind::Number, ParamValue::Number(_) | ParamValue::Integer(_)) => true,
            (ParamKind::Integer, ParamValue::Integer(_)) => true,
            (ParamKind::Integer, ParamValue::Number(n)) => n.fract() == 0.0,
            (ParamKind::Boolean, ParamValue::Bool(_)) => true,
            (ParamKind::Object, ParamValue::Map(_)) => true,
            _ => false,
        }
    }
}

/// Schema entry for one parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub kind: ParamKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<ParamValue>,
    #[serde(default)]
    pub required: bool,
}

/// Static metadata of a step type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDescriptor {
    pub name: String,
    #[serde(default)]
    pub api_version: String,
    #[serde(rename = "type")]
    pub role: RoleClass,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kamelet_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_type: Option<String>,
    #[serde(default)]
    pub supports_branches: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connections: Option<Connections>,
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
}

impl StepDescriptor {
    pub fn new(name: impl Into<String>, role: RoleClass) -> Self {
        Self {
            name: name.into(),
            api_version: String::new(),
            role,
            title: None,
            description: None,
            icon: None,
            kind: None,
            group: None,
            kamelet_type: None,
            sub_type: None,
            supports_branches: false,
            connections: None,
            parameters: Vec::new(),
        }
    }

    /// Creates a step of this type with a fresh identity and default parameters.
    pub fn materialize(&self) -> Step {
        self.build(Step::new(self.name.clone(), self.role))
    }

    /// Creates a step of this type that keeps `id`.
    pub fn rehydrate(&self, id: StepId) -> Step {
        self.build(Step::rehydrate(id, self.name.clone(), self.role))
    }

    /// Parameter values declared with a default.
    pub fn default_parameters(&self) -> Parameters {
        self.parameters
            .iter()
            .filter_map(|spec| spec.default.clone().map(|value| (spec.name.clone(), value)))
            .collect()
    }

    /// Checks `params` against the schema.
    ///
    /// Required parameters without a default must be present, declared kinds
    /// must match, and names outside a non-empty schema are rejected.
    pub fn check_parameters(&self, params: &Parameters) -> Result<(), EditError> {
        for spec in &self.parameters {
            match params.get(&spec.name) {
                Some(value) if !spec.kind.admits(value) => {
                    return Err(EditError::InvalidParameter {
                        name: spec.name.clone(),
                        reason: format!(
                            "expected {:?}, found {}",
                            spec.kind,
                            value.kind_name()
                        )
                        .to_lowercase(),
                    });
                }
                None if spec.required && spec.default.is_none() => {
                    return Err(EditError::InvalidParameter {
                        name: spec.name.clone(),
                        reason: "is required".to_string(),
                    });
                }
                _ => {}
            }
        }

        if !self.parameters.is_empty() {
            if let Some(unknown) = params
                .keys()
                .find(|name| !self.parameters.iter().any(|spec| &spec.name == *name))
            {
                return Err(EditError::InvalidParameter {
                    name: unknown.clone(),
                    reason: format!("is not declared by step type '{}'", self.name),
                });
            }
        }
        Ok(())
    }

    fn build(&self, mut step: Step) -> Step {
        step.api_version = self.api_version.clone();
        step.title = self.title.clone();
        step.description = self.description.clone();
        step.icon = self.icon.clone();
        step.kind = self.kind.clone();
        step.group = self.group.clone();
        step.kamelet_type = self.kamelet_type.clone();
        step.sub_type = self.sub_type.clone();
        step.supports_branches = self.supports_branches;
        step.connections = self.connections.clone();
        step.parameters = self.default_parameters();
        step
    }
}

/// Asynchronous source of step descriptors.
///
/// Implementations typically call a remote catalog service; failures surface
/// as [`EditError::DescriptorUnavailable`].
#[async_trait]
pub trait DescriptorProvider: Send + Sync {
    async fn fetch_descriptor(&self, step_type: &str) -> Result<StepDescriptor, EditError>;
}

/// In-memory descriptor provider keyed by step name.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    descriptors: AHashMap<String, StepDescriptor>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, descriptor: StepDescriptor) {
        self.descriptors.insert(descriptor.name.clone(), descriptor);
    }

    pub fn with(mut self, descriptor: StepDescriptor) -> Self {
        self.insert(descriptor);
        self
    }

    pub fn get(&self, step_type: &str) -> Option<&StepDescriptor> {
        self.descriptors.get(step_type)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Step names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.descriptors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Descriptors whose role may follow `step`, sorted by name.
    pub fn offered_after(&self, step: &Step) -> Vec<&StepDescriptor> {
        let roles = appendable_roles(step);
        let mut offered: Vec<&StepDescriptor> = self
            .descriptors
            .values()
            .filter(|descriptor| roles.contains(&descriptor.role))
            .collect();
        offered.sort_by(|a, b| a.name.cmp(&b.name));
        offered
    }

    /// Parses a YAML list of descriptors.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ParseError> {
        let descriptors: Vec<StepDescriptor> =
            serde_yaml::from_str(yaml).map_err(|e| ParseError::Yaml(e.to_string()))?;
        Ok(Self::from_iter(descriptors))
    }

    /// Parses a JSON array of descriptors.
    pub fn from_json_str(json: &str) -> Result<Self, ParseError> {
        let descriptors: Vec<StepDescriptor> =
            serde_json::from_str(json).map_err(|e| ParseError::Json(e.to_string()))?;
        Ok(Self::from_iter(descriptors))
    }

    /// Loads a catalog file. `.json` files are read as JSON, anything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let catalog = if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
        .map_err(|e| ConfigError::Parse(e.to_string()))?;

        tracing::debug!(path = %path.display(), descriptors = catalog.len(), "catalog loaded");
        Ok(catalog)
    }
}

impl FromIterator<StepDescriptor> for Catalog {
    fn from_iter<I: IntoIterator<Item = StepDescriptor>>(iter: I) -> Self {
        let mut catalog = Catalog::new();
        for descriptor in iter {
            catalog.insert(descriptor);
        }
        catalog
    }
}

#[async_trait]
impl DescriptorProvider for Catalog {
    async fn fetch_descriptor(&self, step_type: &str) -> Result<StepDescriptor, EditError> {
        self.get(step_type)
            .cloned()
            .ok_or_else(|| EditError::DescriptorUnavailable {
                step_type: step_type.to_string(),
                message: "no such step type in the catalog".to_string(),
            })
    }
}
