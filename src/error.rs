use thiserror::Error;

/// A user-facing explanation of why a step may not occupy a position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub title: String,
    pub reason: String,
}

impl Rejection {
    pub fn new(title: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            reason: reason.into(),
        }
    }
}

/// Title/reason pair handed to an alerting collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub reason: String,
}

/// Errors returned by pipeline edits. The pipeline an edit was applied to is
/// never modified, whichever variant comes back.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditError {
    #[error("Step or branch '{identity}' was not found in the pipeline")]
    NotFound { identity: String },

    #[error("{}: {}", .0.title, .0.reason)]
    IncompatibleStep(Rejection),

    #[error("End step conflict: {reason}")]
    EndConflict { reason: String },

    #[error("Descriptor for step type '{step_type}' is unavailable: {message}")]
    DescriptorUnavailable { step_type: String, message: String },

    #[error("Identity '{identity}' is already used in the pipeline")]
    DuplicateIdentity { identity: String },

    #[error("Parameter '{name}' is invalid: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl EditError {
    pub(crate) fn not_found(identity: impl ToString) -> Self {
        EditError::NotFound {
            identity: identity.to_string(),
        }
    }

    /// Returns the title/reason pair for errors meant to be shown to the user.
    /// `NotFound` and `DescriptorUnavailable` are "try again" conditions and
    /// carry no alert.
    pub fn alert(&self) -> Option<Alert> {
        match self {
            EditError::IncompatibleStep(rejection) => Some(Alert {
                title: rejection.title.clone(),
                reason: rejection.reason.clone(),
            }),
            EditError::EndConflict { reason } => Some(Alert {
                title: "End Step Conflict".to_string(),
                reason: reason.clone(),
            }),
            EditError::InvalidParameter { name, reason } => Some(Alert {
                title: "Invalid Parameter".to_string(),
                reason: format!("{}: {}", name, reason),
            }),
            EditError::DuplicateIdentity { .. } => Some(Alert {
                title: "Add Step Unsuccessful".to_string(),
                reason: self.to_string(),
            }),
            EditError::Parse(err) => Some(Alert {
                title: "Invalid Pipeline".to_string(),
                reason: err.to_string(),
            }),
            EditError::NotFound { .. } | EditError::DescriptorUnavailable { .. } => None,
        }
    }

    /// Whether the caller should refresh its view and retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EditError::NotFound { .. } | EditError::DescriptorUnavailable { .. }
        )
    }
}

/// Errors raised at the text boundary when a document cannot become a pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Failed to parse pipeline YAML: {0}")]
    Yaml(String),

    #[error("Failed to parse JSON: {0}")]
    Json(String),

    #[error("Pipeline structure is invalid: {0}")]
    Structure(String),
}

/// Errors produced while writing pipelines to text.
#[derive(Error, Debug, Clone)]
pub enum SerializeError {
    #[error("Failed to serialize pipeline: {0}")]
    Generic(String),
}

/// Errors produced by binary snapshot persistence.
#[derive(Error, Debug, Clone)]
pub enum SnapshotError {
    #[error("Snapshot error: {0}")]
    Generic(String),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Errors produced while loading editor configuration.
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("Could not read config file '{path}': {message}")]
    Read { path: String, message: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid config value for '{key}': {message}")]
    Invalid { key: String, message: String },
}
