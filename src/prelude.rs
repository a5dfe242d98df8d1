//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and functions from the
//! stepgraph crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use stepgraph::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let yaml = std::fs::read_to_string("path/to/pipeline.yaml")?;
//! let pipeline = YamlSerializer::new().deserialize(&yaml)?;
//!
//! let mut session = EditSession::new(pipeline);
//! session.subscribe(|change| println!("pipeline is now at version {}", change.version));
//!
//! if let Some(step) = session.pipeline().find_by_name("log-sink") {
//!     let id = step.id();
//!     session.apply(EditOp::Delete { id })?;
//! }
//! # Ok(())
//! # }
//! ```

// Model
pub use crate::model::{
    Adjacent, Branch, BranchId, Connections, Node, ParamValue, Parameters, Pipeline, RoleClass,
    Slot, Step, StepId,
};

// Resolution and validation
pub use crate::path::{locate, locate_branch, nested_steps, resolve_branch_owner, Path, Segment};
pub use crate::validator::{appendable_roles, can_occupy, Neighbor, SlotContext, Verdict};

// Editing
pub use crate::engine::{
    add_branch, append_after, append_to_branch, delete_step, insert_between, replace_step,
    replace_step_at, update_parameters, AppendPosition, EditOp,
};
pub use crate::session::{EditIntent, EditSession, PendingEdit};
pub use crate::notify::{PipelineChange, SubscriptionId};

// Boundaries
pub use crate::descriptor::{Catalog, DescriptorProvider, ParamKind, ParameterSpec, StepDescriptor};
pub use crate::projector::{project, FlatView, RenderEdge, RenderNode};
pub use crate::serial::{PipelineSerializer, PipelineSnapshot, YamlSerializer};
pub use crate::config::EditorConfig;

// Error types
pub use crate::error::{EditError, ParseError, Rejection};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
