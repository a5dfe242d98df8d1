//! # stepgraph - Step-Graph Model and Mutation Engine
//!
//! **stepgraph** is the data model behind a visual integration-pipeline
//! editor. A pipeline is an ordered sequence of typed steps, some of which own
//! nested branches of further steps. The crate locates steps by identity,
//! decides whether a step may occupy a position, and performs structural edits
//! that keep the tree valid.
//!
//! ## Core Workflow
//!
//! 1.  **Describe Step Types**: Load a [`descriptor::Catalog`] (YAML or JSON) or
//!     implement [`descriptor::DescriptorProvider`] over your own catalog service.
//! 2.  **Build or Parse a Pipeline**: Materialize steps from descriptors, or read
//!     a `steps:` document with [`serial::YamlSerializer`].
//! 3.  **Edit**: Call the pure functions in [`engine`] directly, or drive an
//!     [`session::EditSession`] that owns the current pipeline and notifies
//!     subscribers after every successful edit.
//! 4.  **Render and Persist**: Walk the nested tree as a flat sequence with
//!     [`projector::project`] and write it back with the serializer.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stepgraph::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let catalog = Catalog::new()
//!         .with(StepDescriptor::new("timer-source", RoleClass::Start))
//!         .with(StepDescriptor::new("aggregate", RoleClass::Middle))
//!         .with(StepDescriptor::new("log-sink", RoleClass::End));
//!
//!     let timer = catalog.get("timer-source").ok_or("missing")?.materialize();
//!     let log = catalog.get("log-sink").ok_or("missing")?.materialize();
//!     let timer_id = timer.id();
//!     let pipeline = Pipeline::new(vec![timer, log])?;
//!
//!     // Edits return a new pipeline; the input is never modified.
//!     let aggregate = catalog.get("aggregate").ok_or("missing")?.materialize();
//!     let pipeline = insert_between(&pipeline, timer_id, aggregate)?;
//!
//!     for node in project(&pipeline).iter() {
//!         println!("{:?}", node.id());
//!     }
//!
//!     let yaml = YamlSerializer::new().serialize(&pipeline)?;
//!     println!("{}", yaml);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod model;
pub mod notify;
pub mod path;
pub mod prelude;
pub mod projector;
pub mod serial;
pub mod session;
pub mod validator;
