//! The single writer that owns the current pipeline.
//!
//! An [`EditSession`] applies engine operations to its pipeline, bumps a
//! version and notifies subscribers after every successful edit. Edits that
//! need a descriptor run in two phases: [`EditSession::request`] records what
//! the user asked for, and [`EditSession::complete`] applies it once the fetch
//! has finished, re-resolving the target against whatever the pipeline looks
//! like by then.

use crate::descriptor::{DescriptorProvider, StepDescriptor};
use crate::engine::{self, AppendPosition, EditOp};
use crate::error::EditError;
use crate::model::{BranchId, Node, Parameters, Pipeline, StepId};
use crate::notify::{ChangeNotifier, PipelineChange, SubscriptionId};
use crate::path::{locate, locate_branch};

/// An edit waiting for a step descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditIntent {
    InsertBetween {
        after: StepId,
        step_type: String,
    },
    AppendAfter {
        after: StepId,
        step_type: String,
        position: AppendPosition,
    },
    Replace {
        target: StepId,
        step_type: String,
    },
    AppendToBranch {
        branch: BranchId,
        step_type: String,
    },
}

impl EditIntent {
    pub fn step_type(&self) -> &str {
        match self {
            EditIntent::InsertBetween { step_type, .. }
            | EditIntent::AppendAfter { step_type, .. }
            | EditIntent::Replace { step_type, .. }
            | EditIntent::AppendToBranch { step_type, .. } => step_type,
        }
    }

    fn target(&self) -> String {
        match self {
            EditIntent::InsertBetween { after, .. } | EditIntent::AppendAfter { after, .. } => {
                after.to_string()
            }
            EditIntent::Replace { target, .. } => target.to_string(),
            EditIntent::AppendToBranch { branch, .. } => branch.to_string(),
        }
    }
}

/// Phase-one handle returned by [`EditSession::request`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEdit {
    intent: EditIntent,
    requested_at: u64,
}

impl PendingEdit {
    pub fn intent(&self) -> &EditIntent {
        &self.intent
    }

    pub fn step_type(&self) -> &str {
        self.intent.step_type()
    }

    /// Session version at the time of the request.
    pub fn requested_at(&self) -> u64 {
        self.requested_at
    }
}

#[derive(Debug, Default)]
pub struct EditSession {
    pipeline: Pipeline,
    version: u64,
    notifier: ChangeNotifier,
}

impl EditSession {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            version: 0,
            notifier: ChangeNotifier::new(),
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Number of successful edits so far.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: Fn(&PipelineChange) + Send + Sync + 'static,
    {
        self.notifier.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    /// Applies `op`. On error the current pipeline stays as it was and no
    /// notification is sent.
    pub fn apply(&mut self, op: EditOp) -> Result<&Pipeline, EditError> {
        let next = engine::apply(&self.pipeline, op)?;
        Ok(self.commit(next))
    }

    pub fn add_branch(&mut self, owner: StepId) -> Result<BranchId, EditError> {
        let (next, branch) = engine::add_branch(&self.pipeline, owner)?;
        self.commit(next);
        Ok(branch)
    }

    /// Checks `parameters` against `descriptor` and stores them on step `id`.
    pub fn configure(
        &mut self,
        id: StepId,
        parameters: Parameters,
        descriptor: &StepDescriptor,
    ) -> Result<&Pipeline, EditError> {
        descriptor.check_parameters(&parameters)?;
        self.apply(EditOp::UpdateParameters { id, parameters })
    }

    /// Swaps in a pipeline produced elsewhere, such as a re-parsed text edit.
    pub fn reload(&mut self, pipeline: Pipeline) -> Result<&Pipeline, EditError> {
        pipeline.check()?;
        Ok(self.commit(pipeline))
    }

    /// First phase of a descriptor-backed edit.
    pub fn request(&self, intent: EditIntent) -> PendingEdit {
        tracing::debug!(
            step_type = intent.step_type(),
            identity = %intent.target(),
            version = self.version,
            "edit requested"
        );
        PendingEdit {
            intent,
            requested_at: self.version,
        }
    }

    /// Second phase: applies `pending` with the fetched descriptor.
    ///
    /// A target that disappeared while the fetch was in flight yields
    /// `NotFound`; the edit is dropped and the pipeline is left alone. A step
    /// dropped on a placeholder takes over the placeholder's identity.
    pub fn complete(
        &mut self,
        pending: PendingEdit,
        fetched: Result<StepDescriptor, EditError>,
    ) -> Result<&Pipeline, EditError> {
        let descriptor = match fetched {
            Ok(descriptor) => descriptor,
            Err(err) => {
                tracing::warn!(step_type = pending.step_type(), error = %err, "descriptor fetch failed");
                return Err(err);
            }
        };

        if let Err(err) = self.resolve_target(&pending.intent) {
            tracing::warn!(
                identity = %pending.intent.target(),
                requested_at = pending.requested_at,
                version = self.version,
                "discarding edit for a target that no longer exists"
            );
            return Err(err);
        }

        let op = match pending.intent {
            EditIntent::InsertBetween { after, .. } => EditOp::InsertBetween {
                after,
                step: descriptor.materialize(),
            },
            EditIntent::AppendAfter {
                after, position, ..
            } => EditOp::AppendAfter {
                after,
                step: descriptor.materialize(),
                position,
            },
            EditIntent::Replace { target, .. } => {
                let step = if self.is_slot(target) {
                    descriptor.rehydrate(target)
                } else {
                    descriptor.materialize()
                };
                EditOp::Replace { target, step }
            }
            EditIntent::AppendToBranch { branch, .. } => EditOp::AppendToBranch {
                branch,
                step: descriptor.materialize(),
            },
        };
        self.apply(op)
    }

    /// Runs both phases against `provider`.
    pub async fn fetch_and_apply<P>(
        &mut self,
        provider: &P,
        intent: EditIntent,
    ) -> Result<&Pipeline, EditError>
    where
        P: DescriptorProvider + ?Sized,
    {
        let pending = self.request(intent);
        let fetched = provider.fetch_descriptor(pending.step_type()).await;
        self.complete(pending, fetched)
    }

    fn resolve_target(&self, intent: &EditIntent) -> Result<(), EditError> {
        match intent {
            EditIntent::InsertBetween { after: id, .. }
            | EditIntent::AppendAfter { after: id, .. }
            | EditIntent::Replace { target: id, .. } => locate(&self.pipeline, *id).map(|_| ()),
            EditIntent::AppendToBranch { branch, .. } => {
                locate_branch(&self.pipeline, *branch).map(|_| ())
            }
        }
    }

    fn is_slot(&self, id: StepId) -> bool {
        locate(&self.pipeline, id)
            .ok()
            .and_then(|path| self.pipeline.node_at(&path).map(Node::is_slot))
            .unwrap_or(false)
    }

    fn commit(&mut self, pipeline: Pipeline) -> &Pipeline {
        self.version += 1;
        self.pipeline = pipeline;
        self.notifier.notify(&PipelineChange {
            version: self.version,
            pipeline: self.pipeline.clone(),
        });
        &self.pipeline
    }
}
