//! Structural edits over a [`Pipeline`].
//!
//! Every operation is a pure transition `&Pipeline × op → Result<Pipeline>`.
//! Inputs are borrowed immutably, so a failed edit can never leave a
//! half-spliced tree behind: the caller simply keeps the value it had.
//!
//! Edits inside branches go through [`rebuild::edit_sequence`], which copies
//! each ancestor step from the root down to the edited branch.

use crate::error::{EditError, Rejection};
use crate::model::step::is_lone_slot;
use crate::model::{Branch, BranchId, Node, Parameters, Pipeline, RoleClass, Slot, Step, StepId};
use crate::path::{locate, locate_branch, Path};
use crate::validator::{can_occupy, gap_is_compatible, SlotContext};
use ahash::AHashSet;
use serde::Deserialize;
use std::str::FromStr;
use uuid::Uuid;

mod rebuild;

pub(crate) use rebuild::edit_sequence;

/// Where an appended step is meant to land.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppendPosition {
    #[default]
    Middle,
    End,
}

impl FromStr for AppendPosition {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "middle" => Ok(AppendPosition::Middle),
            "end" => Ok(AppendPosition::End),
            _ => Err(format!(
                "invalid append position '{}'; supported values are middle, end",
                value
            )),
        }
    }
}

/// A single edit, as accepted by [`apply`] and the edit session.
#[derive(Debug, Clone)]
pub enum EditOp {
    InsertBetween {
        after: StepId,
        step: Step,
    },
    AppendAfter {
        after: StepId,
        step: Step,
        position: AppendPosition,
    },
    Delete {
        id: StepId,
    },
    Replace {
        target: StepId,
        step: Step,
    },
    ReplaceAt {
        target: StepId,
        step: Step,
        path: Path,
    },
    AppendToBranch {
        branch: BranchId,
        step: Step,
    },
    UpdateParameters {
        id: StepId,
        parameters: Parameters,
    },
}

impl EditOp {
    pub fn name(&self) -> &'static str {
        match self {
            EditOp::InsertBetween { .. } => "insert_between",
            EditOp::AppendAfter { .. } => "append_after",
            EditOp::Delete { .. } => "delete_step",
            EditOp::Replace { .. } => "replace_step",
            EditOp::ReplaceAt { .. } => "replace_step_at",
            EditOp::AppendToBranch { .. } => "append_to_branch",
            EditOp::UpdateParameters { .. } => "update_parameters",
        }
    }
}

/// Dispatches an [`EditOp`] to the matching operation.
pub fn apply(pipeline: &Pipeline, op: EditOp) -> Result<Pipeline, EditError> {
    match op {
        EditOp::InsertBetween { after, step } => insert_between(pipeline, after, step),
        EditOp::AppendAfter {
            after,
            step,
            position,
        } => append_after(pipeline, after, step, position),
        EditOp::Delete { id } => delete_step(pipeline, id),
        EditOp::Replace { target, step } => replace_step(pipeline, target, step),
        EditOp::ReplaceAt { target, step, path } => replace_step_at(pipeline, target, step, &path),
        EditOp::AppendToBranch { branch, step } => append_to_branch(pipeline, branch, step),
        EditOp::UpdateParameters { id, parameters } => update_parameters(pipeline, id, parameters),
    }
}

/// Splices `step` immediately after `after`, in whichever sequence `after` lives.
pub fn insert_between(pipeline: &Pipeline, after: StepId, step: Step) -> Result<Pipeline, EditError> {
    let outcome = (|| {
        ensure_fresh(pipeline, &step, None)?;
        let path = locate(pipeline, after)?;
        let at = position_of(&path)? + 1;
        let container = path.container();
        let in_branch = container.is_nested();

        edit_sequence(pipeline, &container, |sequence| {
            guard_end(sequence, &step, None)?;
            can_occupy(&step, &SlotContext::insertion(sequence, at, in_branch)).into_result()?;
            let mut out = sequence.to_vec();
            out.insert(at, Node::from(step));
            Ok(out)
        })
    })();
    log_outcome("insert_between", after, outcome)
}

/// Appends `step` after `after`, which must be the last entry of its sequence.
/// When `after` is the only entry and a placeholder, `step` takes its place.
///
/// With [`AppendPosition::End`] an END step already present in the sequence
/// is an [`EditError::EndConflict`]: it has to be removed first.
pub fn append_after(
    pipeline: &Pipeline,
    after: StepId,
    step: Step,
    position: AppendPosition,
) -> Result<Pipeline, EditError> {
    let outcome = (|| {
        ensure_fresh(pipeline, &step, None)?;
        let path = locate(pipeline, after)?;
        let index = position_of(&path)?;
        let container = path.container();
        let in_branch = container.is_nested();

        edit_sequence(pipeline, &container, |sequence| {
            if is_lone_slot(sequence) {
                return fill_lone_slot(&step, in_branch).map(|()| vec![Node::from(step)]);
            }
            if index + 1 != sequence.len() {
                return Err(EditError::IncompatibleStep(Rejection::new(
                    "Add Step Unsuccessful",
                    "Steps can only be appended after the last step of a sequence; insert it instead",
                )));
            }
            if position == AppendPosition::End {
                if let Some(existing) = find_role(sequence, RoleClass::End, None) {
                    return Err(EditError::EndConflict {
                        reason: format!(
                            "The sequence already ends with '{}'; remove it before appending a new end step",
                            existing.name
                        ),
                    });
                }
            }
            guard_end(sequence, &step, None)?;
            let at = sequence.len();
            can_occupy(&step, &SlotContext::insertion(sequence, at, in_branch)).into_result()?;
            let mut out = sequence.to_vec();
            out.push(Node::from(step));
            Ok(out)
        })
    })();
    log_outcome("append_after", after, outcome)
}

/// Removes the step or slot `id` from its sequence.
///
/// When the two entries that become adjacent do not accept each other, or
/// the sequence would be left empty, a placeholder slot takes the removed
/// position. Removing a slot that is holding such a gap open, or that is the
/// last entry of its sequence, is rejected.
pub fn delete_step(pipeline: &Pipeline, id: StepId) -> Result<Pipeline, EditError> {
    let outcome = (|| {
        let path = locate(pipeline, id)?;
        let index = position_of(&path)?;
        let container = path.container();
        let in_branch = container.is_nested();

        edit_sequence(pipeline, &container, |sequence| {
            let mut out = sequence.to_vec();
            let removed = out.remove(index);
            if out.is_empty() || !gap_is_compatible(&out, index, in_branch) {
                match removed {
                    Node::Slot(_) if out.is_empty() => {
                        return Err(EditError::IncompatibleStep(Rejection::new(
                            "Delete Step Unsuccessful",
                            "An empty sequence keeps its placeholder; drop a step on it instead",
                        )));
                    }
                    Node::Slot(_) => {
                        return Err(EditError::IncompatibleStep(Rejection::new(
                            "Delete Step Unsuccessful",
                            "This placeholder keeps incompatible steps apart; fill it instead of removing it",
                        )));
                    }
                    Node::Step(_) => {
                        let slot = Slot::new();
                        tracing::debug!(slot = %slot.id(), "placeholder inserted for removed step");
                        out.insert(index, Node::Slot(slot));
                    }
                }
            }
            Ok(out)
        })
    })();
    log_outcome("delete_step", id, outcome)
}

/// Substitutes the entry `target` with `step`, keeping its position.
///
/// A slot target means filling the placeholder. `step` may re-hydrate the
/// identity of the entry it replaces.
pub fn replace_step(pipeline: &Pipeline, target: StepId, step: Step) -> Result<Pipeline, EditError> {
    let outcome = locate(pipeline, target).and_then(|path| replace_at(pipeline, &path, step));
    log_outcome("replace_step", target, outcome)
}

/// Branch-aware overload of [`replace_step`]: the caller supplies the path it
/// holds for `target`. A path that no longer leads to `target` is `NotFound`.
pub fn replace_step_at(
    pipeline: &Pipeline,
    target: StepId,
    step: Step,
    path: &Path,
) -> Result<Pipeline, EditError> {
    let outcome = match pipeline.node_at(path) {
        Some(node) if node.id() == target => replace_at(pipeline, path, step),
        _ => Err(EditError::NotFound {
            identity: format!("{} at {}", target, path),
        }),
    };
    log_outcome("replace_step_at", target, outcome)
}

/// Appends `step` to the end of the branch `branch`. A branch holding only its
/// placeholder has the placeholder replaced.
pub fn append_to_branch(
    pipeline: &Pipeline,
    branch: BranchId,
    step: Step,
) -> Result<Pipeline, EditError> {
    let outcome = (|| {
        ensure_fresh(pipeline, &step, None)?;
        let container = locate_branch(pipeline, branch)?;

        edit_sequence(pipeline, &container, |sequence| {
            if is_lone_slot(sequence) {
                return fill_lone_slot(&step, true).map(|()| vec![Node::from(step)]);
            }
            guard_end(sequence, &step, None)?;
            let at = sequence.len();
            can_occupy(&step, &SlotContext::insertion(sequence, at, true)).into_result()?;
            let mut out = sequence.to_vec();
            out.push(Node::from(step));
            Ok(out)
        })
    })();
    match &outcome {
        Ok(_) => tracing::debug!(branch = %branch, "append_to_branch applied"),
        Err(err) => tracing::warn!(branch = %branch, error = %err, "append_to_branch rejected"),
    }
    outcome
}

/// Creates an empty branch on the branch-capable step `owner`.
pub fn add_branch(pipeline: &Pipeline, owner: StepId) -> Result<(Pipeline, BranchId), EditError> {
    let mut created = None;
    let outcome = with_step(pipeline, owner, "Add Branch Unsuccessful", |step| {
        if !step.supports_branches {
            return Err(EditError::IncompatibleStep(Rejection::new(
                "Add Branch Unsuccessful",
                format!("'{}' does not support branches", step.name),
            )));
        }
        let branch = Branch::new(step.id());
        created = Some(branch.id());
        let mut updated = step.clone();
        updated.branches.push(branch);
        Ok(updated)
    });
    let outcome = outcome.and_then(|pipeline| {
        created
            .map(|id| (pipeline, id))
            .ok_or_else(|| EditError::not_found(owner))
    });
    log_outcome("add_branch", owner, outcome)
}

/// Replaces the parameters of step `id` wholesale.
pub fn update_parameters(
    pipeline: &Pipeline,
    id: StepId,
    parameters: Parameters,
) -> Result<Pipeline, EditError> {
    let outcome = with_step(pipeline, id, "Configure Step Unsuccessful", |step| {
        Ok(step.clone().with_parameters(parameters))
    });
    log_outcome("update_parameters", id, outcome)
}

fn replace_at(pipeline: &Pipeline, path: &Path, step: Step) -> Result<Pipeline, EditError> {
    let index = position_of(path)?;
    let existing = pipeline
        .node_at(path)
        .ok_or_else(|| EditError::not_found(path))?;
    ensure_fresh(pipeline, &step, Some(existing))?;
    let container = path.container();
    let in_branch = container.is_nested();

    edit_sequence(pipeline, &container, |sequence| {
        guard_end(sequence, &step, Some(index))?;
        can_occupy(&step, &SlotContext::occupying(sequence, index, in_branch)).into_result()?;
        let mut out = sequence.to_vec();
        out[index] = Node::from(step);
        Ok(out)
    })
}

/// Rewrites the step `id` in place through `update`. Slots are rejected.
fn with_step<F>(pipeline: &Pipeline, id: StepId, title: &str, update: F) -> Result<Pipeline, EditError>
where
    F: FnOnce(&Step) -> Result<Step, EditError>,
{
    let path = locate(pipeline, id)?;
    let index = position_of(&path)?;
    edit_sequence(pipeline, &path.container(), |sequence| {
        let Some(Node::Step(step)) = sequence.get(index) else {
            return Err(EditError::IncompatibleStep(Rejection::new(
                title,
                "A placeholder has no step to change; fill it first",
            )));
        };
        let updated = update(step.as_ref())?;
        let mut out = sequence.to_vec();
        out[index] = Node::from(updated);
        Ok(out)
    })
}

/// Checks `step` as the sole entry of a sequence.
fn fill_lone_slot(step: &Step, in_branch: bool) -> Result<(), EditError> {
    can_occupy(step, &SlotContext::insertion(&[], 0, in_branch)).into_result()
}

fn position_of(path: &Path) -> Result<usize, EditError> {
    path.index().ok_or_else(|| EditError::not_found(path))
}

/// Rejects a second END step in a sequence. `skip` excludes the entry being replaced.
fn guard_end(sequence: &[Node], step: &Step, skip: Option<usize>) -> Result<(), EditError> {
    if step.role != RoleClass::End {
        return Ok(());
    }
    match find_role(sequence, RoleClass::End, skip) {
        Some(existing) => Err(EditError::EndConflict {
            reason: format!(
                "'{}' already ends this sequence; remove it before adding '{}'",
                existing.name, step.name
            ),
        }),
        None => Ok(()),
    }
}

fn find_role(sequence: &[Node], role: RoleClass, skip: Option<usize>) -> Option<&Step> {
    sequence
        .iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != skip)
        .filter_map(|(_, node)| node.as_step())
        .find(|step| step.role == role)
}

/// Rejects incoming identities already used by the pipeline. Identities of
/// `reusable` (the entry being replaced) may be re-hydrated.
fn ensure_fresh(pipeline: &Pipeline, step: &Step, reusable: Option<&Node>) -> Result<(), EditError> {
    let mut taken = AHashSet::new();
    collect_ids(pipeline.steps(), &mut taken);
    if let Some(node) = reusable {
        let mut own = AHashSet::new();
        collect_ids(std::slice::from_ref(node), &mut own);
        taken.retain(|id| !own.contains(id));
    }

    let mut incoming = Vec::new();
    collect_step_ids(step, &mut incoming);
    let mut seen = AHashSet::new();
    for id in incoming {
        if taken.contains(&id) || !seen.insert(id) {
            return Err(EditError::DuplicateIdentity {
                identity: id.to_string(),
            });
        }
    }
    Ok(())
}

fn collect_ids(nodes: &[Node], out: &mut AHashSet<Uuid>) {
    for node in nodes {
        out.insert(*node.id().as_uuid());
        if let Node::Step(step) = node {
            for branch in step.branches() {
                out.insert(*branch.id().as_uuid());
                collect_ids(branch.steps(), out);
            }
        }
    }
}

fn collect_step_ids(step: &Step, out: &mut Vec<Uuid>) {
    out.push(*step.id().as_uuid());
    for branch in step.branches() {
        out.push(*branch.id().as_uuid());
        for node in branch.steps() {
            match node {
                Node::Step(child) => collect_step_ids(child, out),
                Node::Slot(slot) => out.push(*slot.id().as_uuid()),
            }
        }
    }
}

fn log_outcome<T>(op: &'static str, target: StepId, outcome: Result<T, EditError>) -> Result<T, EditError> {
    match &outcome {
        Ok(_) => tracing::debug!(op, step = %target, "edit applied"),
        Err(err) => tracing::warn!(op, step = %target, error = %err, "edit rejected"),
    }
    outcome
}
