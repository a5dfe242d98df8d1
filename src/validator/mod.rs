//! Compatibility checks deciding whether a step may occupy a position.

use crate::error::{EditError, Rejection};
use crate::model::{Adjacent, Connections, RoleClass, Step};

mod context;

pub use context::{Neighbor, SlotContext};
pub(crate) use context::gap_is_compatible;

const ADD_TITLE: &str = "Add Step Unsuccessful";
const REPLACE_TITLE: &str = "Replace Step Unsuccessful";

/// Outcome of a compatibility check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Invalid(Rejection),
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid)
    }

    /// Converts a rejection into [`EditError::IncompatibleStep`].
    pub fn into_result(self) -> Result<(), EditError> {
        match self {
            Verdict::Valid => Ok(()),
            Verdict::Invalid(rejection) => Err(EditError::IncompatibleStep(rejection)),
        }
    }
}

/// Decides whether `candidate` may occupy the position described by `ctx`.
///
/// Pure and deterministic: the same inputs always give the same verdict.
pub fn can_occupy(candidate: &Step, ctx: &SlotContext) -> Verdict {
    let title = if ctx.replacing.is_some() {
        REPLACE_TITLE
    } else {
        ADD_TITLE
    };
    let reject = |reason: String| Verdict::Invalid(Rejection::new(title, reason));
    let label = display_name(candidate);

    if let Some(existing) = ctx.replacing {
        if existing != candidate.role {
            return reject(format!(
                "Please select a {} step: '{}' is a {} step and cannot replace a {} step",
                existing, label, candidate.role, existing
            ));
        }
    }

    match candidate.role {
        RoleClass::Start => {
            if !ctx.is_first {
                return reject(format!(
                    "'{}' is a START step and can only be placed at the beginning of a sequence",
                    label
                ));
            }
            if ctx.sequence_has_start {
                return reject("This sequence already begins with a START step".to_string());
            }
        }
        RoleClass::End => {
            if !ctx.is_last || ctx.next != Neighbor::Nothing {
                return reject(format!(
                    "'{}' is an END step and can only be placed at the end of a sequence",
                    label
                ));
            }
            if ctx.sequence_has_end {
                return reject("This sequence already ends with an END step".to_string());
            }
        }
        RoleClass::Middle => {
            if ctx.previous == Neighbor::Origin {
                return reject(format!(
                    "'{}' is a MIDDLE step and cannot be first in a sequence unless a START step precedes it",
                    label
                ));
            }
        }
    }

    let own = candidate.connections();
    let role = Adjacent::from(candidate.role);

    if let Some(before) = ctx.previous.adjacent() {
        if !own.accepts_before(before) {
            return reject(format!("'{}' cannot follow {}", label, describe(&ctx.previous)));
        }
    }
    if let Neighbor::Step { accepts, .. } = &ctx.previous {
        if !accepts.accepts_after(role) {
            return reject(format!(
                "{} does not accept '{}' after it",
                describe(&ctx.previous),
                label
            ));
        }
    }

    if let Some(after) = ctx.next.adjacent() {
        if !own.accepts_after(after) {
            return reject(format!("'{}' cannot precede {}", label, describe(&ctx.next)));
        }
    }
    if let Neighbor::Step { accepts, .. } = &ctx.next {
        if !accepts.accepts_before(role) {
            return reject(format!(
                "{} does not accept '{}' before it",
                describe(&ctx.next),
                label
            ));
        }
    }

    Verdict::Valid
}

/// Roles the catalog may offer for a step appended after `step`.
pub fn appendable_roles(step: &Step) -> Vec<RoleClass> {
    let accepts: Connections = step.connections();
    [RoleClass::Start, RoleClass::Middle, RoleClass::End]
        .into_iter()
        .filter(|role| accepts.accepts_after(Adjacent::from(*role)))
        .collect()
}

pub fn is_start_step(step: &Step) -> bool {
    step.role == RoleClass::Start
}

pub fn is_end_step(step: &Step) -> bool {
    step.role == RoleClass::End
}

fn display_name(step: &Step) -> &str {
    step.title.as_deref().unwrap_or(&step.name)
}

fn describe(neighbor: &Neighbor) -> String {
    match neighbor {
        Neighbor::Origin => "the start of the pipeline".to_string(),
        Neighbor::BranchEntry => "the start of a branch".to_string(),
        Neighbor::Step { role, .. } => format!("a {} step", role),
        Neighbor::Unknown => "a placeholder".to_string(),
        Neighbor::Nothing => "the end of the sequence".to_string(),
    }
}
