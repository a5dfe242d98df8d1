use super::step::{same_sequence_content, with_placeholder, Node, RoleClass, Step, StepId};
use crate::error::{EditError, Rejection};
use ahash::AHashSet;

/// The root ordered sequence of steps plus all nested branches.
///
/// A `Pipeline` is a value: once built it never changes. Cloning is cheap
/// because steps are shared behind `Arc`s. A sequence is never empty: with no
/// steps it holds a single placeholder slot to drop the first step on.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    steps: Vec<Node>,
}

impl Pipeline {
    /// Builds a pipeline from top-level steps and checks its invariants.
    pub fn new(steps: Vec<Step>) -> Result<Self, EditError> {
        let pipeline = Self::from_nodes(steps.into_iter().map(Node::from).collect());
        pipeline.check()?;
        Ok(pipeline)
    }

    /// A pipeline holding only a placeholder slot.
    pub fn empty() -> Self {
        Self::from_nodes(Vec::new())
    }

    pub(crate) fn from_nodes(steps: Vec<Node>) -> Self {
        Self {
            steps: with_placeholder(steps),
        }
    }

    /// Top-level entries, including placeholder slots.
    pub fn steps(&self) -> &[Node] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the root holds placeholders only.
    pub fn is_empty(&self) -> bool {
        self.steps.iter().all(Node::is_slot)
    }

    /// Every step of the tree in depth-first declaration order.
    pub fn all_steps(&self) -> Vec<&Step> {
        let mut out = Vec::new();
        collect_steps(&self.steps, &mut out);
        out
    }

    /// Whether a step or slot anywhere in the tree carries this identity.
    pub fn contains(&self, id: StepId) -> bool {
        crate::path::locate(self, id).is_ok()
    }

    /// First step with the given name, depth-first.
    pub fn find_by_name(&self, name: &str) -> Option<&Step> {
        self.all_steps().into_iter().find(|step| step.name == name)
    }

    /// Number of placeholder slots anywhere in the tree.
    pub fn slot_count(&self) -> usize {
        fn count(nodes: &[Node]) -> usize {
            nodes
                .iter()
                .map(|node| match node {
                    Node::Slot(_) => 1,
                    Node::Step(step) => step.branches().iter().map(|b| count(b.steps())).sum(),
                })
                .sum()
        }
        count(&self.steps)
    }

    /// Compares step order, roles, descriptive fields and parameters,
    /// ignoring identities and placeholder slots.
    pub fn same_structure(&self, other: &Pipeline) -> bool {
        same_sequence_content(&self.steps, &other.steps)
    }

    /// Verifies the structural invariants: unique identities, START/END
    /// positions per sequence, and consistent branch ownership.
    pub fn check(&self) -> Result<(), EditError> {
        let mut seen = AHashSet::new();
        check_sequence(&self.steps, &mut seen)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::empty()
    }
}

fn collect_steps<'a>(nodes: &'a [Node], out: &mut Vec<&'a Step>) {
    for node in nodes {
        if let Node::Step(step) = node {
            out.push(step);
            for branch in step.branches() {
                collect_steps(branch.steps(), out);
            }
        }
    }
}

fn invalid(reason: String) -> EditError {
    EditError::IncompatibleStep(Rejection::new("Invalid Pipeline", reason))
}

fn check_sequence(nodes: &[Node], seen: &mut AHashSet<uuid::Uuid>) -> Result<(), EditError> {
    let last = nodes.len().saturating_sub(1);
    let mut starts = 0;
    let mut ends = 0;

    for (index, node) in nodes.iter().enumerate() {
        if !seen.insert(*node.id().as_uuid()) {
            return Err(EditError::DuplicateIdentity {
                identity: node.id().to_string(),
            });
        }
        let Node::Step(step) = node else {
            continue;
        };

        match step.role {
            RoleClass::Start => {
                starts += 1;
                if index != 0 || starts > 1 {
                    return Err(invalid(format!(
                        "START step '{}' must be the first step of its sequence",
                        step.name
                    )));
                }
            }
            RoleClass::End => {
                ends += 1;
                if index != last || ends > 1 {
                    return Err(invalid(format!(
                        "END step '{}' must be the last step of its sequence",
                        step.name
                    )));
                }
            }
            RoleClass::Middle => {}
        }

        if !step.branches().is_empty() && !step.supports_branches {
            return Err(invalid(format!(
                "step '{}' declares branches but does not support them",
                step.name
            )));
        }

        for branch in step.branches() {
            if branch.owner() != step.id() {
                return Err(invalid(format!(
                    "branch '{}' is not owned by its containing step '{}'",
                    branch.id(),
                    step.name
                )));
            }
            if !seen.insert(*branch.id().as_uuid()) {
                return Err(EditError::DuplicateIdentity {
                    identity: branch.id().to_string(),
                });
            }
            check_sequence(branch.steps(), seen)?;
        }
    }
    Ok(())
}
