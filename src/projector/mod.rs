//! Render-ready projection of a pipeline.
//!
//! [`project`] flattens the nested tree into a preorder sequence of
//! [`RenderNode`]s: each step is followed by the nodes of its branches, and
//! every nested node carries the [`BranchContext`] it belongs to. The view is
//! lazy and borrows the pipeline; iterating it twice yields the same sequence.

use crate::model::{BranchId, Node, Pipeline, Step, StepId};
use itertools::Itertools;

/// Label shown on placeholder slots unless overridden.
pub const DEFAULT_SLOT_LABEL: &str = "ADD A STEP";

/// Where a nested node sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchContext {
    pub branch: BranchId,
    /// Step declaring the branch.
    pub owner: StepId,
    /// 1 for a branch of a root step, 2 for a branch inside that branch, and so on.
    pub depth: usize,
}

/// One renderable entry.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderNode<'a> {
    Occupied {
        step: &'a Step,
        /// Last entry of its own sequence.
        is_last: bool,
        branch: Option<BranchContext>,
    },
    Slot {
        id: StepId,
        label: &'a str,
        branch: Option<BranchContext>,
    },
}

impl RenderNode<'_> {
    pub fn id(&self) -> StepId {
        match self {
            RenderNode::Occupied { step, .. } => step.id(),
            RenderNode::Slot { id, .. } => *id,
        }
    }

    pub fn branch(&self) -> Option<BranchContext> {
        match self {
            RenderNode::Occupied { branch, .. } | RenderNode::Slot { branch, .. } => *branch,
        }
    }

    pub fn is_slot(&self) -> bool {
        matches!(self, RenderNode::Slot { .. })
    }
}

/// A connection between two rendered nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderEdge {
    pub source: StepId,
    pub target: StepId,
    /// Branch the target lives in, `None` on the root sequence.
    pub branch: Option<BranchId>,
}

/// A restartable, read-only view over a pipeline.
#[derive(Debug, Clone, Copy)]
pub struct FlatView<'a> {
    pipeline: &'a Pipeline,
    slot_label: &'a str,
}

/// Projects `pipeline` with the default slot label.
pub fn project(pipeline: &Pipeline) -> FlatView<'_> {
    FlatView {
        pipeline,
        slot_label: DEFAULT_SLOT_LABEL,
    }
}

impl<'a> FlatView<'a> {
    pub fn with_slot_label(mut self, label: &'a str) -> Self {
        self.slot_label = label;
        self
    }

    pub fn iter(&self) -> FlatIter<'a> {
        FlatIter {
            stack: vec![Frame {
                nodes: self.pipeline.steps(),
                index: 0,
                branch: None,
            }],
            slot_label: self.slot_label,
        }
    }

    /// Edges between consecutive entries of each sequence, plus one edge from
    /// every branch owner to the first entry of each of its branches.
    pub fn edges(&self) -> Vec<RenderEdge> {
        let mut out = Vec::new();
        collect_edges(self.pipeline.steps(), None, &mut out);
        out
    }
}

impl<'a> IntoIterator for &FlatView<'a> {
    type Item = RenderNode<'a>;
    type IntoIter = FlatIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

struct Frame<'a> {
    nodes: &'a [Node],
    index: usize,
    branch: Option<BranchContext>,
}

/// Preorder iterator produced by [`FlatView::iter`].
pub struct FlatIter<'a> {
    stack: Vec<Frame<'a>>,
    slot_label: &'a str,
}

impl<'a> Iterator for FlatIter<'a> {
    type Item = RenderNode<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = self.stack.last_mut()?;
            let nodes = frame.nodes;
            let Some(node) = nodes.get(frame.index) else {
                self.stack.pop();
                continue;
            };
            frame.index += 1;
            let branch = frame.branch;
            let is_last = frame.index == nodes.len();

            return Some(match node {
                Node::Step(step) => {
                    let depth = branch.map_or(1, |ctx| ctx.depth + 1);
                    // Reverse so the first branch is visited first.
                    for nested in step.branches().iter().rev() {
                        self.stack.push(Frame {
                            nodes: nested.steps(),
                            index: 0,
                            branch: Some(BranchContext {
                                branch: nested.id(),
                                owner: step.id(),
                                depth,
                            }),
                        });
                    }
                    RenderNode::Occupied {
                        step: step.as_ref(),
                        is_last,
                        branch,
                    }
                }
                Node::Slot(slot) => RenderNode::Slot {
                    id: slot.id(),
                    label: self.slot_label,
                    branch,
                },
            });
        }
    }
}

fn collect_edges(nodes: &[Node], branch: Option<BranchId>, out: &mut Vec<RenderEdge>) {
    out.extend(
        nodes
            .iter()
            .map(Node::id)
            .tuple_windows()
            .map(|(source, target)| RenderEdge {
                source,
                target,
                branch,
            }),
    );

    for step in nodes.iter().filter_map(Node::as_step) {
        for nested in step.branches() {
            if let Some(first) = nested.steps().first() {
                out.push(RenderEdge {
                    source: step.id(),
                    target: first.id(),
                    branch: Some(nested.id()),
                });
            }
            collect_edges(nested.steps(), Some(nested.id()), out);
        }
    }
}
