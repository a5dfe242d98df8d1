//! Path resolution over the nested pipeline tree.
//!
//! A [`Path`] addresses a step, slot, branch or sequence by walking
//! `steps[i] → branches[j] → steps[k] → …` from the pipeline root. It replaces
//! string-keyed deep get/set with a typed address the engine can rebuild along.

use crate::error::EditError;
use crate::model::{Branch, BranchId, Node, Pipeline, StepId};
use std::fmt;

/// One hop of a [`Path`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Index into a step sequence (root or branch).
    Step(usize),
    /// Index into the branches of the step addressed by the previous hop.
    Branch(usize),
}

/// An ordered address from the pipeline root down to a node, branch or sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    /// The root sequence.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Index of the addressed node inside its sequence, if the path ends on a step.
    pub fn index(&self) -> Option<usize> {
        match self.segments.last() {
            Some(Segment::Step(i)) => Some(*i),
            _ => None,
        }
    }

    /// Path of the sequence containing the addressed node. A path that
    /// already addresses a sequence (root or branch) is returned unchanged.
    pub fn container(&self) -> Path {
        match self.segments.last() {
            Some(Segment::Step(_)) => Path {
                segments: self.segments[..self.segments.len() - 1].to_vec(),
            },
            _ => self.clone(),
        }
    }

    /// Number of branches between the root and the addressed node.
    pub fn depth(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Branch(_)))
            .count()
    }

    pub fn is_nested(&self) -> bool {
        self.depth() > 0
    }

    pub fn targets_branch(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::Branch(_)))
    }

    pub fn child_step(&self, index: usize) -> Path {
        let mut segments = self.segments.clone();
        segments.push(Segment::Step(index));
        Path { segments }
    }

    pub fn child_branch(&self, index: usize) -> Path {
        let mut segments = self.segments.clone();
        segments.push(Segment::Branch(index));
        Path { segments }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "steps");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            match segment {
                Segment::Step(idx) => write!(f, "steps[{}]", idx)?,
                Segment::Branch(idx) => write!(f, "branches[{}]", idx)?,
            }
        }
        Ok(())
    }
}

/// Locates the step or slot carrying `id`.
///
/// Traversal is depth-first over steps, then branches, in declaration order.
/// `NotFound` means the step was deleted or never existed; callers are
/// expected to refresh their view.
pub fn locate(pipeline: &Pipeline, id: StepId) -> Result<Path, EditError> {
    let mut trail = Vec::new();
    if search(pipeline.steps(), &Target::Node(id), &mut trail) {
        Ok(Path::from_segments(trail))
    } else {
        tracing::debug!(step = %id, "identity does not resolve");
        Err(EditError::not_found(id))
    }
}

/// Locates a branch. The returned path ends with a [`Segment::Branch`].
pub fn locate_branch(pipeline: &Pipeline, id: BranchId) -> Result<Path, EditError> {
    let mut trail = Vec::new();
    if search(pipeline.steps(), &Target::Branch(id), &mut trail) {
        Ok(Path::from_segments(trail))
    } else {
        tracing::debug!(branch = %id, "branch identity does not resolve");
        Err(EditError::not_found(id))
    }
}

/// Returns the path of the step owning `branch` and the branch's index in it.
pub fn resolve_branch_owner(
    pipeline: &Pipeline,
    branch: BranchId,
) -> Result<(Path, usize), EditError> {
    let path = locate_branch(pipeline, branch)?;
    let mut segments = path.segments;
    match segments.pop() {
        Some(Segment::Branch(index)) => Ok((Path::from_segments(segments), index)),
        _ => Err(EditError::not_found(branch)),
    }
}

enum Target {
    Node(StepId),
    Branch(BranchId),
}

fn search(nodes: &[Node], target: &Target, trail: &mut Vec<Segment>) -> bool {
    for (index, node) in nodes.iter().enumerate() {
        trail.push(Segment::Step(index));
        if let Target::Node(id) = target {
            if node.id() == *id {
                return true;
            }
        }
        if let Node::Step(step) = node {
            for (branch_index, branch) in step.branches().iter().enumerate() {
                trail.push(Segment::Branch(branch_index));
                if let Target::Branch(id) = target {
                    if branch.id() == *id {
                        return true;
                    }
                }
                if search(branch.steps(), target, trail) {
                    return true;
                }
                trail.pop();
            }
        }
        trail.pop();
    }
    false
}

impl Pipeline {
    /// The node addressed by a path ending on a step.
    pub fn node_at(&self, path: &Path) -> Option<&Node> {
        let index = path.index()?;
        self.sequence_at(&path.container())?.get(index)
    }

    /// The branch addressed by a path ending on a branch.
    pub fn branch_at(&self, path: &Path) -> Option<&Branch> {
        let (last, owner) = path.segments().split_last()?;
        let Segment::Branch(branch_index) = last else {
            return None;
        };
        let owner = self.node_at(&Path::from_segments(owner.to_vec()))?;
        owner.as_step()?.branches().get(*branch_index)
    }

    /// The sequence addressed by a path that is empty (root) or ends on a branch.
    pub fn sequence_at(&self, path: &Path) -> Option<&[Node]> {
        if path.segments().is_empty() {
            return Some(self.steps());
        }
        self.branch_at(path).map(Branch::steps)
    }
}

/// A step living inside a branch, indexed for nested edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedStep {
    pub step: StepId,
    /// Top-level ancestor of the step.
    pub root_step: StepId,
    /// Branch that directly contains the step.
    pub branch: BranchId,
    pub path: Path,
}

/// Indexes every step (and slot) that lives inside a branch.
pub fn nested_steps(pipeline: &Pipeline) -> Vec<NestedStep> {
    let mut out = Vec::new();
    for (index, node) in pipeline.steps().iter().enumerate() {
        if let Node::Step(step) = node {
            collect_nested(step.id(), step.branches(), &Path::root().child_step(index), &mut out);
        }
    }
    out
}

fn collect_nested(root: StepId, branches: &[Branch], owner_path: &Path, out: &mut Vec<NestedStep>) {
    for (branch_index, branch) in branches.iter().enumerate() {
        let branch_path = owner_path.child_branch(branch_index);
        for (index, node) in branch.steps().iter().enumerate() {
            let path = branch_path.child_step(index);
            out.push(NestedStep {
                step: node.id(),
                root_step: root,
                branch: branch.id(),
                path: path.clone(),
            });
            if let Node::Step(step) = node {
                collect_nested(root, step.branches(), &path, out);
            }
        }
    }
}
