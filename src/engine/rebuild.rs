use crate::error::EditError;
use crate::model::{Node, Pipeline, Step};
use crate::path::{Path, Segment};
use std::sync::Arc;

/// Applies `edit` to the sequence addressed by `container` and returns a new
/// pipeline.
///
/// Every step on the way from the root down to the edited sequence is copied
/// and re-wrapped; sibling entries are shared with the input through their
/// `Arc`s. The input pipeline is never touched, so an `Err` from `edit`
/// leaves the caller with the original value.
pub(crate) fn edit_sequence<F>(
    pipeline: &Pipeline,
    container: &Path,
    edit: F,
) -> Result<Pipeline, EditError>
where
    F: FnOnce(&[Node]) -> Result<Vec<Node>, EditError>,
{
    let steps = rebuild(pipeline.steps(), container.segments(), edit)?;
    Ok(Pipeline::from_nodes(steps))
}

fn rebuild<F>(nodes: &[Node], path: &[Segment], edit: F) -> Result<Vec<Node>, EditError>
where
    F: FnOnce(&[Node]) -> Result<Vec<Node>, EditError>,
{
    match path {
        [] => edit(nodes),
        [Segment::Step(index), Segment::Branch(branch), rest @ ..] => {
            let Some(Node::Step(owner)) = nodes.get(*index) else {
                return Err(EditError::not_found(Path::from_segments(path.to_vec())));
            };
            let Some(current) = owner.branches().get(*branch) else {
                return Err(EditError::not_found(Path::from_segments(path.to_vec())));
            };

            let rebuilt = rebuild(current.steps(), rest, edit)?;
            let mut new_owner = Step::clone(owner);
            new_owner.branches[*branch].steps = rebuilt;

            let mut out = nodes.to_vec();
            out[*index] = Node::Step(Arc::new(new_owner));
            Ok(out)
        }
        _ => Err(EditError::not_found(Path::from_segments(path.to_vec()))),
    }
}
