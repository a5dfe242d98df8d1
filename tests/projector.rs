//! Tests for the flat render view.
mod common;
use common::*;
use stepgraph::prelude::*;
use stepgraph::projector::DEFAULT_SLOT_LABEL;

fn labels(view: &FlatView<'_>) -> Vec<String> {
    view.iter()
        .map(|node| match node {
            RenderNode::Occupied { step, .. } => step.name.clone(),
            RenderNode::Slot { label, .. } => label.to_string(),
        })
        .collect()
}

#[test]
fn test_preorder_with_branches() {
    let pipeline = branched();
    let view = project(&pipeline);
    assert_eq!(
        labels(&view),
        vec![
            "timer-source",
            "choice",
            "filter",
            "set-body",
            "aggregate",
            "log-sink"
        ]
    );
}

#[test]
fn test_view_is_restartable() {
    let pipeline = branched();
    let view = project(&pipeline);
    let first: Vec<StepId> = view.iter().map(|node| node.id()).collect();
    let second: Vec<StepId> = (&view).into_iter().map(|node| node.id()).collect();
    assert_eq!(first, second);
    assert_eq!(first.len(), 6);
}

#[test]
fn test_branch_context_and_last_flags() {
    let pipeline = branched();
    let choice = pipeline.find_by_name("choice").unwrap();
    let nodes: Vec<RenderNode<'_>> = project(&pipeline).iter().collect();

    assert!(nodes[0].branch().is_none());
    let filter_ctx = nodes[2].branch().unwrap();
    assert_eq!(filter_ctx.owner, choice.id());
    assert_eq!(filter_ctx.branch, choice.branches()[0].id());
    assert_eq!(filter_ctx.depth, 1);
    assert_eq!(nodes[4].branch().unwrap().branch, choice.branches()[1].id());

    let last_flags: Vec<bool> = nodes
        .iter()
        .map(|node| match node {
            RenderNode::Occupied { is_last, .. } => *is_last,
            RenderNode::Slot { .. } => false,
        })
        .collect();
    assert_eq!(last_flags, vec![false, false, false, true, true, true]);
}

#[test]
fn test_nested_depth() {
    let inner = choice().with_branch(vec![filter()]);
    let outer = choice().with_branch(vec![inner]);
    let pipeline = Pipeline::new(vec![timer(), outer, log()]).unwrap();
    let filter = project(&pipeline)
        .iter()
        .find(|node| node.id() == id_of(&pipeline, "filter"))
        .unwrap();
    assert_eq!(filter.branch().unwrap().depth, 2);
}

#[test]
fn test_slots_are_labelled() {
    let pipeline = timer_log();
    let with_slot = delete_step(&pipeline, id_of(&pipeline, "timer-source")).unwrap();

    let view = project(&with_slot);
    assert_eq!(labels(&view), vec![DEFAULT_SLOT_LABEL, "log-sink"]);
    assert!(view.iter().next().unwrap().is_slot());

    let custom = project(&with_slot).with_slot_label("DROP HERE");
    assert_eq!(labels(&custom), vec!["DROP HERE", "log-sink"]);
}

#[test]
fn test_edges() {
    let pipeline = branched();
    let choice = pipeline.find_by_name("choice").unwrap();
    let edges = project(&pipeline).edges();

    // timer->choice, choice->log, choice->filter, filter->set-body, choice->aggregate
    assert_eq!(edges.len(), 5);
    assert!(edges.contains(&RenderEdge {
        source: id_of(&pipeline, "timer-source"),
        target: choice.id(),
        branch: None,
    }));
    assert!(edges.contains(&RenderEdge {
        source: choice.id(),
        target: id_of(&pipeline, "filter"),
        branch: Some(choice.branches()[0].id()),
    }));
    assert!(edges.contains(&RenderEdge {
        source: id_of(&pipeline, "filter"),
        target: id_of(&pipeline, "set-body"),
        branch: Some(choice.branches()[0].id()),
    }));
}

#[test]
fn test_empty_pipeline_projects_a_placeholder() {
    let pipeline = Pipeline::empty();
    let view = project(&pipeline);
    assert_eq!(labels(&view), vec![DEFAULT_SLOT_LABEL]);
    assert!(view.edges().is_empty());

    let source = timer_log();
    let emptied = delete_step(&source, id_of(&source, "log-sink")).unwrap();
    let emptied = delete_step(&emptied, id_of(&emptied, "timer-source")).unwrap();
    assert_eq!(labels(&project(&emptied)), vec![DEFAULT_SLOT_LABEL]);
}

#[test]
fn test_empty_branch_projects_a_placeholder() {
    let pipeline = Pipeline::new(vec![timer(), choice(), log()]).unwrap();
    let (with_branch, branch) = add_branch(&pipeline, id_of(&pipeline, "choice")).unwrap();
    let nodes: Vec<RenderNode<'_>> = project(&with_branch).iter().collect();
    assert_eq!(nodes.len(), 4);
    assert!(nodes[2].is_slot());
    assert_eq!(nodes[2].branch().unwrap().branch, branch);
}
