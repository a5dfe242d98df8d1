//! Tests for identity resolution over nested pipelines.
mod common;
use common::*;
use stepgraph::prelude::*;

#[test]
fn test_locate_root_step() {
    let pipeline = branched();
    let path = locate(&pipeline, id_of(&pipeline, "log-sink")).unwrap();
    assert_eq!(path.to_string(), "steps[2]");
    assert!(!path.is_nested());
}

#[test]
fn test_locate_nested_step() {
    let pipeline = branched();
    let id = id_of(&pipeline, "set-body");
    let path = locate(&pipeline, id).unwrap();
    assert_eq!(path.to_string(), "steps[1].branches[0].steps[1]");
    assert_eq!(path.depth(), 1);
    assert_eq!(pipeline.node_at(&path).map(Node::id), Some(id));
}

#[test]
fn test_locate_unknown_is_not_found() {
    let pipeline = branched();
    let err = locate(&pipeline, StepId::generate()).unwrap_err();
    assert!(matches!(err, EditError::NotFound { .. }));
}

#[test]
fn test_branch_resolution() {
    let pipeline = branched();
    let choice = pipeline.find_by_name("choice").unwrap();
    let second = choice.branches()[1].id();

    let path = locate_branch(&pipeline, second).unwrap();
    assert_eq!(path.to_string(), "steps[1].branches[1]");
    assert!(path.targets_branch());
    assert_eq!(pipeline.branch_at(&path).map(Branch::id), Some(second));
    assert_eq!(
        pipeline.sequence_at(&path).map(names),
        Some(vec!["aggregate".to_string()])
    );

    let (owner_path, index) = resolve_branch_owner(&pipeline, second).unwrap();
    assert_eq!(owner_path.to_string(), "steps[1]");
    assert_eq!(index, 1);
    assert_eq!(
        pipeline.node_at(&owner_path).map(Node::id),
        Some(choice.id())
    );
    assert_eq!(choice.branches()[1].owner(), choice.id());

    assert!(matches!(
        resolve_branch_owner(&pipeline, BranchId::generate()),
        Err(EditError::NotFound { .. })
    ));
}

#[test]
fn test_locate_prefers_declaration_order() {
    // Deeper nesting: choice > branch > inner choice > branch > filter
    let inner = choice().with_branch(vec![filter()]);
    let outer = choice().with_branch(vec![inner]).with_branch(vec![set_body()]);
    let pipeline = Pipeline::new(vec![timer(), outer, log()]).unwrap();

    let filter_id = id_of(&pipeline, "filter");
    let path = locate(&pipeline, filter_id).unwrap();
    assert_eq!(
        path.to_string(),
        "steps[1].branches[0].steps[0].branches[0].steps[0]"
    );
    assert_eq!(path.depth(), 2);
}

#[test]
fn test_nested_steps_index() {
    let pipeline = branched();
    let nested = nested_steps(&pipeline);
    let choice_id = id_of(&pipeline, "choice");

    assert_eq!(nested.len(), 3);
    assert!(nested.iter().all(|entry| entry.root_step == choice_id));
    let set_body = nested
        .iter()
        .find(|entry| entry.step == id_of(&pipeline, "set-body"))
        .unwrap();
    assert_eq!(set_body.path.to_string(), "steps[1].branches[0].steps[1]");
    assert_eq!(
        set_body.branch,
        pipeline.find_by_name("choice").unwrap().branches()[0].id()
    );
}

#[test]
fn test_find_by_name_is_depth_first() {
    let pipeline = branched();
    assert_eq!(
        pipeline.find_by_name("aggregate").map(|s| s.id()),
        Some(id_of(&pipeline, "aggregate"))
    );
    assert!(pipeline.find_by_name("missing").is_none());
}
