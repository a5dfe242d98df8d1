//! End-to-end editing scenarios and properties that must hold after any edit.
mod common;
use common::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use stepgraph::prelude::*;

#[cfg(test)]
mod scenario_tests {
    use super::*;

    /// Rendered order of a pipeline: step names, `<slot>` for placeholders.
    fn rendered(pipeline: &Pipeline) -> Vec<String> {
        project(pipeline)
            .iter()
            .map(|node| match node {
                RenderNode::Occupied { step, .. } => step.name.clone(),
                RenderNode::Slot { .. } => "<slot>".to_string(),
            })
            .collect()
    }

    #[test]
    fn test_insert_between_source_and_sink() {
        let pipeline = timer_log();
        let edited = insert_between(&pipeline, id_of(&pipeline, "timer-source"), aggregate()).unwrap();
        assert_eq!(
            rendered(&edited),
            vec!["timer-source", "aggregate", "log-sink"]
        );
    }

    #[test]
    fn test_delete_source_leaves_slot() {
        let pipeline = timer_log();
        let edited = delete_step(&pipeline, id_of(&pipeline, "timer-source")).unwrap();
        let view = project(&edited);
        assert_eq!(view.iter().count(), 2);
        assert!(view.iter().next().unwrap().is_slot());
        assert_eq!(rendered(&edited), vec!["<slot>", "log-sink"]);
    }

    #[test]
    fn test_insert_then_delete_source() {
        let pipeline = timer_log();
        let timer_id = id_of(&pipeline, "timer-source");
        let edited = insert_between(&pipeline, timer_id, arangodb()).unwrap();
        let edited = delete_step(&edited, timer_id).unwrap();
        let view = project(&edited);
        assert_eq!(view.iter().count(), 3);
        assert!(view.iter().next().unwrap().is_slot());
        assert_eq!(
            rendered(&edited),
            vec!["<slot>", "arangodb-action", "log-sink"]
        );
    }

    #[test]
    fn test_swap_sink_through_appends() {
        let pipeline = timer_log();
        let timer_id = id_of(&pipeline, "timer-source");

        let edited = delete_step(&pipeline, id_of(&pipeline, "log-sink")).unwrap();
        assert_eq!(rendered(&edited), vec!["timer-source"]);

        let aggregate = aggregate();
        let aggregate_id = aggregate.id();
        let edited = append_after(&edited, timer_id, aggregate, AppendPosition::Middle).unwrap();
        let edited = append_after(&edited, aggregate_id, log2(), AppendPosition::End).unwrap();
        assert_eq!(
            rendered(&edited),
            vec!["timer-source", "aggregate", "log-sink-2"]
        );
    }

    #[test]
    fn test_replace_end_with_middle_is_rejected() {
        let pipeline = timer_log();
        let before = pipeline.clone();
        let err = replace_step(&pipeline, id_of(&pipeline, "log-sink"), aggregate()).unwrap_err();
        let EditError::IncompatibleStep(rejection) = err else {
            panic!("expected IncompatibleStep");
        };
        assert_eq!(rejection.title, "Replace Step Unsuccessful");
        assert_eq!(pipeline, before);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;

    fn all_ids(pipeline: &Pipeline) -> Vec<String> {
        let mut out = Vec::new();
        fn walk(nodes: &[Node], out: &mut Vec<String>) {
            for node in nodes {
                out.push(node.id().to_string());
                if let Node::Step(step) = node {
                    for branch in step.branches() {
                        out.push(branch.id().to_string());
                        walk(branch.steps(), out);
                    }
                }
            }
        }
        walk(pipeline.steps(), &mut out);
        out
    }

    fn assert_unique(pipeline: &Pipeline) {
        let ids = all_ids(pipeline);
        let unique: HashSet<&String> = ids.iter().collect();
        assert_eq!(ids.len(), unique.len(), "duplicate identity in {:?}", pipeline);
    }

    fn random_middle(rng: &mut StdRng) -> Step {
        match rng.random_range(0..4) {
            0 => aggregate(),
            1 => filter(),
            2 => set_body(),
            _ => choice(),
        }
    }

    #[test]
    fn test_random_edit_sequences_keep_invariants() {
        for seed in 0..8u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut pipeline = branched();

            for _ in 0..40 {
                let steps = pipeline.all_steps();
                let anchor = steps[rng.random_range(0..steps.len())].id();
                let owners: Vec<StepId> = steps
                    .iter()
                    .filter(|s| s.supports_branches)
                    .map(|s| s.id())
                    .collect();

                let outcome = match rng.random_range(0..5) {
                    0 | 1 => insert_between(&pipeline, anchor, random_middle(&mut rng)),
                    2 => delete_step(&pipeline, anchor),
                    3 => replace_step(&pipeline, anchor, random_middle(&mut rng)),
                    _ if !owners.is_empty() => {
                        let owner = owners[rng.random_range(0..owners.len())];
                        add_branch(&pipeline, owner).and_then(|(next, branch)| {
                            append_to_branch(&next, branch, random_middle(&mut rng))
                        })
                    }
                    _ => continue,
                };

                match outcome {
                    Ok(next) => {
                        assert!(next.check().is_ok(), "invariants broken: {:?}", next);
                        assert_unique(&next);
                        pipeline = next;
                    }
                    Err(
                        EditError::IncompatibleStep(_)
                        | EditError::EndConflict { .. }
                        | EditError::NotFound { .. },
                    ) => {}
                    Err(other) => panic!("unexpected error: {}", other),
                }

                if pipeline.all_steps().is_empty() {
                    break;
                }
            }
        }
    }

    #[test]
    fn test_insert_then_locate() {
        let pipeline = branched();
        for anchor in ["timer-source", "filter", "set-body", "aggregate"] {
            let step = Step::new("log-message", RoleClass::Middle);
            let id = step.id();
            let edited = insert_between(&pipeline, id_of(&pipeline, anchor), step).unwrap();
            let anchor_path = locate(&edited, id_of(&pipeline, anchor)).unwrap();
            let path = locate(&edited, id).unwrap();
            assert_eq!(path.container(), anchor_path.container());
            assert_eq!(path.index(), anchor_path.index().map(|i| i + 1));
        }
    }

    #[test]
    fn test_delete_then_absence() {
        let pipeline = branched();
        for step in pipeline.all_steps() {
            let id = step.id();
            let edited = delete_step(&pipeline, id).unwrap();
            assert!(matches!(locate(&edited, id), Err(EditError::NotFound { .. })));
        }
    }

    #[test]
    fn test_structural_round_trip() {
        let serializer = YamlSerializer::new();
        let pipeline = branched();
        let text = serializer.serialize(&pipeline).unwrap();
        let parsed = serializer.deserialize(&text).unwrap();
        assert!(parsed.same_structure(&pipeline));
        assert_eq!(parsed, pipeline);
    }
}
