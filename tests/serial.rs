//! Tests for YAML serialization and binary snapshots.
mod common;
use common::*;
use stepgraph::error::SnapshotError;
use stepgraph::prelude::*;

#[test]
fn test_parse_document() {
    let pipeline = YamlSerializer::new().deserialize(PIPELINE_YAML).unwrap();
    assert_eq!(
        names(pipeline.steps()),
        vec!["timer-source", "choice", "log-sink"]
    );
    assert_eq!(branch_names(&pipeline, "choice", 0), vec!["filter"]);
    assert_eq!(branch_names(&pipeline, "choice", 1), vec!["set-body"]);

    let timer = pipeline.find_by_name("timer-source").unwrap();
    assert_eq!(timer.api_version, "v1");
    assert_eq!(timer.kamelet_type.as_deref(), Some("source"));
    assert_eq!(timer.parameters["period"].as_i64(), Some(1000));

    let choice = pipeline.find_by_name("choice").unwrap();
    assert!(choice.supports_branches);
    assert_eq!(choice.sub_type.as_deref(), Some("EIP"));
    assert_eq!(choice.branches()[0].owner(), choice.id());
}

#[test]
fn test_output_uses_document_keys() {
    let text = YamlSerializer::new().serialize(&branched()).unwrap();
    assert!(text.contains("steps:"));
    assert!(text.contains("type: START"));
    assert!(text.contains("type: END"));
    assert!(text.contains("subType: EIP"));
    assert!(text.contains("kameletType: source"));
    assert!(text.contains("supportsBranches: true"));
    assert!(text.contains("UUID:"));

    let anonymous = YamlSerializer::new()
        .without_identities()
        .serialize(&branched())
        .unwrap();
    assert!(!anonymous.contains("UUID"));
}

#[test]
fn test_integer_parameters_keep_their_text() {
    let aggregate = aggregate()
        .with_parameter("groupDelay", 15000)
        .with_parameter("id", 9_007_199_254_740_993i64)
        .with_parameter("ratio", 0.5);
    let pipeline = Pipeline::new(vec![timer(), aggregate, log()]).unwrap();

    let serializer = YamlSerializer::new();
    let text = serializer.serialize(&pipeline).unwrap();
    assert!(text.contains("groupDelay: 15000\n"), "{}", text);
    assert!(!text.contains("15000.0"));
    assert!(text.contains("ratio: 0.5"));

    let parsed = serializer.deserialize(&text).unwrap();
    let params = &parsed.find_by_name("aggregate").unwrap().parameters;
    assert_eq!(params["groupDelay"], ParamValue::Integer(15000));
    assert_eq!(params["id"].as_i64(), Some(9_007_199_254_740_993));
    assert_eq!(params["ratio"], ParamValue::Number(0.5));
    assert_eq!(parsed, pipeline);
}

#[test]
fn test_slots_are_not_serialized() {
    let pipeline = timer_log();
    let with_slot = delete_step(&pipeline, id_of(&pipeline, "timer-source")).unwrap();
    let serializer = YamlSerializer::new();
    let text = serializer.serialize(&with_slot).unwrap();
    let parsed = serializer.deserialize(&text).unwrap();
    assert_eq!(names(parsed.steps()), vec!["log-sink"]);
}

#[test]
fn test_identities_survive_round_trip() {
    let serializer = YamlSerializer::new();
    let pipeline = branched();
    let parsed = serializer
        .deserialize(&serializer.serialize(&pipeline).unwrap())
        .unwrap();
    for step in pipeline.all_steps() {
        assert!(parsed.contains(step.id()));
    }
}

#[test]
fn test_fresh_identities_without_uuid() {
    let serializer = YamlSerializer::new().without_identities();
    let pipeline = branched();
    let parsed = serializer
        .deserialize(&serializer.serialize(&pipeline).unwrap())
        .unwrap();
    assert!(parsed.same_structure(&pipeline));
    assert!(!parsed.contains(id_of(&pipeline, "timer-source")));
}

#[test]
fn test_duplicate_persisted_identity_is_replaced() {
    let id = StepId::generate();
    let text = format!(
        "steps:\n  - name: a\n    type: MIDDLE\n    UUID: {id}\n  - name: b\n    type: MIDDLE\n    UUID: {id}\n"
    );
    let parsed = YamlSerializer::new().deserialize(&text).unwrap();
    assert_eq!(id_of(&parsed, "a"), id);
    assert_ne!(id_of(&parsed, "b"), id);
}

#[test]
fn test_invalid_documents_are_rejected() {
    let serializer = YamlSerializer::new();

    let err = serializer.deserialize("steps: [").unwrap_err();
    assert!(matches!(err, ParseError::Yaml(_)));

    let misplaced = "steps:\n  - name: log\n    type: END\n  - name: timer\n    type: START\n";
    let err = serializer.deserialize(misplaced).unwrap_err();
    assert!(matches!(err, ParseError::Structure(_)));

    let unknown_role = "steps:\n  - name: x\n    type: SIDEWAYS\n";
    assert!(matches!(
        serializer.deserialize(unknown_role),
        Err(ParseError::Yaml(_))
    ));
}

#[test]
fn test_empty_document() {
    let pipeline = YamlSerializer::new().deserialize("  \n").unwrap();
    assert!(pipeline.is_empty());
}

#[test]
fn test_snapshot_round_trip() {
    let pipeline = branched();
    let snapshot = PipelineSnapshot::capture(&pipeline).unwrap();
    let bytes = snapshot.to_bytes().unwrap();
    let loaded = PipelineSnapshot::from_bytes(&bytes).unwrap();
    assert_eq!(loaded, snapshot);
    assert_eq!(loaded.restore().unwrap(), pipeline);
}

#[test]
fn test_snapshot_file() {
    let path = std::env::temp_dir().join(format!("stepgraph-{}.snapshot", StepId::generate()));
    let path = path.to_string_lossy().to_string();
    let pipeline = timer_log();

    PipelineSnapshot::capture(&pipeline).unwrap().save(&path).unwrap();
    let restored = PipelineSnapshot::from_file(&path).unwrap().restore().unwrap();
    assert_eq!(restored, pipeline);
    std::fs::remove_file(&path).ok();

    assert!(matches!(
        PipelineSnapshot::from_file(&path),
        Err(SnapshotError::Generic(_))
    ));
}

#[test]
fn test_snapshot_rejects_garbage() {
    assert!(PipelineSnapshot::from_bytes(&[0xff, 0xff, 0xff]).is_err());
}
