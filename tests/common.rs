//! Common test utilities for building steps, pipelines and catalogs.
use stepgraph::prelude::*;

#[allow(dead_code)]
pub const PIPELINE_YAML: &str = r#"
steps:
  - name: timer-source
    type: START
    apiVersion: v1
    kameletType: source
    parameters:
      period: 1000
  - name: choice
    type: MIDDLE
    subType: EIP
    supportsBranches: true
    branches:
      - steps:
          - name: filter
            type: MIDDLE
            parameters:
              expression: "${body} != null"
      - steps:
          - name: set-body
            type: MIDDLE
  - name: log-sink
    type: END
    title: Log
"#;

#[allow(dead_code)]
pub const CATALOG_YAML: &str = r#"
- name: timer-source
  type: START
  title: Timer
  kameletType: source
  parameters:
    - name: period
      type: integer
      default: 1000
- name: aggregate
  type: MIDDLE
  subType: EIP
- name: log-sink
  type: END
  title: Log
  parameters:
    - name: level
      type: string
      required: true
"#;

#[allow(dead_code)]
pub fn timer() -> Step {
    Step::new("timer-source", RoleClass::Start)
        .with_title("Timer")
        .with_kamelet_type("source")
        .with_parameter("period", 1000)
}

#[allow(dead_code)]
pub fn log() -> Step {
    Step::new("log-sink", RoleClass::End).with_title("Log")
}

#[allow(dead_code)]
pub fn log2() -> Step {
    Step::new("log-sink-2", RoleClass::End).with_title("Log 2")
}

#[allow(dead_code)]
pub fn aggregate() -> Step {
    Step::new("aggregate", RoleClass::Middle).with_sub_type("EIP")
}

#[allow(dead_code)]
pub fn arangodb() -> Step {
    Step::new("arangodb-action", RoleClass::Middle).with_kamelet_type("action")
}

#[allow(dead_code)]
pub fn filter() -> Step {
    Step::new("filter", RoleClass::Middle).with_sub_type("EIP")
}

#[allow(dead_code)]
pub fn set_body() -> Step {
    Step::new("set-body", RoleClass::Middle).with_sub_type("EIP")
}

/// A branch-capable step without branches.
#[allow(dead_code)]
pub fn choice() -> Step {
    Step::new("choice", RoleClass::Middle)
        .with_sub_type("EIP")
        .supporting_branches()
}

/// `[timer, log]`
#[allow(dead_code)]
pub fn timer_log() -> Pipeline {
    Pipeline::new(vec![timer(), log()]).expect("valid pipeline")
}

/// `[timer, choice { [filter, set-body], [aggregate] }, log]`
#[allow(dead_code)]
pub fn branched() -> Pipeline {
    let choice = choice()
        .with_branch(vec![filter(), set_body()])
        .with_branch(vec![aggregate()]);
    Pipeline::new(vec![timer(), choice, log()]).expect("valid pipeline")
}

#[allow(dead_code)]
pub fn id_of(pipeline: &Pipeline, name: &str) -> StepId {
    pipeline
        .find_by_name(name)
        .unwrap_or_else(|| panic!("no step named {}", name))
        .id()
}

/// Names of a sequence, with `<slot>` for placeholders.
#[allow(dead_code)]
pub fn names(nodes: &[Node]) -> Vec<String> {
    nodes
        .iter()
        .map(|node| match node {
            Node::Step(step) => step.name.clone(),
            Node::Slot(_) => "<slot>".to_string(),
        })
        .collect()
}

#[allow(dead_code)]
pub fn branch_names(pipeline: &Pipeline, owner: &str, branch: usize) -> Vec<String> {
    let owner = pipeline
        .find_by_name(owner)
        .unwrap_or_else(|| panic!("no step named {}", owner));
    names(owner.branches()[branch].steps())
}

#[allow(dead_code)]
pub fn catalog() -> Catalog {
    let mut timer = StepDescriptor::new("timer-source", RoleClass::Start);
    timer.title = Some("Timer".to_string());
    timer.parameters.push(ParameterSpec {
        name: "period".to_string(),
        title: None,
        kind: ParamKind::Integer,
        default: Some(ParamValue::from(1000)),
        required: true,
    });

    let mut log = StepDescriptor::new("log-sink", RoleClass::End);
    log.title = Some("Log".to_string());

    let mut choice = StepDescriptor::new("choice", RoleClass::Middle);
    choice.supports_branches = true;

    Catalog::new()
        .with(timer)
        .with(log)
        .with(StepDescriptor::new("log-sink-2", RoleClass::End))
        .with(StepDescriptor::new("aggregate", RoleClass::Middle))
        .with(StepDescriptor::new("arangodb-action", RoleClass::Middle))
        .with(StepDescriptor::new("filter", RoleClass::Middle))
        .with(choice)
}
