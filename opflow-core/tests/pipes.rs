use opflow_core::types::{
    Metadata, Phase, PipeKind, PipeSpec, PipeTaskSpec, Plan, Step, Strategy, TaskMetadata,
    TaskParams, TaskSpec,
};
use opflow_core::{pipe_artifact_name, pipes_map, PipeError};

fn meta() -> Metadata {
    Metadata {
        operator_name: "kafka".to_string(),
        instance_name: "kafka-1".to_string(),
        instance_namespace: "default".to_string(),
        ..Default::default()
    }
}

fn pipe_task(name: &str, keys: &[&str]) -> TaskSpec {
    TaskSpec {
        name: name.to_string(),
        kind: "Pipe".to_string(),
        spec: TaskParams {
            pipe: PipeTaskSpec {
                pod: Some("pipe-pod.yaml".to_string()),
                pipe: keys
                    .iter()
                    .map(|k| PipeSpec {
                        file: format!("/tmp/{k}.txt"),
                        kind: PipeKind::ConfigMap,
                        key: k.to_string(),
                    })
                    .collect(),
            },
            ..Default::default()
        },
    }
}

fn plan(steps: Vec<(&str, Vec<&str>)>) -> Plan {
    Plan {
        strategy: Strategy::Serial,
        phases: vec![Phase {
            name: "main".to_string(),
            strategy: Strategy::Serial,
            steps: steps
                .into_iter()
                .map(|(name, tasks)| Step {
                    name: name.to_string(),
                    tasks: tasks.into_iter().map(String::from).collect(),
                })
                .collect(),
        }],
    }
}

#[test]
fn artifact_name_is_deterministic_and_sanitized() {
    let tmeta = TaskMetadata::new(&meta(), "Deploy", "main", "gen_cert", "genCert");
    let a = pipe_artifact_name(&tmeta, "Cert_Key");
    let b = pipe_artifact_name(&tmeta, "Cert_Key");
    assert_eq!(a, b);
    assert_eq!(a, "kafka-1.deploy.main.gen-cert.gencert.cert-key");
}

#[test]
fn artifact_name_is_bounded() {
    let long = "x".repeat(400);
    let tmeta = TaskMetadata::new(&meta(), "deploy", "main", "step", &long);
    let name = pipe_artifact_name(&tmeta, "key");
    assert!(name.len() <= 253);
    assert!(name.chars().last().is_some_and(|c| c.is_ascii_alphanumeric()));
}

#[test]
fn pipes_map_collects_keys_from_all_steps() {
    let tasks = vec![pipe_task("gen-a", &["a"]), pipe_task("gen-b", &["b", "c"])];
    let plan = plan(vec![("one", vec!["gen-a"]), ("two", vec!["gen-b"])]);

    let pipes = pipes_map("deploy", &plan, &tasks, &meta()).unwrap();
    assert_eq!(pipes.len(), 3);
    assert_eq!(pipes["a"], "kafka-1.deploy.main.one.gen-a.a");
    assert_eq!(pipes["c"], "kafka-1.deploy.main.two.gen-b.c");
}

#[test]
fn duplicate_pipe_key_across_steps_is_rejected() {
    let tasks = vec![pipe_task("gen-a", &["shared"]), pipe_task("gen-b", &["shared"])];
    let plan = plan(vec![("one", vec!["gen-a"]), ("two", vec!["gen-b"])]);

    let err = pipes_map("deploy", &plan, &tasks, &meta()).unwrap_err();
    assert_eq!(err, PipeError::DuplicateKey("shared".to_string()));
}

#[test]
fn keys_with_colliding_artifact_names_are_rejected() {
    let tasks = vec![pipe_task("t", &["Cert", "cert"])];
    let plan = plan(vec![("s", vec!["t"])]);

    let err = pipes_map("deploy", &plan, &tasks, &meta()).unwrap_err();
    assert_eq!(
        err,
        PipeError::DuplicateArtifact {
            key: "cert".to_string(),
            name: "kafka-1.deploy.main.s.t.cert".to_string(),
        }
    );

    let tasks = vec![pipe_task("t", &["cert_x", "cert-x"])];
    let err = pipes_map("deploy", &plan, &tasks, &meta()).unwrap_err();
    assert!(matches!(err, PipeError::DuplicateArtifact { ref key, .. } if key == "cert-x"));
}

#[test]
fn non_pipe_and_unknown_tasks_are_ignored() {
    let mut apply = pipe_task("apply", &["ignored"]);
    apply.kind = "Apply".to_string();
    let plan = plan(vec![("one", vec!["apply", "missing"])]);

    let pipes = pipes_map("deploy", &plan, &[apply], &meta()).unwrap();
    assert!(pipes.is_empty());
}
