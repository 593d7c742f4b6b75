mod common;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{json, Value};

use opflow_core::types::{PipeKind, PipeSpec, PipeTaskSpec, ResourceTaskSpec, TaskMetadata, TaskParams, TaskSpec};
use opflow_core::pipe_artifact_name;
use opflow_exec::executor::{ErrorKind, ExecutionError};
use opflow_exec::task::{build_task, pipe_pod_name, TaskBuildError, TaskContext, PIPE_POD_ANNOTATION};
use opflow_exec::{ClientError, DirClient, LabelEnhancer, MemoryClient, ObjectRef, RemoteClient};

// Mock client whose remote side is always down
struct UnavailableClient;

#[async_trait]
impl RemoteClient for UnavailableClient {
    async fn apply(&self, _obj: Value) -> Result<Value, ClientError> {
        Err(ClientError::Unavailable("connection refused".to_string()))
    }

    async fn get(&self, _obj_ref: &ObjectRef) -> Result<Option<Value>, ClientError> {
        Err(ClientError::Unavailable("connection refused".to_string()))
    }

    async fn delete(&self, _obj_ref: &ObjectRef) -> Result<bool, ClientError> {
        Err(ClientError::Unavailable("connection refused".to_string()))
    }

    async fn read_file(&self, _obj_ref: &ObjectRef, _path: &str) -> Result<Option<Vec<u8>>, ClientError> {
        Err(ClientError::Unavailable("connection refused".to_string()))
    }
}

fn templates() -> BTreeMap<String, String> {
    let mut t = BTreeMap::new();
    t.insert(
        "config.yaml".to_string(),
        "kind: ConfigMap\nmetadata:\n  name: {{ .Name }}-config\ndata:\n  replicas: \"{{ .Params.replicas }}\"\n".to_string(),
    );
    t.insert(
        "deploy.yaml".to_string(),
        "kind: Deployment\nmetadata:\n  name: {{ .Name }}\nspec:\n  replicas: {{ .Params.replicas }}\n".to_string(),
    );
    t.insert(
        "pod.yaml".to_string(),
        "kind: Pod\nmetadata:\n  name: generator\nspec:\n  image: gen:{{ .AppVersion }}\n".to_string(),
    );
    t.insert("broken.yaml".to_string(), "kind: Pod\nmetadata:\n  name: {{ .Name\n".to_string());
    t.insert("missing-param.yaml".to_string(), "kind: Pod\nmetadata:\n  name: {{ .Params.nope }}\n".to_string());
    t
}

fn params() -> BTreeMap<String, String> {
    BTreeMap::from([("replicas".to_string(), "3".to_string())])
}

struct Fixture {
    templates: BTreeMap<String, String>,
    params: BTreeMap<String, String>,
    pipes: BTreeMap<String, String>,
    meta: TaskMetadata,
}

impl Fixture {
    fn new(task: &str) -> Self {
        Self {
            templates: templates(),
            params: params(),
            pipes: BTreeMap::new(),
            meta: TaskMetadata::new(&common::meta(), "deploy", "main", "everything", task),
        }
    }

    fn ctx<'a>(&'a self, client: &'a dyn RemoteClient) -> TaskContext<'a> {
        TaskContext {
            client,
            enhancer: &LabelEnhancer,
            meta: self.meta.clone(),
            templates: &self.templates,
            params: &self.params,
            pipes: &self.pipes,
        }
    }
}

fn resource_task(name: &str, kind: &str, resources: &[&str]) -> TaskSpec {
    TaskSpec {
        name: name.to_string(),
        kind: kind.to_string(),
        spec: TaskParams {
            resource: ResourceTaskSpec {
                resources: resources.iter().map(|r| r.to_string()).collect(),
            },
            ..Default::default()
        },
    }
}

fn pipe_task(name: &str) -> TaskSpec {
    TaskSpec {
        name: name.to_string(),
        kind: "Pipe".to_string(),
        spec: TaskParams {
            pipe: PipeTaskSpec {
                pod: Some("pod.yaml".to_string()),
                pipe: vec![
                    PipeSpec {
                        file: "/out/cert.pem".to_string(),
                        kind: PipeKind::Secret,
                        key: "cert".to_string(),
                    },
                    PipeSpec {
                        file: "/out/settings.conf".to_string(),
                        kind: PipeKind::ConfigMap,
                        key: "settings".to_string(),
                    },
                ],
            },
            ..Default::default()
        },
    }
}

async fn run(spec: &TaskSpec, fixture: &Fixture, client: &dyn RemoteClient) -> Result<bool, ExecutionError> {
    build_task(spec).unwrap().run(&fixture.ctx(client)).await
}

#[tokio::test]
async fn apply_renders_enhances_and_stores_objects() {
    let client = MemoryClient::new();
    let fixture = Fixture::new("app");

    let done = run(&resource_task("app", "Apply", &["config.yaml"]), &fixture, &client)
        .await
        .unwrap();

    assert!(done);
    let stored = client
        .object(&ObjectRef::new("ConfigMap", "default", "demo-1-config"))
        .expect("config map applied");
    assert_eq!(stored["data"]["replicas"], json!("3"));
    assert_eq!(stored["metadata"]["labels"]["opflow.dev/instance"], json!("demo-1"));
    assert_eq!(stored["metadata"]["annotations"]["opflow.dev/task"], json!("app"));
    assert_eq!(stored["metadata"]["ownerReferences"][0]["kind"], json!("Instance"));
}

#[tokio::test]
async fn apply_waits_for_unhealthy_objects() {
    let client = MemoryClient::new();
    let fixture = Fixture::new("app");
    let task = resource_task("app", "Apply", &["deploy.yaml"]);

    client.set_status_on_apply("Deployment", json!({ "ready": false }));
    assert!(!run(&task, &fixture, &client).await.unwrap());

    client.set_status_on_apply("Deployment", json!({ "ready": true }));
    assert!(run(&task, &fixture, &client).await.unwrap());
}

#[tokio::test]
async fn unavailable_remote_is_transient() {
    let fixture = Fixture::new("app");

    let err = run(&resource_task("app", "Apply", &["config.yaml"]), &fixture, &UnavailableClient)
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Transient);
    assert!(!err.is_fatal());
    assert!(err.message.contains("connection refused"));
}

#[tokio::test]
async fn malformed_template_is_fatal() {
    let client = MemoryClient::new();
    let fixture = Fixture::new("app");

    for template in ["broken.yaml", "missing-param.yaml", "not-there.yaml"] {
        let err = run(&resource_task("app", "Apply", &[template]), &fixture, &client)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Fatal, "{template}");
        assert_eq!(err.event_name, "TemplateRenderError", "{template}");
    }
    assert!(client.objects().is_empty());
}

#[tokio::test]
async fn delete_removes_objects_and_ignores_missing_ones() {
    let client = MemoryClient::new();
    let fixture = Fixture::new("cleanup");
    run(&resource_task("app", "Apply", &["config.yaml"]), &fixture, &client)
        .await
        .unwrap();

    let delete = resource_task("cleanup", "Delete", &["config.yaml", "deploy.yaml"]);
    assert!(run(&delete, &fixture, &client).await.unwrap());
    assert!(client.objects().is_empty());

    assert!(run(&delete, &fixture, &client).await.unwrap());
}

#[tokio::test]
async fn wait_reports_done_only_for_healthy_objects() {
    let client = MemoryClient::new();
    let fixture = Fixture::new("wait");
    let wait = resource_task("wait", "Wait", &["deploy.yaml"]);

    assert!(!run(&wait, &fixture, &client).await.unwrap());

    client.set_status_on_apply("Deployment", json!({ "conditions": [{ "type": "Ready", "status": "False" }] }));
    run(&resource_task("app", "Apply", &["deploy.yaml"]), &fixture, &client)
        .await
        .unwrap();
    assert!(!run(&wait, &fixture, &client).await.unwrap());

    client.set_status(
        &ObjectRef::new("Deployment", "default", "demo-1"),
        json!({ "conditions": [{ "type": "Ready", "status": "True" }] }),
    );
    assert!(run(&wait, &fixture, &client).await.unwrap());
}

#[tokio::test]
async fn pipe_creates_artifacts_and_removes_its_pod() {
    let client = MemoryClient::new();
    let fixture = Fixture::new("gencert");
    let pod = ObjectRef::new("Pod", "default", pipe_pod_name(&fixture.meta));
    client.set_status_on_apply("Pod", json!({ "phase": "Running" }));
    client.set_file(&pod, "/out/cert.pem", "-----BEGIN CERT-----");
    client.set_file(&pod, "/out/settings.conf", "level=debug");

    assert!(run(&pipe_task("gencert"), &fixture, &client).await.unwrap());

    let secret = client
        .object(&ObjectRef::new("Secret", "default", pipe_artifact_name(&fixture.meta, "cert")))
        .expect("secret created");
    assert_eq!(secret["stringData"]["cert.pem"], json!("-----BEGIN CERT-----"));
    assert_eq!(secret["metadata"]["labels"]["opflow.dev/operator"], json!("demo"));
    let config = client
        .object(&ObjectRef::new("ConfigMap", "default", pipe_artifact_name(&fixture.meta, "settings")))
        .expect("config map created");
    assert_eq!(config["data"]["settings.conf"], json!("level=debug"));
    assert!(client.object(&pod).is_none());

    assert!(run(&pipe_task("gencert"), &fixture, &client).await.unwrap());
    assert!(client.object(&pod).is_none());
}

#[tokio::test]
async fn pipe_waits_for_its_pod() {
    let client = MemoryClient::new();
    let fixture = Fixture::new("gencert");
    client.set_status_on_apply("Pod", json!({ "phase": "Pending" }));

    assert!(!run(&pipe_task("gencert"), &fixture, &client).await.unwrap());

    let pod = client
        .object(&ObjectRef::new("Pod", "default", pipe_pod_name(&fixture.meta)))
        .expect("pipe pod applied");
    assert_eq!(pod["metadata"]["annotations"][PIPE_POD_ANNOTATION], json!("true"));
    assert_eq!(pod["spec"]["image"], json!("gen:2.1"));
}

#[test]
fn pipe_pod_name_differs_from_any_artifact_key_named_pipe() {
    let fixture = Fixture::new("gencert");
    let pod = pipe_pod_name(&fixture.meta);
    assert_eq!(pod, "demo-1.deploy.main.everything.gencert.pipe-pod");
    assert_ne!(pod, pipe_artifact_name(&fixture.meta, "pipe"));
}

#[tokio::test]
async fn pipe_pod_without_file_is_fatal() {
    let client = MemoryClient::new();
    let fixture = Fixture::new("gencert");
    client.set_status_on_apply("Pod", json!({ "phase": "Running" }));

    let err = run(&pipe_task("gencert"), &fixture, &client).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::Fatal);
    assert!(err.message.contains("/out/cert.pem"));
}

#[tokio::test]
async fn failed_pipe_pod_is_fatal() {
    let client = MemoryClient::new();
    let fixture = Fixture::new("gencert");
    client.set_status_on_apply("Pod", json!({ "phase": "Failed" }));

    let err = run(&pipe_task("gencert"), &fixture, &client).await.unwrap_err();

    assert!(err.is_fatal());
}

#[test]
fn build_task_rejects_unknown_kinds_and_incomplete_specs() {
    let err = build_task(&resource_task("x", "Teleport", &["a.yaml"])).err().unwrap();
    assert_eq!(err, TaskBuildError::UnknownKind("Teleport".to_string()));

    let err = build_task(&resource_task("x", "Apply", &[])).err().unwrap();
    assert!(matches!(err, TaskBuildError::InvalidSpec { kind: "Apply", .. }));

    let mut pipe = pipe_task("p");
    pipe.spec.pipe.pod = None;
    assert!(matches!(
        build_task(&pipe).err().unwrap(),
        TaskBuildError::InvalidSpec { kind: "Pipe", .. }
    ));
}

#[tokio::test]
async fn dir_client_persists_objects_and_files() {
    let dir = tempfile::tempdir().unwrap();
    let client = DirClient::new(dir.path());
    let fixture = Fixture::new("app");

    assert!(run(&resource_task("app", "Apply", &["config.yaml"]), &fixture, &client)
        .await
        .unwrap());
    let obj_ref = ObjectRef::new("ConfigMap", "default", "demo-1-config");
    assert!(dir.path().join("ConfigMap/default/demo-1-config.json").exists());
    let stored = client.get(&obj_ref).await.unwrap().expect("stored");
    assert_eq!(stored["data"]["replicas"], json!("3"));

    let files = dir.path().join("ConfigMap/default/demo-1-config.files/out");
    std::fs::create_dir_all(&files).unwrap();
    std::fs::write(files.join("value.txt"), "hello").unwrap();
    let content = client.read_file(&obj_ref, "/out/value.txt").await.unwrap();
    assert_eq!(content.as_deref(), Some(&b"hello"[..]));

    assert!(client.delete(&obj_ref).await.unwrap());
    assert!(client.get(&obj_ref).await.unwrap().is_none());
    assert!(!client.delete(&obj_ref).await.unwrap());
}
