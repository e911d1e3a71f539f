//! Integration tests for `tkn task create` using wiremock
//!
//! A mock API server stands in for the cluster and a second mock serves
//! remote definitions, so the whole pipeline runs over real HTTP.

use serde_json::json;
use tkn::kube::auth::ClusterCredentials;
use tkn::kube::client::KubeClient;
use tkn::task::create_task;
use tkn::task::loader::content_client;
use tkn::TaskError;
use wiremock::matchers::{bearer_token, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TASK_NAME: &str = "build-docker-image-from-git-source";
const TASKS_PATH: &str = "/apis/tekton.dev/v1alpha1/namespaces/ns/tasks";

fn fixture(name: &str) -> String {
    format!("{}/tests/resources/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn kube_client(server: &MockServer) -> KubeClient {
    KubeClient::new(ClusterCredentials {
        server: server.uri(),
        token: Some("test-token".to_string()),
        ..Default::default()
    })
    .expect("client should build")
}

fn not_found_status(name: &str) -> serde_json::Value {
    json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": format!("tasks.tekton.dev \"{}\" not found", name),
        "reason": "NotFound",
        "code": 404
    })
}

async fn mount_absent_task(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("{}/{}", TASKS_PATH, TASK_NAME)))
        .and(bearer_token("test-token"))
        .respond_with(ResponseTemplate::new(404).set_body_json(not_found_status(TASK_NAME)))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_create_echo(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(TASKS_PATH))
        .and(bearer_token("test-token"))
        .and(body_partial_json(json!({
            "kind": "Task",
            "metadata": {"name": TASK_NAME}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "apiVersion": "tekton.dev/v1alpha1",
            "kind": "Task",
            "metadata": {"name": TASK_NAME, "namespace": "ns", "uid": "1234"},
            "spec": {}
        })))
        .expect(1)
        .mount(server)
        .await;
}

mod create_task_tests {
    use super::*;

    /// Local definition is created and confirmed by file name
    #[tokio::test]
    async fn test_create_from_local_file() {
        let server = MockServer::start().await;
        mount_absent_task(&server).await;
        mount_create_echo(&server).await;

        let client = kube_client(&server);
        let http = content_client().unwrap();

        let created = create_task(&client, &http, "ns", &fixture("task.yaml"))
            .await
            .expect("create should succeed");

        assert_eq!(created.confirmation(), "Task created: task.yaml\n");
        assert_eq!(created.task.metadata.extra["uid"], "1234");
    }

    /// Remote definition behaves exactly like a local one
    #[tokio::test]
    async fn test_create_from_remote_url() {
        let server = MockServer::start().await;
        mount_absent_task(&server).await;
        mount_create_echo(&server).await;

        let content = MockServer::start().await;
        let yaml = std::fs::read_to_string(fixture("task.yaml")).unwrap();
        Mock::given(method("GET"))
            .and(path("/gavinfish/raw/5a4da2ec/task.yaml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(yaml))
            .expect(1)
            .mount(&content)
            .await;

        let client = kube_client(&server);
        let http = content_client().unwrap();
        let url = format!("{}/gavinfish/raw/5a4da2ec/task.yaml", content.uri());

        let created = create_task(&client, &http, "ns", &url)
            .await
            .expect("create should succeed");

        assert_eq!(created.confirmation(), "Task created: task.yaml\n");
    }

    /// Remote error pages are not decoded as definitions
    #[tokio::test]
    async fn test_remote_not_found_is_retrieval_error() {
        let server = MockServer::start().await;
        let content = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("404: Not Found"))
            .mount(&content)
            .await;

        let client = kube_client(&server);
        let http = content_client().unwrap();
        let url = format!("{}/missing/task.yaml", content.uri());

        let err = create_task(&client, &http, "ns", &url).await.unwrap_err();

        assert!(matches!(err, TaskError::Retrieval { .. }));
        assert!(err.to_string().contains(&url));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    /// A task with the same name already in the namespace blocks creation
    #[tokio::test]
    async fn test_existing_task_is_not_overwritten() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("{}/{}", TASKS_PATH, TASK_NAME)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "apiVersion": "tekton.dev/v1alpha1",
                "kind": "Task",
                "metadata": {"name": TASK_NAME, "namespace": "ns"},
                "spec": {}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let client = kube_client(&server);
        let http = content_client().unwrap();

        let err = create_task(&client, &http, "ns", &fixture("task.yaml"))
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "task \"build-docker-image-from-git-source\" already exists in namespace ns"
        );
    }

    /// Failed lookups abort instead of being read as "exists" or "absent"
    #[tokio::test]
    async fn test_lookup_forbidden_aborts() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "kind": "Status",
                "status": "Failure",
                "message": "tasks.tekton.dev is forbidden: User \"dev\" cannot get resource \"tasks\"",
                "reason": "Forbidden",
                "code": 403
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let client = kube_client(&server);
        let http = content_client().unwrap();

        let err = create_task(&client, &http, "ns", &fixture("task.yaml"))
            .await
            .unwrap_err();

        assert!(matches!(err, TaskError::Lookup { .. }));
        assert!(err.to_string().contains("cannot get resource"));
    }

    /// Store-side rejections surface with the server's message
    #[tokio::test]
    async fn test_rejected_create_is_creation_error() {
        let server = MockServer::start().await;
        mount_absent_task(&server).await;

        Mock::given(method("POST"))
            .and(path(TASKS_PATH))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "kind": "Status",
                "status": "Failure",
                "message": "Task.tekton.dev \"build-docker-image-from-git-source\" is invalid: spec.steps: Required value",
                "reason": "Invalid",
                "code": 422
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = kube_client(&server);
        let http = content_client().unwrap();

        let err = create_task(&client, &http, "ns", &fixture("task.yaml"))
            .await
            .unwrap_err();

        assert!(matches!(err, TaskError::Creation { .. }));
        assert!(err
            .to_string()
            .starts_with("failed to create task \"build-docker-image-from-git-source\": "));
        assert!(err.to_string().contains("spec.steps: Required value"));
    }

    /// Kind is checked before the cluster is contacted
    #[tokio::test]
    async fn test_mismatched_kind_never_reaches_server() {
        let server = MockServer::start().await;
        let client = kube_client(&server);
        let http = content_client().unwrap();

        let err = create_task(&client, &http, "ns", &fixture("taskrun.yaml"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "provided TaskRun instead of Task kind");
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_file_type() {
        let server = MockServer::start().await;
        let client = kube_client(&server);
        let http = content_client().unwrap();
        let source = fixture("task.txt");

        let err = create_task(&client, &http, "ns", &source).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            format!("does not support such extension for {}", source)
        );
    }

    #[tokio::test]
    async fn test_filename_does_not_exist() {
        let server = MockServer::start().await;
        let client = kube_client(&server);
        let http = content_client().unwrap();

        let err = create_task(&client, &http, "ns", "test/resources/task.yaml")
            .await
            .unwrap_err();

        assert!(matches!(err, TaskError::Io { .. }));
        assert!(err.to_string().starts_with("open test/resources/task.yaml: "));
    }

    /// Definitions naming a newer API version are posted to that version
    #[tokio::test]
    async fn test_create_uses_declared_api_version() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!(
                "/apis/tekton.dev/v1beta1/namespaces/ns/tasks/{}",
                TASK_NAME
            )))
            .respond_with(ResponseTemplate::new(404).set_body_json(not_found_status(TASK_NAME)))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/apis/tekton.dev/v1beta1/namespaces/ns/tasks"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "apiVersion": "tekton.dev/v1beta1",
                "kind": "Task",
                "metadata": {"name": TASK_NAME}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("beta.yml");
        std::fs::write(
            &source,
            format!(
                "apiVersion: tekton.dev/v1beta1\nkind: Task\nmetadata:\n  name: {}\nspec:\n  steps: []\n",
                TASK_NAME
            ),
        )
        .unwrap();

        let client = kube_client(&server);
        let http = content_client().unwrap();

        let created = create_task(&client, &http, "ns", &source.to_string_lossy())
            .await
            .expect("create should succeed");

        assert_eq!(created.confirmation(), "Task created: beta.yml\n");
        assert_eq!(created.task.api_version.as_deref(), Some("tekton.dev/v1beta1"));
    }

    /// Existing tasks are found under the version the definition declares
    #[tokio::test]
    async fn test_existing_task_under_declared_version() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/apis/tekton.dev/v1/namespaces/ns/tasks/echo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "apiVersion": "tekton.dev/v1",
                "kind": "Task",
                "metadata": {"name": "echo", "namespace": "ns"},
                "spec": {}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("echo.yaml");
        std::fs::write(
            &source,
            "apiVersion: tekton.dev/v1\nkind: Task\nmetadata:\n  name: echo\nspec:\n  steps: []\n",
        )
        .unwrap();

        let client = kube_client(&server);
        let http = content_client().unwrap();

        let err = create_task(&client, &http, "ns", &source.to_string_lossy())
            .await
            .unwrap_err();

        assert!(matches!(err, TaskError::AlreadyExists { .. }));
    }

    /// A 404 without a NotFound Status (unserved version) is not "absent"
    #[tokio::test]
    async fn test_plain_not_found_is_lookup_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("404 page not found"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let client = kube_client(&server);
        let http = content_client().unwrap();

        let err = create_task(&client, &http, "ns", &fixture("task.yaml"))
            .await
            .unwrap_err();

        assert!(matches!(err, TaskError::Lookup { .. }));
        assert!(err.to_string().contains("404 Not Found"));
    }

    /// Definitions relying on generateName are created without a lookup
    #[tokio::test]
    async fn test_generate_name_skips_lookup() {
        let server = MockServer::start().await;

        // A nameless lookup would hit the collection and see a TaskList
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "apiVersion": "tekton.dev/v1alpha1",
                "kind": "TaskList",
                "items": []
            })))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(TASKS_PATH))
            .and(body_partial_json(json!({"metadata": {"generateName": "build-"}})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "apiVersion": "tekton.dev/v1alpha1",
                "kind": "Task",
                "metadata": {"name": "build-x7k2p", "generateName": "build-", "namespace": "ns"},
                "spec": {}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("generated.yaml");
        std::fs::write(
            &source,
            "apiVersion: tekton.dev/v1alpha1\nkind: Task\nmetadata:\n  generateName: build-\nspec:\n  steps: []\n",
        )
        .unwrap();

        let client = kube_client(&server);
        let http = content_client().unwrap();

        let created = create_task(&client, &http, "ns", &source.to_string_lossy())
            .await
            .expect("create should succeed");

        assert_eq!(created.confirmation(), "Task created: generated.yaml\n");
        assert_eq!(created.task.name(), "build-x7k2p");
    }

    /// A 200 lookup answered with something other than the named Task is an error
    #[tokio::test]
    async fn test_lookup_returning_list_is_lookup_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("{}/{}", TASKS_PATH, TASK_NAME)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "apiVersion": "tekton.dev/v1alpha1",
                "kind": "TaskList",
                "metadata": {},
                "items": []
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let client = kube_client(&server);
        let http = content_client().unwrap();

        let err = create_task(&client, &http, "ns", &fixture("task.yaml"))
            .await
            .unwrap_err();

        assert!(matches!(err, TaskError::Lookup { .. }));
        assert!(err.to_string().contains("TaskList"));
    }
}
