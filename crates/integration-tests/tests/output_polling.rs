//! Output Polling Tests
//!
//! A task queued in async mode only reports its output file. These tests
//! check that reading that file goes through sync-mode file-service calls,
//! and that nothing is requested when there is nothing to poll.

use bytegenie_sdk::{ByteGenieClient, ClientConfig, ResponseBatch, Secrets};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ByteGenieClient {
    ByteGenieClient::with_secrets(
        ClientConfig::default().with_api_url(format!("{}/execute", server.uri())),
        Secrets {
            api_key: "bg-key".to_string(),
            username: String::new(),
        },
    )
    .unwrap()
}

fn reply(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "response": { "task_1": body } }))
}

async fn mount_slugify_queued(server: &MockServer, output_file: &str) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "tasks": { "task_1": { "func": "slugify", "task_mode": "async" } }
        })))
        .respond_with(reply(json!({
            "status": "scheduled",
            "task": { "output_file": output_file }
        })))
        .mount(server)
        .await;
}

async fn mount_check(server: &MockServer, file: &str, exists: bool, times: u64) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "tasks": { "task_1": {
                "func": "check_file_exists",
                "args": { "file": file },
                "task_mode": "sync"
            } }
        })))
        .respond_with(reply(json!({ "status": "completed", "data": exists })))
        .expect(times)
        .mount(server)
        .await;
}

async fn mount_read(server: &MockServer, file: &str, data: serde_json::Value, times: u64) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "tasks": { "task_1": {
                "func": "read_file",
                "args": { "file": file },
                "task_mode": "sync"
            } }
        })))
        .respond_with(reply(json!({ "status": "completed", "data": data })))
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_queued_task_output_is_read_in_sync_mode() {
    let server = MockServer::start().await;
    mount_slugify_queued(&server, "out/slug.csv").await;
    mount_check(&server, "out/slug.csv", true, 2).await;
    mount_read(&server, "out/slug.csv", json!([{ "slug": "hello-world" }]), 1).await;

    let client = client_for(&server);
    let resp = client.slugify("Hello World", None).await;

    assert_eq!(resp.status(), "scheduled");
    assert_eq!(resp.output_file(), Some("out/slug.csv"));
    assert!(resp.data().is_none());

    assert!(resp.check_output_file_exists(&client).await);
    assert_eq!(
        resp.read_output_data(&client).await,
        Some(json!([{ "slug": "hello-world" }]))
    );
}

#[tokio::test]
async fn test_output_not_ready_skips_read() {
    let server = MockServer::start().await;
    mount_slugify_queued(&server, "out/pending.csv").await;
    mount_check(&server, "out/pending.csv", false, 1).await;
    mount_read(&server, "out/pending.csv", json!([]), 0).await;

    let client = client_for(&server);
    let resp = client.slugify("Hello World", None).await;

    assert!(resp.read_output_data(&client).await.is_none());
}

#[tokio::test]
async fn test_no_output_file_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let resp = bytegenie_sdk::ResponseEnvelope::new(json!({ "message": "accepted" })).unwrap();

    assert!(!resp.check_output_file_exists(&client).await);
    assert!(resp.read_output_data(&client).await.is_none());
}

#[tokio::test]
async fn test_batch_reads_outputs_in_order() {
    let server = MockServer::start().await;
    mount_check(&server, "out/a.csv", true, 1).await;
    mount_check(&server, "out/b.csv", true, 1).await;
    mount_read(&server, "out/a.csv", json!([{ "doc": "a" }]), 1).await;
    mount_read(&server, "out/b.csv", json!([{ "doc": "b" }]), 1).await;

    let client = client_for(&server);
    let batch: ResponseBatch = ["out/a.csv", "out/b.csv"]
        .into_iter()
        .map(|file| {
            bytegenie_sdk::ResponseEnvelope::new(json!({
                "response": { "task_1": { "task": { "output_file": file } } }
            }))
            .unwrap()
        })
        .collect();

    assert_eq!(
        batch.concat_output(&client).await,
        json!([{ "doc": "a" }, { "doc": "b" }])
    );
}
