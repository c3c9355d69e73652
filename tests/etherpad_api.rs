//! Etherpad adapter wire tests against a mocked API server.

mod common;

use std::time::Duration;

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use padbroker::backend::EtherpadBackend;
use padbroker::{lifecycle, BackendError, MemoryStore, Pad, PadBackend, RecordStore};

fn ok_reply(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "code": 0,
        "message": "ok",
        "data": data,
    }))
}

fn error_reply(message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "code": 1,
        "message": message,
        "data": null,
    }))
}

async fn adapter(server: &MockServer) -> EtherpadBackend {
    EtherpadBackend::new("key", &server.uri(), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn group_creation_is_idempotent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/1/createGroupIfNotExistsFor"))
        .and(query_param("apikey", "key"))
        .and(query_param("groupMapper", "team-x"))
        .respond_with(ok_reply(json!({"groupID": "g.abc123"})))
        .expect(2)
        .mount(&server)
        .await;

    let backend = adapter(&server).await;
    let first = backend.get_or_create_group("team-x").await.unwrap();
    let second = backend.get_or_create_group("team-x").await.unwrap();
    assert_eq!(first, "g.abc123");
    assert_eq!(first, second);
}

#[tokio::test]
async fn created_pad_round_trips_through_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/1/createGroupPad"))
        .and(query_param("groupID", "g.abc"))
        .and(query_param("padName", "Meeting: Notes"))
        .respond_with(ok_reply(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/1/setPublicStatus"))
        .respond_with(ok_reply(json!({})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/1/listPads"))
        .and(query_param("groupID", "g.abc"))
        .respond_with(ok_reply(json!({"padIDs": ["g.abc$Meeting__Notes"]})))
        .mount(&server)
        .await;

    let backend = adapter(&server).await;
    let mut store = MemoryStore::new();
    let group = common::group_with_remote(uuid::Uuid::new_v4(), "team-x", "g.abc");
    store.save_group(group.clone());

    let pad = Pad::new("Meeting: Notes", group.server_id, group.id);
    let created = lifecycle::create(&mut store, &backend, pad, None).await.unwrap();
    // deterministic id: remote group id, `$`, sanitized name
    assert_eq!(created.remote_id.as_deref(), Some("g.abc$Meeting__Notes"));

    let names = backend.list_group_pads("g.abc").await.unwrap();
    assert_eq!(names, vec!["Meeting__Notes"]);
    // the sanitized form comes back, not the display name
    assert_eq!(
        names.iter().filter(|n| *n == "Meeting__Notes").count(),
        1
    );
}

#[tokio::test]
async fn already_existing_pad_still_yields_its_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/1/createGroupPad"))
        .respond_with(error_reply("padName does already exist"))
        .mount(&server)
        .await;

    let backend = adapter(&server).await;
    let pad_id = backend
        .create_group_pad("g.abc", "Notes", Some("seed text"))
        .await
        .unwrap();
    assert_eq!(pad_id, "g.abc$Notes");
}

#[tokio::test]
async fn delete_pad_is_idempotent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/1/deletePad"))
        .and(query_param("padID", "g.abc$Notes"))
        .respond_with(ok_reply(json!({})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/1/deletePad"))
        .respond_with(error_reply("padID does not exist"))
        .mount(&server)
        .await;

    let backend = adapter(&server).await;
    backend.delete_pad("g.abc$Notes").await.unwrap();
    // second delete hits the "does not exist" reply and still succeeds
    backend.delete_pad("g.abc$Notes").await.unwrap();
}

#[tokio::test]
async fn delete_group_swallows_missing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/1/deleteGroup"))
        .respond_with(error_reply("groupID does not exist"))
        .mount(&server)
        .await;

    let backend = adapter(&server).await;
    backend.delete_group("g.gone").await.unwrap();
}

#[tokio::test]
async fn session_create_carries_expiry_and_parses_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/1/createSession"))
        .and(query_param("groupID", "g.abc"))
        .and(query_param("authorID", "a.1"))
        .and(query_param("validUntil", "4102444800"))
        .respond_with(ok_reply(json!({"sessionID": "s.feedface"})))
        .expect(1)
        .mount(&server)
        .await;

    let backend = adapter(&server).await;
    let token = backend
        .create_session("g.abc", "a.1", 4_102_444_800)
        .await
        .unwrap();
    assert_eq!(token.as_deref(), Some("s.feedface"));
}

#[tokio::test]
async fn liveness_probe_never_fails() {
    let up = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/1/checkToken"))
        .respond_with(ok_reply(json!(null)))
        .mount(&up)
        .await;
    assert!(adapter(&up).await.is_online().await);

    let down = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/1/checkToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 4,
            "message": "no or wrong API Key",
            "data": null,
        })))
        .mount(&down)
        .await;
    assert!(!adapter(&down).await.is_online().await);
}

#[tokio::test]
async fn transport_failure_propagates_on_mutating_calls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/1/getText"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let backend = adapter(&server).await;
    let err = backend.get_text("g.abc$Notes").await.unwrap_err();
    assert_matches!(err, BackendError::Transport { .. });
}

#[tokio::test]
async fn remote_rejection_carries_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/1/createGroupIfNotExistsFor"))
        .respond_with(error_reply("groupMapper is not a string"))
        .mount(&server)
        .await;

    let backend = adapter(&server).await;
    let err = backend.get_or_create_group("team-x").await.unwrap_err();
    assert_matches!(
        err,
        BackendError::Remote { ref message, .. } if message == "groupMapper is not a string"
    );
}

#[tokio::test]
async fn initial_text_is_pushed_after_create() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/1/createGroupPad"))
        .respond_with(ok_reply(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/1/setText"))
        .and(query_param("padID", "g.abc$Agenda"))
        .and(query_param("text", "# Agenda"))
        .respond_with(ok_reply(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let backend = adapter(&server).await;
    let pad_id = backend
        .create_group_pad("g.abc", "Agenda", Some("# Agenda"))
        .await
        .unwrap();
    assert_eq!(pad_id, "g.abc$Agenda");
}

#[tokio::test]
async fn public_status_round_trips() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/1/setPublicStatus"))
        .and(query_param("padID", "g.abc$Agenda"))
        .and(query_param("publicStatus", "true"))
        .respond_with(ok_reply(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/1/getPublicStatus"))
        .and(query_param("padID", "g.abc$Agenda"))
        .respond_with(ok_reply(json!({"publicStatus": true})))
        .expect(1)
        .mount(&server)
        .await;

    let backend = adapter(&server).await;
    backend.set_public_status("g.abc$Agenda", true).await.unwrap();
    assert!(backend.is_pad_public("g.abc$Agenda").await.unwrap());
}

#[tokio::test]
async fn public_status_reply_without_flag_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/1/getPublicStatus"))
        .respond_with(ok_reply(json!({})))
        .mount(&server)
        .await;

    let backend = adapter(&server).await;
    let err = backend.is_pad_public("g.abc$Agenda").await.unwrap_err();
    assert_matches!(err, BackendError::Remote { ref operation, .. } if operation == "getPublicStatus");
}
