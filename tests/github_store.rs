//! Integration tests for the GitHub contents API store.
//!
//! A wiremock server stands in for `api.github.com`.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use migrator_core::publish::{AssetPublisher, AssetStore, GitHubStore, PagesSite, PublishAction, PublishError};
use migrator_core::RepoId;
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CONTENTS_PATH: &str = "/repos/acme/imgs/contents/images/photo.jpg";

fn store(server: &MockServer) -> GitHubStore {
    GitHubStore::new(&server.uri(), RepoId::new("acme", "imgs"), "main", "t0ken").unwrap()
}

fn publisher(server: &MockServer) -> AssetPublisher {
    AssetPublisher::new(
        Arc::new(store(server)),
        PagesSite::new("acme", "imgs", "github.io"),
    )
}

async fn put_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|request| request.method.as_str() == "PUT")
        .map(|request| serde_json::from_slice(&request.body).unwrap())
        .collect()
}

#[tokio::test]
async fn test_lookup_missing_path_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .and(query_param("ref", "main"))
        .and(header("authorization", "Bearer t0ken"))
        .and(header("accept", "application/vnd.github+json"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
        .expect(1)
        .mount(&server)
        .await;

    let revision = store(&server).lookup("images/photo.jpg").await.unwrap();
    assert!(revision.is_none());
}

#[tokio::test]
async fn test_publish_new_asset_creates_without_sha() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(CONTENTS_PATH))
        .and(body_partial_json(json!({
            "message": "Add image photo.jpg [batch 1]",
            "content": STANDARD.encode(b"jpeg bytes"),
            "branch": "main",
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"content": {"sha": "new"}})))
        .expect(1)
        .mount(&server)
        .await;

    let asset = publisher(&server)
        .publish("photo.jpg", b"jpeg bytes", Some(1))
        .await
        .unwrap();

    assert_eq!(asset.action, PublishAction::Created);
    assert_eq!(asset.public_url, "https://acme.github.io/imgs/images/photo.jpg");
    let bodies = put_bodies(&server).await;
    assert_eq!(bodies.len(), 1);
    assert!(bodies[0].get("sha").is_none(), "create must not send a sha");
}

#[tokio::test]
async fn test_publish_existing_asset_updates_with_prior_sha() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "photo.jpg",
            "path": "images/photo.jpg",
            "sha": "3d21ec53a331a6f037a91c368710b99387d012c1",
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(CONTENTS_PATH))
        .and(body_partial_json(json!({
            "sha": "3d21ec53a331a6f037a91c368710b99387d012c1",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let asset = publisher(&server)
        .publish("photo.jpg", b"v2", None)
        .await
        .unwrap();

    assert_eq!(asset.action, PublishAction::Updated);
    let bodies = put_bodies(&server).await;
    assert_eq!(bodies[0]["message"], "Add image photo.jpg");
    assert_eq!(bodies[0]["content"], STANDARD.encode(b"v2"));
}

#[tokio::test]
async fn test_unauthorized_put_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Bad credentials"})),
        )
        .mount(&server)
        .await;

    let error = publisher(&server)
        .publish("photo.jpg", b"x", Some(1))
        .await
        .unwrap_err();
    assert!(matches!(error, PublishError::Unauthorized { status: 401, .. }));
}

#[tokio::test]
async fn test_stale_sha_is_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sha": "old"})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "images/photo.jpg does not match old",
        })))
        .mount(&server)
        .await;

    let error = publisher(&server)
        .publish("photo.jpg", b"x", Some(2))
        .await
        .unwrap_err();
    assert!(matches!(error, PublishError::Conflict { .. }));
}

#[tokio::test]
async fn test_server_error_carries_api_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"message": "Server Error"})),
        )
        .mount(&server)
        .await;

    let error = store(&server).lookup("images/photo.jpg").await.unwrap_err();
    match error {
        PublishError::Api { status, message, .. } => {
            assert_eq!(status, 500);
            assert_eq!(message, "Server Error");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_lookup_without_sha_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"type": "dir"})))
        .mount(&server)
        .await;

    let error = store(&server).lookup("images/photo.jpg").await.unwrap_err();
    assert!(matches!(error, PublishError::InvalidResponse { .. }));
}
