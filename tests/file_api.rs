//! HTTP tests for the file routes.

use axum::{
    body::Body,
    http::{header, Method, Request, Response, StatusCode},
    Router,
};
use axum_file_service::{
    build_router, config::ServerConfig, config::StorageConfig, setup_file_routes, LocalFileStore,
    SequentialIdGenerator, BAD_STATUS_PREFIX,
};
use serde_json::Value;
use std::collections::HashSet;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "file-service-test-boundary";

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a [u8]),
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();

    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, content) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"upload.bin\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(content);
            }
        }
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

fn request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn test_app() -> (TempDir, Router) {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalFileStore::new(&StorageConfig::new(dir.path()).with_read_chunk_size(3))
        .with_id_generator(SequentialIdGenerator::new("file"));
    (dir, setup_file_routes(Router::new(), store))
}

async fn body_bytes(response: Response<axum::body::BoxBody>) -> Vec<u8> {
    hyper::body::to_bytes(response.into_body())
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: Response<axum::body::BoxBody>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

async fn upload(app: &Router, user_id: &str, content: &[u8]) -> String {
    let response = app
        .clone()
        .oneshot(upload_request(&[
            Part::Text("userid", user_id),
            Part::File("file", content),
        ]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    body_json(response).await["fileName"]
        .as_str()
        .unwrap()
        .to_string()
}

async fn list(app: &Router, user_id: &str) -> HashSet<String> {
    let response = app
        .clone()
        .oneshot(request(Method::GET, &format!("/?userId={user_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    body_json(response)
        .await
        .as_array()
        .unwrap()
        .iter()
        .map(|record| record["fileName"].as_str().unwrap().to_string())
        .collect()
}

fn error_message(body: &Value) -> &str {
    body["error"]["message"].as_str().unwrap()
}

#[tokio::test]
async fn test_upload_get_delete_example() {
    let (_dir, app) = test_app();

    let file_id = upload(&app, "u1", b"hello world").await;
    assert_eq!(file_id, "file-0");

    let response = app
        .clone()
        .oneshot(request(Method::GET, &format!("/{file_id}?userId=u1")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/octet-stream"
    );
    assert_eq!(body_bytes(response).await, b"hello world");

    let response = app
        .clone()
        .oneshot(request(Method::DELETE, &format!("/{file_id}?userId=u1")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_bytes(response).await.is_empty());

    let response = app
        .clone()
        .oneshot(request(Method::DELETE, &format!("/{file_id}?userId=u1")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(
        error_message(&body),
        "Response has bad status, message: Could not remove file file-0"
    );
}

#[tokio::test]
async fn test_list_returns_every_upload() {
    let (_dir, app) = test_app();

    let mut uploaded = HashSet::new();
    for content in [&b"one"[..], b"two", b"three"] {
        uploaded.insert(upload(&app, "u1", content).await);
    }
    upload(&app, "u2", b"other user").await;

    assert_eq!(list(&app, "u1").await, uploaded);
}

#[tokio::test]
async fn test_deleted_file_is_not_listed() {
    let (_dir, app) = test_app();

    let keep = upload(&app, "u1", b"keep").await;
    let remove = upload(&app, "u1", b"remove").await;

    let response = app
        .clone()
        .oneshot(request(Method::DELETE, &format!("/{remove}?userId=u1")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(list(&app, "u1").await, HashSet::from([keep]));
}

#[tokio::test]
async fn test_list_unknown_user_is_empty() {
    let (_dir, app) = test_app();
    assert!(list(&app, "nobody").await.is_empty());
}

#[tokio::test]
async fn test_file_part_before_user_id() {
    let (dir, app) = test_app();

    let response = app
        .clone()
        .oneshot(upload_request(&[
            Part::File("file", b"reversed"),
            Part::Text("userid", "u1"),
        ]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let file_id = body_json(response).await["fileName"]
        .as_str()
        .unwrap()
        .to_string();
    let stored = std::fs::read(dir.path().join("u1").join(file_id)).unwrap();
    assert_eq!(stored, b"reversed");
}

#[tokio::test]
async fn test_missing_user_id_part() {
    let (dir, app) = test_app();

    let response = app
        .clone()
        .oneshot(upload_request(&[Part::File("file", b"orphan")]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    let message = error_message(&body);
    assert!(message.starts_with(BAD_STATUS_PREFIX));
    assert!(message.len() > BAD_STATUS_PREFIX.len());
    assert!(message.contains("userid"));

    // the staged bytes are discarded
    let staged = std::fs::read_dir(dir.path().join(".staging")).unwrap().count();
    assert_eq!(staged, 0);
}

#[tokio::test]
async fn test_missing_file_part() {
    let (dir, app) = test_app();

    let response = app
        .clone()
        .oneshot(upload_request(&[Part::Text("userid", "u1")]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    let message = error_message(&body);
    assert!(message.starts_with(BAD_STATUS_PREFIX));
    assert!(message.contains("file"));
    assert!(!dir.path().join("u1").exists());
}

#[tokio::test]
async fn test_upload_with_invalid_user_id() {
    let (dir, app) = test_app();

    let response = app
        .clone()
        .oneshot(upload_request(&[
            Part::Text("userid", "../outside"),
            Part::File("file", b"escape"),
        ]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(!dir.path().join("outside").exists());
}

#[tokio::test]
async fn test_upload_without_multipart_body() {
    let (_dir, app) = test_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_missing_file_is_not_found() {
    let (_dir, app) = test_app();

    let response = app
        .clone()
        .oneshot(request(Method::GET, "/does-not-exist?userId=u1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_user_id_query() {
    let (_dir, app) = test_app();

    let response = app.clone().oneshot(request(Method::GET, "/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(request(Method::DELETE, "/file-0"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_user_id_query() {
    let (_dir, app) = test_app();

    let response = app
        .clone()
        .oneshot(request(Method::GET, "/file-0?userId=.."))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(request(Method::GET, "/?userId=.staging"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_concurrent_uploads_do_not_mix() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalFileStore::new(&StorageConfig::new(dir.path()));
    let app = build_router(&ServerConfig::default(), store);

    let first = vec![b'a'; 64 * 1024];
    let second = vec![b'b'; 48 * 1024];

    let (first_id, second_id) = tokio::join!(upload(&app, "u1", &first), upload(&app, "u1", &second));
    assert_ne!(first_id, second_id);

    for (file_id, expected) in [(&first_id, &first), (&second_id, &second)] {
        let response = app
            .clone()
            .oneshot(request(Method::GET, &format!("/{file_id}?userId=u1")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(&body_bytes(response).await, expected);
    }

    assert_eq!(list(&app, "u1").await, HashSet::from([first_id, second_id]));
}

#[tokio::test]
async fn test_body_limit_rejects_large_upload() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalFileStore::new(&StorageConfig::new(dir.path()));
    let config = ServerConfig {
        max_upload_bytes: 1024,
        ..ServerConfig::default()
    };
    let app = build_router(&config, store);

    let response = app
        .oneshot(upload_request(&[
            Part::Text("userid", "u1"),
            Part::File("file", &[0u8; 4096]),
        ]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(!dir.path().join("u1").exists());
}
