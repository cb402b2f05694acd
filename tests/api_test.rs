//! Integration tests for the liveness and file metadata endpoints.

mod common;

use axum::http::{Method, StatusCode};
use common::TestHarness;
use filestream_core::config::Config;
use filestream_db::models::NewFile;
use filestream_upstream::testing::MemorySource;

#[tokio::test]
async fn root_reports_running() {
    let h = TestHarness::new(MemorySource::new(16));

    let resp = h.get("/").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["status"], "running");
    assert_eq!(resp.header("access-control-allow-origin"), Some("*"));
}

#[tokio::test]
async fn root_answers_head() {
    let h = TestHarness::new(MemorySource::new(16));

    let resp = h.request(Method::HEAD, "/", &[]).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.is_empty());
}

#[tokio::test]
async fn file_metadata_with_links() {
    let mut config = Config::default();
    config.server.public_url = "https://media.example.com/".into();
    let h = TestHarness::with_config(config, MemorySource::new(16));
    let id = h.add_file(NewFile {
        message_id: 42,
        anime_title: Some("Frieren".into()),
        poster: Some("https://img.example.com/frieren.jpg".into()),
        genres: Some(vec!["Fantasy".into(), "Adventure".into()]),
        quality: Some("1080p".into()),
        drive_id: Some("1AbC".into()),
        ..Default::default()
    });

    let resp = h.get(&format!("/api/file/{id}")).await;
    assert_eq!(resp.status, StatusCode::OK);
    let json = resp.json();
    assert_eq!(json["id"], id.as_str());
    assert_eq!(json["title"], "Frieren");
    assert_eq!(
        json["stream_url"],
        format!("https://media.example.com/watch/{id}")
    );
    assert_eq!(
        json["download_link"],
        format!("https://media.example.com/dl/{id}")
    );
    assert_eq!(
        json["drive_link"],
        "https://drive.google.com/file/d/1AbC/view"
    );
    assert_eq!(json["genres"][1], "Adventure");
    assert_eq!(json["quality"], "1080p");
}

#[tokio::test]
async fn file_metadata_defaults() {
    let h = TestHarness::new(MemorySource::new(16));
    let id = h.add_message(1);

    let json = h.get(&format!("/api/file/{id}")).await.json();
    assert_eq!(json["title"], "Unknown");
    assert!(json["drive_link"].is_null());
    assert!(json["genres"].is_null());
}

#[tokio::test]
async fn file_metadata_unknown_id() {
    let h = TestHarness::new(MemorySource::new(16));

    let resp = h.get("/api/file/nope").await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.json()["code"], "not_found");
    assert_eq!(resp.header("access-control-allow-origin"), Some("*"));
}

#[tokio::test]
async fn responses_carry_request_id() {
    let h = TestHarness::new(MemorySource::new(16));

    let resp = h
        .request(Method::GET, "/", &[("x-request-id", "trace-me")])
        .await;
    assert_eq!(resp.header("x-request-id"), Some("trace-me"));
}
