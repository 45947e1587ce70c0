mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use agri_sage::artifacts::ensure_artifact;
use agri_sage::Error;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::get;
use axum::Router;

use common::spawn;

async fn file_server(hits: Arc<AtomicUsize>) -> String {
    let app = Router::new()
        .route(
            "/class_indices.json",
            get(|State(hits): State<Arc<AtomicUsize>>, headers: HeaderMap| async move {
                hits.fetch_add(1, Ordering::SeqCst);
                let authorized = headers
                    .get(header::AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    == Some("Bearer gh-token");
                if authorized {
                    (StatusCode::OK, r#"{"Apple___healthy": 0}"#)
                } else {
                    (StatusCode::UNAUTHORIZED, "")
                }
            }),
        )
        .with_state(hits);
    spawn(app).await
}

#[tokio::test]
async fn downloads_missing_artifact_into_new_directory() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base_url = file_server(hits.clone()).await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model").join("class_indices.json");

    ensure_artifact(
        &reqwest::Client::new(),
        &path,
        Some(&format!("{base_url}/class_indices.json")),
        Some("gh-token"),
    )
    .await
    .unwrap();

    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        r#"{"Apple___healthy": 0}"#
    );
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn existing_artifact_is_left_alone() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base_url = file_server(hits.clone()).await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("class_indices.json");
    std::fs::write(&path, "{}").unwrap();

    ensure_artifact(
        &reqwest::Client::new(),
        &path,
        Some(&format!("{base_url}/class_indices.json")),
        None,
    )
    .await
    .unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failed_download_reports_status() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base_url = file_server(hits).await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("class_indices.json");

    let err = ensure_artifact(
        &reqwest::Client::new(),
        &path,
        Some(&format!("{base_url}/class_indices.json")),
        None,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::Download { status: 401, .. }));
    assert!(!path.exists());
}

#[tokio::test]
async fn missing_artifact_without_url() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plant_disease_model.pb");

    let err = ensure_artifact(&reqwest::Client::new(), &path, None, None)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::MissingArtifact(p) if p == path));
}
