use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use cdn_catalog_core::contract::{FetchOutcome, Fetcher};
use cdn_catalog_core::download::HttpFetcher;
use cdn_catalog_core::CatalogError;
use tempfile::tempdir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

const BODY: &str = r#"{"results":[{"name":"a","version":"1.0"}]}"#;
const ETAG: &str = "\"abc123\"";

#[derive(Clone, Default)]
struct Hits(Arc<AtomicUsize>);

async fn with_etag(State(hits): State<Hits>) -> impl IntoResponse {
    hits.0.fetch_add(1, Ordering::SeqCst);
    ([(header::ETAG, ETAG)], BODY)
}

async fn conditional(headers: HeaderMap) -> Response {
    let matches = headers
        .get(header::IF_NONE_MATCH)
        .is_some_and(|v| v.as_bytes() == ETAG.as_bytes());
    if matches {
        return StatusCode::NOT_MODIFIED.into_response();
    }
    ([(header::ETAG, ETAG)], BODY).into_response()
}

async fn without_etag() -> &'static str {
    BODY
}

async fn spawn_server(hits: Hits) -> String {
    let app = Router::new()
        .route("/etag", get(with_etag))
        .route("/conditional", get(conditional))
        .route("/no-etag", get(without_etag))
        .with_state(hits);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn matching_validator_keeps_existing_file() {
    let base = spawn_server(Hits::default()).await;
    let dir = tempdir().unwrap();
    let dest = dir.path().join("raw_libraries.json");
    fs::write(&dest, "LOCAL COPY").unwrap();

    let outcome = HttpFetcher::new()
        .fetch(&format!("{base}/etag"), &dest, ETAG)
        .await
        .unwrap();
    assert_eq!(outcome, FetchOutcome::Unchanged);
    assert_eq!(fs::read_to_string(&dest).unwrap(), "LOCAL COPY");
}

#[tokio::test]
async fn changed_validator_rewrites_file() {
    let hits = Hits::default();
    let base = spawn_server(hits.clone()).await;
    let dir = tempdir().unwrap();
    let dest = dir.path().join("raw_libraries.json");
    fs::write(&dest, "STALE").unwrap();

    let outcome = HttpFetcher::new()
        .fetch(&format!("{base}/etag"), &dest, "\"older\"")
        .await
        .unwrap();
    assert_eq!(
        outcome,
        FetchOutcome::Downloaded {
            validator: Some(ETAG.to_string()),
            bytes: BODY.len() as u64,
        }
    );
    assert_eq!(fs::read_to_string(&dest).unwrap(), BODY);
    assert_eq!(hits.0.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn missing_file_is_downloaded_even_with_matching_validator() {
    let base = spawn_server(Hits::default()).await;
    let dir = tempdir().unwrap();
    let dest = dir.path().join("raw_libraries.json");

    let outcome = HttpFetcher::new()
        .fetch(&format!("{base}/etag"), &dest, ETAG)
        .await
        .unwrap();
    assert!(matches!(outcome, FetchOutcome::Downloaded { .. }));
    assert_eq!(fs::read_to_string(&dest).unwrap(), BODY);
}

#[tokio::test]
async fn not_modified_answer_means_unchanged() {
    let base = spawn_server(Hits::default()).await;
    let dir = tempdir().unwrap();
    let dest = dir.path().join("raw_libraries.json");
    fs::write(&dest, "LOCAL COPY").unwrap();

    let fetcher = HttpFetcher::new();
    let outcome = fetcher
        .fetch(&format!("{base}/conditional"), &dest, ETAG)
        .await
        .unwrap();
    assert_eq!(outcome, FetchOutcome::Unchanged);
    assert_eq!(fs::read_to_string(&dest).unwrap(), "LOCAL COPY");

    let outcome = fetcher
        .fetch(&format!("{base}/conditional"), &dest, "\"something-else\"")
        .await
        .unwrap();
    assert!(matches!(outcome, FetchOutcome::Downloaded { .. }));
    assert_eq!(fs::read_to_string(&dest).unwrap(), BODY);
}

#[tokio::test]
async fn absent_validator_always_downloads() {
    let base = spawn_server(Hits::default()).await;
    let dir = tempdir().unwrap();
    let dest = dir.path().join("raw_libraries.json");
    fs::write(&dest, "LOCAL COPY").unwrap();

    let outcome = HttpFetcher::new()
        .fetch(&format!("{base}/no-etag"), &dest, "")
        .await
        .unwrap();
    assert_eq!(
        outcome,
        FetchOutcome::Downloaded {
            validator: None,
            bytes: BODY.len() as u64,
        }
    );
    assert_eq!(fs::read_to_string(&dest).unwrap(), BODY);
}

#[tokio::test]
async fn error_status_is_fatal() {
    let base = spawn_server(Hits::default()).await;
    let dir = tempdir().unwrap();
    let dest = dir.path().join("raw_libraries.json");

    let err = HttpFetcher::new()
        .fetch(&format!("{base}/does-not-exist"), &dest, "")
        .await
        .unwrap_err();
    match err {
        CatalogError::HttpStatus { status, .. } => assert_eq!(status.as_u16(), 404),
        other => panic!("expected HttpStatus, got {other:?}"),
    }
    assert!(!dest.exists());
}

#[tokio::test]
async fn connection_failure_is_fatal() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let dir = tempdir().unwrap();

    let err = HttpFetcher::new()
        .fetch(&format!("http://{addr}/etag"), &dir.path().join("raw.json"), "")
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Http(_)), "got {err:?}");
}

/// Serves one response that announces the full body but sends only a prefix.
async fn spawn_truncating_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 1024];
        let _ = socket.read(&mut request).await.unwrap();
        let head = format!(
            "HTTP/1.1 200 OK\r\nETag: {ETAG}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            BODY.len()
        );
        socket.write_all(head.as_bytes()).await.unwrap();
        socket.write_all(&BODY.as_bytes()[..15]).await.unwrap();
        socket.shutdown().await.unwrap();
    });
    format!("http://{addr}/cut")
}

#[tokio::test]
async fn interrupted_transfer_leaves_no_partial_document() {
    let url = spawn_truncating_server().await;
    let dir = tempdir().unwrap();
    let dest = dir.path().join("raw_libraries.json");

    let err = HttpFetcher::new().fetch(&url, &dest, ETAG).await.unwrap_err();
    assert!(matches!(err, CatalogError::Http(_)), "got {err:?}");
    assert!(!dest.exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn interrupted_transfer_keeps_cached_copy() {
    let url = spawn_truncating_server().await;
    let dir = tempdir().unwrap();
    let dest = dir.path().join("raw_libraries.json");
    fs::write(&dest, "LOCAL COPY").unwrap();

    let err = HttpFetcher::new()
        .fetch(&url, &dest, "\"older\"")
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Http(_)), "got {err:?}");
    assert_eq!(fs::read_to_string(&dest).unwrap(), "LOCAL COPY");
}
