use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use parkcast_ingest::{AttemptError, DocumentSource, FetchPolicy, HttpFetcher, IngestError};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::time::Duration;

/// Serves 503 until `fail_first` requests have been seen
async fn flaky(State((hits, fail_first)): State<(Arc<AtomicU32>, u32)>) -> Response {
    let n = hits.fetch_add(1, Ordering::SeqCst) + 1;
    if n <= fail_first {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    Json(json!({
        "type": "FeatureCollection",
        "features": [{"properties": {"noteId": "X1", "libres": "129"}}]
    }))
    .into_response()
}

async fn not_json() -> &'static str {
    "<html>maintenance</html>"
}

async fn serve(fail_first: u32) -> (SocketAddr, Arc<AtomicU32>) {
    let hits = Arc::new(AtomicU32::new(0));
    let app = Router::new()
        .route("/parkings", get(flaky))
        .route("/html", get(not_json))
        .with_state((Arc::clone(&hits), fail_first));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, hits)
}

fn fast_policy(max_retries: u32) -> FetchPolicy {
    FetchPolicy {
        max_retries,
        timeout: Duration::from_secs(5),
        backoff_base: Duration::from_millis(10),
    }
}

#[tokio::test]
async fn recovers_after_transient_failures() {
    let (addr, hits) = serve(2).await;
    let fetcher = HttpFetcher::new(format!("http://{addr}/parkings"), fast_policy(3)).unwrap();

    let doc = fetcher.fetch().await.unwrap();
    assert_eq!(doc["features"][0]["properties"]["noteId"], "X1");
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn gives_up_after_max_retries_with_last_cause() {
    let (addr, hits) = serve(10).await;
    let fetcher = HttpFetcher::new(format!("http://{addr}/parkings"), fast_policy(3)).unwrap();

    let err = fetcher.fetch().await.unwrap_err();
    match err {
        IngestError::Fetch { attempts, last, .. } => {
            assert_eq!(attempts, 3);
            assert!(matches!(last, AttemptError::Status(s) if s == StatusCode::SERVICE_UNAVAILABLE));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn non_json_body_is_retried_then_reported() {
    let (addr, _hits) = serve(0).await;
    let fetcher = HttpFetcher::new(format!("http://{addr}/html"), fast_policy(2)).unwrap();

    let err = fetcher.fetch().await.unwrap_err();
    assert!(matches!(
        err,
        IngestError::Fetch {
            attempts: 2,
            last: AttemptError::Decode(_),
            ..
        }
    ));
}

#[tokio::test]
async fn connection_refused_is_transport_error() {
    // Bind then drop to get a port nobody listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let fetcher = HttpFetcher::new(format!("http://{addr}/parkings"), fast_policy(2)).unwrap();
    let err = fetcher.fetch().await.unwrap_err();
    assert!(matches!(
        err,
        IngestError::Fetch {
            last: AttemptError::Transport(_),
            ..
        }
    ));
}
