//! API Module
//!
//! HTTP API layer for the server.
//! Each submodule handles endpoints for a specific domain.

pub mod error;
pub mod health;
pub mod job;

use axum::{
    Router,
    http::{Method, header},
    routing::{get, post},
};
use std::path::Path;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::pipeline::artifacts::PUBLIC_PREFIX;
use crate::state::AppState;

/// Create the main API router with all endpoints
///
/// Published artifacts under `public_dir` are served read-only below `/files`.
pub fn create_router(state: AppState, public_dir: &Path) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Job endpoints
        .route("/job", post(job::submit_job))
        .route("/job/", get(job::missing_job_id))
        .route("/job/{id}", get(job::get_job))
        .route("/jobs/active", get(job::list_active_jobs))
        .route("/jobs/history", get(job::list_job_history))
        // Published artifacts
        .nest_service(PUBLIC_PREFIX, ServeDir::new(public_dir))
        // Add state and middleware
        .with_state(state)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::{DetachedRuns, OverflowPolicy, WorkQueue};
    use crate::testing::{FakeTooling, Fixture, wait_for_terminal};
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use scribe_core::domain::job::{Job, JobStatus};
    use scribe_core::domain::source::SourceAllowlist;
    use tokio::sync::mpsc::Receiver;
    use tower::ServiceExt;
    use uuid::Uuid;

    struct TestApp {
        fixture: Fixture,
        router: Router,
        receiver: Receiver<Uuid>,
    }

    fn test_app(policy: OverflowPolicy, capacity: usize) -> TestApp {
        let fixture = Fixture::new(FakeTooling::new());
        let (queue, receiver) = WorkQueue::new(
            capacity,
            policy,
            DetachedRuns::default(),
            fixture.pipeline.clone(),
        );
        let state = AppState::new(fixture.store.clone(), queue, SourceAllowlist::default());
        let router = create_router(state, fixture.layout.public_dir());

        TestApp {
            fixture,
            router,
            receiver,
        }
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    fn post_job(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/job")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn error_message(body: &[u8]) -> String {
        let value: serde_json::Value = serde_json::from_slice(body).unwrap();
        value["error"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = test_app(OverflowPolicy::Spill, 10);

        let (status, body) = send(&app.router, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"OK");
    }

    #[tokio::test]
    async fn test_submit_job() {
        let mut app = test_app(OverflowPolicy::Spill, 10);

        let (status, body) = send(
            &app.router,
            post_job(r#"{"url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let job: Job = serde_json::from_slice(&body).unwrap();
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.progress.overall, 0);

        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "queued");
        assert_eq!(json["progress"], 0);
        assert!(json.get("text").is_none());
        assert!(json.get("error").is_none());

        assert_eq!(app.receiver.recv().await, Some(job.id));
    }

    #[tokio::test]
    async fn test_submit_job_missing_url() {
        let app = test_app(OverflowPolicy::Spill, 10);

        let (status, body) = send(&app.router, post_job("{}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_message(&body), "URL is required");
    }

    #[tokio::test]
    async fn test_submit_job_unsupported_source() {
        let app = test_app(OverflowPolicy::Spill, 10);

        let request = post_job(r#"{"url": "https://example.com/video"}"#);
        let (status, body) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_message(&body), "Invalid YouTube URL");
        assert!(app.fixture.store.list_active().is_empty());
    }

    #[tokio::test]
    async fn test_submit_job_invalid_json() {
        let app = test_app(OverflowPolicy::Spill, 10);

        let (status, body) = send(&app.router, post_job("{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_message(&body), "Invalid JSON");
    }

    #[tokio::test]
    async fn test_submit_job_rejected() {
        let app = test_app(OverflowPolicy::Reject, 1);

        send(&app.router, post_job(r#"{"url": "https://youtu.be/one"}"#)).await;
        let request = post_job(r#"{"url": "https://youtu.be/two"}"#);
        let (status, body) = send(&app.router, request).await;

        assert_eq!(status, StatusCode::OK);
        let job: Job = serde_json::from_slice(&body).unwrap();
        assert_eq!(job.status, JobStatus::Error);
        assert_eq!(job.error.as_deref(), Some("Rejected: work queue is full"));
    }

    #[tokio::test]
    async fn test_get_job() {
        let app = test_app(OverflowPolicy::Spill, 10);
        let id = app.fixture.submit("https://youtu.be/abc");

        let (status, body) = send(&app.router, get(&format!("/job/{}", id))).await;
        assert_eq!(status, StatusCode::OK);
        let job: Job = serde_json::from_slice(&body).unwrap();
        assert_eq!(job.id, id);
    }

    #[tokio::test]
    async fn test_get_job_not_found() {
        let app = test_app(OverflowPolicy::Spill, 10);

        let (status, body) = send(&app.router, get(&format!("/job/{}", Uuid::new_v4()))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error_message(&body), "Job not found");

        let (status, body) = send(&app.router, get("/job/not-a-uuid")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error_message(&body), "Job not found");
    }

    #[tokio::test]
    async fn test_get_job_without_id() {
        let app = test_app(OverflowPolicy::Spill, 10);

        let (status, body) = send(&app.router, get("/job/")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_message(&body), "Job ID required");
    }

    #[tokio::test]
    async fn test_list_active_and_history() {
        let app = test_app(OverflowPolicy::Spill, 10);
        let pending = app.fixture.submit("https://youtu.be/pending");
        let finished = app.fixture.submit("https://youtu.be/finished");
        app.fixture.pipeline.run(finished).await;

        let (status, body) = send(&app.router, get("/jobs/active")).await;
        assert_eq!(status, StatusCode::OK);
        let active: Vec<Job> = serde_json::from_slice(&body).unwrap();
        let ids: Vec<Uuid> = active.iter().map(|job| job.id).collect();
        assert_eq!(ids, vec![finished, pending]);

        let (status, body) = send(&app.router, get("/jobs/history")).await;
        assert_eq!(status, StatusCode::OK);
        let history: Vec<Job> = serde_json::from_slice(&body).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, finished);
        assert_eq!(history[0].text, "hello world");
    }

    #[tokio::test]
    async fn test_empty_lists_are_arrays() {
        let app = test_app(OverflowPolicy::Spill, 10);

        let (_, body) = send(&app.router, get("/jobs/active")).await;
        assert_eq!(body, b"[]");

        let (_, body) = send(&app.router, get("/jobs/history")).await;
        assert_eq!(body, b"[]");
    }

    #[tokio::test]
    async fn test_serves_published_transcript() {
        let app = test_app(OverflowPolicy::Spill, 10);
        let id = app.fixture.submit("https://youtu.be/served");
        app.fixture.pipeline.run(id).await;
        let job = wait_for_terminal(&app.fixture.store, id).await;

        let (status, body) = send(&app.router, get(job.file.as_deref().unwrap())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"hello world");
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let app = test_app(OverflowPolicy::Spill, 10);

        let request = Request::builder()
            .method("OPTIONS")
            .uri("/job")
            .header("origin", "https://app.example")
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "content-type")
            .body(Body::empty())
            .unwrap();

        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "*"
        );
    }
}
