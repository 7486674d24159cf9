//! HTTP surface tests over the in-memory queue
//!
//! Exercises status codes and owner checks without a database or any
//! provider: handlers only touch the queue, the metadata mock, and the
//! dispatcher.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use patchwright_api::{AppState, routes};
use patchwright_meta_data::{MetaRepository, MockMetaRepository};
use patchwright_queue::{JobQueue, MemoryJobQueue, QueueName};
use patchwright_webhook::{WebhookDispatcher, sign};
use std::sync::Arc;
use tower::util::ServiceExt;

const SECRET: &str = "hook-secret";

fn test_app() -> (Router, Arc<MemoryJobQueue>) {
    let queue = Arc::new(MemoryJobQueue::default());
    let meta = Arc::new(MockMetaRepository::new());
    let dispatcher = Arc::new(WebhookDispatcher::new(
        Arc::clone(&queue) as Arc<dyn JobQueue>,
        meta as Arc<dyn MetaRepository>,
        100,
    ));

    let state = AppState::new(
        Arc::clone(&queue) as Arc<dyn JobQueue>,
        dispatcher,
        SECRET.to_string(),
    );
    (routes::create_router(state), queue)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn generation_submission_returns_accepted_with_status_url() {
    let (app, queue) = test_app();

    let response = app
        .oneshot(json_request(
            "POST",
            "/generation",
            serde_json::json!({
                "repoUrl": "https://github.com/octo/app",
                "task": "Rename foo to bar",
                "repoId": "octo/app",
                "userId": "alice",
                "username": "alice",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = body_json(response).await;
    let job_id = body["jobId"].as_str().unwrap();
    assert_eq!(
        body["statusUrl"].as_str().unwrap(),
        format!("/generation/{job_id}")
    );

    // The job landed on the generation queue with the right owner
    let job = queue.get_job(job_id).await.unwrap().unwrap();
    assert_eq!(job.queue, QueueName::Generation);
    assert_eq!(job.owner_user_id.as_deref(), Some("alice"));
}

#[tokio::test]
async fn empty_task_is_rejected_with_bad_request() {
    let (app, _) = test_app();

    let response = app
        .oneshot(json_request(
            "POST",
            "/generation",
            serde_json::json!({
                "repoUrl": "https://github.com/octo/app",
                "task": "   ",
                "repoId": "octo/app",
                "userId": "alice",
                "username": "alice",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn status_lookup_enforces_ownership() {
    let (app, queue) = test_app();

    let job_id = queue
        .enqueue(
            QueueName::Generation,
            serde_json::json!({}),
            patchwright_queue::EnqueueOptions {
                owner_user_id: Some("alice".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let owner = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/generation/{job_id}?userId=alice"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(owner.status(), StatusCode::OK);
    let body = body_json(owner).await;
    assert_eq!(body["state"], "waiting");

    let stranger = app
        .oneshot(
            Request::builder()
                .uri(format!("/generation/{job_id}?userId=mallory"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(stranger.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_job_is_not_found() {
    let (app, _) = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/generation/ghost?userId=alice")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn index_submission_enqueues_on_indexing_queue() {
    let (app, queue) = test_app();

    let response = app
        .oneshot(json_request(
            "POST",
            "/index",
            serde_json::json!({
                "repoUrl": "https://github.com/octo/app",
                "repoId": "octo/app",
                "userId": "alice",
                "username": "alice",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = body_json(response).await;
    let job = queue
        .get_job(body["jobId"].as_str().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(job.queue, QueueName::Indexing);
}

#[tokio::test]
async fn webhook_rejects_bad_signatures_with_forbidden() {
    let (app, _) = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhook")
                .header("x-github-event", "ping")
                .header("x-hub-signature-256", "sha256=deadbeef")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn webhook_acknowledges_unhandled_events() {
    let (app, _) = test_app();
    let body = b"{}".to_vec();
    let signature = sign(SECRET, &body);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhook")
                .header("x-github-event", "ping")
                .header("x-hub-signature-256", signature)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "event not handled");
}

#[tokio::test]
async fn signed_push_enqueues_indexing_job() {
    let (app, queue) = test_app();
    let push = serde_json::json!({
        "ref": "refs/heads/main",
        "before": "0000000000000000000000000000000000000000",
        "after": "abc123",
        "repository": {
            "id": 1,
            "name": "app",
            "full_name": "octo/app",
            "clone_url": "https://github.com/octo/app.git",
        },
        "pusher": {"name": "octocat"},
        "commits": [{"id": "c1", "added": ["src/a.ts"]}],
    });
    let body = serde_json::to_vec(&push).unwrap();
    let signature = sign(SECRET, &body);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhook")
                .header("x-github-event", "push")
                .header("x-hub-signature-256", signature)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "full indexing queued");

    let job = queue
        .get_job(body["jobId"].as_str().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(job.queue, QueueName::Indexing);
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let (app, _) = test_app();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
