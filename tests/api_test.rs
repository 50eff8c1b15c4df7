//! HTTP API tests

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use seat_watch::server::{router, ServerState};
use seat_watch::{
    ActivityJournal, CourseRef, Crn, MemoryUserStore, MonitorContext, Notifier, Snapshot, SnapshotFetcher,
    TaskRegistry, UserId, UserRecord,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

struct ClosedFetcher;

#[async_trait]
impl SnapshotFetcher for ClosedFetcher {
    async fn fetch(&self, _course: &CourseRef) -> seat_watch::Result<Snapshot> {
        Ok(Snapshot::sentinel())
    }

    async fn fetch_name(&self, course: &CourseRef) -> seat_watch::Result<String> {
        Ok(format!("Section {}", course.crn()))
    }
}

struct SilentNotifier;

#[async_trait]
impl Notifier for SilentNotifier {
    async fn send(&self, _user: &UserId, _message: &str) -> seat_watch::Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "silent"
    }
}

struct NoJournal;

impl ActivityJournal for NoJournal {
    fn record(&self, _user: &UserId, _message: &str) {}
}

fn app() -> (Router, Arc<TaskRegistry>) {
    let store = Arc::new(MemoryUserStore::default());
    store
        .insert(UserRecord {
            id: UserId::from("u-1"),
            name: "Eve".to_string(),
            ntfy_topic: Some("gt_registration_RXZl".to_string()),
            logfile: Some("eve_log.txt".to_string()),
            courses: vec![Crn::from("81234")],
        })
        .unwrap();

    let ctx = MonitorContext {
        store,
        fetcher: Arc::new(ClosedFetcher),
        notifier: Arc::new(SilentNotifier),
        journal: Arc::new(NoJournal),
        poll_interval: Duration::from_secs(10),
    };
    let registry = Arc::new(TaskRegistry::new(ctx));
    (router(ServerState { registry: registry.clone() }), registry)
}

async fn call(app: &Router, method: Method, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_index_and_status() {
    let (app, _) = app();

    let (status, body) = call(&app, Method::GET, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());

    let (status, body) = call(&app, Method::GET, "/api/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], seat_watch::VERSION);
    assert_eq!(body["monitors"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_register_and_look_up_user() {
    let (app, registry) = app();

    let (status, body) = call(&app, Method::POST, "/users?name=Finn").await;
    assert_eq!(status, StatusCode::CREATED);
    let uuid = body["uuid"].as_str().unwrap().to_string();
    assert_eq!(body["ntfy_topic"], "gt_registration_Rmlubg");
    assert!(registry.is_running(&UserId::new(uuid.clone())).await);

    let (status, body) = call(&app, Method::GET, "/users/by-name/Finn").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["uuid"], uuid.as_str());

    let (status, _) = call(&app, Method::GET, "/users/by-name/Nobody").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call(&app, Method::GET, "/users").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    registry.shutdown().await;
}

#[tokio::test]
async fn test_empty_name_is_rejected() {
    let (app, _) = app();
    let (status, body) = call(&app, Method::POST, "/users?name=%20").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid user name");
}

#[tokio::test]
async fn test_course_summaries() {
    let (app, _) = app();

    let (status, body) = call(&app, Method::GET, "/courses/u-1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!(["CRN 81234\nawaiting first poll\n"]));

    let (status, body) = call(&app, Method::GET, "/courses/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Failed to list courses");
    assert!(body["details"].as_str().unwrap().contains("missing"));
}

#[tokio::test]
async fn test_add_course_conflicts_and_unknown_user() {
    let (app, _) = app();

    let (status, body) = call(&app, Method::POST, "/users/u-1/courses?crn=80001").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["crn"], "80001");

    let (status, _) = call(&app, Method::POST, "/users/u-1/courses?crn=80001").await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(&app, Method::POST, "/users/nope/courses?crn=80001").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_monitor_start_and_stop() {
    let (app, registry) = app();

    let (status, body) = call(&app, Method::POST, "/users/u-1/monitor").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "started");

    let (_, body) = call(&app, Method::POST, "/users/u-1/monitor").await;
    assert_eq!(body["status"], "reloaded");

    let (status, body) = call(&app, Method::DELETE, "/users/u-1/monitor").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stopped"], true);
    assert!(registry.active_users().await.is_empty());

    let (_, body) = call(&app, Method::DELETE, "/users/u-1/monitor").await;
    assert_eq!(body["stopped"], false);

    let (status, _) = call(&app, Method::DELETE, "/users/ghost/monitor").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
