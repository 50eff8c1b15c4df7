//! HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::WatchError;
use crate::monitor::{MonitorStats, StartOutcome};
use crate::server::ServerState;
use crate::types::{Crn, UserId};

/// Status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub version: String,
    pub monitors: Vec<MonitorStats>,
}

#[derive(Debug, Deserialize)]
pub struct NameQuery {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CrnQuery {
    pub crn: Crn,
}

fn error_response(error: &str, e: WatchError) -> Response {
    let status = match &e {
        WatchError::UnknownUser(_) => StatusCode::NOT_FOUND,
        WatchError::CourseAlreadyTracked { .. } => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(json!({
            "error": error,
            "details": e.to_string()
        })),
    )
        .into_response()
}

pub async fn index_handler() -> impl IntoResponse {
    Json(json!({ "message": "Seat Watch is running" }))
}

pub async fn status_handler(State(state): State<ServerState>) -> impl IntoResponse {
    Json(StatusResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        monitors: state.registry.stats().await,
    })
}

pub async fn list_users_handler(State(state): State<ServerState>) -> Response {
    match state.registry.store().users() {
        Ok(users) => (StatusCode::OK, Json(users)).into_response(),
        Err(e) => error_response("Failed to list users", e),
    }
}

/// Register a user and start their monitor
pub async fn create_user_handler(
    State(state): State<ServerState>,
    Query(query): Query<NameQuery>,
) -> Response {
    let name = query.name.trim();
    if name.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "Invalid user name",
                "details": "name must not be empty"
            })),
        )
            .into_response();
    }

    match state.registry.register_user(name).await {
        Ok(record) => (
            StatusCode::CREATED,
            Json(json!({
                "uuid": record.id,
                "ntfy_topic": record.ntfy_topic
            })),
        )
            .into_response(),
        Err(e) => error_response("Failed to register user", e),
    }
}

pub async fn user_by_name_handler(
    State(state): State<ServerState>,
    Path(name): Path<String>,
) -> Response {
    match state.registry.store().find_user_by_name(&name) {
        Ok(Some(id)) => (StatusCode::OK, Json(json!({ "uuid": id }))).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "User not found",
                "details": format!("no user named {}", name)
            })),
        )
            .into_response(),
        Err(e) => error_response("Failed to look up user", e),
    }
}

/// Human-readable summaries of a user's tracked courses
pub async fn courses_handler(
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
) -> Response {
    let user = UserId::new(user_id);
    match state.registry.list_course_statuses(&user).await {
        Ok(statuses) => {
            let summaries: Vec<String> = statuses.iter().map(ToString::to_string).collect();
            (StatusCode::OK, Json(summaries)).into_response()
        }
        Err(e) => error_response("Failed to list courses", e),
    }
}

pub async fn add_course_handler(
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
    Query(query): Query<CrnQuery>,
) -> Response {
    let user = UserId::new(user_id);
    match state.registry.add_course(&user, &query.crn).await {
        Ok(()) => (
            StatusCode::CREATED,
            Json(json!({
                "user": user,
                "crn": query.crn
            })),
        )
            .into_response(),
        Err(e) => error_response("Failed to add course", e),
    }
}

pub async fn start_monitor_handler(
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
) -> Response {
    let user = UserId::new(user_id);
    match state.registry.start(&user).await {
        Ok(outcome) => {
            let status = match outcome {
                StartOutcome::Started => "started",
                StartOutcome::Reloaded => "reloaded",
            };
            (StatusCode::OK, Json(json!({ "status": status }))).into_response()
        }
        Err(e) => error_response("Failed to start monitor", e),
    }
}

pub async fn stop_monitor_handler(
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
) -> Response {
    let user = UserId::new(user_id);
    match state.registry.stop(&user).await {
        Ok(stopped) => (StatusCode::OK, Json(json!({ "stopped": stopped }))).into_response(),
        Err(e) => error_response("Failed to stop monitor", e),
    }
}
