//! HTTP API
//!
//! Thin JSON surface over the task registry: user registration, course
//! tracking, monitor control and course summaries.

pub mod http;

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::monitor::TaskRegistry;

/// Shared server state
#[derive(Clone)]
pub struct ServerState {
    pub registry: Arc<TaskRegistry>,
}

/// Build the application router
pub fn router(state: ServerState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(http::index_handler))
        .route("/api/status", get(http::status_handler))
        .route("/users", get(http::list_users_handler).post(http::create_user_handler))
        .route("/users/by-name/{name}", get(http::user_by_name_handler))
        .route("/users/{user_id}/courses", post(http::add_course_handler))
        .route(
            "/users/{user_id}/monitor",
            post(http::start_monitor_handler).delete(http::stop_monitor_handler),
        )
        .route("/courses/{user_id}", get(http::courses_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the API until Ctrl+C
pub async fn start(host: &str, port: u16, registry: Arc<TaskRegistry>) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", host, port))?;

    let app = router(ServerState { registry });

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("     Seat Watch Server Starting");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();
    println!("🚀 Listening on http://{}", addr);
    println!();

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
        .context("Server error")?;

    Ok(())
}
