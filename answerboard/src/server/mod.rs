// Server module - HTTP server setup and routing
pub mod actor;
pub mod handlers;
pub mod models;
pub mod state;

use std::net::SocketAddr;

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use axum::routing::{delete, get, post};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use self::actor::ACTOR_HEADER;
use self::state::AppState;
use crate::errors::ServerError;

/// Create the Axum application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/questions", post(handlers::create_question))
        .route("/questions/:question_id", get(handlers::get_question))
        .route("/questions/:question_id/answers", post(handlers::post_answer))
        .route("/questions/:question_id/vote", post(handlers::vote_question))
        .route(
            "/questions/:question_id/answers/:answer_id/accept",
            post(handlers::accept_answer).delete(handlers::unaccept_answer),
        )
        .route("/answers/:answer_id", delete(handlers::delete_answer))
        .route("/answers/:answer_id/vote", post(handlers::vote_answer))
        .route("/notifications", get(handlers::list_notifications))
        .route(
            "/notifications/:notification_id/read",
            post(handlers::mark_notification_read),
        )
        .layer(create_cors_layer())
        .with_state(state)
}

/// Create CORS layer for local frontends
pub fn create_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://localhost:5173"), // Vite default
            HeaderValue::from_static("http://127.0.0.1:3000"),
            HeaderValue::from_static("http://127.0.0.1:5173"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(ACTOR_HEADER)])
}

/// Run the server on the specified address until Ctrl+C or SIGTERM
pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), ServerError> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
