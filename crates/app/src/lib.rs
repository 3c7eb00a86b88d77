//! HTTP surface for the study companion.
//!
//! Every route except `/health` requires the caller's id in the `x-user-id`
//! header; the upstream auth gateway is trusted to set it. Records owned by
//! someone else are reported as not found.

#![forbid(unsafe_code)]

use std::{io, time::Duration};

use axum::{
    Router,
    http::{
        HeaderName, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{delete, get, patch, post},
};
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use routes::{ai, analytics, health, profile, quizzes, sessions, subjects, topics};
pub use state::AppState;

/// Build the application router over shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            HeaderName::from_static(auth::USER_HEADER),
        ])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/profile",
            get(profile::get_profile_handler)
                .post(profile::create_profile_handler)
                .patch(profile::update_profile_handler),
        )
        .route(
            "/subjects",
            get(subjects::list_subjects_handler).post(subjects::create_subject_handler),
        )
        .route("/subjects/overview", get(subjects::overview_handler))
        .route(
            "/subjects/{id}",
            patch(subjects::update_subject_handler).delete(subjects::delete_subject_handler),
        )
        .route("/subjects/{id}/progress", get(subjects::progress_handler))
        .route(
            "/subjects/{id}/topics",
            get(topics::list_topics_handler).post(topics::create_topic_handler),
        )
        .route(
            "/subjects/{id}/quizzes",
            get(quizzes::list_quizzes_handler).post(quizzes::save_quiz_handler),
        )
        .route(
            "/topics/{id}/progress",
            patch(topics::update_progress_handler),
        )
        .route("/topics/{id}", delete(topics::delete_topic_handler))
        .route("/sessions", post(sessions::start_session_handler))
        .route("/sessions/active", get(sessions::active_session_handler))
        .route("/sessions/recent", get(sessions::recent_sessions_handler))
        .route(
            "/sessions/{id}/activity",
            patch(sessions::update_activity_handler),
        )
        .route("/sessions/{id}/end", post(sessions::end_session_handler))
        .route("/analytics", get(analytics::analytics_handler))
        .route("/quizzes/{id}", get(quizzes::get_quiz_handler))
        .route(
            "/quizzes/{id}/attempts",
            get(quizzes::list_attempts_handler).post(quizzes::submit_attempt_handler),
        )
        .route("/ai/explain", post(ai::explain_handler))
        .route("/ai/quiz", post(ai::quiz_handler))
        .route("/ai/chat", post(ai::chat_handler))
        .route("/ai/summarize", post(ai::summarize_handler))
        .route("/ai/plan", post(ai::plan_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serve until Ctrl+C or SIGTERM.
///
/// # Errors
///
/// Returns an I/O error if the listener fails.
pub async fn serve(listener: TcpListener, state: AppState) -> io::Result<()> {
    if let Ok(address) = listener.local_addr() {
        info!("Server running on {address}");
    }

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down");
        } else {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
