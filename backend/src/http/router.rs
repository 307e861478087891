//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - permissive for development, should be restricted in production
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Horses
        .route(
            "/horses",
            get(handlers::list_horses).post(handlers::create_horse),
        )
        .route(
            "/horses/{id}",
            get(handlers::get_horse)
                .put(handlers::update_horse)
                .delete(handlers::delete_horse),
        )
        // Users
        .route(
            "/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route("/users/riders", get(handlers::list_riders))
        .route("/users/trainers", get(handlers::list_trainers))
        .route("/users/role/{role}", get(handlers::list_users_with_role))
        .route(
            "/users/{id}",
            put(handlers::update_user).delete(handlers::delete_user),
        )
        // Sessions
        .route("/sessions", post(handlers::create_session))
        .route("/sessions/validate", post(handlers::validate_session))
        .route("/sessions/date/{date}", get(handlers::list_sessions_on_date))
        .route(
            "/sessions/{id}",
            put(handlers::update_session).delete(handlers::delete_session),
        )
        .route("/sessions/{id}/complete", post(handlers::complete_session))
        .route("/riders/{id}/sessions", get(handlers::rider_sessions))
        .route("/trainers/{id}/sessions", get(handlers::trainer_sessions))
        // Feeding
        .route("/feeding/date/{date}", get(handlers::list_feeding_tasks))
        .route(
            "/feeding/generate/{date}",
            post(handlers::generate_feeding_tasks),
        )
        .route("/feeding/{id}/complete", put(handlers::complete_feeding_task))
        .route(
            "/feeding/{id}/uncomplete",
            put(handlers::uncomplete_feeding_task),
        )
        // Job management
        .route("/jobs/{job_id}", get(handlers::get_job_status))
        .route("/jobs/{job_id}/logs", get(handlers::stream_job_logs));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
