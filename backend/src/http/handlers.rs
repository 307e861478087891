//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! service layer for business logic.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use chrono::NaiveDate;
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;

use super::dto::{
    BookingOutcome, BookingRequest, BookingUpdate, CompleteFeedingRequest, CompletionOutcome,
    CreateUserRequest, GenerationStartedResponse, HealthResponse, HorseDraft, HorseUpdate,
    JobStatusResponse, MessageResponse, UpcomingQuery, UserUpdate, ValidateRequest,
    ValidationResult,
};
use super::error::AppError;
use super::state::AppState;
use crate::db::services as db_services;
use crate::models::{FeedingTask, FeedingTaskId, Horse, HorseId, Role, Session, SessionId, User, UserId};
use crate::services::job_tracker::JobStatus;
use crate::services::{booking, feeding};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

type Created<T> = Result<(StatusCode, Json<T>), AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and the store is reachable.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match db_services::health_check(state.repository.as_ref()).await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Horses
// =============================================================================

/// GET /v1/horses
pub async fn list_horses(State(state): State<AppState>) -> HandlerResult<Vec<Horse>> {
    Ok(Json(db_services::list_horses(state.repository.as_ref()).await?))
}

/// POST /v1/horses
pub async fn create_horse(
    State(state): State<AppState>,
    Json(draft): Json<HorseDraft>,
) -> Created<Horse> {
    let horse = db_services::create_horse(state.repository.as_ref(), draft, &state.welfare).await?;
    Ok((StatusCode::CREATED, Json(horse)))
}

/// GET /v1/horses/{id}
pub async fn get_horse(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<Horse> {
    Ok(Json(
        db_services::get_horse(state.repository.as_ref(), HorseId::new(id)).await?,
    ))
}

/// PUT /v1/horses/{id}
pub async fn update_horse(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<HorseUpdate>,
) -> HandlerResult<Horse> {
    Ok(Json(
        db_services::update_horse(state.repository.as_ref(), HorseId::new(id), update).await?,
    ))
}

/// DELETE /v1/horses/{id}
///
/// Deactivates the horse; its sessions keep referring to it.
pub async fn delete_horse(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<MessageResponse> {
    let horse = db_services::deactivate_horse(state.repository.as_ref(), HorseId::new(id)).await?;
    Ok(Json(MessageResponse {
        message: format!("Horse {} deactivated", horse.id),
    }))
}

// =============================================================================
// Users
// =============================================================================

/// GET /v1/users
pub async fn list_users(State(state): State<AppState>) -> HandlerResult<Vec<User>> {
    Ok(Json(db_services::list_users(state.repository.as_ref()).await?))
}

/// POST /v1/users
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Created<User> {
    let user = db_services::create_user(state.repository.as_ref(), request.into()).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// PUT /v1/users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<UserUpdate>,
) -> HandlerResult<User> {
    Ok(Json(
        db_services::update_user(state.repository.as_ref(), UserId::new(id), update).await?,
    ))
}

/// DELETE /v1/users/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<MessageResponse> {
    db_services::delete_user(state.repository.as_ref(), UserId::new(id)).await?;
    Ok(Json(MessageResponse {
        message: format!("User {} deleted", id),
    }))
}

/// GET /v1/users/role/{role}
pub async fn list_users_with_role(
    State(state): State<AppState>,
    Path(role): Path<String>,
) -> HandlerResult<Vec<User>> {
    let role: Role = role.parse().map_err(AppError::BadRequest)?;
    Ok(Json(
        db_services::list_users_with_role(state.repository.as_ref(), role).await?,
    ))
}

/// GET /v1/users/riders
pub async fn list_riders(State(state): State<AppState>) -> HandlerResult<Vec<User>> {
    Ok(Json(
        db_services::list_users_with_role(state.repository.as_ref(), Role::Rider).await?,
    ))
}

/// GET /v1/users/trainers
pub async fn list_trainers(State(state): State<AppState>) -> HandlerResult<Vec<User>> {
    Ok(Json(
        db_services::list_users_with_role(state.repository.as_ref(), Role::Trainer).await?,
    ))
}

// =============================================================================
// Sessions
// =============================================================================

/// POST /v1/sessions
///
/// Book a session. Welfare violations are returned as 422 with the full list.
pub async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<BookingRequest>,
) -> Created<BookingOutcome> {
    let outcome = booking::create_booking(state.repository.as_ref(), request).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// POST /v1/sessions/validate
///
/// Advisory check before submitting a booking form.
pub async fn validate_session(
    State(state): State<AppState>,
    Json(request): Json<ValidateRequest>,
) -> HandlerResult<ValidationResult> {
    let result = booking::advisory_check(
        state.repository.as_ref(),
        &request.candidate(),
        request.rider_id,
        state.welfare.on_infra_error,
    )
    .await?;
    Ok(Json(result))
}

/// GET /v1/sessions/date/{date}
pub async fn list_sessions_on_date(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
) -> HandlerResult<Vec<Session>> {
    Ok(Json(
        booking::sessions_on_date(state.repository.as_ref(), date).await?,
    ))
}

/// PUT /v1/sessions/{id}
pub async fn update_session(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<BookingUpdate>,
) -> HandlerResult<BookingOutcome> {
    Ok(Json(
        booking::update_booking(state.repository.as_ref(), SessionId::new(id), update).await?,
    ))
}

/// DELETE /v1/sessions/{id}
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<MessageResponse> {
    booking::cancel_booking(state.repository.as_ref(), SessionId::new(id)).await?;
    Ok(Json(MessageResponse {
        message: format!("Session {} deleted", id),
    }))
}

/// POST /v1/sessions/{id}/complete
pub async fn complete_session(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<CompletionOutcome> {
    Ok(Json(
        booking::complete_booking(state.repository.as_ref(), SessionId::new(id)).await?,
    ))
}

/// GET /v1/riders/{id}/sessions
pub async fn rider_sessions(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<UpcomingQuery>,
) -> HandlerResult<Vec<Session>> {
    let from = query.from.unwrap_or_else(|| chrono::Utc::now().date_naive());
    Ok(Json(
        booking::upcoming_for_rider(state.repository.as_ref(), UserId::new(id), from).await?,
    ))
}

/// GET /v1/trainers/{id}/sessions
pub async fn trainer_sessions(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<UpcomingQuery>,
) -> HandlerResult<Vec<Session>> {
    let from = query.from.unwrap_or_else(|| chrono::Utc::now().date_naive());
    Ok(Json(
        booking::upcoming_for_trainer(state.repository.as_ref(), UserId::new(id), from).await?,
    ))
}

// =============================================================================
// Feeding
// =============================================================================

/// GET /v1/feeding/date/{date}
pub async fn list_feeding_tasks(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
) -> HandlerResult<Vec<FeedingTask>> {
    Ok(Json(
        feeding::list_feeding_tasks(state.repository.as_ref(), date).await?,
    ))
}

/// POST /v1/feeding/generate/{date}
///
/// Start feeding task generation in the background. Returns a job ID for tracking progress.
pub async fn generate_feeding_tasks(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
) -> Result<(StatusCode, Json<GenerationStartedResponse>), AppError> {
    let job_id = state.job_tracker.create_job();
    let response_job_id = job_id.clone();

    let tracker = state.job_tracker.clone();
    let repo = state.repository.clone();
    tokio::spawn(async move {
        let _ = feeding::run_generation_job(job_id, tracker, repo, date).await;
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(GenerationStartedResponse {
            job_id: response_job_id.clone(),
            message: format!(
                "Feeding generation started. Track progress at /v1/jobs/{}/logs",
                response_job_id
            ),
        }),
    ))
}

/// PUT /v1/feeding/{id}/complete
pub async fn complete_feeding_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Bytes,
) -> HandlerResult<FeedingTask> {
    // The body is optional: an empty PUT completes without a name.
    let completed_by = if body.is_empty() {
        None
    } else {
        serde_json::from_slice::<CompleteFeedingRequest>(&body)
            .map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e)))?
            .completed_by
    };
    Ok(Json(
        feeding::complete_feeding_task(
            state.repository.as_ref(),
            FeedingTaskId::new(id),
            completed_by,
        )
        .await?,
    ))
}

/// PUT /v1/feeding/{id}/uncomplete
pub async fn uncomplete_feeding_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<FeedingTask> {
    Ok(Json(
        feeding::uncomplete_feeding_task(state.repository.as_ref(), FeedingTaskId::new(id)).await?,
    ))
}

// =============================================================================
// Async Job Management
// =============================================================================

/// GET /v1/jobs/{job_id}
///
/// Get the current status and logs of a background job.
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> HandlerResult<JobStatusResponse> {
    let job = state
        .job_tracker
        .get_job(&job_id)
        .ok_or_else(|| AppError::NotFound(format!("Job {} not found", job_id)))?;

    Ok(Json(JobStatusResponse {
        job_id: job.job_id,
        status: job.status,
        logs: job.logs,
        result: job.result,
    }))
}

/// GET /v1/jobs/{job_id}/logs
///
/// Stream job logs via Server-Sent Events (SSE).
pub async fn stream_job_logs(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    if state.job_tracker.get_job(&job_id).is_none() {
        return Err(AppError::NotFound(format!("Job {} not found", job_id)));
    }

    let tracker = state.job_tracker.clone();
    let stream = async_stream::stream! {
        let mut sent = 0;
        loop {
            let logs = tracker.get_logs(&job_id);
            for entry in logs.iter().skip(sent) {
                let data = serde_json::to_string(entry).unwrap_or_default();
                yield Ok(Event::default().data(data));
            }
            sent = logs.len();

            match tracker.get_job(&job_id) {
                Some(job) if job.status != JobStatus::Running => {
                    let final_event = serde_json::json!({
                        "status": job.status,
                        "result": job.result,
                    });
                    yield Ok(Event::default()
                        .event("complete")
                        .data(serde_json::to_string(&final_event).unwrap_or_default()));
                    break;
                }
                Some(_) => {}
                None => break,
            }

            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(1))
            .text("keep-alive"),
    ))
}
