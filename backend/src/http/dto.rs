//! Data Transfer Objects for the HTTP API.
//!
//! Request bodies that map one-to-one onto a service input reuse the
//! service type directly; the types here cover the rest.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub use crate::db::services::{HorseDraft, HorseUpdate, UserUpdate};
pub use crate::services::{
    BookingOutcome, BookingRequest, BookingUpdate, CompletionOutcome, ValidationResult,
};

use crate::models::{HorseId, NewUser, PaymentMethod, Role, SessionId, SkillLevel, UserId};
use crate::services::welfare::Candidate;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Version of the API
    pub version: String,
    /// Store connection status
    pub database: String,
}

/// Generic acknowledgement for deletions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Request body for `POST /v1/users`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub roles: BTreeSet<Role>,
    #[serde(default)]
    pub level: Option<SkillLevel>,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub subscription_hours: f64,
}

impl From<CreateUserRequest> for NewUser {
    fn from(req: CreateUserRequest) -> Self {
        NewUser {
            name: req.name,
            email: req.email,
            roles: req.roles,
            level: req.level,
            specialization: req.specialization,
            payment_method: req.payment_method,
            subscription_hours: req.subscription_hours,
        }
    }
}

/// Request body for `POST /v1/sessions/validate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateRequest {
    pub horse_id: HorseId,
    pub date: NaiveDate,
    pub start_time: crate::models::ClockTime,
    pub duration_minutes: u32,
    /// Session being edited, if any.
    #[serde(default)]
    pub exclude_session_id: Option<SessionId>,
    /// When given, a skill-level warning is added for this rider.
    #[serde(default)]
    pub rider_id: Option<UserId>,
}

impl ValidateRequest {
    pub fn candidate(&self) -> Candidate {
        Candidate {
            horse_id: self.horse_id,
            date: self.date,
            start_time: self.start_time,
            duration_minutes: self.duration_minutes,
            exclude: self.exclude_session_id,
        }
    }
}

/// Query parameters for upcoming-session listings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpcomingQuery {
    /// First day to include (default: today, UTC)
    #[serde(default)]
    pub from: Option<NaiveDate>,
}

/// Request body for `PUT /v1/feeding/{id}/complete`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CompleteFeedingRequest {
    #[serde(default)]
    pub completed_by: Option<String>,
}

/// Response for starting feeding generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationStartedResponse {
    /// Job ID for tracking the background run
    pub job_id: String,
    pub message: String,
}

/// Job status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub job_id: String,
    pub status: crate::services::JobStatus,
    pub logs: Vec<crate::services::job_tracker::LogEntry>,
    /// Result if completed
    pub result: Option<serde_json::Value>,
}
