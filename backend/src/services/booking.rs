//! Booking workflow: create, edit, complete and cancel ride sessions.
//!
//! Every change to a scheduled session's horse, date or time slot goes
//! through [`welfare::validate`] first; hard errors reject the change with
//! the full error list. Skill-level mismatches are reported as warnings
//! only.

use chrono::NaiveDate;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::feeding;
use super::welfare::{self, Candidate, ValidationResult, WelfareError};
use crate::config::InfraErrorPolicy;
use crate::db::repository::{FullRepository, RepositoryError};
use crate::db::services as db_services;
use crate::models::{
    add_minutes, ClockTime, FeedingTask, Horse, HorseId, NewSession, PaymentMethod, Session,
    SessionId, SessionStatus, User, UserId,
};

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Invalid booking: {0}")]
    InvalidRequest(String),

    #[error("Welfare validation failed")]
    WelfareRejected(ValidationResult),

    #[error("Session {0} is already completed")]
    AlreadyCompleted(SessionId),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<WelfareError> for BookingError {
    fn from(err: WelfareError) -> Self {
        match err {
            WelfareError::InvalidCandidate(message) => BookingError::InvalidRequest(message),
            WelfareError::Repository(e) => BookingError::Repository(e),
        }
    }
}

/// A new booking as submitted by an administrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub horse_id: HorseId,
    pub rider_id: UserId,
    pub trainer_id: UserId,
    pub date: NaiveDate,
    pub start_time: ClockTime,
    pub duration_minutes: u32,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub paid: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial edit of a session; `None` leaves a field unchanged.
///
/// Status is not editable here: completion goes through
/// [`complete_booking`] so subscription hours are settled exactly once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookingUpdate {
    #[serde(default)]
    pub horse_id: Option<HorseId>,
    #[serde(default)]
    pub rider_id: Option<UserId>,
    #[serde(default)]
    pub trainer_id: Option<UserId>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub start_time: Option<ClockTime>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub paid: Option<bool>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl BookingUpdate {
    fn moves_slot(&self) -> bool {
        self.horse_id.is_some()
            || self.date.is_some()
            || self.start_time.is_some()
            || self.duration_minutes.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingOutcome {
    pub session: Session,
    /// Non-blocking advice, e.g. a rider less experienced than the horse.
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feeding_task: Option<FeedingTask>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionOutcome {
    pub session: Session,
    /// Hours taken from a subscription rider's balance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deducted_hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_hours: Option<f64>,
}

/// Warn when the rider's level ranks below the horse's. A rider without a
/// level ranks below every horse.
pub fn skill_mismatch_warning(horse: &Horse, rider: &User) -> Option<String> {
    if rider.level >= Some(horse.level) {
        return None;
    }
    let rider_level = rider
        .level
        .map(|l| l.to_string())
        .unwrap_or_else(|| "UNSET".to_string());
    Some(format!(
        "Level mismatch: Horse {} is {}, Rider {} is {}",
        horse.name, horse.level, rider.name, rider_level
    ))
}

async fn require_user<R: FullRepository + ?Sized>(
    repo: &R,
    id: UserId,
    what: &str,
) -> Result<User, BookingError> {
    repo.find_user_by_id(id)
        .await?
        .ok_or_else(|| BookingError::InvalidRequest(format!("{} {} does not exist", what, id)))
}

async fn ensure_valid<R: FullRepository + ?Sized>(
    repo: &R,
    candidate: &Candidate,
) -> Result<ValidationResult, BookingError> {
    let result = welfare::validate(repo, candidate).await?;
    if !result.valid {
        info!(
            "Rejected booking for horse {} on {} at {}: {:?}",
            candidate.horse_id, candidate.date, candidate.start_time, result.errors
        );
        return Err(BookingError::WelfareRejected(result));
    }
    Ok(result)
}

/// Validate and store a new session.
pub async fn create_booking<R: FullRepository + ?Sized>(
    repo: &R,
    request: BookingRequest,
) -> Result<BookingOutcome, BookingError> {
    let candidate = Candidate::new(
        request.horse_id,
        request.date,
        request.start_time,
        request.duration_minutes,
    );
    let validation = ensure_valid(repo, &candidate).await?;

    let rider = require_user(repo, request.rider_id, "Rider").await?;
    require_user(repo, request.trainer_id, "Trainer").await?;
    let horse = db_services::get_horse(repo, request.horse_id).await?;

    let session = repo
        .create_session(NewSession {
            horse_id: request.horse_id,
            rider_id: request.rider_id,
            trainer_id: request.trainer_id,
            date: request.date,
            start_time: request.start_time,
            duration_minutes: request.duration_minutes,
            end_time: candidate.end_time(),
            price: request.price,
            paid: request.paid,
            notes: request.notes,
        })
        .await?;
    info!(
        "Booked session {} for horse {} on {} {}",
        session.id,
        horse.name,
        session.date,
        session.time_range()
    );

    let feeding_task = feeding::create_task_for_session(repo, &horse, &session).await?;

    let mut warnings = validation.warnings;
    warnings.extend(skill_mismatch_warning(&horse, &rider));

    Ok(BookingOutcome {
        session,
        warnings,
        feeding_task,
    })
}

/// Apply a partial edit. A scheduled session whose horse, date or slot
/// changes is re-validated without counting its own previous state.
pub async fn update_booking<R: FullRepository + ?Sized>(
    repo: &R,
    id: SessionId,
    update: BookingUpdate,
) -> Result<BookingOutcome, BookingError> {
    let mut session = repo.get_session(id).await?;
    let revalidate = update.moves_slot() && session.is_scheduled();

    let start_time = update.start_time.unwrap_or(session.start_time);
    let duration_minutes = update.duration_minutes.unwrap_or(session.duration_minutes);
    if let Some(message) = welfare::slot_error(start_time, duration_minutes) {
        return Err(BookingError::InvalidRequest(message));
    }

    session.horse_id = update.horse_id.unwrap_or(session.horse_id);
    session.date = update.date.unwrap_or(session.date);
    session.start_time = start_time;
    session.duration_minutes = duration_minutes;
    session.end_time = add_minutes(start_time, duration_minutes);

    // Completed sessions skip the welfare rules but stay inside their day.
    if !revalidate && !session.end_time.is_within_day() {
        return Err(BookingError::InvalidRequest(format!(
            "Session {} would run past midnight",
            session.time_range()
        )));
    }

    let mut warnings = Vec::new();
    if revalidate {
        let candidate = Candidate::new(
            session.horse_id,
            session.date,
            session.start_time,
            session.duration_minutes,
        )
        .excluding(id);
        warnings = ensure_valid(repo, &candidate).await?.warnings;
    }

    if let Some(rider_id) = update.rider_id {
        require_user(repo, rider_id, "Rider").await?;
        session.rider_id = rider_id;
    }
    if let Some(trainer_id) = update.trainer_id {
        require_user(repo, trainer_id, "Trainer").await?;
        session.trainer_id = trainer_id;
    }
    if update.price.is_some() {
        session.price = update.price;
    }
    if let Some(paid) = update.paid {
        session.paid = paid;
    }
    if update.notes.is_some() {
        session.notes = update.notes;
    }

    let session = repo.update_session(&session).await?;
    info!("Updated session {} to {} {}", session.id, session.date, session.time_range());

    let horse = db_services::get_horse(repo, session.horse_id).await?;
    let feeding_task = feeding::sync_task_with_session(repo, &horse, &session).await?;
    if let Some(rider) = repo.find_user_by_id(session.rider_id).await? {
        warnings.extend(skill_mismatch_warning(&horse, &rider));
    }

    Ok(BookingOutcome {
        session,
        warnings,
        feeding_task,
    })
}

/// Mark a session completed, settling a subscription rider's hours.
pub async fn complete_booking<R: FullRepository + ?Sized>(
    repo: &R,
    id: SessionId,
) -> Result<CompletionOutcome, BookingError> {
    let mut session = repo.get_session(id).await?;
    if session.status == SessionStatus::Completed {
        return Err(BookingError::AlreadyCompleted(id));
    }

    session.status = SessionStatus::Completed;
    let session = repo.update_session(&session).await?;

    let mut outcome = CompletionOutcome {
        session,
        deducted_hours: None,
        remaining_hours: None,
    };

    if let Some(mut rider) = repo.find_user_by_id(outcome.session.rider_id).await? {
        if rider.payment_method == PaymentMethod::Subscription {
            let deducted = f64::from(outcome.session.duration_minutes) / 60.0;
            rider.subscription_hours = (rider.subscription_hours - deducted).max(0.0);
            let rider = repo.update_user(&rider).await?;
            info!(
                "Deducted {:.2}h from rider {}; {:.2}h remaining",
                deducted, rider.id, rider.subscription_hours
            );
            outcome.deducted_hours = Some(deducted);
            outcome.remaining_hours = Some(rider.subscription_hours);
        }
    }

    info!("Completed session {}", id);
    Ok(outcome)
}

/// Delete a session together with its feeding tasks.
pub async fn cancel_booking<R: FullRepository + ?Sized>(
    repo: &R,
    id: SessionId,
) -> Result<(), BookingError> {
    repo.get_session(id).await?;
    let removed = repo.delete_feeding_tasks_for_session(id).await?;
    repo.delete_session(id).await?;
    info!("Cancelled session {} ({} feeding tasks removed)", id, removed);
    Ok(())
}

/// Pre-submit check for a form: validation plus the skill-level warning.
///
/// When the store fails at any point of the check, `policy` decides the
/// outcome: `Block` returns the error, `Allow` reports the candidate as
/// valid with a warning saying the check did not run.
pub async fn advisory_check<R: FullRepository + ?Sized>(
    repo: &R,
    candidate: &Candidate,
    rider_id: Option<UserId>,
    policy: InfraErrorPolicy,
) -> Result<ValidationResult, BookingError> {
    match check_with_skill_warning(repo, candidate, rider_id).await {
        Ok(result) => Ok(result),
        Err(e) if e.is_infrastructure() && policy == InfraErrorPolicy::Allow => {
            warn!(
                "Welfare check for horse {} skipped after store failure: {}",
                candidate.horse_id, e
            );
            let mut result = ValidationResult::ok();
            result.add_warning(format!("Welfare check could not be completed: {}", e));
            Ok(result)
        }
        Err(e) => Err(e.into()),
    }
}

async fn check_with_skill_warning<R: FullRepository + ?Sized>(
    repo: &R,
    candidate: &Candidate,
    rider_id: Option<UserId>,
) -> Result<ValidationResult, WelfareError> {
    let mut result = welfare::validate(repo, candidate).await?;

    if let Some(rider_id) = rider_id {
        let horse = repo.find_horse_by_id(candidate.horse_id).await?;
        let rider = repo.find_user_by_id(rider_id).await?;
        if let (Some(horse), Some(rider)) = (horse, rider) {
            if let Some(warning) = skill_mismatch_warning(&horse, &rider) {
                result.add_warning(warning);
            }
        }
    }
    Ok(result)
}

pub async fn sessions_on_date<R: FullRepository + ?Sized>(
    repo: &R,
    date: NaiveDate,
) -> Result<Vec<Session>, BookingError> {
    Ok(repo.list_sessions_on_date(date).await?)
}

pub async fn upcoming_for_rider<R: FullRepository + ?Sized>(
    repo: &R,
    rider_id: UserId,
    from: NaiveDate,
) -> Result<Vec<Session>, BookingError> {
    Ok(repo.list_upcoming_for_rider(rider_id, from).await?)
}

pub async fn upcoming_for_trainer<R: FullRepository + ?Sized>(
    repo: &R,
    trainer_id: UserId,
    from: NaiveDate,
) -> Result<Vec<Session>, BookingError> {
    Ok(repo.list_upcoming_for_trainer(trainer_id, from).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HorseId, SkillLevel};
    use std::collections::BTreeSet;

    fn horse(level: SkillLevel) -> Horse {
        Horse {
            id: HorseId::new(1),
            name: "Storm".to_string(),
            breed: None,
            level,
            max_work_minutes_per_day: 240,
            required_rest_minutes: 60,
            post_training_meal: None,
            notes: None,
            is_active: true,
        }
    }

    fn rider(level: Option<SkillLevel>) -> User {
        User {
            id: UserId::new(5),
            name: "Lea".to_string(),
            email: "lea@example.com".to_string(),
            roles: BTreeSet::new(),
            level,
            specialization: None,
            payment_method: PaymentMethod::PerSession,
            subscription_hours: 0.0,
        }
    }

    #[test]
    fn test_skill_warning_only_when_rider_ranks_below() {
        let advanced = horse(SkillLevel::Advanced);
        assert_eq!(
            skill_mismatch_warning(&advanced, &rider(Some(SkillLevel::Beginner))).as_deref(),
            Some("Level mismatch: Horse Storm is ADVANCED, Rider Lea is BEGINNER")
        );
        assert!(skill_mismatch_warning(&advanced, &rider(Some(SkillLevel::Advanced))).is_none());

        let beginner = horse(SkillLevel::Beginner);
        assert!(skill_mismatch_warning(&beginner, &rider(Some(SkillLevel::Advanced))).is_none());
        assert!(skill_mismatch_warning(&beginner, &rider(None))
            .unwrap()
            .ends_with("is UNSET"));
    }

    #[test]
    fn test_update_moves_slot() {
        assert!(!BookingUpdate::default().moves_slot());
        assert!(!BookingUpdate {
            notes: Some("bring boots".to_string()),
            ..Default::default()
        }
        .moves_slot());
        assert!(BookingUpdate {
            duration_minutes: Some(45),
            ..Default::default()
        }
        .moves_slot());
    }

    #[test]
    fn test_welfare_error_conversion() {
        let err: BookingError = WelfareError::InvalidCandidate("bad".to_string()).into();
        assert!(matches!(err, BookingError::InvalidRequest(_)));

        let err: BookingError = WelfareError::Repository(RepositoryError::connection("down")).into();
        assert!(matches!(err, BookingError::Repository(_)));
    }
}
