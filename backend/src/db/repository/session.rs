//! Session repository trait.
//!
//! The welfare validator depends on exactly one query of this trait,
//! [`SessionRepository::find_sessions_for_horse_on_date`]; everything else
//! serves the booking workflow.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::error::RepositoryResult;
use crate::models::{HorseId, NewSession, Session, SessionId, SessionStatus, UserId};

/// Repository trait for booked ride sessions.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    // ==================== Health & Connection ====================

    /// Check if the store is reachable.
    ///
    /// # Returns
    /// - `Ok(true)` if the store is healthy
    /// - `Ok(false)` if it is unhealthy but no error occurred
    /// - `Err(RepositoryError)` if the check itself failed
    async fn health_check(&self) -> RepositoryResult<bool>;

    // ==================== Session CRUD ====================

    /// Store a new session in `Scheduled` state.
    async fn create_session(&self, session: NewSession) -> RepositoryResult<Session>;

    /// Retrieve a session by id.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the session doesn't exist
    async fn get_session(&self, id: SessionId) -> RepositoryResult<Session>;

    /// Replace a stored session.
    async fn update_session(&self, session: &Session) -> RepositoryResult<Session>;

    /// Delete a session.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the session doesn't exist
    async fn delete_session(&self, id: SessionId) -> RepositoryResult<()>;

    // ==================== Queries ====================

    /// All sessions of all horses on `date`, ordered by start time.
    async fn list_sessions_on_date(&self, date: NaiveDate) -> RepositoryResult<Vec<Session>>;

    /// Sessions of one horse on one calendar day.
    ///
    /// # Arguments
    /// * `horse_id` - The horse
    /// * `date` - The calendar day (time of day plays no role)
    /// * `status` - Only sessions in this status are returned
    /// * `exclude` - Session to leave out, typically the one being edited
    ///
    /// # Returns
    /// Matching sessions ordered by start time ascending.
    async fn find_sessions_for_horse_on_date(
        &self,
        horse_id: HorseId,
        date: NaiveDate,
        status: SessionStatus,
        exclude: Option<SessionId>,
    ) -> RepositoryResult<Vec<Session>>;

    /// Scheduled sessions of a rider on or after `from`, ordered by date then start.
    async fn list_upcoming_for_rider(
        &self,
        rider_id: UserId,
        from: NaiveDate,
    ) -> RepositoryResult<Vec<Session>>;

    /// Scheduled sessions of a trainer on or after `from`, ordered by date then start.
    async fn list_upcoming_for_trainer(
        &self,
        trainer_id: UserId,
        from: NaiveDate,
    ) -> RepositoryResult<Vec<Session>>;
}
