//! Feeding task repository trait.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::error::RepositoryResult;
use crate::models::{FeedingTask, FeedingTaskId, NewFeedingTask, SessionId};

#[async_trait]
pub trait FeedingRepository: Send + Sync {
    async fn create_feeding_task(&self, task: NewFeedingTask) -> RepositoryResult<FeedingTask>;

    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the task doesn't exist
    async fn get_feeding_task(&self, id: FeedingTaskId) -> RepositoryResult<FeedingTask>;

    /// The feeding task generated for a session, if any.
    async fn find_feeding_task_for_session(
        &self,
        session_id: SessionId,
    ) -> RepositoryResult<Option<FeedingTask>>;

    /// Tasks due on `date`, ordered by end time.
    async fn list_feeding_tasks_on_date(
        &self,
        date: NaiveDate,
    ) -> RepositoryResult<Vec<FeedingTask>>;

    async fn update_feeding_task(&self, task: &FeedingTask) -> RepositoryResult<FeedingTask>;

    /// Remove every task attached to a session.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of tasks deleted
    async fn delete_feeding_tasks_for_session(
        &self,
        session_id: SessionId,
    ) -> RepositoryResult<usize>;
}
