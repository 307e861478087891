//! Post-training feeding reminders for stable hands.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::session::SessionId;
use super::time::ClockTime;

crate::define_id_type!(i64, FeedingTaskId);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedingTask {
    pub id: FeedingTaskId,
    pub session_id: SessionId,
    pub horse_name: String,
    /// When the ride ends, i.e. when the meal is due.
    pub end_time: ClockTime,
    pub meal_description: String,
    pub date: NaiveDate,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFeedingTask {
    pub session_id: SessionId,
    pub horse_name: String,
    pub end_time: ClockTime,
    pub meal_description: String,
    pub date: NaiveDate,
}

impl NewFeedingTask {
    pub fn into_task(self, id: FeedingTaskId) -> FeedingTask {
        FeedingTask {
            id,
            session_id: self.session_id,
            horse_name: self.horse_name,
            end_time: self.end_time,
            meal_description: self.meal_description,
            date: self.date,
            completed: false,
            completed_at: None,
            completed_by: None,
        }
    }
}
