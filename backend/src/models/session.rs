//! Booked ride sessions.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::horse::HorseId;
use super::time::{ClockTime, TimeRange};
use super::user::UserId;

crate::define_id_type!(i64, SessionId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    /// Booked and still consuming the horse's daily capacity.
    Scheduled,
    /// Historical; ignored by every welfare check.
    Completed,
}

/// A booked ride of one horse with one rider and one trainer.
///
/// `end_time` is stored, not derived on read: it is recomputed whenever the
/// start or duration changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub horse_id: HorseId,
    pub rider_id: UserId,
    pub trainer_id: UserId,
    pub date: NaiveDate,
    pub start_time: ClockTime,
    pub duration_minutes: u32,
    pub end_time: ClockTime,
    pub status: SessionStatus,
    pub price: Option<f64>,
    pub paid: bool,
    pub notes: Option<String>,
    pub feeding_done: bool,
}

impl Session {
    pub fn time_range(&self) -> TimeRange {
        TimeRange {
            start: self.start_time,
            end: self.end_time,
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.status == SessionStatus::Scheduled
    }
}

/// A session about to be stored; the repository assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSession {
    pub horse_id: HorseId,
    pub rider_id: UserId,
    pub trainer_id: UserId,
    pub date: NaiveDate,
    pub start_time: ClockTime,
    pub duration_minutes: u32,
    pub end_time: ClockTime,
    pub price: Option<f64>,
    pub paid: bool,
    pub notes: Option<String>,
}

impl NewSession {
    /// Attach an id, producing a freshly scheduled session.
    pub fn into_session(self, id: SessionId) -> Session {
        Session {
            id,
            horse_id: self.horse_id,
            rider_id: self.rider_id,
            trainer_id: self.trainer_id,
            date: self.date,
            start_time: self.start_time,
            duration_minutes: self.duration_minutes,
            end_time: self.end_time,
            status: SessionStatus::Scheduled,
            price: self.price,
            paid: self.paid,
            notes: self.notes,
            feeding_done: false,
        }
    }
}
