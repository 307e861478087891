//! Welfare-constrained booking validation.
//!
//! Decides whether a proposed ride may be booked for a horse given its daily
//! workload cap, its mandatory rest after long stretches of work, and the
//! rule that a horse cannot be in two sessions at once.
//!
//! Rule violations are returned as data in a [`ValidationResult`]; only
//! store failures surface as [`WelfareError`]. All checks run on every call
//! (except when the horse does not exist) so the caller can show every
//! problem at once.
//!
//! Validation reads the store and never writes. Two concurrent bookings for
//! the same horse and day can both pass and both be committed; nothing here
//! serializes them.

use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::db::repository::{HorseRepository, RepositoryError, SessionRepository};
use crate::models::{
    add_minutes, minutes_between, ClockTime, Horse, HorseId, Session, SessionId, SessionStatus,
    TimeRange, MINUTES_PER_DAY,
};

/// Work without a qualifying break, in minutes, after which the horse's
/// required rest becomes mandatory.
pub const CONTINUOUS_WORK_THRESHOLD_MINUTES: u32 = 120;

/// A proposed, not yet stored, session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub horse_id: HorseId,
    pub date: NaiveDate,
    pub start_time: ClockTime,
    pub duration_minutes: u32,
    /// Session being edited; it must not count against itself.
    #[serde(default)]
    pub exclude: Option<SessionId>,
}

impl Candidate {
    pub fn new(
        horse_id: HorseId,
        date: NaiveDate,
        start_time: ClockTime,
        duration_minutes: u32,
    ) -> Self {
        Self {
            horse_id,
            date,
            start_time,
            duration_minutes,
            exclude: None,
        }
    }

    pub fn excluding(mut self, session_id: SessionId) -> Self {
        self.exclude = Some(session_id);
        self
    }

    pub fn end_time(&self) -> ClockTime {
        add_minutes(self.start_time, self.duration_minutes)
    }

    pub fn time_range(&self) -> TimeRange {
        TimeRange::starting_at(self.start_time, self.duration_minutes)
    }
}

/// Outcome of a validation: `valid` is false exactly when `errors` is
/// non-empty. Warnings never affect validity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::ok()
    }
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn from_violations(violations: &[Violation]) -> Self {
        let errors: Vec<String> = violations.iter().map(|v| v.to_string()).collect();
        Self {
            valid: errors.is_empty(),
            errors,
            warnings: Vec::new(),
        }
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}

/// A broken welfare rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    HorseNotFound,
    DailyLimitExceeded {
        existing_minutes: u32,
        new_minutes: u32,
        max_minutes: u32,
    },
    Overlap {
        candidate: TimeRange,
        existing: TimeRange,
    },
    InsufficientRest {
        required_minutes: u32,
        break_minutes: i64,
    },
    /// Sessions must end by 24:00 on their own date.
    PastMidnight { range: TimeRange },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::HorseNotFound => f.write_str("Horse not found"),
            Violation::DailyLimitExceeded {
                existing_minutes,
                new_minutes,
                max_minutes,
            } => write!(
                f,
                "Horse would exceed daily work limit. Current: {}min, New: {}min, Max: {}min",
                existing_minutes, new_minutes, max_minutes
            ),
            Violation::Overlap {
                candidate,
                existing,
            } => write!(
                f,
                "Session {} overlaps existing session {}",
                candidate, existing
            ),
            Violation::InsufficientRest {
                required_minutes,
                break_minutes,
            } => write!(
                f,
                "Horse needs {}min rest after {}min of continuous work. Only {}min break detected.",
                required_minutes, CONTINUOUS_WORK_THRESHOLD_MINUTES, break_minutes
            ),
            Violation::PastMidnight { range } => {
                write!(f, "Session {} would run past midnight", range)
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WelfareError {
    #[error("Invalid candidate: {0}")]
    InvalidCandidate(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl WelfareError {
    /// True when the failure came from the store rather than the request.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, WelfareError::Repository(e) if e.is_infrastructure())
    }
}

/// Check a candidate against the rules, using the horse's other scheduled
/// sessions on the candidate's date.
pub async fn validate<R>(repo: &R, candidate: &Candidate) -> Result<ValidationResult, WelfareError>
where
    R: HorseRepository + SessionRepository + ?Sized,
{
    check_preconditions(candidate)?;

    let Some(horse) = repo.find_horse_by_id(candidate.horse_id).await? else {
        debug!("Welfare check: horse {} not found", candidate.horse_id);
        return Ok(ValidationResult::from_violations(&[Violation::HorseNotFound]));
    };

    let existing = repo
        .find_sessions_for_horse_on_date(
            candidate.horse_id,
            candidate.date,
            SessionStatus::Scheduled,
            candidate.exclude,
        )
        .await?;

    let violations = evaluate(&horse, &existing, candidate);
    debug!(
        "Welfare check for horse {} on {} at {} ({}min): {} existing sessions, {} violations",
        horse.id,
        candidate.date,
        candidate.start_time,
        candidate.duration_minutes,
        existing.len(),
        violations.len()
    );
    Ok(ValidationResult::from_violations(&violations))
}

fn check_preconditions(candidate: &Candidate) -> Result<(), WelfareError> {
    match slot_error(candidate.start_time, candidate.duration_minutes) {
        Some(message) => Err(WelfareError::InvalidCandidate(message)),
        None => Ok(()),
    }
}

/// Describe why no day could hold a slot: empty, starting at or after
/// 24:00, or longer than a whole day.
pub(crate) fn slot_error(start_time: ClockTime, duration_minutes: u32) -> Option<String> {
    if duration_minutes == 0 {
        return Some("duration must be a positive number of minutes".to_string());
    }
    if duration_minutes > MINUTES_PER_DAY {
        return Some(format!(
            "duration {}min is longer than a day ({}min)",
            duration_minutes, MINUTES_PER_DAY
        ));
    }
    if start_time >= ClockTime::END_OF_DAY {
        return Some(format!("start time {} is outside 00:00-23:59", start_time));
    }
    None
}

/// Run every check for `candidate` against `existing`.
///
/// `existing` must already be the horse's scheduled sessions on the
/// candidate's date, without the excluded session.
pub fn evaluate(horse: &Horse, existing: &[Session], candidate: &Candidate) -> Vec<Violation> {
    let mut violations = Vec::new();

    check_daily_limit(horse, existing, candidate, &mut violations);

    let candidate_range = candidate.time_range();
    if !candidate_range.end.is_within_day() {
        violations.push(Violation::PastMidnight {
            range: candidate_range,
        });
    }

    if let Some(clash) = existing
        .iter()
        .map(Session::time_range)
        .find(|range| candidate_range.overlaps(range))
    {
        violations.push(Violation::Overlap {
            candidate: candidate_range,
            existing: clash,
        });
    }

    check_rest(horse, existing, candidate, &mut violations);
    violations
}

fn check_daily_limit(
    horse: &Horse,
    existing: &[Session],
    candidate: &Candidate,
    violations: &mut Vec<Violation>,
) {
    let existing_minutes = existing
        .iter()
        .fold(0u32, |total, s| total.saturating_add(s.duration_minutes));
    let new_total = existing_minutes.saturating_add(candidate.duration_minutes);
    if new_total > horse.max_work_minutes_per_day {
        violations.push(Violation::DailyLimitExceeded {
            existing_minutes,
            new_minutes: candidate.duration_minutes,
            max_minutes: horse.max_work_minutes_per_day,
        });
    }
}

/// Walk the day's sessions in start order, tracking work done since the last
/// break that met the horse's required rest.
fn check_rest(
    horse: &Horse,
    existing: &[Session],
    candidate: &Candidate,
    violations: &mut Vec<Violation>,
) {
    let mut day: Vec<(ClockTime, u32)> = existing
        .iter()
        .map(|s| (s.start_time, s.duration_minutes))
        .collect();
    day.push((candidate.start_time, candidate.duration_minutes));
    // Stable: on equal starts the candidate stays after existing sessions.
    day.sort_by_key(|(start, _)| *start);

    let required = horse.required_rest_minutes;
    let mut consecutive_minutes: u32 = 0;
    let mut last_end: Option<ClockTime> = None;

    for (start, duration) in day {
        if let Some(end) = last_end {
            let break_minutes = minutes_between(end, start);
            if break_minutes < i64::from(required)
                && consecutive_minutes >= CONTINUOUS_WORK_THRESHOLD_MINUTES
            {
                violations.push(Violation::InsufficientRest {
                    required_minutes: required,
                    break_minutes,
                });
            }
            if break_minutes >= i64::from(required) {
                consecutive_minutes = 0;
            }
        }
        consecutive_minutes = consecutive_minutes.saturating_add(duration);
        last_end = Some(add_minutes(start, duration));
    }
}
