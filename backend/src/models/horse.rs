//! Horse records and their welfare limits.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

crate::define_id_type!(i64, HorseId);

/// Experience level shared by horses and riders.
///
/// Variants are declared from least to most demanding, so the derived
/// ordering ranks them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl SkillLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillLevel::Beginner => "BEGINNER",
            SkillLevel::Intermediate => "INTERMEDIATE",
            SkillLevel::Advanced => "ADVANCED",
        }
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SkillLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BEGINNER" => Ok(Self::Beginner),
            "INTERMEDIATE" => Ok(Self::Intermediate),
            "ADVANCED" => Ok(Self::Advanced),
            _ => Err(format!("Unknown skill level: {}", s)),
        }
    }
}

/// Daily workload cap and mandatory rest for one horse, in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkLimits {
    pub max_work_minutes_per_day: u32,
    pub required_rest_minutes: u32,
}

impl WorkLimits {
    /// Convert configured hours into minute limits.
    ///
    /// Fractions of a minute are rounded to the nearest minute. The daily cap
    /// must be positive and the rest period non-negative.
    pub fn from_hours(max_work_hours: f64, rest_hours: f64) -> Result<Self, String> {
        if !max_work_hours.is_finite() || max_work_hours <= 0.0 {
            return Err(format!(
                "max work hours must be positive, got {}",
                max_work_hours
            ));
        }
        if !rest_hours.is_finite() || rest_hours < 0.0 {
            return Err(format!("rest hours must not be negative, got {}", rest_hours));
        }

        let max_work_minutes_per_day = (max_work_hours * 60.0).round() as u32;
        if max_work_minutes_per_day == 0 {
            return Err("max work must be at least one minute".to_string());
        }

        Ok(Self {
            max_work_minutes_per_day,
            required_rest_minutes: (rest_hours * 60.0).round() as u32,
        })
    }
}

/// A stable horse. Horses are never deleted, only deactivated, so old
/// sessions keep a valid reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Horse {
    pub id: HorseId,
    pub name: String,
    pub breed: Option<String>,
    pub level: SkillLevel,
    pub max_work_minutes_per_day: u32,
    pub required_rest_minutes: u32,
    /// Meal to serve after training; drives feeding task creation.
    pub post_training_meal: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
}

impl Horse {
    pub fn limits(&self) -> WorkLimits {
        WorkLimits {
            max_work_minutes_per_day: self.max_work_minutes_per_day,
            required_rest_minutes: self.required_rest_minutes,
        }
    }
}

/// Fields for a horse that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewHorse {
    pub name: String,
    pub breed: Option<String>,
    pub level: SkillLevel,
    pub limits: WorkLimits,
    pub post_training_meal: Option<String>,
    pub notes: Option<String>,
}
