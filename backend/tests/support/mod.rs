//! Shared helpers for integration tests: scoped environment variables and
//! stable fixtures.
#![allow(dead_code)]

use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::collections::HashSet;
use std::sync::Mutex;

use stable_welfare::config::WelfareSettings;
use stable_welfare::db::repositories::LocalRepository;
use stable_welfare::db::services::{self, HorseDraft};
use stable_welfare::models::{
    ClockTime, Horse, NewUser, PaymentMethod, Role, SkillLevel, User,
};
use stable_welfare::services::BookingRequest;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK poisoned");
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 14).unwrap()
}

pub fn at(s: &str) -> ClockTime {
    s.parse().unwrap()
}

/// Horse with limits in hours and an optional post-training meal.
pub async fn horse(
    repo: &LocalRepository,
    name: &str,
    level: SkillLevel,
    max_work_hours: f64,
    rest_hours: f64,
    meal: Option<&str>,
) -> Horse {
    services::create_horse(
        repo,
        HorseDraft {
            name: name.to_string(),
            breed: None,
            level,
            max_work_hours: Some(max_work_hours),
            rest_hours: Some(rest_hours),
            post_training_meal: meal.map(str::to_string),
            notes: None,
        },
        &WelfareSettings::default(),
    )
    .await
    .unwrap()
}

pub async fn user(
    repo: &LocalRepository,
    email: &str,
    roles: &[Role],
    level: Option<SkillLevel>,
    payment_method: PaymentMethod,
    subscription_hours: f64,
) -> User {
    services::create_user(
        repo,
        NewUser {
            name: email.split('@').next().unwrap_or(email).to_string(),
            email: email.to_string(),
            roles: roles.iter().copied().collect::<BTreeSet<_>>(),
            level,
            specialization: None,
            payment_method,
            subscription_hours,
        },
    )
    .await
    .unwrap()
}

pub async fn rider(repo: &LocalRepository, email: &str, level: Option<SkillLevel>) -> User {
    user(repo, email, &[Role::Rider], level, PaymentMethod::PerSession, 0.0).await
}

pub async fn trainer(repo: &LocalRepository, email: &str) -> User {
    user(repo, email, &[Role::Trainer], None, PaymentMethod::PerSession, 0.0).await
}

/// A stable with one horse (4h/day, 1h rest, fed "Warm mash"), an
/// intermediate rider and a trainer.
pub struct Stable {
    pub repo: LocalRepository,
    pub horse: Horse,
    pub rider: User,
    pub trainer: User,
}

impl Stable {
    pub async fn new() -> Self {
        let repo = LocalRepository::new();
        let horse = horse(
            &repo,
            "Bella",
            SkillLevel::Intermediate,
            4.0,
            1.0,
            Some("Warm mash"),
        )
        .await;
        let rider = rider(&repo, "rider@example.com", Some(SkillLevel::Intermediate)).await;
        let trainer = trainer(&repo, "trainer@example.com").await;
        Self {
            repo,
            horse,
            rider,
            trainer,
        }
    }

    pub fn booking(&self, start: &str, duration_minutes: u32) -> BookingRequest {
        BookingRequest {
            horse_id: self.horse.id,
            rider_id: self.rider.id,
            trainer_id: self.trainer.id,
            date: day(),
            start_time: at(start),
            duration_minutes,
            price: Some(45.0),
            paid: false,
            notes: None,
        }
    }
}
