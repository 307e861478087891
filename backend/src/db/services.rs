//! Plain CRUD services for horses and users.
//!
//! These functions work with any repository implementation and add the
//! input checks the store itself does not enforce. Booking and feeding
//! workflows live in [`crate::services`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::repository::{
    ErrorContext, HorseRepository, RepositoryError, RepositoryResult, SessionRepository,
    UserRepository,
};
use crate::config::WelfareSettings;
use crate::models::{
    Horse, HorseId, NewHorse, NewUser, PaymentMethod, Role, SkillLevel, User, UserId, WorkLimits,
};

/// Check that the store is reachable.
pub async fn health_check<R: SessionRepository + ?Sized>(repo: &R) -> RepositoryResult<bool> {
    repo.health_check().await
}

// =============================================================================
// Horses
// =============================================================================

/// Horse fields as submitted by an administrator. Limits are in hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorseDraft {
    pub name: String,
    #[serde(default)]
    pub breed: Option<String>,
    pub level: SkillLevel,
    #[serde(default)]
    pub max_work_hours: Option<f64>,
    #[serde(default)]
    pub rest_hours: Option<f64>,
    #[serde(default)]
    pub post_training_meal: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial horse update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HorseUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub breed: Option<String>,
    #[serde(default)]
    pub level: Option<SkillLevel>,
    #[serde(default)]
    pub max_work_hours: Option<f64>,
    #[serde(default)]
    pub rest_hours: Option<f64>,
    #[serde(default)]
    pub post_training_meal: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

fn required_name(name: &str, entity: &str) -> RepositoryResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(RepositoryError::validation(format!("{} name is required", entity)));
    }
    Ok(trimmed.to_string())
}

fn limits_from_hours(max_work_hours: f64, rest_hours: f64) -> RepositoryResult<WorkLimits> {
    WorkLimits::from_hours(max_work_hours, rest_hours).map_err(RepositoryError::validation)
}

/// Create a horse, filling missing limits from the welfare defaults.
pub async fn create_horse<R: HorseRepository + ?Sized>(
    repo: &R,
    draft: HorseDraft,
    defaults: &WelfareSettings,
) -> RepositoryResult<Horse> {
    let name = required_name(&draft.name, "Horse")?;
    let limits = limits_from_hours(
        draft.max_work_hours.unwrap_or(defaults.default_max_work_hours),
        draft.rest_hours.unwrap_or(defaults.default_rest_hours),
    )?;

    let horse = repo
        .create_horse(NewHorse {
            name,
            breed: draft.breed,
            level: draft.level,
            limits,
            post_training_meal: draft.post_training_meal,
            notes: draft.notes,
        })
        .await?;
    log::info!(
        "Created horse {} ({}) limits {}min/day, rest {}min",
        horse.id,
        horse.name,
        horse.max_work_minutes_per_day,
        horse.required_rest_minutes
    );
    Ok(horse)
}

/// Get a horse by id, active or not.
pub async fn get_horse<R: HorseRepository + ?Sized>(repo: &R, id: HorseId) -> RepositoryResult<Horse> {
    repo.find_horse_by_id(id).await?.ok_or_else(|| {
        RepositoryError::not_found_with_context(
            format!("Horse {} not found", id),
            ErrorContext::new("get_horse")
                .with_entity("horse")
                .with_entity_id(id),
        )
    })
}

pub async fn list_horses<R: HorseRepository + ?Sized>(repo: &R) -> RepositoryResult<Vec<Horse>> {
    repo.list_active_horses().await
}

pub async fn update_horse<R: HorseRepository + ?Sized>(
    repo: &R,
    id: HorseId,
    update: HorseUpdate,
) -> RepositoryResult<Horse> {
    let mut horse = get_horse(repo, id).await?;

    if let Some(name) = update.name {
        horse.name = required_name(&name, "Horse")?;
    }
    if let Some(breed) = update.breed {
        horse.breed = Some(breed);
    }
    if let Some(level) = update.level {
        horse.level = level;
    }
    if update.max_work_hours.is_some() || update.rest_hours.is_some() {
        let current = horse.limits();
        let limits = limits_from_hours(
            update
                .max_work_hours
                .unwrap_or(f64::from(current.max_work_minutes_per_day) / 60.0),
            update
                .rest_hours
                .unwrap_or(f64::from(current.required_rest_minutes) / 60.0),
        )?;
        horse.max_work_minutes_per_day = limits.max_work_minutes_per_day;
        horse.required_rest_minutes = limits.required_rest_minutes;
    }
    if let Some(meal) = update.post_training_meal {
        horse.post_training_meal = Some(meal).filter(|m| !m.trim().is_empty());
    }
    if let Some(notes) = update.notes {
        horse.notes = Some(notes);
    }
    if let Some(is_active) = update.is_active {
        horse.is_active = is_active;
    }

    repo.update_horse(&horse).await
}

/// Soft delete: the horse stays in the store so old sessions still resolve.
pub async fn deactivate_horse<R: HorseRepository + ?Sized>(
    repo: &R,
    id: HorseId,
) -> RepositoryResult<Horse> {
    let mut horse = get_horse(repo, id).await?;
    horse.is_active = false;
    let horse = repo.update_horse(&horse).await?;
    log::info!("Deactivated horse {} ({})", horse.id, horse.name);
    Ok(horse)
}

// =============================================================================
// Users
// =============================================================================

/// Partial user update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub roles: Option<BTreeSet<Role>>,
    #[serde(default)]
    pub level: Option<SkillLevel>,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub subscription_hours: Option<f64>,
}

fn normalized_email(email: &str) -> RepositoryResult<String> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(RepositoryError::validation(format!(
            "Invalid email address: '{}'",
            email
        )));
    }
    Ok(email)
}

fn check_subscription_hours(hours: f64) -> RepositoryResult<f64> {
    if !hours.is_finite() || hours < 0.0 {
        return Err(RepositoryError::validation(format!(
            "subscription hours must not be negative, got {}",
            hours
        )));
    }
    Ok(hours)
}

pub async fn create_user<R: UserRepository + ?Sized>(
    repo: &R,
    user: NewUser,
) -> RepositoryResult<User> {
    if user.roles.is_empty() {
        return Err(RepositoryError::validation("A user needs at least one role"));
    }
    let user = NewUser {
        name: required_name(&user.name, "User")?,
        email: normalized_email(&user.email)?,
        subscription_hours: check_subscription_hours(user.subscription_hours)?,
        ..user
    };
    let user = repo.create_user(user).await?;
    log::info!("Created user {} with roles {:?}", user.id, user.roles);
    Ok(user)
}

pub async fn get_user<R: UserRepository + ?Sized>(repo: &R, id: UserId) -> RepositoryResult<User> {
    repo.find_user_by_id(id).await?.ok_or_else(|| {
        RepositoryError::not_found_with_context(
            format!("User {} not found", id),
            ErrorContext::new("get_user").with_entity("user").with_entity_id(id),
        )
    })
}

pub async fn list_users<R: UserRepository + ?Sized>(repo: &R) -> RepositoryResult<Vec<User>> {
    repo.list_users().await
}

pub async fn list_users_with_role<R: UserRepository + ?Sized>(
    repo: &R,
    role: Role,
) -> RepositoryResult<Vec<User>> {
    repo.list_users_with_role(role).await
}

pub async fn update_user<R: UserRepository + ?Sized>(
    repo: &R,
    id: UserId,
    update: UserUpdate,
) -> RepositoryResult<User> {
    let mut user = get_user(repo, id).await?;

    if let Some(name) = update.name {
        user.name = required_name(&name, "User")?;
    }
    if let Some(email) = update.email {
        user.email = normalized_email(&email)?;
    }
    if let Some(roles) = update.roles {
        if roles.is_empty() {
            return Err(RepositoryError::validation("A user needs at least one role"));
        }
        user.roles = roles;
    }
    if let Some(level) = update.level {
        user.level = Some(level);
    }
    if let Some(specialization) = update.specialization {
        user.specialization = Some(specialization);
    }
    if let Some(method) = update.payment_method {
        user.payment_method = method;
    }
    if let Some(hours) = update.subscription_hours {
        user.subscription_hours = check_subscription_hours(hours)?;
    }

    repo.update_user(&user).await
}

pub async fn delete_user<R: UserRepository + ?Sized>(repo: &R, id: UserId) -> RepositoryResult<()> {
    repo.delete_user(id).await?;
    log::info!("Deleted user {}", id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;

    fn draft(name: &str) -> HorseDraft {
        HorseDraft {
            name: name.to_string(),
            breed: None,
            level: SkillLevel::Intermediate,
            max_work_hours: None,
            rest_hours: None,
            post_training_meal: None,
            notes: None,
        }
    }

    fn new_user(email: &str, roles: &[Role]) -> NewUser {
        NewUser {
            name: "Chris".to_string(),
            email: email.to_string(),
            roles: roles.iter().copied().collect(),
            level: None,
            specialization: None,
            payment_method: PaymentMethod::PerSession,
            subscription_hours: 0.0,
        }
    }

    #[tokio::test]
    async fn test_create_horse_uses_default_limits() {
        let repo = LocalRepository::new();
        let horse = create_horse(&repo, draft("Comet"), &WelfareSettings::default())
            .await
            .unwrap();
        assert_eq!(horse.max_work_minutes_per_day, 240);
        assert_eq!(horse.required_rest_minutes, 60);
        assert!(horse.is_active);
    }

    #[tokio::test]
    async fn test_create_horse_rejects_bad_limits() {
        let repo = LocalRepository::new();
        let mut bad = draft("Comet");
        bad.max_work_hours = Some(0.0);
        let err = create_horse(&repo, bad, &WelfareSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));

        let mut bad = draft("Comet");
        bad.rest_hours = Some(-1.0);
        assert!(create_horse(&repo, bad, &WelfareSettings::default())
            .await
            .is_err());

        assert!(create_horse(&repo, draft("   "), &WelfareSettings::default())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_update_horse_keeps_unchanged_limit() {
        let repo = LocalRepository::new();
        let horse = create_horse(&repo, draft("Comet"), &WelfareSettings::default())
            .await
            .unwrap();
        let updated = update_horse(
            &repo,
            horse.id,
            HorseUpdate {
                max_work_hours: Some(3.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.max_work_minutes_per_day, 180);
        assert_eq!(updated.required_rest_minutes, 60);
    }

    #[tokio::test]
    async fn test_deactivated_horse_hidden_but_retrievable() {
        let repo = LocalRepository::new();
        let horse = create_horse(&repo, draft("Comet"), &WelfareSettings::default())
            .await
            .unwrap();
        deactivate_horse(&repo, horse.id).await.unwrap();

        assert!(list_horses(&repo).await.unwrap().is_empty());
        assert!(!get_horse(&repo, horse.id).await.unwrap().is_active);
    }

    #[tokio::test]
    async fn test_get_missing_horse_is_not_found() {
        let repo = LocalRepository::new();
        let err = get_horse(&repo, HorseId::new(99)).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.context().entity.as_deref(), Some("horse"));
    }

    #[tokio::test]
    async fn test_create_user_normalizes_email() {
        let repo = LocalRepository::new();
        let user = create_user(&repo, new_user("  Chris@Example.COM ", &[Role::Rider]))
            .await
            .unwrap();
        assert_eq!(user.email, "chris@example.com");

        let err = create_user(&repo, new_user("not-an-email", &[Role::Rider]))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));

        let err = create_user(&repo, new_user("x@example.com", &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));
    }

    #[tokio::test]
    async fn test_update_user_roles() {
        let repo = LocalRepository::new();
        let user = create_user(&repo, new_user("chris@example.com", &[Role::Rider]))
            .await
            .unwrap();
        let updated = update_user(
            &repo,
            user.id,
            UserUpdate {
                roles: Some([Role::Rider, Role::Trainer].into_iter().collect()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(updated.has_role(Role::Trainer));

        let trainers = list_users_with_role(&repo, Role::Trainer).await.unwrap();
        assert_eq!(trainers.len(), 1);
    }
}
