//! In-memory local repository implementation.
//!
//! Stores every table in memory behind one `RwLock`, giving fast,
//! deterministic and isolated execution for unit tests and local development.
//!
//! Like the relational store it stands in for, it enforces no exclusion
//! constraint on horse/date/time: two bookings validated concurrently can
//! both be committed.

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::db::repository::*;
use crate::models::*;

/// In-memory local repository.
///
/// # Example
/// ```
/// use stable_welfare::db::repositories::LocalRepository;
/// use stable_welfare::db::repository::SessionRepository;
///
/// let repo = LocalRepository::new();
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// assert!(rt.block_on(repo.health_check()).unwrap());
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    horses: HashMap<HorseId, Horse>,
    users: HashMap<UserId, User>,
    sessions: HashMap<SessionId, Session>,
    feeding_tasks: HashMap<FeedingTaskId, FeedingTask>,

    // ID counters
    next_horse_id: i64,
    next_user_id: i64,
    next_session_id: i64,
    next_feeding_task_id: i64,

    // Connection health
    is_healthy: bool,
    failing_operations: HashSet<&'static str>,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            horses: HashMap::new(),
            users: HashMap::new(),
            sessions: HashMap::new(),
            feeding_tasks: HashMap::new(),
            next_horse_id: 1,
            next_user_id: 1,
            next_session_id: 1,
            next_feeding_task_id: 1,
            is_healthy: true,
            failing_operations: HashSet::new(),
        }
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Set the health status for testing connection failures.
    ///
    /// While unhealthy every operation except `health_check` fails with a
    /// connection error.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Make one operation (e.g. `"find_user_by_id"`) fail with a connection
    /// error while the rest of the store keeps working.
    pub fn fail_operation(&self, operation: &'static str) {
        self.data.write().failing_operations.insert(operation);
    }

    /// Clear all data from the repository.
    pub fn clear(&self) {
        let mut data = self.data.write();
        *data = LocalData {
            is_healthy: data.is_healthy,
            ..Default::default()
        };
    }

    pub fn session_count(&self) -> usize {
        self.data.read().sessions.len()
    }

    pub fn feeding_task_count(&self) -> usize {
        self.data.read().feeding_tasks.len()
    }

    /// Helper to check health and return error if unhealthy.
    fn check_health(&self, operation: &str) -> RepositoryResult<()> {
        let data = self.data.read();
        if !data.is_healthy || data.failing_operations.contains(operation) {
            return Err(RepositoryError::connection("Store is not healthy").with_operation(operation));
        }
        Ok(())
    }

    fn not_found(entity: &str, id: impl ToString, operation: &str) -> RepositoryError {
        let id = id.to_string();
        RepositoryError::not_found_with_context(
            format!("{} {} not found", capitalize(entity), id),
            ErrorContext::new(operation)
                .with_entity(entity)
                .with_entity_id(id),
        )
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn sort_by_date_then_start(sessions: &mut [Session]) {
    sessions.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then(a.start_time.cmp(&b.start_time))
            .then(a.id.cmp(&b.id))
    });
}

// ==================== Horse Repository ====================

#[async_trait]
impl HorseRepository for LocalRepository {
    async fn create_horse(&self, horse: NewHorse) -> RepositoryResult<Horse> {
        self.check_health("create_horse")?;
        let mut data = self.data.write();
        let id = HorseId::new(data.next_horse_id);
        data.next_horse_id += 1;

        let stored = Horse {
            id,
            name: horse.name,
            breed: horse.breed,
            level: horse.level,
            max_work_minutes_per_day: horse.limits.max_work_minutes_per_day,
            required_rest_minutes: horse.limits.required_rest_minutes,
            post_training_meal: horse.post_training_meal,
            notes: horse.notes,
            is_active: true,
        };
        data.horses.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_horse_by_id(&self, id: HorseId) -> RepositoryResult<Option<Horse>> {
        self.check_health("find_horse_by_id")?;
        Ok(self.data.read().horses.get(&id).cloned())
    }

    async fn list_active_horses(&self) -> RepositoryResult<Vec<Horse>> {
        self.check_health("list_active_horses")?;
        let data = self.data.read();
        let mut horses: Vec<Horse> = data
            .horses
            .values()
            .filter(|h| h.is_active)
            .cloned()
            .collect();
        horses.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(horses)
    }

    async fn update_horse(&self, horse: &Horse) -> RepositoryResult<Horse> {
        self.check_health("update_horse")?;
        let mut data = self.data.write();
        match data.horses.get_mut(&horse.id) {
            Some(slot) => {
                *slot = horse.clone();
                Ok(horse.clone())
            }
            None => Err(Self::not_found("horse", horse.id, "update_horse")),
        }
    }
}

// ==================== User Repository ====================

#[async_trait]
impl UserRepository for LocalRepository {
    async fn create_user(&self, user: NewUser) -> RepositoryResult<User> {
        self.check_health("create_user")?;
        let mut data = self.data.write();

        let email = user.email.to_lowercase();
        if data.users.values().any(|u| u.email == email) {
            return Err(RepositoryError::ValidationError {
                message: format!("Email {} is already registered", email),
                context: ErrorContext::new("create_user").with_entity("user"),
            });
        }

        let id = UserId::new(data.next_user_id);
        data.next_user_id += 1;

        let stored = User {
            id,
            name: user.name,
            email,
            roles: user.roles,
            level: user.level,
            specialization: user.specialization,
            payment_method: user.payment_method,
            subscription_hours: user.subscription_hours,
        };
        data.users.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_user_by_id(&self, id: UserId) -> RepositoryResult<Option<User>> {
        self.check_health("find_user_by_id")?;
        Ok(self.data.read().users.get(&id).cloned())
    }

    async fn list_users(&self) -> RepositoryResult<Vec<User>> {
        self.check_health("list_users")?;
        let mut users: Vec<User> = self.data.read().users.values().cloned().collect();
        users.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(users)
    }

    async fn list_users_with_role(&self, role: Role) -> RepositoryResult<Vec<User>> {
        let mut users = self.list_users().await?;
        users.retain(|u| u.has_role(role));
        Ok(users)
    }

    async fn update_user(&self, user: &User) -> RepositoryResult<User> {
        self.check_health("update_user")?;
        let mut data = self.data.write();
        match data.users.get_mut(&user.id) {
            Some(slot) => {
                *slot = user.clone();
                Ok(user.clone())
            }
            None => Err(Self::not_found("user", user.id, "update_user")),
        }
    }

    async fn delete_user(&self, id: UserId) -> RepositoryResult<()> {
        self.check_health("delete_user")?;
        match self.data.write().users.remove(&id) {
            Some(_) => Ok(()),
            None => Err(Self::not_found("user", id, "delete_user")),
        }
    }
}

// ==================== Session Repository ====================

#[async_trait]
impl SessionRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn create_session(&self, session: NewSession) -> RepositoryResult<Session> {
        self.check_health("create_session")?;
        let mut data = self.data.write();
        let id = SessionId::new(data.next_session_id);
        data.next_session_id += 1;

        let stored = session.into_session(id);
        data.sessions.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_session(&self, id: SessionId) -> RepositoryResult<Session> {
        self.check_health("get_session")?;
        self.data
            .read()
            .sessions
            .get(&id)
            .cloned()
            .ok_or_else(|| Self::not_found("session", id, "get_session"))
    }

    async fn update_session(&self, session: &Session) -> RepositoryResult<Session> {
        self.check_health("update_session")?;
        let mut data = self.data.write();
        match data.sessions.get_mut(&session.id) {
            Some(slot) => {
                *slot = session.clone();
                Ok(session.clone())
            }
            None => Err(Self::not_found("session", session.id, "update_session")),
        }
    }

    async fn delete_session(&self, id: SessionId) -> RepositoryResult<()> {
        self.check_health("delete_session")?;
        match self.data.write().sessions.remove(&id) {
            Some(_) => Ok(()),
            None => Err(Self::not_found("session", id, "delete_session")),
        }
    }

    async fn list_sessions_on_date(&self, date: NaiveDate) -> RepositoryResult<Vec<Session>> {
        self.check_health("list_sessions_on_date")?;
        let mut sessions: Vec<Session> = self
            .data
            .read()
            .sessions
            .values()
            .filter(|s| s.date == date)
            .cloned()
            .collect();
        sort_by_date_then_start(&mut sessions);
        Ok(sessions)
    }

    async fn find_sessions_for_horse_on_date(
        &self,
        horse_id: HorseId,
        date: NaiveDate,
        status: SessionStatus,
        exclude: Option<SessionId>,
    ) -> RepositoryResult<Vec<Session>> {
        self.check_health("find_sessions_for_horse_on_date")?;
        let mut sessions: Vec<Session> = self
            .data
            .read()
            .sessions
            .values()
            .filter(|s| s.horse_id == horse_id && s.date == date && s.status == status)
            .filter(|s| Some(s.id) != exclude)
            .cloned()
            .collect();
        sort_by_date_then_start(&mut sessions);
        Ok(sessions)
    }

    async fn list_upcoming_for_rider(
        &self,
        rider_id: UserId,
        from: NaiveDate,
    ) -> RepositoryResult<Vec<Session>> {
        self.check_health("list_upcoming_for_rider")?;
        let mut sessions: Vec<Session> = self
            .data
            .read()
            .sessions
            .values()
            .filter(|s| s.rider_id == rider_id && s.date >= from && s.is_scheduled())
            .cloned()
            .collect();
        sort_by_date_then_start(&mut sessions);
        Ok(sessions)
    }

    async fn list_upcoming_for_trainer(
        &self,
        trainer_id: UserId,
        from: NaiveDate,
    ) -> RepositoryResult<Vec<Session>> {
        self.check_health("list_upcoming_for_trainer")?;
        let mut sessions: Vec<Session> = self
            .data
            .read()
            .sessions
            .values()
            .filter(|s| s.trainer_id == trainer_id && s.date >= from && s.is_scheduled())
            .cloned()
            .collect();
        sort_by_date_then_start(&mut sessions);
        Ok(sessions)
    }
}

// ==================== Feeding Repository ====================

#[async_trait]
impl FeedingRepository for LocalRepository {
    async fn create_feeding_task(&self, task: NewFeedingTask) -> RepositoryResult<FeedingTask> {
        self.check_health("create_feeding_task")?;
        let mut data = self.data.write();
        let id = FeedingTaskId::new(data.next_feeding_task_id);
        data.next_feeding_task_id += 1;

        let stored = task.into_task(id);
        data.feeding_tasks.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_feeding_task(&self, id: FeedingTaskId) -> RepositoryResult<FeedingTask> {
        self.check_health("get_feeding_task")?;
        self.data
            .read()
            .feeding_tasks
            .get(&id)
            .cloned()
            .ok_or_else(|| Self::not_found("feeding_task", id, "get_feeding_task"))
    }

    async fn find_feeding_task_for_session(
        &self,
        session_id: SessionId,
    ) -> RepositoryResult<Option<FeedingTask>> {
        self.check_health("find_feeding_task_for_session")?;
        Ok(self
            .data
            .read()
            .feeding_tasks
            .values()
            .filter(|t| t.session_id == session_id)
            .min_by_key(|t| t.id)
            .cloned())
    }

    async fn list_feeding_tasks_on_date(
        &self,
        date: NaiveDate,
    ) -> RepositoryResult<Vec<FeedingTask>> {
        self.check_health("list_feeding_tasks_on_date")?;
        let mut tasks: Vec<FeedingTask> = self
            .data
            .read()
            .feeding_tasks
            .values()
            .filter(|t| t.date == date)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| a.end_time.cmp(&b.end_time).then(a.id.cmp(&b.id)));
        Ok(tasks)
    }

    async fn update_feeding_task(&self, task: &FeedingTask) -> RepositoryResult<FeedingTask> {
        self.check_health("update_feeding_task")?;
        let mut data = self.data.write();
        match data.feeding_tasks.get_mut(&task.id) {
            Some(slot) => {
                *slot = task.clone();
                Ok(task.clone())
            }
            None => Err(Self::not_found("feeding_task", task.id, "update_feeding_task")),
        }
    }

    async fn delete_feeding_tasks_for_session(
        &self,
        session_id: SessionId,
    ) -> RepositoryResult<usize> {
        self.check_health("delete_feeding_tasks_for_session")?;
        let mut data = self.data.write();
        let before = data.feeding_tasks.len();
        data.feeding_tasks.retain(|_, t| t.session_id != session_id);
        Ok(before - data.feeding_tasks.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn new_session(horse: i64, day: &str, start: &str, minutes: u32) -> NewSession {
        let start_time: ClockTime = start.parse().unwrap();
        NewSession {
            horse_id: HorseId::new(horse),
            rider_id: UserId::new(1),
            trainer_id: UserId::new(2),
            date: date(day),
            start_time,
            duration_minutes: minutes,
            end_time: add_minutes(start_time, minutes),
            price: None,
            paid: false,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_find_sessions_scoped_to_horse_day_and_status() {
        let repo = LocalRepository::new();
        let late = repo
            .create_session(new_session(1, "2026-03-02", "14:00", 60))
            .await
            .unwrap();
        let early = repo
            .create_session(new_session(1, "2026-03-02", "09:00", 60))
            .await
            .unwrap();
        repo.create_session(new_session(2, "2026-03-02", "10:00", 60))
            .await
            .unwrap();
        repo.create_session(new_session(1, "2026-03-03", "10:00", 60))
            .await
            .unwrap();

        let mut done = repo
            .create_session(new_session(1, "2026-03-02", "11:00", 60))
            .await
            .unwrap();
        done.status = SessionStatus::Completed;
        repo.update_session(&done).await.unwrap();

        let found = repo
            .find_sessions_for_horse_on_date(
                HorseId::new(1),
                date("2026-03-02"),
                SessionStatus::Scheduled,
                None,
            )
            .await
            .unwrap();
        let ids: Vec<SessionId> = found.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![early.id, late.id]);

        let without_early = repo
            .find_sessions_for_horse_on_date(
                HorseId::new(1),
                date("2026-03-02"),
                SessionStatus::Scheduled,
                Some(early.id),
            )
            .await
            .unwrap();
        assert_eq!(without_early.len(), 1);
        assert_eq!(without_early[0].id, late.id);
    }

    #[tokio::test]
    async fn test_unhealthy_store_fails_operations() {
        let repo = LocalRepository::new();
        repo.set_healthy(false);

        assert!(!repo.health_check().await.unwrap());
        let err = repo.find_horse_by_id(HorseId::new(1)).await.unwrap_err();
        assert!(matches!(err, RepositoryError::ConnectionError { .. }));
        assert_eq!(err.context().operation.as_deref(), Some("find_horse_by_id"));

        repo.set_healthy(true);
        assert!(repo.find_horse_by_id(HorseId::new(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_session_is_not_found() {
        let repo = LocalRepository::new();
        let err = repo.delete_session(SessionId::new(42)).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("Session 42 not found"));
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let repo = LocalRepository::new();
        let user = NewUser {
            name: "Maria".to_string(),
            email: "Maria@Example.com".to_string(),
            roles: [Role::Rider].into_iter().collect(),
            level: Some(SkillLevel::Beginner),
            specialization: None,
            payment_method: PaymentMethod::PerSession,
            subscription_hours: 0.0,
        };
        let stored = repo.create_user(user.clone()).await.unwrap();
        assert_eq!(stored.email, "maria@example.com");

        let err = repo.create_user(user).await.unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));
    }

    #[tokio::test]
    async fn test_clear_resets_ids_but_keeps_health() {
        let repo = LocalRepository::new();
        repo.create_session(new_session(1, "2026-03-02", "09:00", 30))
            .await
            .unwrap();
        repo.set_healthy(false);
        repo.clear();
        assert_eq!(repo.session_count(), 0);
        assert!(!repo.health_check().await.unwrap());

        repo.set_healthy(true);
        let again = repo
            .create_session(new_session(1, "2026-03-02", "09:00", 30))
            .await
            .unwrap();
        assert_eq!(again.id, SessionId::new(1));
    }
}
