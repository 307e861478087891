//! Post-training feeding tasks.
//!
//! A horse with a post-training meal gets one feeding task per session,
//! due when the session ends. Tasks are created at booking time and can be
//! (re)generated for a whole day; generation never duplicates a task.

use chrono::{NaiveDate, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use super::job_tracker::{JobTracker, LogLevel};
use crate::db::repository::{
    FeedingRepository, FullRepository, HorseRepository, RepositoryError, RepositoryResult,
    SessionRepository,
};
use crate::models::{FeedingTask, FeedingTaskId, Horse, HorseId, NewFeedingTask, Session};

#[derive(Debug, thiserror::Error)]
pub enum FeedingError {
    #[error("Invalid feeding request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// What a generation run did for one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub date: NaiveDate,
    pub created: Vec<FeedingTask>,
    /// Sessions that already had a task.
    pub already_present: usize,
    /// Sessions whose horse has no post-training meal (or no longer exists).
    pub without_meal: usize,
}

fn meal_of(horse: &Horse) -> Option<&str> {
    horse
        .post_training_meal
        .as_deref()
        .map(str::trim)
        .filter(|meal| !meal.is_empty())
}

fn new_task(horse: &Horse, meal: &str, session: &Session) -> NewFeedingTask {
    NewFeedingTask {
        session_id: session.id,
        horse_name: horse.name.clone(),
        end_time: session.end_time,
        meal_description: meal.to_string(),
        date: session.date,
    }
}

/// Create the session's feeding task if its horse has a meal and no task
/// exists yet. Returns the session's task, new or existing.
pub async fn create_task_for_session<R>(
    repo: &R,
    horse: &Horse,
    session: &Session,
) -> RepositoryResult<Option<FeedingTask>>
where
    R: FeedingRepository + ?Sized,
{
    let Some(meal) = meal_of(horse) else {
        return Ok(None);
    };
    if let Some(existing) = repo.find_feeding_task_for_session(session.id).await? {
        return Ok(Some(existing));
    }
    let task = repo
        .create_feeding_task(new_task(horse, meal, session))
        .await?;
    debug!(
        "Created feeding task {} for session {} ({} at {})",
        task.id, session.id, task.horse_name, task.end_time
    );
    Ok(Some(task))
}

/// Bring a session's feeding task in line after the session was edited.
///
/// Open tasks follow the session's horse, date and end time; a horse
/// without a meal loses the task. Completed tasks are left alone.
pub async fn sync_task_with_session<R>(
    repo: &R,
    horse: &Horse,
    session: &Session,
) -> RepositoryResult<Option<FeedingTask>>
where
    R: FeedingRepository + ?Sized,
{
    let existing = repo.find_feeding_task_for_session(session.id).await?;
    let Some(meal) = meal_of(horse) else {
        if existing.as_ref().is_some_and(|t| !t.completed) {
            repo.delete_feeding_tasks_for_session(session.id).await?;
            return Ok(None);
        }
        return Ok(existing);
    };

    match existing {
        Some(task) if task.completed => Ok(Some(task)),
        Some(mut task) => {
            task.horse_name = horse.name.clone();
            task.end_time = session.end_time;
            task.meal_description = meal.to_string();
            task.date = session.date;
            Ok(Some(repo.update_feeding_task(&task).await?))
        }
        None => create_task_for_session(repo, horse, session).await,
    }
}

/// Create every missing feeding task for sessions on `date`, scheduled or
/// completed. Running it again creates nothing new.
pub async fn generate_feeding_tasks<R>(
    repo: &R,
    date: NaiveDate,
) -> Result<GenerationSummary, FeedingError>
where
    R: HorseRepository + SessionRepository + FeedingRepository + ?Sized,
{
    let sessions = repo.list_sessions_on_date(date).await?;
    let mut horses: HashMap<HorseId, Option<Horse>> = HashMap::new();
    let mut summary = GenerationSummary {
        date,
        created: Vec::new(),
        already_present: 0,
        without_meal: 0,
    };

    for session in &sessions {
        if !horses.contains_key(&session.horse_id) {
            let horse = repo.find_horse_by_id(session.horse_id).await?;
            horses.insert(session.horse_id, horse);
        }
        let Some(horse) = horses.get(&session.horse_id).and_then(Option::as_ref) else {
            summary.without_meal += 1;
            continue;
        };
        let Some(meal) = meal_of(horse) else {
            summary.without_meal += 1;
            continue;
        };
        if repo.find_feeding_task_for_session(session.id).await?.is_some() {
            summary.already_present += 1;
            continue;
        }
        let task = repo
            .create_feeding_task(new_task(horse, meal, session))
            .await?;
        summary.created.push(task);
    }

    info!(
        "Feeding generation for {}: {} created, {} already present, {} without meal",
        date,
        summary.created.len(),
        summary.already_present,
        summary.without_meal
    );
    Ok(summary)
}

pub async fn list_feeding_tasks<R: FeedingRepository + ?Sized>(
    repo: &R,
    date: NaiveDate,
) -> Result<Vec<FeedingTask>, FeedingError> {
    Ok(repo.list_feeding_tasks_on_date(date).await?)
}

async fn set_completion<R>(
    repo: &R,
    mut task: FeedingTask,
    completed_by: Option<String>,
    completed: bool,
) -> Result<FeedingTask, FeedingError>
where
    R: SessionRepository + FeedingRepository + ?Sized,
{
    task.completed = completed;
    task.completed_at = completed.then(Utc::now);
    task.completed_by = if completed { completed_by } else { None };
    let task = repo.update_feeding_task(&task).await?;

    match repo.get_session(task.session_id).await {
        Ok(mut session) => {
            session.feeding_done = completed;
            repo.update_session(&session).await?;
        }
        Err(e) if e.is_not_found() => {
            debug!("Feeding task {} has no session {}", task.id, task.session_id);
        }
        Err(e) => return Err(e.into()),
    }
    Ok(task)
}

/// Mark a task done, recording who fed the horse and when.
pub async fn complete_feeding_task<R>(
    repo: &R,
    id: FeedingTaskId,
    completed_by: Option<String>,
) -> Result<FeedingTask, FeedingError>
where
    R: SessionRepository + FeedingRepository + ?Sized,
{
    let completed_by = match completed_by {
        Some(name) if name.trim().is_empty() => {
            return Err(FeedingError::InvalidRequest(
                "completed_by must not be blank".to_string(),
            ))
        }
        other => other.map(|name| name.trim().to_string()),
    };
    let task = repo.get_feeding_task(id).await?;
    let task = set_completion(repo, task, completed_by, true).await?;
    info!("Feeding task {} completed", task.id);
    Ok(task)
}

/// Reopen a task and clear its completion record.
pub async fn uncomplete_feeding_task<R>(
    repo: &R,
    id: FeedingTaskId,
) -> Result<FeedingTask, FeedingError>
where
    R: SessionRepository + FeedingRepository + ?Sized,
{
    let task = repo.get_feeding_task(id).await?;
    let task = set_completion(repo, task, None, false).await?;
    info!("Feeding task {} reopened", task.id);
    Ok(task)
}

/// Run [`generate_feeding_tasks`] as a tracked background job.
///
/// Progress is written to `tracker` so clients can follow it over SSE.
pub async fn run_generation_job(
    job_id: String,
    tracker: JobTracker,
    repo: Arc<dyn FullRepository>,
    date: NaiveDate,
) -> Result<GenerationSummary, String> {
    tracker.log(
        &job_id,
        LogLevel::Info,
        format!("Generating feeding tasks for {}...", date),
    );

    let summary = match generate_feeding_tasks(repo.as_ref(), date).await {
        Ok(summary) => summary,
        Err(e) => {
            let msg = format!("Failed to generate feeding tasks: {}", e);
            tracker.fail_job(&job_id, &msg);
            return Err(msg);
        }
    };

    for task in &summary.created {
        tracker.log(
            &job_id,
            LogLevel::Info,
            format!(
                "Created task for {} at {}: {}",
                task.horse_name, task.end_time, task.meal_description
            ),
        );
    }
    if summary.already_present > 0 {
        tracker.log(
            &job_id,
            LogLevel::Warning,
            format!("{} sessions already had a feeding task", summary.already_present),
        );
    }
    tracker.log(
        &job_id,
        LogLevel::Success,
        format!("Created {} feeding tasks", summary.created.len()),
    );

    let result = serde_json::json!({
        "date": date,
        "created": summary.created.len(),
        "already_present": summary.already_present,
        "without_meal": summary.without_meal,
    });
    tracker.complete_job(&job_id, Some(result));
    Ok(summary)
}
