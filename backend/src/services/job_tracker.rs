//! In-memory tracking of background jobs.
//!
//! Long-running work (feeding task generation for a day) runs on a spawned
//! task; the tracker keeps its status and timestamped progress log so HTTP
//! clients can poll it or follow it over SSE.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub job_id: String,
    pub status: JobStatus,
    pub logs: Vec<LogEntry>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Job output, e.g. how many feeding tasks were created.
    pub result: Option<serde_json::Value>,
}

/// Shared handle to the job table. Clones see the same jobs.
#[derive(Clone)]
pub struct JobTracker {
    jobs: Arc<RwLock<HashMap<String, Job>>>,
}

impl JobTracker {
    pub fn new() -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a running job and return its id.
    pub fn create_job(&self) -> String {
        let job_id = Uuid::new_v4().to_string();
        let job = Job {
            job_id: job_id.clone(),
            status: JobStatus::Running,
            logs: vec![],
            created_at: Utc::now(),
            completed_at: None,
            result: None,
        };
        self.jobs.write().insert(job_id.clone(), job);
        job_id
    }

    /// Append to a job's log. Unknown ids are ignored.
    pub fn log(&self, job_id: &str, level: LogLevel, message: impl Into<String>) {
        if let Some(job) = self.jobs.write().get_mut(job_id) {
            job.logs.push(LogEntry {
                timestamp: Utc::now(),
                level,
                message: message.into(),
            });
        }
    }

    pub fn complete_job(&self, job_id: &str, result: Option<serde_json::Value>) {
        if let Some(job) = self.jobs.write().get_mut(job_id) {
            job.status = JobStatus::Completed;
            job.completed_at = Some(Utc::now());
            job.result = result;
        }
    }

    /// Mark a job failed; the message becomes its last log entry.
    pub fn fail_job(&self, job_id: &str, error_message: impl Into<String>) {
        if let Some(job) = self.jobs.write().get_mut(job_id) {
            let now = Utc::now();
            job.status = JobStatus::Failed;
            job.completed_at = Some(now);
            job.logs.push(LogEntry {
                timestamp: now,
                level: LogLevel::Error,
                message: error_message.into(),
            });
        }
    }

    pub fn get_job(&self, job_id: &str) -> Option<Job> {
        self.jobs.read().get(job_id).cloned()
    }

    pub fn get_logs(&self, job_id: &str) -> Vec<LogEntry> {
        self.jobs
            .read()
            .get(job_id)
            .map(|job| job.logs.clone())
            .unwrap_or_default()
    }
}

impl Default for JobTracker {
    fn default() -> Self {
        Self::new()
    }
}
