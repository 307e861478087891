//! Application state for the HTTP server.

use std::sync::Arc;

use crate::config::WelfareSettings;
use crate::db::repository::FullRepository;
use crate::services::JobTracker;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for all storage operations
    pub repository: Arc<dyn FullRepository>,
    /// Background job tracker (feeding generation)
    pub job_tracker: JobTracker,
    /// Welfare defaults and the infrastructure-error policy
    pub welfare: Arc<WelfareSettings>,
}

impl AppState {
    /// Create a state with default welfare settings.
    pub fn new(repository: Arc<dyn FullRepository>) -> Self {
        Self::with_welfare(repository, WelfareSettings::default())
    }

    pub fn with_welfare(repository: Arc<dyn FullRepository>, welfare: WelfareSettings) -> Self {
        Self {
            repository,
            job_tracker: JobTracker::new(),
            welfare: Arc::new(welfare),
        }
    }
}
