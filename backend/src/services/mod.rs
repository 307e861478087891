//! Service layer for the stable's business rules.
//!
//! Services sit between the HTTP handlers and the repository traits:
//!
//! - [`welfare`]: decides whether a session may be booked for a horse
//! - [`booking`]: session create/edit/complete/cancel built on the validator
//! - [`feeding`]: post-training feeding tasks and their generation job
//! - [`job_tracker`]: progress logs for background jobs

pub mod booking;
pub mod feeding;
pub mod job_tracker;
pub mod welfare;

pub use booking::{BookingError, BookingOutcome, BookingRequest, BookingUpdate, CompletionOutcome};
pub use feeding::{FeedingError, GenerationSummary};
pub use job_tracker::{JobStatus, JobTracker};
pub use welfare::{Candidate, ValidationResult, Violation, WelfareError};
