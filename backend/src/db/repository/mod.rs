//! Repository trait definitions for the stable data store.
//!
//! Responsibilities are split across focused traits so each service can ask
//! only for what it uses:
//!
//! - [`error`]: Error types for repository operations
//! - [`horse`]: Horse records and soft deletion
//! - [`user`]: Riders, trainers and staff
//! - [`session`]: Booked sessions and the per-horse/per-day query
//! - [`feeding`]: Post-training feeding tasks
//!
//! # Convenience Trait Bound
//!
//! For code that needs every capability (the HTTP state, the factory), use
//! the [`FullRepository`] bound:
//!
//! ```ignore
//! async fn cancel<R: FullRepository + ?Sized>(repo: &R, id: SessionId) -> RepositoryResult<()> {
//!     repo.delete_feeding_tasks_for_session(id).await?;
//!     repo.delete_session(id).await
//! }
//! ```

pub mod error;
pub mod feeding;
pub mod horse;
pub mod session;
pub mod user;

// Re-export error types
pub use error::{ErrorContext, RepositoryError, RepositoryResult};

// Re-export all traits
pub use feeding::FeedingRepository;
pub use horse::HorseRepository;
pub use session::SessionRepository;
pub use user::UserRepository;

/// Composite trait bound for a complete repository implementation.
///
/// Automatically implemented for any type that implements all four
/// repository traits.
pub trait FullRepository:
    HorseRepository + UserRepository + SessionRepository + FeedingRepository
{
}

impl<T> FullRepository for T where
    T: HorseRepository + UserRepository + SessionRepository + FeedingRepository
{
}
