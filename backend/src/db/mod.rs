//! Storage layer for horses, users, sessions and feeding tasks.
//!
//! Storage sits behind the Repository pattern so backends can be swapped
//! without touching the welfare rules or the HTTP layer.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Application Layer (REST API, tests)                    │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Service Layer (crate::services) - Business Logic       │
//! │  - Welfare validation                                   │
//! │  - Booking and feeding workflows                        │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository Traits (repository/) - Abstract Interface   │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌──────────────────────────────────────────────┐
//!     │             Local Repository                  │
//!     │               (in-memory)                     │
//!     └──────────────────────────────────────────────┘
//! ```
//!
//! - `repository`: trait definitions, split by concern
//! - `repositories::local`: in-memory implementation
//! - `factory`: creates repository instances from configuration
//! - `services`: plain CRUD for horses and users with input checks
//!
//! The repository is always passed in explicitly; there is no process-wide
//! instance.

pub mod factory;
pub mod repositories;
pub mod repository;
pub mod services;

pub use factory::{RepositoryFactory, RepositoryType};
pub use repositories::LocalRepository;
pub use services::health_check;
pub use repository::{
    ErrorContext, FeedingRepository, FullRepository, HorseRepository, RepositoryError,
    RepositoryResult, SessionRepository, UserRepository,
};
