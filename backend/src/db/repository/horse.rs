//! Horse repository trait.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{Horse, HorseId, NewHorse};

/// Repository trait for horse records.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait HorseRepository: Send + Sync {
    /// Store a new, active horse.
    ///
    /// # Returns
    /// * `Ok(Horse)` - The stored horse with its assigned id
    /// * `Err(RepositoryError)` - If the operation fails
    async fn create_horse(&self, horse: NewHorse) -> RepositoryResult<Horse>;

    /// Look up a horse, active or not.
    ///
    /// # Returns
    /// * `Ok(Some(Horse))` - The horse
    /// * `Ok(None)` - No horse with this id exists
    /// * `Err(RepositoryError)` - If the store could not be queried
    async fn find_horse_by_id(&self, id: HorseId) -> RepositoryResult<Option<Horse>>;

    /// List active horses ordered by name.
    async fn list_active_horses(&self) -> RepositoryResult<Vec<Horse>>;

    /// Replace a stored horse.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the horse does not exist
    async fn update_horse(&self, horse: &Horse) -> RepositoryResult<Horse>;
}
