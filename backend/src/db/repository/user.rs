//! User repository trait.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{NewUser, Role, User, UserId};

/// Repository trait for stable users (riders, trainers, staff).
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, user: NewUser) -> RepositoryResult<User>;

    async fn find_user_by_id(&self, id: UserId) -> RepositoryResult<Option<User>>;

    /// List all users ordered by name.
    async fn list_users(&self) -> RepositoryResult<Vec<User>>;

    /// List users holding `role` (among possibly others), ordered by name.
    async fn list_users_with_role(&self, role: Role) -> RepositoryResult<Vec<User>>;

    /// Replace a stored user.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the user does not exist
    async fn update_user(&self, user: &User) -> RepositoryResult<User>;

    /// Remove a user permanently.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the user does not exist
    async fn delete_user(&self, id: UserId) -> RepositoryResult<()>;
}
