//! User and session repository trait.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::{NewSession, NewUser, Session, User, UserId};

/// Repository trait for user accounts and their bearer sessions.
///
/// Sessions store only token digests; expiry is interpreted by the auth
/// service, not the repository.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user account.
    ///
    /// # Returns
    /// * `Ok(User)` - The created user with generated id and timestamps
    /// * `Err(RepositoryError::ValidationError)` - If the email is already taken
    async fn insert_user(&self, new: NewUser) -> RepositoryResult<User>;

    /// Fetch a user by id.
    ///
    /// # Returns
    /// * `Ok(Some(User))` - If the user exists
    /// * `Ok(None)` - If no such user
    async fn fetch_user(&self, id: UserId) -> RepositoryResult<Option<User>>;

    /// Look a user up by email, case-insensitively.
    async fn find_user_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;

    /// List all registered users, ordered by creation time ascending.
    async fn list_users(&self) -> RepositoryResult<Vec<User>>;

    /// Persist a new session row.
    async fn insert_session(&self, new: NewSession) -> RepositoryResult<Session>;

    /// Look a session up by its token digest.
    async fn find_session_by_digest(&self, digest: &str) -> RepositoryResult<Option<Session>>;

    /// Delete the session with the given token digest.
    ///
    /// # Returns
    /// * `Ok(true)` - A session was removed
    /// * `Ok(false)` - No session matched the digest
    async fn delete_session(&self, digest: &str) -> RepositoryResult<bool>;

    /// Remove all sessions whose expiry lies in the past.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of sessions removed
    async fn delete_expired_sessions(&self) -> RepositoryResult<usize>;
}
