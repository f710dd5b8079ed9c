//! Repository trait definitions.
//!
//! Each aggregate gets its own trait so backends can be composed and
//! tested piecemeal; [`FullRepository`] glues them together for the
//! application, which always talks to `Arc<dyn FullRepository>`.

pub mod error;
pub mod files;
pub mod goals;
pub mod notifications;
pub mod statuses;
pub mod teams;
pub mod users;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};
pub use files::FileRepository;
pub use goals::GoalRepository;
pub use notifications::NotificationRepository;
pub use statuses::StatusRepository;
pub use teams::TeamRepository;
pub use users::UserRepository;

use async_trait::async_trait;

/// Combined repository interface implemented by every storage backend.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait FullRepository:
    UserRepository
    + GoalRepository
    + TeamRepository
    + NotificationRepository
    + FileRepository
    + StatusRepository
{
    /// Verify the backend is reachable and able to answer queries.
    async fn health_check(&self) -> RepositoryResult<()>;

    /// Short static name of the backend ("local", "postgres").
    fn backend_name(&self) -> &'static str;
}
