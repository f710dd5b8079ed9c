//! Custom status label repository trait.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::{NewStatus, StatusId, StatusPatch, TeamId, TeamStatus, UserId, UserStatus};

/// Repository trait for custom status labels in both scopes.
///
/// Names are unique per owner scope (constraint
/// `unique_user_status_name` / `unique_team_status_name`); listings are
/// ordered by `display_order`.
#[async_trait]
pub trait StatusRepository: Send + Sync {
    // ==================== User scope ====================

    async fn insert_user_status(
        &self,
        owner: UserId,
        new: NewStatus,
    ) -> RepositoryResult<UserStatus>;

    async fn fetch_user_status(&self, id: StatusId) -> RepositoryResult<Option<UserStatus>>;

    async fn list_user_statuses(&self, owner: UserId) -> RepositoryResult<Vec<UserStatus>>;

    async fn update_user_status(
        &self,
        id: StatusId,
        patch: StatusPatch,
    ) -> RepositoryResult<UserStatus>;

    async fn delete_user_status(&self, id: StatusId) -> RepositoryResult<bool>;

    // ==================== Team scope ====================

    async fn insert_team_status(
        &self,
        team: TeamId,
        created_by: UserId,
        new: NewStatus,
    ) -> RepositoryResult<TeamStatus>;

    async fn fetch_team_status(&self, id: StatusId) -> RepositoryResult<Option<TeamStatus>>;

    async fn list_team_statuses(&self, team: TeamId) -> RepositoryResult<Vec<TeamStatus>>;

    async fn update_team_status(
        &self,
        id: StatusId,
        patch: StatusPatch,
    ) -> RepositoryResult<TeamStatus>;

    async fn delete_team_status(&self, id: StatusId) -> RepositoryResult<bool>;
}
