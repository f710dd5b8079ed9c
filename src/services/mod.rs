//! Business logic over the repository traits.
//!
//! Every operation takes the acting authenticated user and enforces
//! authorization itself; the repositories only store. "Not found" covers
//! "exists but you may not see it" wherever leaking existence would tell a
//! caller something they have no right to know.

use std::time::Instant;

use crate::api::{Goal, GoalId, TeamId, UserId, Visibility};
use crate::db::repository::{FullRepository, RepositoryError};

pub mod categories;
pub mod files;
pub mod goals;
pub mod invitations;
pub mod notifications;
pub mod statuses;
pub mod teams;

/// Errors surfaced by service operations.
///
/// The HTTP layer maps these onto status codes: `NotFound` → 404,
/// `Forbidden` → 403, `Validation` → 400, `Repository` → 500.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Repository(RepositoryError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<RepositoryError> for ServiceError {
    fn from(e: RepositoryError) -> Self {
        if e.is_not_found() {
            ServiceError::NotFound("Resource not found".to_string())
        } else {
            ServiceError::Repository(e)
        }
    }
}

/// True when `err` is a validation error caused by the named constraint.
pub(crate) fn violates(err: &RepositoryError, constraint: &str) -> bool {
    matches!(err, RepositoryError::ValidationError { .. })
        && err
            .context()
            .details
            .as_deref()
            .is_some_and(|d| d.contains(&format!("constraint={constraint}")))
}

/// Is `user` a member of `team`?
pub(crate) async fn is_team_member(
    repo: &dyn FullRepository,
    team: TeamId,
    user: UserId,
) -> ServiceResult<bool> {
    Ok(repo.find_member(team, user).await?.is_some())
}

/// Is `user` a member of any team the goal is assigned to?
pub(crate) async fn member_of_assigned_team(
    repo: &dyn FullRepository,
    goal: GoalId,
    user: UserId,
) -> ServiceResult<bool> {
    for team_id in repo.list_goal_team_ids(goal).await? {
        if is_team_member(repo, team_id, user).await? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Read access: owner, public goal, or member of an assigned team.
pub(crate) async fn goal_read_access(
    repo: &dyn FullRepository,
    goal: &Goal,
    user: UserId,
) -> ServiceResult<bool> {
    if goal.owner_id == user || goal.visibility == Visibility::Public {
        return Ok(true);
    }
    member_of_assigned_team(repo, goal.id, user).await
}

/// Write access: owner or member of an assigned team.
pub(crate) async fn goal_write_access(
    repo: &dyn FullRepository,
    goal: &Goal,
    user: UserId,
) -> ServiceResult<bool> {
    if goal.owner_id == user {
        return Ok(true);
    }
    member_of_assigned_team(repo, goal.id, user).await
}

/// Backend health probe result.
#[derive(Debug, Clone)]
pub struct HealthReport {
    pub backend: &'static str,
    pub healthy: bool,
    pub latency_ms: u64,
}

/// Probe the storage backend and measure round-trip latency.
pub async fn health_check(repo: &dyn FullRepository) -> HealthReport {
    let start = Instant::now();
    let healthy = repo.health_check().await.is_ok();
    HealthReport {
        backend: repo.backend_name(),
        healthy,
        latency_ms: start.elapsed().as_millis() as u64,
    }
}
