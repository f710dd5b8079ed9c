//! Custom status labels, in user scope and team scope.
//!
//! Beyond the built-in goal lifecycle, users and teams can define their
//! own workflow labels. `combined_statuses` merges everything a caller
//! can use into one payload.

use crate::api::{
    is_valid_hex_color, is_valid_length, CombinedStatuses, NewStatus, StatusId, StatusPatch,
    TeamId, TeamRole, TeamStatus, UserStatus, DEFAULT_STATUS_NAMES, MAX_STATUS_NAME_LEN,
};
use crate::auth::AuthenticatedUser;
use crate::db::repositories::local::constraints;
use crate::db::repository::FullRepository;

use super::{violates, ServiceError, ServiceResult};

fn validate_input(name: Option<&str>, color: Option<&str>) -> ServiceResult<()> {
    if let Some(name) = name {
        if !is_valid_length(name, 1, MAX_STATUS_NAME_LEN) {
            return Err(ServiceError::Validation(
                "Status name must be between 1 and 50 characters".to_string(),
            ));
        }
    }
    if let Some(color) = color {
        if !is_valid_hex_color(color) {
            return Err(ServiceError::Validation(
                "Color must be a hex color like #3B82F6".to_string(),
            ));
        }
    }
    Ok(())
}

// ==================== User scope ====================

/// Create a status label owned by the caller.
pub async fn create_user_status(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
    input: NewStatus,
) -> ServiceResult<UserStatus> {
    validate_input(Some(&input.name), input.color.as_deref())?;
    let name = input.name.clone();
    repo.insert_user_status(user.user_id, input)
        .await
        .map_err(|err| {
            if violates(&err, constraints::USER_STATUS_NAME) {
                ServiceError::Validation(format!("Status name '{}' already exists", name))
            } else {
                err.into()
            }
        })
}

/// The caller's status labels ordered for display.
pub async fn list_user_statuses(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
) -> ServiceResult<Vec<UserStatus>> {
    Ok(repo.list_user_statuses(user.user_id).await?)
}

/// Fetch one of the caller's status labels, or report it missing.
async fn owned_user_status(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
    id: StatusId,
) -> ServiceResult<UserStatus> {
    match repo.fetch_user_status(id).await? {
        Some(status) if status.user_id == user.user_id => Ok(status),
        _ => Err(ServiceError::NotFound("Status not found".to_string())),
    }
}

/// Update one of the caller's status labels.
pub async fn update_user_status(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
    id: StatusId,
    patch: StatusPatch,
) -> ServiceResult<UserStatus> {
    let current = owned_user_status(repo, user, id).await?;
    validate_input(patch.name.as_deref(), patch.color.as_deref())?;
    if patch.name.is_none()
        && patch.color.is_none()
        && patch.icon.is_none()
        && patch.display_order.is_none()
    {
        return Ok(current);
    }

    repo.update_user_status(id, patch).await.map_err(|err| {
        if violates(&err, constraints::USER_STATUS_NAME) {
            ServiceError::Validation("Status name already exists".to_string())
        } else {
            err.into()
        }
    })
}

/// Delete one of the caller's status labels.
pub async fn delete_user_status(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
    id: StatusId,
) -> ServiceResult<()> {
    owned_user_status(repo, user, id).await?;
    repo.delete_user_status(id).await?;
    Ok(())
}

// ==================== Team scope ====================

async fn membership(
    repo: &dyn FullRepository,
    team_id: TeamId,
    user: &AuthenticatedUser,
) -> ServiceResult<TeamRole> {
    match repo.find_member(team_id, user.user_id).await? {
        Some(member) => Ok(member.role),
        None => Err(ServiceError::Forbidden(
            "You are not a member of this team".to_string(),
        )),
    }
}

/// Create a status label shared by a team. Owners only.
pub async fn create_team_status(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
    team_id: TeamId,
    input: NewStatus,
) -> ServiceResult<TeamStatus> {
    if membership(repo, team_id, user).await? != TeamRole::Owner {
        return Err(ServiceError::Forbidden(
            "Only team owners can create team statuses".to_string(),
        ));
    }
    validate_input(Some(&input.name), input.color.as_deref())?;

    let name = input.name.clone();
    repo.insert_team_status(team_id, user.user_id, input)
        .await
        .map_err(|err| {
            if violates(&err, constraints::TEAM_STATUS_NAME) {
                ServiceError::Validation(format!(
                    "Status name '{}' already exists for this team",
                    name
                ))
            } else {
                err.into()
            }
        })
}

/// A team's status labels ordered for display. Members only.
pub async fn list_team_statuses(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
    team_id: TeamId,
) -> ServiceResult<Vec<TeamStatus>> {
    membership(repo, team_id, user).await?;
    Ok(repo.list_team_statuses(team_id).await?)
}

async fn team_status_in(
    repo: &dyn FullRepository,
    team_id: TeamId,
    id: StatusId,
) -> ServiceResult<TeamStatus> {
    match repo.fetch_team_status(id).await? {
        Some(status) if status.team_id == team_id => Ok(status),
        _ => Err(ServiceError::NotFound("Team status not found".to_string())),
    }
}

/// Update a team's status label. Owners only.
pub async fn update_team_status(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
    team_id: TeamId,
    id: StatusId,
    patch: StatusPatch,
) -> ServiceResult<TeamStatus> {
    if membership(repo, team_id, user).await? != TeamRole::Owner {
        return Err(ServiceError::Forbidden(
            "Only team owners can update team statuses".to_string(),
        ));
    }
    let current = team_status_in(repo, team_id, id).await?;
    validate_input(patch.name.as_deref(), patch.color.as_deref())?;
    if patch.name.is_none()
        && patch.color.is_none()
        && patch.icon.is_none()
        && patch.display_order.is_none()
    {
        return Ok(current);
    }

    repo.update_team_status(id, patch).await.map_err(|err| {
        if violates(&err, constraints::TEAM_STATUS_NAME) {
            ServiceError::Validation("Status name already exists for this team".to_string())
        } else {
            err.into()
        }
    })
}

/// Delete a team's status label. Owners only.
pub async fn delete_team_status(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
    team_id: TeamId,
    id: StatusId,
) -> ServiceResult<()> {
    if membership(repo, team_id, user).await? != TeamRole::Owner {
        return Err(ServiceError::Forbidden(
            "Only team owners can delete team statuses".to_string(),
        ));
    }
    team_status_in(repo, team_id, id).await?;
    repo.delete_team_status(id).await?;
    Ok(())
}

// ==================== Combined view ====================

/// Everything the caller can label a goal with: their own statuses, the
/// statuses of every team they belong to, and the built-in lifecycle
/// names.
pub async fn combined_statuses(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
) -> ServiceResult<CombinedStatuses> {
    let user_statuses = repo.list_user_statuses(user.user_id).await?;

    let mut team_statuses = Vec::new();
    for team in repo.list_teams_for_user(user.user_id).await? {
        team_statuses.extend(repo.list_team_statuses(team.id).await?);
    }

    Ok(CombinedStatuses {
        user_statuses,
        team_statuses,
        default_statuses: DEFAULT_STATUS_NAMES.iter().map(|s| s.to_string()).collect(),
    })
}
