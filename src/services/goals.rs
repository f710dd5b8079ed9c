//! Goal operations: CRUD, the category junction, and team assignment.

use std::collections::HashSet;

use crate::api::{
    is_valid_length, Category, CategoryId, Goal, GoalId, GoalPatch, GoalStatus, NewGoal,
    NewNotification, NotificationKind, TeamId, UserId, MAX_GOAL_TITLE_LEN,
};
use crate::auth::AuthenticatedUser;
use crate::db::repository::FullRepository;

use super::notifications::notify_quietly;
use super::{goal_read_access, is_team_member, ServiceError, ServiceResult};

fn validate_title(title: &str) -> ServiceResult<()> {
    if is_valid_length(title, 1, MAX_GOAL_TITLE_LEN) {
        Ok(())
    } else {
        Err(ServiceError::Validation(
            "Title must be between 1 and 200 characters".to_string(),
        ))
    }
}

/// Fetch a goal the caller owns, or report it missing.
///
/// Ownership failures read as "not found" so callers cannot probe for
/// other users' goal ids.
async fn owned_goal(
    repo: &dyn FullRepository,
    user: UserId,
    id: GoalId,
) -> ServiceResult<Goal> {
    match repo.fetch_goal(id).await? {
        Some(goal) if goal.owner_id == user => Ok(goal),
        _ => Err(ServiceError::NotFound("Goal not found".to_string())),
    }
}

/// Create a goal owned by the caller.
pub async fn create_goal(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
    input: NewGoal,
) -> ServiceResult<Goal> {
    validate_title(&input.title)?;
    Ok(repo.insert_goal(user.user_id, input).await?)
}

/// List the caller's goals, newest first.
pub async fn list_goals(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
) -> ServiceResult<Vec<Goal>> {
    Ok(repo.list_goals_for_owner(user.user_id).await?)
}

/// Fetch a single readable goal.
pub async fn get_goal(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
    id: GoalId,
) -> ServiceResult<Goal> {
    let goal = repo
        .fetch_goal(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Goal not found".to_string()))?;

    if goal_read_access(repo, &goal, user.user_id).await? {
        Ok(goal)
    } else {
        Err(ServiceError::NotFound("Goal not found".to_string()))
    }
}

/// Update a goal. Owner only; `None` fields are left untouched.
///
/// Completing a goal that is assigned to teams notifies every member of
/// those teams except the actor, one row per affected user.
pub async fn update_goal(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
    id: GoalId,
    patch: GoalPatch,
) -> ServiceResult<Goal> {
    let goal = owned_goal(repo, user.user_id, id).await?;

    if let Some(ref title) = patch.title {
        validate_title(title)?;
    }
    if patch.is_empty() {
        return Ok(goal);
    }

    let completing =
        patch.status == Some(GoalStatus::Completed) && goal.status != GoalStatus::Completed;

    let updated = repo.update_goal(id, patch).await?;

    if completing {
        let mut notified: HashSet<UserId> = HashSet::new();
        for team_id in repo.list_goal_team_ids(id).await? {
            for member in repo.list_members(team_id).await? {
                if member.user_id == user.user_id || !notified.insert(member.user_id) {
                    continue;
                }
                notify_quietly(
                    repo,
                    NewNotification {
                        user_id: member.user_id,
                        kind: NotificationKind::TeamGoalCompleted,
                        title: "Team goal completed".to_string(),
                        message: format!("{} has been completed", updated.title),
                        related_id: Some(id.value()),
                    },
                )
                .await;
            }
        }
    }

    Ok(updated)
}

/// Delete a goal and everything attached to it. Owner only.
pub async fn delete_goal(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
    id: GoalId,
) -> ServiceResult<()> {
    owned_goal(repo, user.user_id, id).await?;
    repo.delete_goal(id).await?;
    Ok(())
}

/// Check that a category exists and belongs to the caller.
async fn owned_category(
    repo: &dyn FullRepository,
    user: UserId,
    id: CategoryId,
) -> ServiceResult<Category> {
    match repo.fetch_category(id).await? {
        Some(category) if category.user_id == user => Ok(category),
        _ => Err(ServiceError::NotFound(format!(
            "Category with id {} not found",
            id
        ))),
    }
}

/// Replace the set of categories attached to a goal.
///
/// Returns the resulting category ids. Every named category must belong
/// to the caller.
pub async fn set_goal_categories(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
    goal_id: GoalId,
    category_ids: &[CategoryId],
) -> ServiceResult<Vec<CategoryId>> {
    owned_goal(repo, user.user_id, goal_id).await?;
    for &category_id in category_ids {
        owned_category(repo, user.user_id, category_id).await?;
    }

    let wanted: HashSet<CategoryId> = category_ids.iter().copied().collect();
    let current: HashSet<CategoryId> = repo
        .list_goal_categories(goal_id)
        .await?
        .into_iter()
        .collect();

    for &stale in current.difference(&wanted) {
        repo.detach_category(goal_id, stale).await?;
    }
    for &fresh in wanted.difference(&current) {
        repo.attach_category(goal_id, fresh).await?;
    }

    Ok(repo.list_goal_categories(goal_id).await?)
}

/// Attach one category to a goal. Re-attaching is a silent no-op.
pub async fn attach_category(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
    goal_id: GoalId,
    category_id: CategoryId,
) -> ServiceResult<()> {
    owned_goal(repo, user.user_id, goal_id).await?;
    owned_category(repo, user.user_id, category_id).await?;
    repo.attach_category(goal_id, category_id).await?;
    Ok(())
}

/// Detach one category from a goal.
pub async fn detach_category(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
    goal_id: GoalId,
    category_id: CategoryId,
) -> ServiceResult<()> {
    owned_goal(repo, user.user_id, goal_id).await?;
    repo.detach_category(goal_id, category_id).await?;
    Ok(())
}

/// Categories attached to a readable goal.
pub async fn list_goal_categories(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
    goal_id: GoalId,
) -> ServiceResult<Vec<CategoryId>> {
    get_goal(repo, user, goal_id).await?;
    Ok(repo.list_goal_categories(goal_id).await?)
}

/// Assign a goal to one or more teams.
///
/// The caller must own the goal and be a member of every named team.
/// Already-assigned teams are tolerated silently; members of each newly
/// assigned team (except the actor) are notified. Returns how many teams
/// were newly assigned.
pub async fn assign_goal_to_teams(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
    goal_id: GoalId,
    team_ids: &[TeamId],
) -> ServiceResult<usize> {
    let goal = match repo.fetch_goal(goal_id).await? {
        Some(goal) if goal.owner_id == user.user_id => goal,
        _ => {
            return Err(ServiceError::NotFound(
                "Goal not found or you do not own it".to_string(),
            ))
        }
    };

    for &team_id in team_ids {
        if !is_team_member(repo, team_id, user.user_id).await? {
            return Err(ServiceError::NotFound(format!(
                "Team {} not found or you are not a member",
                team_id
            )));
        }
    }

    let mut newly_assigned = 0;
    for &team_id in team_ids {
        if !repo
            .assign_goal_to_team(goal_id, team_id, user.user_id)
            .await?
        {
            continue;
        }
        newly_assigned += 1;

        let team_name = match repo.fetch_team(team_id).await? {
            Some(team) => team.name,
            None => continue,
        };
        for member in repo.list_members(team_id).await? {
            if member.user_id == user.user_id {
                continue;
            }
            notify_quietly(
                repo,
                NewNotification {
                    user_id: member.user_id,
                    kind: NotificationKind::TeamGoalAssigned,
                    title: "New team goal".to_string(),
                    message: format!("{} has been assigned to {}", goal.title, team_name),
                    related_id: Some(goal_id.value()),
                },
            )
            .await;
        }
    }

    Ok(newly_assigned)
}

/// Remove a goal from a team. Goal owner only.
pub async fn unassign_goal_from_team(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
    goal_id: GoalId,
    team_id: TeamId,
) -> ServiceResult<bool> {
    match repo.fetch_goal(goal_id).await? {
        Some(goal) if goal.owner_id == user.user_id => {}
        _ => {
            return Err(ServiceError::NotFound(
                "Goal not found or you do not own it".to_string(),
            ))
        }
    }
    Ok(repo.unassign_goal_from_team(goal_id, team_id).await?)
}
