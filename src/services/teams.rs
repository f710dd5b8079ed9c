//! Team operations: CRUD, membership management and the member roster.

use serde::Serialize;

use crate::api::{
    is_valid_length, Goal, NewNotification, NewTeam, NotificationKind, Team, TeamId, TeamMember,
    TeamPatch, TeamRole, UserId, MAX_NESTING_LEVEL, MAX_TEAM_NAME_LEN,
};
use crate::auth::AuthenticatedUser;
use crate::db::repositories::local::constraints;
use crate::db::repository::FullRepository;

use super::notifications::notify_quietly;
use super::{violates, ServiceError, ServiceResult};

/// A membership row joined with the member's account details, as shown
/// in the team roster.
#[derive(Debug, Clone, Serialize)]
pub struct MemberProfile {
    #[serde(flatten)]
    pub member: TeamMember,
    pub email: String,
    pub display_name: String,
}

fn not_a_member() -> ServiceError {
    ServiceError::NotFound("Team not found or you are not a member".to_string())
}

fn validate_name(name: &str) -> ServiceResult<()> {
    if is_valid_length(name, 1, MAX_TEAM_NAME_LEN) {
        Ok(())
    } else {
        Err(ServiceError::Validation(
            "Team name must be between 1 and 100 characters".to_string(),
        ))
    }
}

/// Fetch a team together with the caller's membership row.
///
/// Missing teams and teams the caller does not belong to are reported
/// identically so team ids cannot be probed.
async fn member_team(
    repo: &dyn FullRepository,
    team_id: TeamId,
    user: UserId,
) -> ServiceResult<(Team, TeamMember)> {
    let team = repo.fetch_team(team_id).await?.ok_or_else(not_a_member)?;
    let member = repo
        .find_member(team_id, user)
        .await?
        .ok_or_else(not_a_member)?;
    Ok((team, member))
}

fn require_owner(member: &TeamMember, denied: &str) -> ServiceResult<()> {
    if member.role == TeamRole::Owner {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(denied.to_string()))
    }
}

async fn count_owners(repo: &dyn FullRepository, team_id: TeamId) -> ServiceResult<usize> {
    Ok(repo
        .list_members(team_id)
        .await?
        .iter()
        .filter(|m| m.role == TeamRole::Owner)
        .count())
}

/// Create a team; the caller becomes its owner.
///
/// A parent team may be named to build a hierarchy up to three levels
/// deep. The caller must belong to the parent.
pub async fn create_team(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
    input: NewTeam,
) -> ServiceResult<Team> {
    validate_name(&input.name)?;

    let nesting_level = match input.parent_team_id {
        Some(parent_id) => {
            let parent = match repo.fetch_team(parent_id).await? {
                Some(parent)
                    if repo.find_member(parent_id, user.user_id).await?.is_some() =>
                {
                    parent
                }
                _ => {
                    return Err(ServiceError::NotFound(
                        "Parent team not found or you are not a member".to_string(),
                    ))
                }
            };
            if parent.nesting_level >= MAX_NESTING_LEVEL {
                return Err(ServiceError::Validation(
                    "Maximum team nesting depth (3 levels) would be exceeded".to_string(),
                ));
            }
            parent.nesting_level + 1
        }
        None => 0,
    };

    Ok(repo.insert_team(user.user_id, input, nesting_level).await?)
}

/// Teams the caller belongs to, newest first.
pub async fn list_teams(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
) -> ServiceResult<Vec<Team>> {
    Ok(repo.list_teams_for_user(user.user_id).await?)
}

/// Fetch one team. Members only.
pub async fn get_team(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
    team_id: TeamId,
) -> ServiceResult<Team> {
    let (team, _) = member_team(repo, team_id, user.user_id).await?;
    Ok(team)
}

/// Update a team's details. Owners only.
pub async fn update_team(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
    team_id: TeamId,
    patch: TeamPatch,
) -> ServiceResult<Team> {
    let (team, member) = member_team(repo, team_id, user.user_id).await?;
    require_owner(&member, "Only team owners can update team details")?;

    if let Some(ref name) = patch.name {
        validate_name(name)?;
    }
    if patch.name.is_none() && patch.description.is_none() && patch.color_theme.is_none() {
        return Ok(team);
    }
    Ok(repo.update_team(team_id, patch).await?)
}

/// Delete a team. Owners only.
///
/// Remaining members are told before the membership rows disappear.
pub async fn delete_team(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
    team_id: TeamId,
) -> ServiceResult<()> {
    let (team, member) = member_team(repo, team_id, user.user_id).await?;
    require_owner(&member, "Only team owners can delete teams")?;

    for member in repo.list_members(team_id).await? {
        if member.user_id == user.user_id {
            continue;
        }
        notify_quietly(
            repo,
            NewNotification {
                user_id: member.user_id,
                kind: NotificationKind::TeamDeleted,
                title: "Team deleted".to_string(),
                message: format!("{} has been deleted", team.name),
                related_id: Some(team_id.value()),
            },
        )
        .await;
    }

    repo.delete_team(team_id).await?;
    Ok(())
}

/// The team roster with each member's email and display name. Members
/// only.
pub async fn list_members(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
    team_id: TeamId,
) -> ServiceResult<Vec<MemberProfile>> {
    member_team(repo, team_id, user.user_id).await?;

    let mut roster = Vec::new();
    for member in repo.list_members(team_id).await? {
        if let Some(account) = repo.fetch_user(member.user_id).await? {
            roster.push(MemberProfile {
                member,
                email: account.email,
                display_name: account.display_name,
            });
        }
    }
    Ok(roster)
}

/// Add an existing user to a team. Owners only.
pub async fn add_member(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
    team_id: TeamId,
    new_member: UserId,
    role: TeamRole,
) -> ServiceResult<TeamMember> {
    let (team, member) = member_team(repo, team_id, user.user_id).await?;
    require_owner(&member, "Only team owners can add members")?;

    if repo.fetch_user(new_member).await?.is_none() {
        return Err(ServiceError::NotFound("User not found".to_string()));
    }

    let inserted = repo
        .insert_member(team_id, new_member, role, Some(user.user_id))
        .await
        .map_err(|err| {
            if violates(&err, constraints::TEAM_MEMBERSHIP) {
                ServiceError::Validation("User is already a member of this team".to_string())
            } else {
                err.into()
            }
        })?;

    notify_quietly(
        repo,
        NewNotification {
            user_id: new_member,
            kind: NotificationKind::TeamMemberAdded,
            title: "Added to a team".to_string(),
            message: format!("You've been added to {}", team.name),
            related_id: Some(team_id.value()),
        },
    )
    .await;

    Ok(inserted)
}

/// Change a member's role. Owners only; the last owner cannot be
/// demoted.
pub async fn update_member_role(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
    team_id: TeamId,
    member_id: UserId,
    role: TeamRole,
) -> ServiceResult<TeamMember> {
    let (_, member) = member_team(repo, team_id, user.user_id).await?;
    require_owner(&member, "Only team owners can update member roles")?;

    let target = repo
        .find_member(team_id, member_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Member not found in this team".to_string()))?;

    if target.role == TeamRole::Owner
        && role != TeamRole::Owner
        && count_owners(repo, team_id).await? == 1
    {
        return Err(ServiceError::Validation(
            "Cannot demote the last owner of the team".to_string(),
        ));
    }

    Ok(repo.update_member_role(team_id, member_id, role).await?)
}

/// Remove a member. Owners can remove anyone; everyone can remove
/// themselves. The last owner cannot leave.
pub async fn remove_member(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
    team_id: TeamId,
    member_id: UserId,
) -> ServiceResult<()> {
    let (team, member) = member_team(repo, team_id, user.user_id).await?;
    if member.role != TeamRole::Owner && member_id != user.user_id {
        return Err(ServiceError::Forbidden(
            "Only team owners can remove other members".to_string(),
        ));
    }

    let target = repo
        .find_member(team_id, member_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Member not found in this team".to_string()))?;

    if target.role == TeamRole::Owner && count_owners(repo, team_id).await? == 1 {
        return Err(ServiceError::Validation(
            "Cannot remove the last owner of the team".to_string(),
        ));
    }

    repo.remove_member(team_id, member_id).await?;

    // Leaving on your own is not worth a notification.
    if member_id != user.user_id {
        notify_quietly(
            repo,
            NewNotification {
                user_id: member_id,
                kind: NotificationKind::TeamMemberRemoved,
                title: "Removed from team".to_string(),
                message: format!("You've been removed from {}", team.name),
                related_id: Some(team_id.value()),
            },
        )
        .await;
    }

    Ok(())
}

/// Goals assigned to a team, newest first. Members only.
pub async fn list_team_goals(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
    team_id: TeamId,
) -> ServiceResult<Vec<Goal>> {
    member_team(repo, team_id, user.user_id).await?;
    Ok(repo.list_goals_for_team(team_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use crate::db::repository::{NotificationRepository, TeamRepository};
    use crate::services::testing::{acting, user};

    fn team_named(name: &str, parent: Option<TeamId>) -> NewTeam {
        NewTeam {
            name: name.to_string(),
            description: None,
            color_theme: None,
            parent_team_id: parent,
        }
    }

    #[tokio::test]
    async fn nesting_is_capped_at_three_levels() {
        let repo = LocalRepository::new();
        let alice = user(&repo, "alice@example.com").await;
        let actor = acting(&alice);

        let root = create_team(&repo, &actor, team_named("root", None)).await.unwrap();
        assert_eq!(root.nesting_level, 0);
        let child = create_team(&repo, &actor, team_named("child", Some(root.id)))
            .await
            .unwrap();
        let grandchild = create_team(&repo, &actor, team_named("leaf", Some(child.id)))
            .await
            .unwrap();
        assert_eq!(grandchild.nesting_level, 2);

        let err = create_team(&repo, &actor, team_named("too deep", Some(grandchild.id)))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        // A parent you don't belong to reads as missing.
        let bob = user(&repo, "bob@example.com").await;
        let err = create_team(&repo, &acting(&bob), team_named("orphan", Some(root.id)))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn updates_and_deletes_are_owner_only() {
        let repo = LocalRepository::new();
        let alice = user(&repo, "alice@example.com").await;
        let bob = user(&repo, "bob@example.com").await;
        let team = create_team(&repo, &acting(&alice), team_named("ops", None))
            .await
            .unwrap();
        add_member(&repo, &acting(&alice), team.id, bob.id, TeamRole::Member)
            .await
            .unwrap();

        let err = update_team(
            &repo,
            &acting(&bob),
            team.id,
            TeamPatch {
                name: Some("renamed".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let err = delete_team(&repo, &acting(&bob), team.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        // Outsiders can't even see it.
        let carol = user(&repo, "carol@example.com").await;
        let err = get_team(&repo, &acting(&carol), team.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn membership_lifecycle_with_notifications() {
        let repo = LocalRepository::new();
        let alice = user(&repo, "alice@example.com").await;
        let bob = user(&repo, "bob@example.com").await;
        let team = create_team(&repo, &acting(&alice), team_named("crew", None))
            .await
            .unwrap();

        add_member(&repo, &acting(&alice), team.id, bob.id, TeamRole::Member)
            .await
            .unwrap();
        let added = repo.list_notifications(bob.id, true).await.unwrap();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].kind, NotificationKind::TeamMemberAdded);
        assert_eq!(added[0].message, "You've been added to crew");

        let err = add_member(&repo, &acting(&alice), team.id, bob.id, TeamRole::Member)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let roster = list_members(&repo, &acting(&bob), team.id).await.unwrap();
        assert_eq!(roster.len(), 2);
        assert!(roster.iter().any(|p| p.email == "bob@example.com"));

        remove_member(&repo, &acting(&alice), team.id, bob.id)
            .await
            .unwrap();
        let latest = &repo.list_notifications(bob.id, true).await.unwrap()[0];
        assert_eq!(latest.kind, NotificationKind::TeamMemberRemoved);
    }

    #[tokio::test]
    async fn self_removal_is_allowed_and_quiet() {
        let repo = LocalRepository::new();
        let alice = user(&repo, "alice@example.com").await;
        let bob = user(&repo, "bob@example.com").await;
        let team = create_team(&repo, &acting(&alice), team_named("crew", None))
            .await
            .unwrap();
        add_member(&repo, &acting(&alice), team.id, bob.id, TeamRole::Member)
            .await
            .unwrap();
        let before = repo.list_notifications(bob.id, false).await.unwrap().len();

        remove_member(&repo, &acting(&bob), team.id, bob.id)
            .await
            .unwrap();
        assert!(repo.find_member(team.id, bob.id).await.unwrap().is_none());
        assert_eq!(
            repo.list_notifications(bob.id, false).await.unwrap().len(),
            before
        );

        // A plain member cannot remove someone else.
        add_member(&repo, &acting(&alice), team.id, bob.id, TeamRole::Member)
            .await
            .unwrap();
        let err = remove_member(&repo, &acting(&bob), team.id, alice.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn the_last_owner_is_pinned() {
        let repo = LocalRepository::new();
        let alice = user(&repo, "alice@example.com").await;
        let bob = user(&repo, "bob@example.com").await;
        let team = create_team(&repo, &acting(&alice), team_named("solo", None))
            .await
            .unwrap();

        let err = remove_member(&repo, &acting(&alice), team.id, alice.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        add_member(&repo, &acting(&alice), team.id, bob.id, TeamRole::Member)
            .await
            .unwrap();
        let err = update_member_role(&repo, &acting(&alice), team.id, alice.id, TeamRole::Member)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        // With a second owner in place the first may step down.
        update_member_role(&repo, &acting(&alice), team.id, bob.id, TeamRole::Owner)
            .await
            .unwrap();
        remove_member(&repo, &acting(&alice), team.id, alice.id)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn deleting_a_team_tells_the_members() {
        let repo = LocalRepository::new();
        let alice = user(&repo, "alice@example.com").await;
        let bob = user(&repo, "bob@example.com").await;
        let team = create_team(&repo, &acting(&alice), team_named("ephemeral", None))
            .await
            .unwrap();
        add_member(&repo, &acting(&alice), team.id, bob.id, TeamRole::Member)
            .await
            .unwrap();

        delete_team(&repo, &acting(&alice), team.id).await.unwrap();
        assert!(repo.fetch_team(team.id).await.unwrap().is_none());

        let latest = &repo.list_notifications(bob.id, true).await.unwrap()[0];
        assert_eq!(latest.kind, NotificationKind::TeamDeleted);
        assert_eq!(latest.message, "ephemeral has been deleted");
        // The actor is not notified about their own deletion.
        assert!(repo
            .list_notifications(alice.id, false)
            .await
            .unwrap()
            .is_empty());
    }
}
