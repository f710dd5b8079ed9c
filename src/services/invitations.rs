//! Team invitations: issuing codes, accepting, declining and joining.

use chrono::{Duration, Utc};

use crate::api::{
    InvitationId, InvitationStatus, NewInvitation, NewNotification, NotificationKind, TeamId,
    TeamInvitation, TeamMember, TeamRole, UserId,
};
use crate::auth::{email_is_well_formed, AuthenticatedUser};
use crate::db::codes::generate_invite_code;
use crate::db::repositories::local::constraints;
use crate::db::repository::FullRepository;

use super::notifications::notify_quietly;
use super::{violates, ServiceError, ServiceResult};

const CODE_ATTEMPTS: usize = 3;

/// Invite someone to a team by email. Owners only.
///
/// The invitee does not need an account yet; if one exists they are
/// notified right away. The invitation carries a shareable join code and
/// expires after `ttl`.
pub async fn create_invitation(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
    team_id: TeamId,
    email: &str,
    ttl: Duration,
) -> ServiceResult<TeamInvitation> {
    let team = repo.fetch_team(team_id).await?;
    let member = repo.find_member(team_id, user.user_id).await?;
    let (team, member) = match (team, member) {
        (Some(team), Some(member)) => (team, member),
        _ => {
            return Err(ServiceError::NotFound(
                "Team not found or you are not a member".to_string(),
            ))
        }
    };
    if member.role != TeamRole::Owner {
        return Err(ServiceError::Forbidden(
            "Only team owners can send invitations".to_string(),
        ));
    }
    if !email_is_well_formed(email) {
        return Err(ServiceError::Validation("Invalid email address".to_string()));
    }
    let email = email.trim().to_lowercase();

    // Codes are random enough that collisions are freak events; retry a
    // couple of times rather than failing the request on one.
    let expires_at = Utc::now() + ttl;
    let mut attempt = 1;
    let invitation = loop {
        let result = repo
            .insert_invitation(NewInvitation {
                team_id,
                email: email.clone(),
                invite_code: generate_invite_code(),
                invited_by: user.user_id,
                expires_at,
            })
            .await;
        match result {
            Ok(created) => break created,
            Err(err) if violates(&err, constraints::INVITE_CODE) && attempt < CODE_ATTEMPTS => {
                attempt += 1;
            }
            Err(err) => return Err(err.into()),
        }
    };

    if let Some(invitee) = repo.find_user_by_email(&email).await? {
        notify_quietly(
            repo,
            NewNotification {
                user_id: invitee.id,
                kind: NotificationKind::TeamInvitation,
                title: "Team invitation".to_string(),
                message: format!("You've been invited to join {}", team.name),
                related_id: Some(invitation.id.value()),
            },
        )
        .await;
    }

    Ok(invitation)
}

/// Invitations sent for a team, newest first. Members only.
pub async fn list_team_invitations(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
    team_id: TeamId,
) -> ServiceResult<Vec<TeamInvitation>> {
    if repo.fetch_team(team_id).await?.is_none()
        || repo.find_member(team_id, user.user_id).await?.is_none()
    {
        return Err(ServiceError::NotFound(
            "Team not found or you are not a member".to_string(),
        ));
    }
    Ok(repo.list_invitations_for_team(team_id).await?)
}

/// Pending invitations addressed to the caller.
pub async fn list_my_invitations(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
) -> ServiceResult<Vec<TeamInvitation>> {
    Ok(repo.list_pending_invitations_for_email(&user.email).await?)
}

fn addressed_to(invitation: &TeamInvitation, user: &AuthenticatedUser) -> ServiceResult<()> {
    if invitation.email.to_lowercase() == user.email.to_lowercase() {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(format!(
            "This invitation is for {}, but you are logged in as {}",
            invitation.email, user.email
        )))
    }
}

/// Join the team, mark the invitation accepted.
///
/// If the membership already exists the invitation is still marked
/// accepted so it stops showing up as pending.
async fn complete_acceptance(
    repo: &dyn FullRepository,
    invitation: &TeamInvitation,
    user: UserId,
) -> ServiceResult<TeamMember> {
    let member = match repo
        .insert_member(
            invitation.team_id,
            user,
            TeamRole::Member,
            Some(invitation.invited_by),
        )
        .await
    {
        Ok(member) => member,
        Err(err) if violates(&err, constraints::TEAM_MEMBERSHIP) => {
            repo.update_invitation_status(invitation.id, InvitationStatus::Accepted)
                .await?;
            return Err(ServiceError::Validation(
                "You are already a member of this team".to_string(),
            ));
        }
        Err(err) => return Err(err.into()),
    };
    repo.update_invitation_status(invitation.id, InvitationStatus::Accepted)
        .await?;
    Ok(member)
}

/// Accept an invitation addressed to the caller's email.
pub async fn accept_invitation(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
    invitation_id: InvitationId,
) -> ServiceResult<TeamMember> {
    let invitation = repo
        .fetch_invitation(invitation_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Invitation not found".to_string()))?;
    if invitation.status != InvitationStatus::Pending {
        return Err(ServiceError::Validation(
            "This invitation has already been processed".to_string(),
        ));
    }
    addressed_to(&invitation, user)?;
    if Utc::now() >= invitation.expires_at {
        repo.update_invitation_status(invitation_id, InvitationStatus::Expired)
            .await?;
        return Err(ServiceError::Validation(
            "Invitation has expired".to_string(),
        ));
    }

    complete_acceptance(repo, &invitation, user.user_id).await
}

/// Decline an invitation addressed to the caller's email.
pub async fn decline_invitation(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
    invitation_id: InvitationId,
) -> ServiceResult<TeamInvitation> {
    let invitation = repo
        .fetch_invitation(invitation_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Invitation not found".to_string()))?;
    if invitation.status != InvitationStatus::Pending {
        return Err(ServiceError::Validation(
            "This invitation has already been processed".to_string(),
        ));
    }
    addressed_to(&invitation, user)?;

    Ok(repo
        .update_invitation_status(invitation_id, InvitationStatus::Declined)
        .await?)
}

/// Look an invitation up by its shareable code.
///
/// Expired invitations are marked as such on sight.
pub async fn get_invitation_by_code(
    repo: &dyn FullRepository,
    code: &str,
) -> ServiceResult<TeamInvitation> {
    let invitation = repo
        .find_invitation_by_code(code)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Invitation not found".to_string()))?;
    if invitation.status != InvitationStatus::Pending {
        return Err(ServiceError::Validation(
            "Invitation has already been processed".to_string(),
        ));
    }
    if Utc::now() >= invitation.expires_at {
        repo.update_invitation_status(invitation.id, InvitationStatus::Expired)
            .await?;
        return Err(ServiceError::Validation(
            "Invitation has expired".to_string(),
        ));
    }
    Ok(invitation)
}

/// Join a team with an invite code, regardless of the email it was sent
/// to. Whoever holds a live code may join.
pub async fn join_team_by_code(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
    code: &str,
) -> ServiceResult<TeamMember> {
    let invitation = get_invitation_by_code(repo, code).await?;
    complete_acceptance(repo, &invitation, user.user_id).await
}
