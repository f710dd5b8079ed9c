//! Team, membership and invitation repository trait.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::{
    InvitationId, InvitationStatus, NewInvitation, NewTeam, Team, TeamId, TeamInvitation,
    TeamMember, TeamPatch, TeamRole, UserId,
};

/// Repository trait for teams, their memberships and their invitations.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait TeamRepository: Send + Sync {
    // ==================== Teams ====================

    /// Insert a team and its creator's owner membership atomically.
    ///
    /// `nesting_level` is computed by the caller from the parent team;
    /// the repository stores it verbatim.
    async fn insert_team(
        &self,
        created_by: UserId,
        new: NewTeam,
        nesting_level: i32,
    ) -> RepositoryResult<Team>;

    /// Fetch a team by id.
    async fn fetch_team(&self, id: TeamId) -> RepositoryResult<Option<Team>>;

    /// List teams the user is a member of, newest first.
    async fn list_teams_for_user(&self, user: UserId) -> RepositoryResult<Vec<Team>>;

    /// Apply a partial update to a team and refresh its `updated_at`.
    async fn update_team(&self, id: TeamId, patch: TeamPatch) -> RepositoryResult<Team>;

    /// Delete a team with its memberships, invitations, statuses and
    /// goal assignments. Goals and child teams survive (children keep
    /// their recorded nesting level and dangling parent id is cleared).
    async fn delete_team(&self, id: TeamId) -> RepositoryResult<bool>;

    // ==================== Members ====================

    /// Membership rows for a team ordered by join time ascending.
    async fn list_members(&self, team: TeamId) -> RepositoryResult<Vec<TeamMember>>;

    /// Fetch a single membership row.
    async fn find_member(&self, team: TeamId, user: UserId)
        -> RepositoryResult<Option<TeamMember>>;

    /// Insert a membership row.
    ///
    /// # Returns
    /// * `Err(RepositoryError::ValidationError)` with constraint
    ///   `unique_team_membership` - If the user already belongs to the team
    async fn insert_member(
        &self,
        team: TeamId,
        user: UserId,
        role: TeamRole,
        invited_by: Option<UserId>,
    ) -> RepositoryResult<TeamMember>;

    /// Change a member's role.
    async fn update_member_role(
        &self,
        team: TeamId,
        user: UserId,
        role: TeamRole,
    ) -> RepositoryResult<TeamMember>;

    /// Remove a member from a team.
    async fn remove_member(&self, team: TeamId, user: UserId) -> RepositoryResult<bool>;

    // ==================== Invitations ====================

    /// Insert an invitation row with status `Pending`.
    ///
    /// # Returns
    /// * `Err(RepositoryError::ValidationError)` - If the invite code
    ///   collides with an existing one
    async fn insert_invitation(&self, new: NewInvitation) -> RepositoryResult<TeamInvitation>;

    /// Fetch an invitation by id.
    async fn fetch_invitation(&self, id: InvitationId)
        -> RepositoryResult<Option<TeamInvitation>>;

    /// Look an invitation up by its code.
    async fn find_invitation_by_code(
        &self,
        code: &str,
    ) -> RepositoryResult<Option<TeamInvitation>>;

    /// Invitations sent for a team, newest first.
    async fn list_invitations_for_team(
        &self,
        team: TeamId,
    ) -> RepositoryResult<Vec<TeamInvitation>>;

    /// Pending invitations addressed to an email (case-insensitive),
    /// newest first.
    async fn list_pending_invitations_for_email(
        &self,
        email: &str,
    ) -> RepositoryResult<Vec<TeamInvitation>>;

    /// Set an invitation's status.
    async fn update_invitation_status(
        &self,
        id: InvitationId,
        status: InvitationStatus,
    ) -> RepositoryResult<TeamInvitation>;
}
