//! In-memory repository implementation.
//!
//! `LocalRepository` backs the default `local-repo` feature: every table
//! is a `HashMap` behind a `parking_lot::RwLock`, ids come from a single
//! atomic sequence, and the uniqueness rules the SQL schema declares are
//! enforced by hand so the service layer sees the same
//! `RepositoryError`s in tests as it does against Postgres.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::api::{
    Category, CategoryId, CategoryPatch, FileId, Goal, GoalFile, GoalId, GoalPatch, GoalStatus,
    InvitationId, InvitationStatus, NewCategory, NewGoal, NewGoalFile, NewInvitation,
    NewNotification, NewSession, NewStatus, NewTeam, NewUser, Notification, NotificationId,
    Session, SessionId, StatusId, StatusPatch, Team, TeamId, TeamInvitation, TeamMember, TeamPatch,
    TeamRole, TeamStatus, User, UserId, UserRole, UserStatus, Visibility, DEFAULT_COLOR,
};
use crate::db::repository::error::{RepositoryError, RepositoryResult};
use crate::db::repository::{
    FileRepository, FullRepository, GoalRepository, NotificationRepository, StatusRepository,
    TeamRepository, UserRepository,
};

/// Constraint names mirrored from the Postgres schema so both backends
/// report identical validation errors.
pub mod constraints {
    pub const USERS_EMAIL: &str = "users_email_unique";
    pub const TEAM_MEMBERSHIP: &str = "unique_team_membership";
    pub const GOAL_TEAM_ASSIGNMENT: &str = "unique_goal_team_assignment";
    pub const USER_STATUS_NAME: &str = "unique_user_status_name";
    pub const TEAM_STATUS_NAME: &str = "unique_team_status_name";
    pub const CATEGORY_NAME: &str = "categories_name_user_unique";
    pub const INVITE_CODE: &str = "team_invitations_invite_code_unique";
}

struct StoredFile {
    meta: GoalFile,
    content: Vec<u8>,
}

/// In-memory repository for tests and local development.
pub struct LocalRepository {
    users: RwLock<HashMap<Uuid, User>>,
    sessions: RwLock<HashMap<i64, Session>>,
    goals: RwLock<HashMap<i64, Goal>>,
    categories: RwLock<HashMap<i64, Category>>,
    goal_categories: RwLock<HashSet<(i64, i64)>>,
    teams: RwLock<HashMap<i64, Team>>,
    members: RwLock<HashMap<i64, TeamMember>>,
    invitations: RwLock<HashMap<i64, TeamInvitation>>,
    notifications: RwLock<HashMap<i64, Notification>>,
    goal_teams: RwLock<HashMap<(i64, i64), UserId>>,
    files: RwLock<HashMap<i64, StoredFile>>,
    user_statuses: RwLock<HashMap<i64, UserStatus>>,
    team_statuses: RwLock<HashMap<i64, TeamStatus>>,
    next_id: AtomicI64,
}

impl LocalRepository {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            sessions: RwLock::new(HashMap::new()),
            goals: RwLock::new(HashMap::new()),
            categories: RwLock::new(HashMap::new()),
            goal_categories: RwLock::new(HashSet::new()),
            teams: RwLock::new(HashMap::new()),
            members: RwLock::new(HashMap::new()),
            invitations: RwLock::new(HashMap::new()),
            notifications: RwLock::new(HashMap::new()),
            goal_teams: RwLock::new(HashMap::new()),
            files: RwLock::new(HashMap::new()),
            user_statuses: RwLock::new(HashMap::new()),
            team_statuses: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for LocalRepository {
    async fn insert_user(&self, new: NewUser) -> RepositoryResult<User> {
        let mut users = self.users.write();
        let lowered = new.email.to_lowercase();
        if users.values().any(|u| u.email.to_lowercase() == lowered) {
            return Err(RepositoryError::constraint_violation(
                format!("Email '{}' is already registered", new.email),
                constraints::USERS_EMAIL,
            ));
        }

        let user = User {
            id: UserId::new(Uuid::new_v4()),
            email: lowered,
            display_name: new.display_name,
            role: new.role.unwrap_or(UserRole::User),
            created_at: Utc::now(),
        };
        users.insert(user.id.value(), user.clone());
        Ok(user)
    }

    async fn fetch_user(&self, id: UserId) -> RepositoryResult<Option<User>> {
        Ok(self.users.read().get(&id.value()).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let lowered = email.to_lowercase();
        Ok(self
            .users
            .read()
            .values()
            .find(|u| u.email.to_lowercase() == lowered)
            .cloned())
    }

    async fn list_users(&self) -> RepositoryResult<Vec<User>> {
        let mut users: Vec<User> = self.users.read().values().cloned().collect();
        users.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.email.cmp(&b.email))
        });
        Ok(users)
    }

    async fn insert_session(&self, new: NewSession) -> RepositoryResult<Session> {
        let session = Session {
            id: SessionId::new(self.next_id()),
            user_id: new.user_id,
            token_digest: new.token_digest,
            created_at: Utc::now(),
            expires_at: new.expires_at,
        };
        self.sessions
            .write()
            .insert(session.id.value(), session.clone());
        Ok(session)
    }

    async fn find_session_by_digest(&self, digest: &str) -> RepositoryResult<Option<Session>> {
        Ok(self
            .sessions
            .read()
            .values()
            .find(|s| s.token_digest == digest)
            .cloned())
    }

    async fn delete_session(&self, digest: &str) -> RepositoryResult<bool> {
        let mut sessions = self.sessions.write();
        let id = sessions
            .values()
            .find(|s| s.token_digest == digest)
            .map(|s| s.id.value());
        Ok(match id {
            Some(id) => sessions.remove(&id).is_some(),
            None => false,
        })
    }

    async fn delete_expired_sessions(&self) -> RepositoryResult<usize> {
        let now = Utc::now();
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, s| s.expires_at > now);
        Ok(before - sessions.len())
    }
}

#[async_trait]
impl GoalRepository for LocalRepository {
    async fn insert_goal(&self, owner: UserId, new: NewGoal) -> RepositoryResult<Goal> {
        let now = Utc::now();
        let goal = Goal {
            id: GoalId::new(self.next_id()),
            owner_id: owner,
            title: new.title,
            description: new.description,
            status: new.status.unwrap_or(GoalStatus::Pending),
            visibility: new.visibility.unwrap_or(Visibility::Private),
            target_date: new.target_date,
            created_at: now,
            updated_at: now,
        };
        self.goals.write().insert(goal.id.value(), goal.clone());
        Ok(goal)
    }

    async fn fetch_goal(&self, id: GoalId) -> RepositoryResult<Option<Goal>> {
        Ok(self.goals.read().get(&id.value()).cloned())
    }

    async fn list_goals_for_owner(&self, owner: UserId) -> RepositoryResult<Vec<Goal>> {
        let mut goals: Vec<Goal> = self
            .goals
            .read()
            .values()
            .filter(|g| g.owner_id == owner)
            .cloned()
            .collect();
        goals.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.value().cmp(&a.id.value()))
        });
        Ok(goals)
    }

    async fn update_goal(&self, id: GoalId, patch: GoalPatch) -> RepositoryResult<Goal> {
        let mut goals = self.goals.write();
        let goal = goals
            .get_mut(&id.value())
            .ok_or_else(|| RepositoryError::not_found_entity("goal", id))?;

        if let Some(title) = patch.title {
            goal.title = title;
        }
        if let Some(description) = patch.description {
            goal.description = Some(description);
        }
        if let Some(status) = patch.status {
            goal.status = status;
        }
        if let Some(visibility) = patch.visibility {
            goal.visibility = visibility;
        }
        if let Some(target_date) = patch.target_date {
            goal.target_date = Some(target_date);
        }
        goal.updated_at = Utc::now();
        Ok(goal.clone())
    }

    async fn delete_goal(&self, id: GoalId) -> RepositoryResult<bool> {
        let removed = self.goals.write().remove(&id.value()).is_some();
        if removed {
            self.goal_categories
                .write()
                .retain(|(goal, _)| *goal != id.value());
            self.goal_teams
                .write()
                .retain(|(goal, _), _| *goal != id.value());
            self.files
                .write()
                .retain(|_, f| f.meta.goal_id != id);
        }
        Ok(removed)
    }

    async fn insert_category(&self, owner: UserId, new: NewCategory) -> RepositoryResult<Category> {
        let mut categories = self.categories.write();
        if categories
            .values()
            .any(|c| c.user_id == owner && c.name == new.name)
        {
            return Err(RepositoryError::constraint_violation(
                format!("Category with name '{}' already exists", new.name),
                constraints::CATEGORY_NAME,
            ));
        }

        let category = Category {
            id: CategoryId::new(self.next_id()),
            user_id: owner,
            name: new.name,
            color: new.color.unwrap_or_else(|| DEFAULT_COLOR.to_string()),
            icon: new.icon,
            created_at: Utc::now(),
        };
        categories.insert(category.id.value(), category.clone());
        Ok(category)
    }

    async fn fetch_category(&self, id: CategoryId) -> RepositoryResult<Option<Category>> {
        Ok(self.categories.read().get(&id.value()).cloned())
    }

    async fn list_categories_for_owner(&self, owner: UserId) -> RepositoryResult<Vec<Category>> {
        let mut categories: Vec<Category> = self
            .categories
            .read()
            .values()
            .filter(|c| c.user_id == owner)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn update_category(
        &self,
        id: CategoryId,
        patch: CategoryPatch,
    ) -> RepositoryResult<Category> {
        let mut categories = self.categories.write();

        if let Some(ref name) = patch.name {
            let owner = categories
                .get(&id.value())
                .map(|c| c.user_id)
                .ok_or_else(|| RepositoryError::not_found_entity("category", id))?;
            if categories
                .values()
                .any(|c| c.user_id == owner && c.name == *name && c.id != id)
            {
                return Err(RepositoryError::constraint_violation(
                    format!("Category with name '{}' already exists", name),
                    constraints::CATEGORY_NAME,
                ));
            }
        }

        let category = categories
            .get_mut(&id.value())
            .ok_or_else(|| RepositoryError::not_found_entity("category", id))?;
        if let Some(name) = patch.name {
            category.name = name;
        }
        if let Some(color) = patch.color {
            category.color = color;
        }
        if let Some(icon) = patch.icon {
            category.icon = Some(icon);
        }
        Ok(category.clone())
    }

    async fn delete_category(&self, id: CategoryId) -> RepositoryResult<bool> {
        let removed = self.categories.write().remove(&id.value()).is_some();
        if removed {
            self.goal_categories
                .write()
                .retain(|(_, category)| *category != id.value());
        }
        Ok(removed)
    }

    async fn attach_category(&self, goal: GoalId, category: CategoryId) -> RepositoryResult<bool> {
        Ok(self
            .goal_categories
            .write()
            .insert((goal.value(), category.value())))
    }

    async fn detach_category(&self, goal: GoalId, category: CategoryId) -> RepositoryResult<bool> {
        Ok(self
            .goal_categories
            .write()
            .remove(&(goal.value(), category.value())))
    }

    async fn list_goal_categories(&self, goal: GoalId) -> RepositoryResult<Vec<CategoryId>> {
        let mut ids: Vec<i64> = self
            .goal_categories
            .read()
            .iter()
            .filter(|(g, _)| *g == goal.value())
            .map(|(_, c)| *c)
            .collect();
        ids.sort_unstable();
        Ok(ids.into_iter().map(CategoryId::new).collect())
    }

    async fn list_goals_for_category(&self, category: CategoryId) -> RepositoryResult<Vec<Goal>> {
        let goal_ids: HashSet<i64> = self
            .goal_categories
            .read()
            .iter()
            .filter(|(_, c)| *c == category.value())
            .map(|(g, _)| *g)
            .collect();
        let mut goals: Vec<Goal> = self
            .goals
            .read()
            .values()
            .filter(|g| goal_ids.contains(&g.id.value()))
            .cloned()
            .collect();
        goals.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.value().cmp(&a.id.value()))
        });
        Ok(goals)
    }

    async fn assign_goal_to_team(
        &self,
        goal: GoalId,
        team: TeamId,
        assigned_by: UserId,
    ) -> RepositoryResult<bool> {
        let mut assignments = self.goal_teams.write();
        let key = (goal.value(), team.value());
        if assignments.contains_key(&key) {
            return Ok(false);
        }
        assignments.insert(key, assigned_by);
        Ok(true)
    }

    async fn unassign_goal_from_team(&self, goal: GoalId, team: TeamId) -> RepositoryResult<bool> {
        Ok(self
            .goal_teams
            .write()
            .remove(&(goal.value(), team.value()))
            .is_some())
    }

    async fn list_goal_team_ids(&self, goal: GoalId) -> RepositoryResult<Vec<TeamId>> {
        let mut ids: Vec<i64> = self
            .goal_teams
            .read()
            .keys()
            .filter(|(g, _)| *g == goal.value())
            .map(|(_, t)| *t)
            .collect();
        ids.sort_unstable();
        Ok(ids.into_iter().map(TeamId::new).collect())
    }

    async fn list_goals_for_team(&self, team: TeamId) -> RepositoryResult<Vec<Goal>> {
        let goal_ids: HashSet<i64> = self
            .goal_teams
            .read()
            .keys()
            .filter(|(_, t)| *t == team.value())
            .map(|(g, _)| *g)
            .collect();
        let mut goals: Vec<Goal> = self
            .goals
            .read()
            .values()
            .filter(|g| goal_ids.contains(&g.id.value()))
            .cloned()
            .collect();
        goals.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.value().cmp(&a.id.value()))
        });
        Ok(goals)
    }
}

#[async_trait]
impl TeamRepository for LocalRepository {
    async fn insert_team(
        &self,
        created_by: UserId,
        new: NewTeam,
        nesting_level: i32,
    ) -> RepositoryResult<Team> {
        let now = Utc::now();
        let team = Team {
            id: TeamId::new(self.next_id()),
            name: new.name,
            description: new.description,
            color_theme: new.color_theme.unwrap_or_else(|| DEFAULT_COLOR.to_string()),
            parent_team_id: new.parent_team_id,
            created_by,
            nesting_level,
            created_at: now,
            updated_at: now,
        };
        self.teams.write().insert(team.id.value(), team.clone());

        let member = TeamMember {
            id: self.next_id(),
            team_id: team.id,
            user_id: created_by,
            role: TeamRole::Owner,
            invited_by: None,
            joined_at: now,
        };
        self.members.write().insert(member.id, member);
        Ok(team)
    }

    async fn fetch_team(&self, id: TeamId) -> RepositoryResult<Option<Team>> {
        Ok(self.teams.read().get(&id.value()).cloned())
    }

    async fn list_teams_for_user(&self, user: UserId) -> RepositoryResult<Vec<Team>> {
        let team_ids: HashSet<i64> = self
            .members
            .read()
            .values()
            .filter(|m| m.user_id == user)
            .map(|m| m.team_id.value())
            .collect();
        let mut teams: Vec<Team> = self
            .teams
            .read()
            .values()
            .filter(|t| team_ids.contains(&t.id.value()))
            .cloned()
            .collect();
        teams.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.value().cmp(&a.id.value()))
        });
        Ok(teams)
    }

    async fn update_team(&self, id: TeamId, patch: TeamPatch) -> RepositoryResult<Team> {
        let mut teams = self.teams.write();
        let team = teams
            .get_mut(&id.value())
            .ok_or_else(|| RepositoryError::not_found_entity("team", id))?;
        if let Some(name) = patch.name {
            team.name = name;
        }
        if let Some(description) = patch.description {
            team.description = Some(description);
        }
        if let Some(color_theme) = patch.color_theme {
            team.color_theme = color_theme;
        }
        team.updated_at = Utc::now();
        Ok(team.clone())
    }

    async fn delete_team(&self, id: TeamId) -> RepositoryResult<bool> {
        let removed = self.teams.write().remove(&id.value()).is_some();
        if removed {
            self.members.write().retain(|_, m| m.team_id != id);
            self.invitations.write().retain(|_, i| i.team_id != id);
            self.team_statuses.write().retain(|_, s| s.team_id != id);
            self.goal_teams
                .write()
                .retain(|(_, team), _| *team != id.value());
            // Children survive as roots of their subtree.
            let mut teams = self.teams.write();
            for team in teams.values_mut() {
                if team.parent_team_id == Some(id) {
                    team.parent_team_id = None;
                }
            }
        }
        Ok(removed)
    }

    async fn list_members(&self, team: TeamId) -> RepositoryResult<Vec<TeamMember>> {
        let mut members: Vec<TeamMember> = self
            .members
            .read()
            .values()
            .filter(|m| m.team_id == team)
            .cloned()
            .collect();
        members.sort_by(|a, b| a.joined_at.cmp(&b.joined_at).then_with(|| a.id.cmp(&b.id)));
        Ok(members)
    }

    async fn find_member(
        &self,
        team: TeamId,
        user: UserId,
    ) -> RepositoryResult<Option<TeamMember>> {
        Ok(self
            .members
            .read()
            .values()
            .find(|m| m.team_id == team && m.user_id == user)
            .cloned())
    }

    async fn insert_member(
        &self,
        team: TeamId,
        user: UserId,
        role: TeamRole,
        invited_by: Option<UserId>,
    ) -> RepositoryResult<TeamMember> {
        let mut members = self.members.write();
        if members
            .values()
            .any(|m| m.team_id == team && m.user_id == user)
        {
            return Err(RepositoryError::constraint_violation(
                "User is already a member of this team",
                constraints::TEAM_MEMBERSHIP,
            ));
        }

        let member = TeamMember {
            id: self.next_id(),
            team_id: team,
            user_id: user,
            role,
            invited_by,
            joined_at: Utc::now(),
        };
        members.insert(member.id, member.clone());
        Ok(member)
    }

    async fn update_member_role(
        &self,
        team: TeamId,
        user: UserId,
        role: TeamRole,
    ) -> RepositoryResult<TeamMember> {
        let mut members = self.members.write();
        let member = members
            .values_mut()
            .find(|m| m.team_id == team && m.user_id == user)
            .ok_or_else(|| RepositoryError::not_found_entity("team member", user))?;
        member.role = role;
        Ok(member.clone())
    }

    async fn remove_member(&self, team: TeamId, user: UserId) -> RepositoryResult<bool> {
        let mut members = self.members.write();
        let id = members
            .values()
            .find(|m| m.team_id == team && m.user_id == user)
            .map(|m| m.id);
        Ok(match id {
            Some(id) => members.remove(&id).is_some(),
            None => false,
        })
    }

    async fn insert_invitation(&self, new: NewInvitation) -> RepositoryResult<TeamInvitation> {
        let mut invitations = self.invitations.write();
        if invitations
            .values()
            .any(|i| i.invite_code == new.invite_code)
        {
            return Err(RepositoryError::constraint_violation(
                "Invite code already in use",
                constraints::INVITE_CODE,
            ));
        }

        let invitation = TeamInvitation {
            id: InvitationId::new(self.next_id()),
            team_id: new.team_id,
            email: new.email.to_lowercase(),
            invite_code: new.invite_code,
            invited_by: new.invited_by,
            status: InvitationStatus::Pending,
            created_at: Utc::now(),
            expires_at: new.expires_at,
        };
        invitations.insert(invitation.id.value(), invitation.clone());
        Ok(invitation)
    }

    async fn fetch_invitation(
        &self,
        id: InvitationId,
    ) -> RepositoryResult<Option<TeamInvitation>> {
        Ok(self.invitations.read().get(&id.value()).cloned())
    }

    async fn find_invitation_by_code(
        &self,
        code: &str,
    ) -> RepositoryResult<Option<TeamInvitation>> {
        Ok(self
            .invitations
            .read()
            .values()
            .find(|i| i.invite_code == code)
            .cloned())
    }

    async fn list_invitations_for_team(
        &self,
        team: TeamId,
    ) -> RepositoryResult<Vec<TeamInvitation>> {
        let mut invitations: Vec<TeamInvitation> = self
            .invitations
            .read()
            .values()
            .filter(|i| i.team_id == team)
            .cloned()
            .collect();
        invitations.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.value().cmp(&a.id.value()))
        });
        Ok(invitations)
    }

    async fn list_pending_invitations_for_email(
        &self,
        email: &str,
    ) -> RepositoryResult<Vec<TeamInvitation>> {
        let lowered = email.to_lowercase();
        let mut invitations: Vec<TeamInvitation> = self
            .invitations
            .read()
            .values()
            .filter(|i| i.status == InvitationStatus::Pending && i.email.to_lowercase() == lowered)
            .cloned()
            .collect();
        invitations.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.value().cmp(&a.id.value()))
        });
        Ok(invitations)
    }

    async fn update_invitation_status(
        &self,
        id: InvitationId,
        status: InvitationStatus,
    ) -> RepositoryResult<TeamInvitation> {
        let mut invitations = self.invitations.write();
        let invitation = invitations
            .get_mut(&id.value())
            .ok_or_else(|| RepositoryError::not_found_entity("invitation", id))?;
        invitation.status = status;
        Ok(invitation.clone())
    }
}

#[async_trait]
impl NotificationRepository for LocalRepository {
    async fn insert_notification(&self, new: NewNotification) -> RepositoryResult<Notification> {
        let notification = Notification {
            id: NotificationId::new(self.next_id()),
            user_id: new.user_id,
            kind: new.kind,
            title: new.title,
            message: new.message,
            related_id: new.related_id,
            read: false,
            created_at: Utc::now(),
        };
        self.notifications
            .write()
            .insert(notification.id.value(), notification.clone());
        Ok(notification)
    }

    async fn list_notifications(
        &self,
        user: UserId,
        unread_only: bool,
    ) -> RepositoryResult<Vec<Notification>> {
        let mut notifications: Vec<Notification> = self
            .notifications
            .read()
            .values()
            .filter(|n| n.user_id == user && (!unread_only || !n.read))
            .cloned()
            .collect();
        notifications.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.value().cmp(&a.id.value()))
        });
        Ok(notifications)
    }

    async fn mark_notification_read(
        &self,
        id: NotificationId,
        user: UserId,
    ) -> RepositoryResult<Option<Notification>> {
        let mut notifications = self.notifications.write();
        match notifications.get_mut(&id.value()) {
            Some(n) if n.user_id == user => {
                n.read = true;
                Ok(Some(n.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn mark_all_notifications_read(&self, user: UserId) -> RepositoryResult<usize> {
        let mut notifications = self.notifications.write();
        let mut updated = 0;
        for n in notifications.values_mut() {
            if n.user_id == user && !n.read {
                n.read = true;
                updated += 1;
            }
        }
        Ok(updated)
    }
}

#[async_trait]
impl FileRepository for LocalRepository {
    async fn insert_file(&self, new: NewGoalFile) -> RepositoryResult<GoalFile> {
        let meta = GoalFile {
            id: FileId::new(self.next_id()),
            goal_id: new.goal_id,
            file_name: new.file_name,
            file_size: new.content.len() as i64,
            mime_type: new.mime_type,
            uploaded_by: new.uploaded_by,
            uploaded_at: Utc::now(),
        };
        self.files.write().insert(
            meta.id.value(),
            StoredFile {
                meta: meta.clone(),
                content: new.content,
            },
        );
        Ok(meta)
    }

    async fn fetch_file(&self, id: FileId) -> RepositoryResult<Option<GoalFile>> {
        Ok(self.files.read().get(&id.value()).map(|f| f.meta.clone()))
    }

    async fn fetch_file_content(&self, id: FileId) -> RepositoryResult<Option<Vec<u8>>> {
        Ok(self
            .files
            .read()
            .get(&id.value())
            .map(|f| f.content.clone()))
    }

    async fn list_files_for_goal(&self, goal: GoalId) -> RepositoryResult<Vec<GoalFile>> {
        let mut files: Vec<GoalFile> = self
            .files
            .read()
            .values()
            .filter(|f| f.meta.goal_id == goal)
            .map(|f| f.meta.clone())
            .collect();
        files.sort_by(|a, b| {
            b.uploaded_at
                .cmp(&a.uploaded_at)
                .then_with(|| b.id.value().cmp(&a.id.value()))
        });
        Ok(files)
    }

    async fn count_files_for_goal(&self, goal: GoalId) -> RepositoryResult<usize> {
        Ok(self
            .files
            .read()
            .values()
            .filter(|f| f.meta.goal_id == goal)
            .count())
    }

    async fn delete_file(&self, id: FileId) -> RepositoryResult<bool> {
        Ok(self.files.write().remove(&id.value()).is_some())
    }
}

#[async_trait]
impl StatusRepository for LocalRepository {
    async fn insert_user_status(
        &self,
        owner: UserId,
        new: NewStatus,
    ) -> RepositoryResult<UserStatus> {
        let mut statuses = self.user_statuses.write();
        if statuses
            .values()
            .any(|s| s.user_id == owner && s.name == new.name)
        {
            return Err(RepositoryError::constraint_violation(
                format!("Status name '{}' already exists", new.name),
                constraints::USER_STATUS_NAME,
            ));
        }

        let now = Utc::now();
        let status = UserStatus {
            id: StatusId::new(self.next_id()),
            user_id: owner,
            name: new.name,
            color: new.color.unwrap_or_else(|| DEFAULT_COLOR.to_string()),
            icon: new.icon,
            display_order: new.display_order.unwrap_or(0),
            created_at: now,
            updated_at: now,
        };
        statuses.insert(status.id.value(), status.clone());
        Ok(status)
    }

    async fn fetch_user_status(&self, id: StatusId) -> RepositoryResult<Option<UserStatus>> {
        Ok(self.user_statuses.read().get(&id.value()).cloned())
    }

    async fn list_user_statuses(&self, owner: UserId) -> RepositoryResult<Vec<UserStatus>> {
        let mut statuses: Vec<UserStatus> = self
            .user_statuses
            .read()
            .values()
            .filter(|s| s.user_id == owner)
            .cloned()
            .collect();
        statuses.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then_with(|| a.id.value().cmp(&b.id.value()))
        });
        Ok(statuses)
    }

    async fn update_user_status(
        &self,
        id: StatusId,
        patch: StatusPatch,
    ) -> RepositoryResult<UserStatus> {
        let mut statuses = self.user_statuses.write();

        if let Some(ref name) = patch.name {
            let owner = statuses
                .get(&id.value())
                .map(|s| s.user_id)
                .ok_or_else(|| RepositoryError::not_found_entity("status", id))?;
            if statuses
                .values()
                .any(|s| s.user_id == owner && s.name == *name && s.id != id)
            {
                return Err(RepositoryError::constraint_violation(
                    format!("Status name '{}' already exists", name),
                    constraints::USER_STATUS_NAME,
                ));
            }
        }

        let status = statuses
            .get_mut(&id.value())
            .ok_or_else(|| RepositoryError::not_found_entity("status", id))?;
        if let Some(name) = patch.name {
            status.name = name;
        }
        if let Some(color) = patch.color {
            status.color = color;
        }
        if let Some(icon) = patch.icon {
            status.icon = Some(icon);
        }
        if let Some(display_order) = patch.display_order {
            status.display_order = display_order;
        }
        status.updated_at = Utc::now();
        Ok(status.clone())
    }

    async fn delete_user_status(&self, id: StatusId) -> RepositoryResult<bool> {
        Ok(self.user_statuses.write().remove(&id.value()).is_some())
    }

    async fn insert_team_status(
        &self,
        team: TeamId,
        created_by: UserId,
        new: NewStatus,
    ) -> RepositoryResult<TeamStatus> {
        let mut statuses = self.team_statuses.write();
        if statuses
            .values()
            .any(|s| s.team_id == team && s.name == new.name)
        {
            return Err(RepositoryError::constraint_violation(
                format!("Status name '{}' already exists for this team", new.name),
                constraints::TEAM_STATUS_NAME,
            ));
        }

        let now = Utc::now();
        let status = TeamStatus {
            id: StatusId::new(self.next_id()),
            team_id: team,
            name: new.name,
            color: new.color.unwrap_or_else(|| DEFAULT_COLOR.to_string()),
            icon: new.icon,
            display_order: new.display_order.unwrap_or(0),
            created_by,
            created_at: now,
            updated_at: now,
        };
        statuses.insert(status.id.value(), status.clone());
        Ok(status)
    }

    async fn fetch_team_status(&self, id: StatusId) -> RepositoryResult<Option<TeamStatus>> {
        Ok(self.team_statuses.read().get(&id.value()).cloned())
    }

    async fn list_team_statuses(&self, team: TeamId) -> RepositoryResult<Vec<TeamStatus>> {
        let mut statuses: Vec<TeamStatus> = self
            .team_statuses
            .read()
            .values()
            .filter(|s| s.team_id == team)
            .cloned()
            .collect();
        statuses.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then_with(|| a.id.value().cmp(&b.id.value()))
        });
        Ok(statuses)
    }

    async fn update_team_status(
        &self,
        id: StatusId,
        patch: StatusPatch,
    ) -> RepositoryResult<TeamStatus> {
        let mut statuses = self.team_statuses.write();

        if let Some(ref name) = patch.name {
            let team = statuses
                .get(&id.value())
                .map(|s| s.team_id)
                .ok_or_else(|| RepositoryError::not_found_entity("status", id))?;
            if statuses
                .values()
                .any(|s| s.team_id == team && s.name == *name && s.id != id)
            {
                return Err(RepositoryError::constraint_violation(
                    format!("Status name '{}' already exists for this team", name),
                    constraints::TEAM_STATUS_NAME,
                ));
            }
        }

        let status = statuses
            .get_mut(&id.value())
            .ok_or_else(|| RepositoryError::not_found_entity("status", id))?;
        if let Some(name) = patch.name {
            status.name = name;
        }
        if let Some(color) = patch.color {
            status.color = color;
        }
        if let Some(icon) = patch.icon {
            status.icon = Some(icon);
        }
        if let Some(display_order) = patch.display_order {
            status.display_order = display_order;
        }
        status.updated_at = Utc::now();
        Ok(status.clone())
    }

    async fn delete_team_status(&self, id: StatusId) -> RepositoryResult<bool> {
        Ok(self.team_statuses.write().remove(&id.value()).is_some())
    }
}

#[async_trait]
impl FullRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::NotificationKind;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            display_name: email.split('@').next().unwrap_or(email).to_string(),
            role: None,
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_case_insensitively() {
        let repo = LocalRepository::new();
        repo.insert_user(new_user("alice@example.com")).await.unwrap();
        let err = repo
            .insert_user(new_user("Alice@Example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));
    }

    #[tokio::test]
    async fn goal_lists_are_newest_first() {
        let repo = LocalRepository::new();
        let user = repo.insert_user(new_user("a@example.com")).await.unwrap();
        for title in ["one", "two", "three"] {
            repo.insert_goal(
                user.id,
                NewGoal {
                    title: title.to_string(),
                    description: None,
                    status: None,
                    visibility: None,
                    target_date: None,
                },
            )
            .await
            .unwrap();
        }
        let goals = repo.list_goals_for_owner(user.id).await.unwrap();
        let titles: Vec<&str> = goals.iter().map(|g| g.title.as_str()).collect();
        assert_eq!(titles, vec!["three", "two", "one"]);
    }

    #[tokio::test]
    async fn team_creation_adds_owner_membership() {
        let repo = LocalRepository::new();
        let user = repo.insert_user(new_user("owner@example.com")).await.unwrap();
        let team = repo
            .insert_team(
                user.id,
                NewTeam {
                    name: "Alpha".to_string(),
                    description: None,
                    color_theme: None,
                    parent_team_id: None,
                },
                0,
            )
            .await
            .unwrap();
        let members = repo.list_members(team.id).await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].user_id, user.id);
        assert_eq!(members[0].role, TeamRole::Owner);
    }

    #[tokio::test]
    async fn duplicate_membership_reports_constraint() {
        let repo = LocalRepository::new();
        let owner = repo.insert_user(new_user("o@example.com")).await.unwrap();
        let other = repo.insert_user(new_user("m@example.com")).await.unwrap();
        let team = repo
            .insert_team(
                owner.id,
                NewTeam {
                    name: "Alpha".to_string(),
                    description: None,
                    color_theme: None,
                    parent_team_id: None,
                },
                0,
            )
            .await
            .unwrap();
        repo.insert_member(team.id, other.id, TeamRole::Member, Some(owner.id))
            .await
            .unwrap();
        let err = repo
            .insert_member(team.id, other.id, TeamRole::Member, Some(owner.id))
            .await
            .unwrap_err();
        let details = err.context().details.clone().unwrap_or_default();
        assert!(details.contains(constraints::TEAM_MEMBERSHIP));
    }

    #[tokio::test]
    async fn deleting_goal_cascades_links_and_files() {
        let repo = LocalRepository::new();
        let user = repo.insert_user(new_user("x@example.com")).await.unwrap();
        let goal = repo
            .insert_goal(
                user.id,
                NewGoal {
                    title: "g".to_string(),
                    description: None,
                    status: None,
                    visibility: None,
                    target_date: None,
                },
            )
            .await
            .unwrap();
        let team = repo
            .insert_team(
                user.id,
                NewTeam {
                    name: "t".to_string(),
                    description: None,
                    color_theme: None,
                    parent_team_id: None,
                },
                0,
            )
            .await
            .unwrap();
        repo.assign_goal_to_team(goal.id, team.id, user.id)
            .await
            .unwrap();
        repo.insert_file(NewGoalFile {
            goal_id: goal.id,
            file_name: "notes.txt".to_string(),
            mime_type: Some("text/plain".to_string()),
            uploaded_by: user.id,
            content: b"hello".to_vec(),
        })
        .await
        .unwrap();

        assert!(repo.delete_goal(goal.id).await.unwrap());
        assert!(repo.list_goal_team_ids(goal.id).await.unwrap().is_empty());
        assert_eq!(repo.count_files_for_goal(goal.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn notification_read_marking_respects_ownership() {
        let repo = LocalRepository::new();
        let a = repo.insert_user(new_user("a@x.com")).await.unwrap();
        let b = repo.insert_user(new_user("b@x.com")).await.unwrap();
        let n = repo
            .insert_notification(NewNotification {
                user_id: a.id,
                kind: NotificationKind::TeamMemberAdded,
                title: "Added to a team".to_string(),
                message: "You've been added to Alpha".to_string(),
                related_id: None,
            })
            .await
            .unwrap();

        assert!(repo
            .mark_notification_read(n.id, b.id)
            .await
            .unwrap()
            .is_none());
        let updated = repo
            .mark_notification_read(n.id, a.id)
            .await
            .unwrap()
            .unwrap();
        assert!(updated.read);
    }
}
