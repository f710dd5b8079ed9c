//! Public API surface for the goal-tracking backend.
//!
//! This file consolidates the domain types shared by the service layer,
//! the repository implementations and the HTTP server: identifier newtypes,
//! status/role enums, entity structs and the input/patch types the service
//! layer accepts. All types derive Serialize/Deserialize for JSON
//! serialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==================== Identifiers ====================

/// User identifier (UUID, issued at registration).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

/// Goal identifier (database primary key).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GoalId(pub i64);

/// Team identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TeamId(pub i64);

/// Category identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CategoryId(pub i64);

/// Team invitation identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InvitationId(pub i64);

/// Notification identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub i64);

/// Goal file attachment identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FileId(pub i64);

/// Custom status identifier (user or team scope).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StatusId(pub i64);

/// Session identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub i64);

impl UserId {
    pub fn new(value: Uuid) -> Self {
        UserId(value)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

macro_rules! impl_i64_id {
    ($($id:ident),* $(,)?) => {
        $(
            impl $id {
                pub fn new(value: i64) -> Self {
                    $id(value)
                }

                pub fn value(&self) -> i64 {
                    self.0
                }
            }

            impl std::fmt::Display for $id {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl From<$id> for i64 {
                fn from(id: $id) -> Self {
                    id.0
                }
            }
        )*
    };
}

impl_i64_id!(
    GoalId,
    TeamId,
    CategoryId,
    InvitationId,
    NotificationId,
    FileId,
    StatusId,
    SessionId,
);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ==================== Enums ====================

/// Lifecycle status of a goal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Pending,
    InProgress,
    Completed,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::Pending => "pending",
            GoalStatus::InProgress => "in_progress",
            GoalStatus::Completed => "completed",
        }
    }
}

impl std::str::FromStr for GoalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(GoalStatus::Pending),
            "in_progress" => Ok(GoalStatus::InProgress),
            "completed" => Ok(GoalStatus::Completed),
            other => Err(format!("Unknown goal status: {other}")),
        }
    }
}

/// Names of the built-in statuses, in display order.
pub const DEFAULT_STATUS_NAMES: [&str; 3] = ["pending", "in_progress", "completed"];

/// Visibility scope of a goal.
///
/// `Team` visibility exposes the goal to members of the teams it is
/// assigned to; `Public` grants read access to any authenticated user.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Private,
    Public,
    Team,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Public => "public",
            Visibility::Team => "team",
        }
    }
}

impl std::str::FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "private" => Ok(Visibility::Private),
            "public" => Ok(Visibility::Public),
            "team" => Ok(Visibility::Team),
            other => Err(format!("Unknown visibility scope: {other}")),
        }
    }
}

/// Role of a user inside a team.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamRole {
    Owner,
    Member,
}

impl TeamRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamRole::Owner => "owner",
            TeamRole::Member => "member",
        }
    }
}

impl std::str::FromStr for TeamRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(TeamRole::Owner),
            "member" => Ok(TeamRole::Member),
            other => Err(format!("Unknown team role: {other}")),
        }
    }
}

/// Application-level role carried by every user account.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(UserRole::User),
            "admin" => Ok(UserRole::Admin),
            other => Err(format!("Unknown user role: {other}")),
        }
    }
}

/// State of a team invitation.
///
/// There is no automatic transition to `Expired`: expiry is detected
/// lazily by comparing `expires_at` against the clock whenever the
/// invitation is read, and the row is updated at that point.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Declined,
    Expired,
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "pending",
            InvitationStatus::Accepted => "accepted",
            InvitationStatus::Declined => "declined",
            InvitationStatus::Expired => "expired",
        }
    }
}

impl std::str::FromStr for InvitationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InvitationStatus::Pending),
            "accepted" => Ok(InvitationStatus::Accepted),
            "declined" => Ok(InvitationStatus::Declined),
            "expired" => Ok(InvitationStatus::Expired),
            other => Err(format!("Unknown invitation status: {other}")),
        }
    }
}

/// Kind of event a notification reports.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    TeamInvitation,
    TeamMemberAdded,
    TeamMemberRemoved,
    TeamGoalAssigned,
    TeamGoalCompleted,
    TeamDeleted,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::TeamInvitation => "team_invitation",
            NotificationKind::TeamMemberAdded => "team_member_added",
            NotificationKind::TeamMemberRemoved => "team_member_removed",
            NotificationKind::TeamGoalAssigned => "team_goal_assigned",
            NotificationKind::TeamGoalCompleted => "team_goal_completed",
            NotificationKind::TeamDeleted => "team_deleted",
        }
    }
}

impl std::str::FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "team_invitation" => Ok(NotificationKind::TeamInvitation),
            "team_member_added" => Ok(NotificationKind::TeamMemberAdded),
            "team_member_removed" => Ok(NotificationKind::TeamMemberRemoved),
            "team_goal_assigned" => Ok(NotificationKind::TeamGoalAssigned),
            "team_goal_completed" => Ok(NotificationKind::TeamGoalCompleted),
            "team_deleted" => Ok(NotificationKind::TeamDeleted),
            other => Err(format!("Unknown notification kind: {other}")),
        }
    }
}

// ==================== Limits and validation ====================

/// Maximum goal title length in characters.
pub const MAX_GOAL_TITLE_LEN: usize = 200;
/// Maximum team name length in characters.
pub const MAX_TEAM_NAME_LEN: usize = 100;
/// Maximum category name length in characters.
pub const MAX_CATEGORY_NAME_LEN: usize = 50;
/// Maximum custom status name length in characters.
pub const MAX_STATUS_NAME_LEN: usize = 50;
/// Maximum icon identifier length in characters.
pub const MAX_ICON_LEN: usize = 50;
/// Maximum file name length in characters.
pub const MAX_FILE_NAME_LEN: usize = 255;
/// Maximum MIME type length in characters.
pub const MAX_MIME_TYPE_LEN: usize = 127;
/// Maximum notification title length in characters.
pub const MAX_NOTIFICATION_TITLE_LEN: usize = 200;
/// Maximum number of file attachments per goal.
pub const MAX_FILES_PER_GOAL: usize = 10;
/// Maximum size of a single file attachment in bytes (10 MiB).
pub const MAX_FILE_SIZE_BYTES: usize = 10 * 1024 * 1024;
/// Deepest allowed `nesting_level` for a team (levels 0, 1 and 2 give
/// three levels of nesting in total).
pub const MAX_NESTING_LEVEL: i32 = 2;
/// Length of generated invite codes.
pub const INVITE_CODE_LEN: usize = 12;
/// Default color assigned to categories, teams and statuses.
pub const DEFAULT_COLOR: &str = "#3B82F6";

/// Check a `#RRGGBB` hex color string.
pub fn is_valid_hex_color(color: &str) -> bool {
    let bytes = color.as_bytes();
    bytes.len() == 7 && bytes[0] == b'#' && bytes[1..].iter().all(|b| b.is_ascii_hexdigit())
}

/// Check that a trimmed string length falls within `min..=max` characters.
pub fn is_valid_length(value: &str, min: usize, max: usize) -> bool {
    let chars = value.chars().count();
    chars >= min && chars <= max
}

// ==================== Entities ====================

/// Registered user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Login/contact email; unique case-insensitively.
    pub email: String,
    pub display_name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

/// An issued bearer session.
///
/// Only the SHA-256 digest of the token is stored; the raw token is
/// returned to the caller once at issuance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    pub token_digest: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// A user-owned goal record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: GoalId,
    /// Owner of the goal; the only user allowed to modify or delete it.
    pub owner_id: UserId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: GoalStatus,
    pub visibility: Visibility,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user-owned label for grouping goals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub user_id: UserId,
    /// Unique per user.
    pub name: String,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A named group of users, optionally nested under a parent team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub color_theme: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_team_id: Option<TeamId>,
    pub created_by: UserId,
    /// Depth below the root: 0 for top-level teams, at most
    /// [`MAX_NESTING_LEVEL`].
    pub nesting_level: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Membership row linking a user to a team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: i64,
    pub team_id: TeamId,
    pub user_id: UserId,
    pub role: TeamRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invited_by: Option<UserId>,
    pub joined_at: DateTime<Utc>,
}

/// A time-limited, code-based offer to join a team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamInvitation {
    pub id: InvitationId,
    pub team_id: TeamId,
    /// Address the invitation was sent to; matched case-insensitively
    /// when accepting or declining.
    pub email: String,
    pub invite_code: String,
    pub invited_by: UserId,
    pub status: InvitationStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// A per-user notification row produced by team events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    /// Id of the related entity (team or invitation), when applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_id: Option<i64>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Metadata of a file attached to a goal. The bytes are fetched
/// separately so listings stay cheap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalFile {
    pub id: FileId,
    pub goal_id: GoalId,
    pub file_name: String,
    pub file_size: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub uploaded_by: UserId,
    pub uploaded_at: DateTime<Utc>,
}

/// A custom status label owned by a single user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStatus {
    pub id: StatusId,
    pub user_id: UserId,
    /// Unique per user.
    pub name: String,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A custom status label shared by a team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamStatus {
    pub id: StatusId,
    pub team_id: TeamId,
    /// Unique per team.
    pub name: String,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub display_order: i32,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User, team and built-in statuses merged for a single caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinedStatuses {
    pub user_statuses: Vec<UserStatus>,
    pub team_statuses: Vec<TeamStatus>,
    pub default_statuses: Vec<String>,
}

// ==================== Inputs and patches ====================

/// Input for registering a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub display_name: String,
    #[serde(default)]
    pub role: Option<UserRole>,
}

/// Input for persisting a session (digest already computed).
#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: UserId,
    pub token_digest: String,
    pub expires_at: DateTime<Utc>,
}

/// Input for creating a goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGoal {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<GoalStatus>,
    #[serde(default)]
    pub visibility: Option<Visibility>,
    #[serde(default)]
    pub target_date: Option<DateTime<Utc>>,
}

/// Partial update of a goal; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoalPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<GoalStatus>,
    #[serde(default)]
    pub visibility: Option<Visibility>,
    #[serde(default)]
    pub target_date: Option<DateTime<Utc>>,
}

impl GoalPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.visibility.is_none()
            && self.target_date.is_none()
    }
}

/// Input for creating a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

/// Partial update of a category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

/// Input for creating a team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTeam {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color_theme: Option<String>,
    #[serde(default)]
    pub parent_team_id: Option<TeamId>,
}

/// Partial update of a team.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color_theme: Option<String>,
}

/// Input for persisting an invitation (code and expiry already chosen).
#[derive(Debug, Clone)]
pub struct NewInvitation {
    pub team_id: TeamId,
    pub email: String,
    pub invite_code: String,
    pub invited_by: UserId,
    pub expires_at: DateTime<Utc>,
}

/// Input for inserting a notification row.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub related_id: Option<i64>,
}

/// Input for storing a file attachment; `file_size` is derived from the
/// content.
#[derive(Debug, Clone)]
pub struct NewGoalFile {
    pub goal_id: GoalId,
    pub file_name: String,
    pub mime_type: Option<String>,
    pub uploaded_by: UserId,
    pub content: Vec<u8>,
}

/// Input for creating a custom status label (either scope).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStatus {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub display_order: Option<i32>,
}

/// Partial update of a custom status label.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub display_order: Option<i32>,
}
