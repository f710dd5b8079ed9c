//! Data Transfer Objects for the HTTP API.
//!
//! The domain entities in `crate::api` already derive
//! Serialize/Deserialize and are returned as-is; this module adds the
//! request bodies, query parameters and the handful of response wrappers
//! the REST surface needs on top.

use serde::{Deserialize, Serialize};

// Re-export the domain types that appear directly in responses.
pub use crate::api::{
    Category, CombinedStatuses, Goal, GoalFile, Notification, Team, TeamInvitation, TeamMember,
    TeamStatus, User, UserStatus,
};
pub use crate::services::teams::MemberProfile;

use crate::api::{CategoryId, TeamId, TeamRole, UserId};
use crate::services::HealthReport;

/// Request body for registering a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub display_name: String,
}

/// Response for registration: the profile plus the raw session token.
///
/// The token is shown exactly once; only its digest is stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// Response for logout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevokeResponse {
    pub revoked: bool,
}

/// Request body replacing the full category set of a goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetCategoriesRequest {
    pub category_ids: Vec<CategoryId>,
}

/// Category ids currently attached to a goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalCategoriesResponse {
    pub category_ids: Vec<CategoryId>,
}

/// Request body assigning a goal to teams.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignTeamsRequest {
    pub team_ids: Vec<TeamId>,
}

/// Response for a team assignment request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignTeamsResponse {
    /// Teams that were not already assigned
    pub newly_assigned: usize,
}

/// Request body adding a member to a team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddMemberRequest {
    pub user_id: UserId,
    /// Defaults to `member`
    #[serde(default)]
    pub role: Option<TeamRole>,
}

/// Request body changing a member's role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateMemberRoleRequest {
    pub role: TeamRole,
}

/// Request body for inviting someone to a team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInvitationRequest {
    pub email: String,
}

/// Query parameters for the notification listing.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NotificationQuery {
    /// Only return unread rows
    #[serde(default)]
    pub unread_only: bool,
}

/// Response for marking all notifications read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkAllReadResponse {
    /// Rows flipped from unread to read
    pub updated: usize,
}

/// Query parameters for file upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileUploadQuery {
    /// Name to store the attachment under
    pub file_name: String,
}

/// Landing response at `/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
    pub status: String,
}

/// Basic health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Detailed health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedHealthResponse {
    pub status: String,
    /// Storage backend in use ("local" or "postgres")
    pub backend: String,
    /// Round-trip latency of the backend probe
    pub latency_ms: u64,
}

impl From<HealthReport> for DetailedHealthResponse {
    fn from(report: HealthReport) -> Self {
        Self {
            status: if report.healthy {
                "healthy".to_string()
            } else {
                "unhealthy".to_string()
            },
            backend: report.backend.to_string(),
            latency_ms: report.latency_ms,
        }
    }
}
