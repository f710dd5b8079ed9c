use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{
    categories, goal_files, goal_teams, goals, notifications, sessions, team_invitations,
    team_members, team_statuses, teams, user_statuses, users,
};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub struct NewUserRow {
    pub email: String,
    pub display_name: String,
    pub role: String,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SessionRow {
    pub id: i64,
    pub user_id: Uuid,
    pub token_digest: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = sessions)]
pub struct NewSessionRow {
    pub user_id: Uuid,
    pub token_digest: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = goals)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct GoalRow {
    pub id: i64,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub visibility: String,
    pub target_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = goals)]
pub struct NewGoalRow {
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub visibility: String,
    pub target_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = goals)]
pub struct GoalChangeset {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub visibility: Option<String>,
    pub target_date: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = categories)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CategoryRow {
    pub id: i64,
    pub user_id: Uuid,
    pub name: String,
    pub color: String,
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = categories)]
pub struct NewCategoryRow {
    pub user_id: Uuid,
    pub name: String,
    pub color: String,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = categories)]
pub struct CategoryChangeset {
    pub name: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = teams)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TeamRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub color_theme: String,
    pub parent_team_id: Option<i64>,
    pub created_by: Uuid,
    pub nesting_level: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = teams)]
pub struct NewTeamRow {
    pub name: String,
    pub description: Option<String>,
    pub color_theme: String,
    pub parent_team_id: Option<i64>,
    pub created_by: Uuid,
    pub nesting_level: i32,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = teams)]
pub struct TeamChangeset {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color_theme: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = team_members)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TeamMemberRow {
    pub id: i64,
    pub team_id: i64,
    pub user_id: Uuid,
    pub role: String,
    pub invited_by: Option<Uuid>,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = team_members)]
pub struct NewTeamMemberRow {
    pub team_id: i64,
    pub user_id: Uuid,
    pub role: String,
    pub invited_by: Option<Uuid>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = team_invitations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TeamInvitationRow {
    pub id: i64,
    pub team_id: i64,
    pub email: String,
    pub invite_code: String,
    pub invited_by: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = team_invitations)]
pub struct NewTeamInvitationRow {
    pub team_id: i64,
    pub email: String,
    pub invite_code: String,
    pub invited_by: Uuid,
    pub status: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NotificationRow {
    pub id: i64,
    pub user_id: Uuid,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub related_id: Option<i64>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = notifications)]
pub struct NewNotificationRow {
    pub user_id: Uuid,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub related_id: Option<i64>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = goal_teams)]
pub struct NewGoalTeamRow {
    pub goal_id: i64,
    pub team_id: i64,
    pub assigned_by: Uuid,
}

/// File metadata row. The `content` column is fetched separately so
/// listings never drag the blob across the wire.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = goal_files)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct GoalFileRow {
    pub id: i64,
    pub goal_id: i64,
    pub file_name: String,
    pub file_size: i64,
    pub mime_type: Option<String>,
    pub uploaded_by: Uuid,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = goal_files)]
pub struct NewGoalFileRow {
    pub goal_id: i64,
    pub file_name: String,
    pub file_size: i64,
    pub mime_type: Option<String>,
    pub content: Vec<u8>,
    pub uploaded_by: Uuid,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = user_statuses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserStatusRow {
    pub id: i64,
    pub user_id: Uuid,
    pub name: String,
    pub color: String,
    pub icon: Option<String>,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = user_statuses)]
pub struct NewUserStatusRow {
    pub user_id: Uuid,
    pub name: String,
    pub color: String,
    pub icon: Option<String>,
    pub display_order: i32,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = user_statuses)]
pub struct UserStatusChangeset {
    pub name: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub display_order: Option<i32>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = team_statuses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TeamStatusRow {
    pub id: i64,
    pub team_id: i64,
    pub name: String,
    pub color: String,
    pub icon: Option<String>,
    pub display_order: i32,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = team_statuses)]
pub struct NewTeamStatusRow {
    pub team_id: i64,
    pub name: String,
    pub color: String,
    pub icon: Option<String>,
    pub display_order: i32,
    pub created_by: Uuid,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = team_statuses)]
pub struct TeamStatusChangeset {
    pub name: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub display_order: Option<i32>,
    pub updated_at: DateTime<Utc>,
}
