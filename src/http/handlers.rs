//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! service layer for authorization and business logic.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use super::dto::{
    AddMemberRequest, AssignTeamsRequest, AssignTeamsResponse, AuthResponse,
    CreateInvitationRequest, DetailedHealthResponse, FileUploadQuery, GoalCategoriesResponse,
    HealthResponse, MarkAllReadResponse, MemberProfile, NotificationQuery, RegisterRequest,
    RevokeResponse, RootResponse, SetCategoriesRequest, UpdateMemberRoleRequest,
};
use super::error::AppError;
use super::extract::{bearer_token, CurrentUser};
use super::state::AppState;
use crate::api::{
    Category, CategoryId, CategoryPatch, CombinedStatuses, FileId, Goal, GoalFile, GoalId,
    GoalPatch, InvitationId, NewCategory, NewGoal, NewStatus, NewTeam, Notification,
    NotificationId, StatusId, StatusPatch, Team, TeamId, TeamInvitation, TeamMember, TeamPatch,
    TeamRole, TeamStatus, User, UserId, UserStatus,
};
use crate::auth;
use crate::services;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Root and Health
// =============================================================================

/// GET /
///
/// Landing endpoint confirming the API is up.
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Goal Tracker API".to_string(),
        status: "running".to_string(),
    })
}

/// GET /health
///
/// Liveness probe.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

/// GET /health/detailed
///
/// Readiness probe: reports the storage backend and its round-trip latency.
pub async fn health_detailed(State(state): State<AppState>) -> Json<DetailedHealthResponse> {
    let report = services::health_check(state.repository.as_ref()).await;
    Json(report.into())
}

// =============================================================================
// Auth
// =============================================================================

/// POST /v1/auth/register
///
/// Register a new account and issue its first session token.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let registered = auth::register_user(
        state.repository.as_ref(),
        &request.email,
        &request.display_name,
        None,
        state.session_ttl,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token: registered.token,
            user: registered.user,
        }),
    ))
}

/// GET /v1/auth/me
///
/// The caller's own profile.
pub async fn me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> HandlerResult<User> {
    let profile = state
        .repository
        .fetch_user(user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(profile))
}

/// POST /v1/auth/logout
///
/// Revoke the session the request was authenticated with.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> HandlerResult<RevokeResponse> {
    let token = bearer_token(&headers)
        .ok_or_else(|| AppError::Unauthorized("Missing authentication token".to_string()))?;
    let revoked = auth::revoke_session(state.repository.as_ref(), token).await?;
    Ok(Json(RevokeResponse { revoked }))
}

/// GET /v1/users
///
/// List all registered users. Admin only.
pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> HandlerResult<Vec<User>> {
    let users = auth::list_users(state.repository.as_ref(), &user).await?;
    Ok(Json(users))
}

// =============================================================================
// Goals
// =============================================================================

/// GET /v1/goals
///
/// The caller's goals, newest first.
pub async fn list_goals(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> HandlerResult<Vec<Goal>> {
    let goals = services::goals::list_goals(state.repository.as_ref(), &user).await?;
    Ok(Json(goals))
}

/// POST /v1/goals
///
/// Create a goal owned by the caller.
pub async fn create_goal(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<NewGoal>,
) -> Result<(StatusCode, Json<Goal>), AppError> {
    let goal = services::goals::create_goal(state.repository.as_ref(), &user, request).await?;
    Ok((StatusCode::CREATED, Json(goal)))
}

/// GET /v1/goals/{goal_id}
///
/// Fetch a single readable goal.
pub async fn get_goal(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(goal_id): Path<i64>,
) -> HandlerResult<Goal> {
    let goal =
        services::goals::get_goal(state.repository.as_ref(), &user, GoalId::new(goal_id)).await?;
    Ok(Json(goal))
}

/// PATCH /v1/goals/{goal_id}
///
/// Partially update one of the caller's goals.
pub async fn update_goal(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(goal_id): Path<i64>,
    Json(patch): Json<GoalPatch>,
) -> HandlerResult<Goal> {
    let goal =
        services::goals::update_goal(state.repository.as_ref(), &user, GoalId::new(goal_id), patch)
            .await?;
    Ok(Json(goal))
}

/// DELETE /v1/goals/{goal_id}
///
/// Delete one of the caller's goals.
pub async fn delete_goal(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(goal_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    services::goals::delete_goal(state.repository.as_ref(), &user, GoalId::new(goal_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/goals/{goal_id}/categories
///
/// Category ids attached to a goal.
pub async fn list_goal_categories(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(goal_id): Path<i64>,
) -> HandlerResult<GoalCategoriesResponse> {
    let category_ids =
        services::goals::list_goal_categories(state.repository.as_ref(), &user, GoalId::new(goal_id))
            .await?;
    Ok(Json(GoalCategoriesResponse { category_ids }))
}

/// PUT /v1/goals/{goal_id}/categories
///
/// Replace the categories attached to a goal.
pub async fn set_goal_categories(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(goal_id): Path<i64>,
    Json(request): Json<SetCategoriesRequest>,
) -> HandlerResult<GoalCategoriesResponse> {
    let category_ids = services::goals::set_goal_categories(
        state.repository.as_ref(),
        &user,
        GoalId::new(goal_id),
        &request.category_ids,
    )
    .await?;
    Ok(Json(GoalCategoriesResponse { category_ids }))
}

/// POST /v1/goals/{goal_id}/teams
///
/// Assign a goal to one or more of the caller's teams.
pub async fn assign_goal_to_teams(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(goal_id): Path<i64>,
    Json(request): Json<AssignTeamsRequest>,
) -> HandlerResult<AssignTeamsResponse> {
    let newly_assigned = services::goals::assign_goal_to_teams(
        state.repository.as_ref(),
        &user,
        GoalId::new(goal_id),
        &request.team_ids,
    )
    .await?;
    Ok(Json(AssignTeamsResponse { newly_assigned }))
}

/// DELETE /v1/goals/{goal_id}/teams/{team_id}
///
/// Remove a goal from a team.
pub async fn unassign_goal_from_team(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((goal_id, team_id)): Path<(i64, i64)>,
) -> Result<StatusCode, AppError> {
    services::goals::unassign_goal_from_team(
        state.repository.as_ref(),
        &user,
        GoalId::new(goal_id),
        TeamId::new(team_id),
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Goal Files
// =============================================================================

/// POST /v1/goals/{goal_id}/files?file_name=...
///
/// Attach a file to a goal. The request body is the raw content; the MIME
/// type is taken from the Content-Type header.
pub async fn upload_file(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(goal_id): Path<i64>,
    Query(query): Query<FileUploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<GoalFile>), AppError> {
    let mime_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let file = services::files::upload_file(
        state.repository.as_ref(),
        &user,
        GoalId::new(goal_id),
        &query.file_name,
        mime_type,
        body.to_vec(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(file)))
}

/// GET /v1/goals/{goal_id}/files
///
/// Attachment metadata for a goal.
pub async fn list_files(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(goal_id): Path<i64>,
) -> HandlerResult<Vec<GoalFile>> {
    let files =
        services::files::list_files(state.repository.as_ref(), &user, GoalId::new(goal_id)).await?;
    Ok(Json(files))
}

/// GET /v1/goals/{goal_id}/files/{file_id}
///
/// Download an attachment's content.
pub async fn download_file(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((goal_id, file_id)): Path<(i64, i64)>,
) -> Result<Response, AppError> {
    let (file, content) = services::files::download_file(
        state.repository.as_ref(),
        &user,
        GoalId::new(goal_id),
        FileId::new(file_id),
    )
    .await?;

    let mime = file
        .mime_type
        .unwrap_or_else(|| "application/octet-stream".to_string());
    let disposition = format!("attachment; filename=\"{}\"", file.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, mime),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        content,
    )
        .into_response())
}

/// DELETE /v1/goals/{goal_id}/files/{file_id}
///
/// Delete an attachment.
pub async fn delete_file(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((goal_id, file_id)): Path<(i64, i64)>,
) -> Result<StatusCode, AppError> {
    services::files::delete_file(
        state.repository.as_ref(),
        &user,
        GoalId::new(goal_id),
        FileId::new(file_id),
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Categories
// =============================================================================

/// GET /v1/categories
///
/// The caller's categories, alphabetical.
pub async fn list_categories(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> HandlerResult<Vec<Category>> {
    let categories = services::categories::list_categories(state.repository.as_ref(), &user).await?;
    Ok(Json(categories))
}

/// POST /v1/categories
///
/// Create a category.
pub async fn create_category(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<NewCategory>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    let category =
        services::categories::create_category(state.repository.as_ref(), &user, request).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// GET /v1/categories/{category_id}
///
/// Fetch one of the caller's categories.
pub async fn get_category(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(category_id): Path<i64>,
) -> HandlerResult<Category> {
    let category = services::categories::get_category(
        state.repository.as_ref(),
        &user,
        CategoryId::new(category_id),
    )
    .await?;
    Ok(Json(category))
}

/// PATCH /v1/categories/{category_id}
///
/// Partially update a category.
pub async fn update_category(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(category_id): Path<i64>,
    Json(patch): Json<CategoryPatch>,
) -> HandlerResult<Category> {
    let category = services::categories::update_category(
        state.repository.as_ref(),
        &user,
        CategoryId::new(category_id),
        patch,
    )
    .await?;
    Ok(Json(category))
}

/// DELETE /v1/categories/{category_id}
///
/// Delete a category. Goals linked to it survive.
pub async fn delete_category(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(category_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    services::categories::delete_category(
        state.repository.as_ref(),
        &user,
        CategoryId::new(category_id),
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/categories/{category_id}/goals
///
/// Goals linked to a category.
pub async fn list_category_goals(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(category_id): Path<i64>,
) -> HandlerResult<Vec<Goal>> {
    let goals = services::categories::list_category_goals(
        state.repository.as_ref(),
        &user,
        CategoryId::new(category_id),
    )
    .await?;
    Ok(Json(goals))
}

// =============================================================================
// Teams
// =============================================================================

/// GET /v1/teams
///
/// Teams the caller belongs to.
pub async fn list_teams(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> HandlerResult<Vec<Team>> {
    let teams = services::teams::list_teams(state.repository.as_ref(), &user).await?;
    Ok(Json(teams))
}

/// POST /v1/teams
///
/// Create a team owned by the caller.
pub async fn create_team(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<NewTeam>,
) -> Result<(StatusCode, Json<Team>), AppError> {
    let team = services::teams::create_team(state.repository.as_ref(), &user, request).await?;
    Ok((StatusCode::CREATED, Json(team)))
}

/// GET /v1/teams/{team_id}
///
/// Fetch a team the caller belongs to.
pub async fn get_team(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(team_id): Path<i64>,
) -> HandlerResult<Team> {
    let team =
        services::teams::get_team(state.repository.as_ref(), &user, TeamId::new(team_id)).await?;
    Ok(Json(team))
}

/// PATCH /v1/teams/{team_id}
///
/// Update a team's details. Owners only.
pub async fn update_team(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(team_id): Path<i64>,
    Json(patch): Json<TeamPatch>,
) -> HandlerResult<Team> {
    let team =
        services::teams::update_team(state.repository.as_ref(), &user, TeamId::new(team_id), patch)
            .await?;
    Ok(Json(team))
}

/// DELETE /v1/teams/{team_id}
///
/// Delete a team. Owners only.
pub async fn delete_team(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(team_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    services::teams::delete_team(state.repository.as_ref(), &user, TeamId::new(team_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/teams/{team_id}/members
///
/// The team roster with account details.
pub async fn list_members(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(team_id): Path<i64>,
) -> HandlerResult<Vec<MemberProfile>> {
    let members =
        services::teams::list_members(state.repository.as_ref(), &user, TeamId::new(team_id))
            .await?;
    Ok(Json(members))
}

/// POST /v1/teams/{team_id}/members
///
/// Add an existing user to the team. Owners only.
pub async fn add_member(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(team_id): Path<i64>,
    Json(request): Json<AddMemberRequest>,
) -> Result<(StatusCode, Json<TeamMember>), AppError> {
    let member = services::teams::add_member(
        state.repository.as_ref(),
        &user,
        TeamId::new(team_id),
        request.user_id,
        request.role.unwrap_or(TeamRole::Member),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(member)))
}

/// PATCH /v1/teams/{team_id}/members/{user_id}
///
/// Change a member's role. Owners only.
pub async fn update_member_role(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((team_id, member_id)): Path<(i64, Uuid)>,
    Json(request): Json<UpdateMemberRoleRequest>,
) -> HandlerResult<TeamMember> {
    let member = services::teams::update_member_role(
        state.repository.as_ref(),
        &user,
        TeamId::new(team_id),
        UserId::new(member_id),
        request.role,
    )
    .await?;
    Ok(Json(member))
}

/// DELETE /v1/teams/{team_id}/members/{user_id}
///
/// Remove a member, or leave the team.
pub async fn remove_member(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((team_id, member_id)): Path<(i64, Uuid)>,
) -> Result<StatusCode, AppError> {
    services::teams::remove_member(
        state.repository.as_ref(),
        &user,
        TeamId::new(team_id),
        UserId::new(member_id),
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/teams/{team_id}/goals
///
/// Goals assigned to a team.
pub async fn list_team_goals(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(team_id): Path<i64>,
) -> HandlerResult<Vec<Goal>> {
    let goals =
        services::teams::list_team_goals(state.repository.as_ref(), &user, TeamId::new(team_id))
            .await?;
    Ok(Json(goals))
}

// =============================================================================
// Invitations
// =============================================================================

/// POST /v1/teams/{team_id}/invitations
///
/// Invite someone to the team by email. Owners only.
pub async fn create_invitation(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(team_id): Path<i64>,
    Json(request): Json<CreateInvitationRequest>,
) -> Result<(StatusCode, Json<TeamInvitation>), AppError> {
    let invitation = services::invitations::create_invitation(
        state.repository.as_ref(),
        &user,
        TeamId::new(team_id),
        &request.email,
        state.invitation_ttl,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(invitation)))
}

/// GET /v1/teams/{team_id}/invitations
///
/// Invitations sent for a team.
pub async fn list_team_invitations(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(team_id): Path<i64>,
) -> HandlerResult<Vec<TeamInvitation>> {
    let invitations = services::invitations::list_team_invitations(
        state.repository.as_ref(),
        &user,
        TeamId::new(team_id),
    )
    .await?;
    Ok(Json(invitations))
}

/// GET /v1/invitations
///
/// Pending invitations addressed to the caller.
pub async fn list_my_invitations(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> HandlerResult<Vec<TeamInvitation>> {
    let invitations =
        services::invitations::list_my_invitations(state.repository.as_ref(), &user).await?;
    Ok(Json(invitations))
}

/// POST /v1/invitations/{invitation_id}/accept
///
/// Accept an invitation and join the team.
pub async fn accept_invitation(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(invitation_id): Path<i64>,
) -> Result<(StatusCode, Json<TeamMember>), AppError> {
    let member = services::invitations::accept_invitation(
        state.repository.as_ref(),
        &user,
        InvitationId::new(invitation_id),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(member)))
}

/// POST /v1/invitations/{invitation_id}/decline
///
/// Decline an invitation.
pub async fn decline_invitation(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(invitation_id): Path<i64>,
) -> HandlerResult<TeamInvitation> {
    let invitation = services::invitations::decline_invitation(
        state.repository.as_ref(),
        &user,
        InvitationId::new(invitation_id),
    )
    .await?;
    Ok(Json(invitation))
}

/// GET /v1/invitations/code/{code}
///
/// Preview an invitation by its shareable code. No authentication: the
/// code itself is the credential.
pub async fn get_invitation_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> HandlerResult<TeamInvitation> {
    let invitation =
        services::invitations::get_invitation_by_code(state.repository.as_ref(), &code).await?;
    Ok(Json(invitation))
}

/// POST /v1/teams/join/{code}
///
/// Join a team with an invite code.
pub async fn join_team_by_code(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(code): Path<String>,
) -> Result<(StatusCode, Json<TeamMember>), AppError> {
    let member =
        services::invitations::join_team_by_code(state.repository.as_ref(), &user, &code).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

// =============================================================================
// Notifications
// =============================================================================

/// GET /v1/notifications?unread_only=true
///
/// The caller's notifications, newest first.
pub async fn list_notifications(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<NotificationQuery>,
) -> HandlerResult<Vec<Notification>> {
    let notifications = services::notifications::list_notifications(
        state.repository.as_ref(),
        &user,
        query.unread_only,
    )
    .await?;
    Ok(Json(notifications))
}

/// POST /v1/notifications/{notification_id}/read
///
/// Mark one notification as read.
pub async fn mark_notification_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(notification_id): Path<i64>,
) -> HandlerResult<Notification> {
    let notification = services::notifications::mark_read(
        state.repository.as_ref(),
        &user,
        NotificationId::new(notification_id),
    )
    .await?;
    Ok(Json(notification))
}

/// POST /v1/notifications/read-all
///
/// Mark every unread notification as read.
pub async fn mark_all_notifications_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> HandlerResult<MarkAllReadResponse> {
    let updated =
        services::notifications::mark_all_read(state.repository.as_ref(), &user).await?;
    Ok(Json(MarkAllReadResponse { updated }))
}

// =============================================================================
// Custom Statuses
// =============================================================================

/// GET /v1/statuses
///
/// The caller's custom status labels.
pub async fn list_user_statuses(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> HandlerResult<Vec<UserStatus>> {
    let statuses = services::statuses::list_user_statuses(state.repository.as_ref(), &user).await?;
    Ok(Json(statuses))
}

/// POST /v1/statuses
///
/// Create a custom status label.
pub async fn create_user_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<NewStatus>,
) -> Result<(StatusCode, Json<UserStatus>), AppError> {
    let status =
        services::statuses::create_user_status(state.repository.as_ref(), &user, request).await?;
    Ok((StatusCode::CREATED, Json(status)))
}

/// PATCH /v1/statuses/{status_id}
///
/// Partially update a custom status label.
pub async fn update_user_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(status_id): Path<i64>,
    Json(patch): Json<StatusPatch>,
) -> HandlerResult<UserStatus> {
    let status = services::statuses::update_user_status(
        state.repository.as_ref(),
        &user,
        StatusId::new(status_id),
        patch,
    )
    .await?;
    Ok(Json(status))
}

/// DELETE /v1/statuses/{status_id}
///
/// Delete a custom status label.
pub async fn delete_user_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(status_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    services::statuses::delete_user_status(
        state.repository.as_ref(),
        &user,
        StatusId::new(status_id),
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/statuses/combined
///
/// Everything the caller can label goals with: own statuses, team
/// statuses and the built-in names.
pub async fn combined_statuses(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> HandlerResult<CombinedStatuses> {
    let combined = services::statuses::combined_statuses(state.repository.as_ref(), &user).await?;
    Ok(Json(combined))
}

/// GET /v1/teams/{team_id}/statuses
///
/// A team's status labels. Members only.
pub async fn list_team_statuses(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(team_id): Path<i64>,
) -> HandlerResult<Vec<TeamStatus>> {
    let statuses =
        services::statuses::list_team_statuses(state.repository.as_ref(), &user, TeamId::new(team_id))
            .await?;
    Ok(Json(statuses))
}

/// POST /v1/teams/{team_id}/statuses
///
/// Create a status label for a team. Owners only.
pub async fn create_team_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(team_id): Path<i64>,
    Json(request): Json<NewStatus>,
) -> Result<(StatusCode, Json<TeamStatus>), AppError> {
    let status = services::statuses::create_team_status(
        state.repository.as_ref(),
        &user,
        TeamId::new(team_id),
        request,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(status)))
}

/// PATCH /v1/teams/{team_id}/statuses/{status_id}
///
/// Update a team's status label. Owners only.
pub async fn update_team_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((team_id, status_id)): Path<(i64, i64)>,
    Json(patch): Json<StatusPatch>,
) -> HandlerResult<TeamStatus> {
    let status = services::statuses::update_team_status(
        state.repository.as_ref(),
        &user,
        TeamId::new(team_id),
        StatusId::new(status_id),
        patch,
    )
    .await?;
    Ok(Json(status))
}

/// DELETE /v1/teams/{team_id}/statuses/{status_id}
///
/// Delete a team's status label. Owners only.
pub async fn delete_team_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((team_id, status_id)): Path<(i64, i64)>,
) -> Result<StatusCode, AppError> {
    services::statuses::delete_team_status(
        state.repository.as_ref(),
        &user,
        TeamId::new(team_id),
        StatusId::new(status_id),
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
