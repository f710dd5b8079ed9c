//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;
use crate::api::MAX_FILE_SIZE_BYTES;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - permissive for development, should be restricted in production
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the API router with versioned endpoints
    let api_v1 = Router::new()
        // Auth and accounts
        .route("/auth/register", post(handlers::register))
        .route("/auth/me", get(handlers::me))
        .route("/auth/logout", post(handlers::logout))
        .route("/users", get(handlers::list_users))
        // Goal CRUD
        .route("/goals", get(handlers::list_goals))
        .route("/goals", post(handlers::create_goal))
        .route("/goals/{goal_id}", get(handlers::get_goal))
        .route("/goals/{goal_id}", patch(handlers::update_goal))
        .route("/goals/{goal_id}", delete(handlers::delete_goal))
        // Goal categorization and team assignment
        .route("/goals/{goal_id}/categories", get(handlers::list_goal_categories))
        .route("/goals/{goal_id}/categories", put(handlers::set_goal_categories))
        .route("/goals/{goal_id}/teams", post(handlers::assign_goal_to_teams))
        .route("/goals/{goal_id}/teams/{team_id}", delete(handlers::unassign_goal_from_team))
        // Goal attachments
        .route("/goals/{goal_id}/files", get(handlers::list_files))
        .route("/goals/{goal_id}/files", post(handlers::upload_file))
        .route("/goals/{goal_id}/files/{file_id}", get(handlers::download_file))
        .route("/goals/{goal_id}/files/{file_id}", delete(handlers::delete_file))
        // Categories
        .route("/categories", get(handlers::list_categories))
        .route("/categories", post(handlers::create_category))
        .route("/categories/{category_id}", get(handlers::get_category))
        .route("/categories/{category_id}", patch(handlers::update_category))
        .route("/categories/{category_id}", delete(handlers::delete_category))
        .route("/categories/{category_id}/goals", get(handlers::list_category_goals))
        // Teams and membership
        .route("/teams", get(handlers::list_teams))
        .route("/teams", post(handlers::create_team))
        .route("/teams/join/{code}", post(handlers::join_team_by_code))
        .route("/teams/{team_id}", get(handlers::get_team))
        .route("/teams/{team_id}", patch(handlers::update_team))
        .route("/teams/{team_id}", delete(handlers::delete_team))
        .route("/teams/{team_id}/members", get(handlers::list_members))
        .route("/teams/{team_id}/members", post(handlers::add_member))
        .route("/teams/{team_id}/members/{user_id}", patch(handlers::update_member_role))
        .route("/teams/{team_id}/members/{user_id}", delete(handlers::remove_member))
        .route("/teams/{team_id}/goals", get(handlers::list_team_goals))
        // Invitations
        .route("/teams/{team_id}/invitations", get(handlers::list_team_invitations))
        .route("/teams/{team_id}/invitations", post(handlers::create_invitation))
        .route("/invitations", get(handlers::list_my_invitations))
        .route("/invitations/code/{code}", get(handlers::get_invitation_by_code))
        .route("/invitations/{invitation_id}/accept", post(handlers::accept_invitation))
        .route("/invitations/{invitation_id}/decline", post(handlers::decline_invitation))
        // Notifications
        .route("/notifications", get(handlers::list_notifications))
        .route("/notifications/read-all", post(handlers::mark_all_notifications_read))
        .route("/notifications/{notification_id}/read", post(handlers::mark_notification_read))
        // Custom statuses
        .route("/statuses", get(handlers::list_user_statuses))
        .route("/statuses", post(handlers::create_user_status))
        .route("/statuses/combined", get(handlers::combined_statuses))
        .route("/statuses/{status_id}", patch(handlers::update_user_status))
        .route("/statuses/{status_id}", delete(handlers::delete_user_status))
        .route("/teams/{team_id}/statuses", get(handlers::list_team_statuses))
        .route("/teams/{team_id}/statuses", post(handlers::create_team_status))
        .route("/teams/{team_id}/statuses/{status_id}", patch(handlers::update_team_status))
        .route("/teams/{team_id}/statuses/{status_id}", delete(handlers::delete_team_status));

    // Combine all routes
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/health/detailed", get(handlers::health_detailed))
        .nest("/v1", api_v1)
        // Room for the largest allowed attachment.
        .layer(DefaultBodyLimit::max(MAX_FILE_SIZE_BYTES + 64 * 1024))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::db::repositories::LocalRepository;

    fn test_state() -> AppState {
        let repo =
            Arc::new(LocalRepository::new()) as Arc<dyn crate::db::repository::FullRepository>;
        AppState::new(repo)
    }

    #[test]
    fn test_router_creation() {
        let _router = create_router(test_state());
        // If we got here, router was created successfully
    }

    #[tokio::test]
    async fn health_answers_without_a_token() {
        let router = create_router(test_state());
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_routes_reject_missing_tokens() {
        let router = create_router(test_state());
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/v1/goals")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
