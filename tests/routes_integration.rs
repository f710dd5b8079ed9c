//! HTTP-level tests: requests through the full router with oneshot.

#![cfg(feature = "http-server")]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use goal_tracker::db::repositories::LocalRepository;
use goal_tracker::db::repository::FullRepository;
use goal_tracker::http::{create_router, AppState};

fn app() -> Router {
    let repo = Arc::new(LocalRepository::new()) as Arc<dyn FullRepository>;
    create_router(AppState::new(repo))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn get_authed(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

fn send_json(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    }
}

/// Register a user over HTTP, returning (token, user id string).
async fn register(app: &Router, email: &str) -> (String, String) {
    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/v1/auth/register",
            None,
            &json!({"email": email, "display_name": email.split('@').next().unwrap()}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    (
        body["token"].as_str().unwrap().to_string(),
        body["user"]["id"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn test_root_and_health_endpoints() {
    let app = app();

    let response = app.clone().oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Goal Tracker API");
    assert_eq!(body["status"], "running");

    let response = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "healthy");

    let response = app.oneshot(get("/health/detailed")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["backend"], "local");
}

#[tokio::test]
async fn test_register_then_me_round_trip() {
    let app = app();
    let (token, user_id) = register(&app, "ada@example.com").await;

    let response = app.oneshot(get_authed("/v1/auth/me", &token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["id"], user_id.as_str());
    assert_eq!(body["email"], "ada@example.com");
    assert_eq!(body["role"], "user");
}

#[tokio::test]
async fn test_logout_revokes_the_session() {
    let app = app();
    let (token, _) = register(&app, "ada@example.com").await;

    let response = app
        .clone()
        .oneshot(send_json("POST", "/v1/auth/logout", Some(&token), &json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["revoked"], true);

    let response = app.oneshot(get_authed("/v1/auth/me", &token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_goal_crud_over_http() {
    let app = app();
    let (token, _) = register(&app, "ada@example.com").await;

    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/v1/goals",
            Some(&token),
            &json!({"title": "Ship the rewrite", "visibility": "public"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let goal = body_json(response).await;
    assert_eq!(goal["status"], "pending");
    assert_eq!(goal["visibility"], "public");
    let goal_id = goal["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(send_json(
            "PATCH",
            &format!("/v1/goals/{}", goal_id),
            Some(&token),
            &json!({"status": "in_progress"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "in_progress");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/v1/goals/{}", goal_id))
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(get_authed(&format!("/v1/goals/{}", goal_id), &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["code"], "NOT_FOUND");
    assert_eq!(body["message"], "Goal not found");
}

#[tokio::test]
async fn test_missing_and_garbage_tokens_are_401() {
    let app = app();

    let response = app.clone().oneshot(get("/v1/goals")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["code"], "UNAUTHORIZED");
    assert_eq!(body["message"], "Missing authentication token");

    let response = app
        .oneshot(get_authed("/v1/goals", "definitely-not-a-token"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_validation_errors_map_to_400() {
    let app = app();

    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/v1/auth/register",
            None,
            &json!({"email": "not-an-email", "display_name": "Nope"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");

    let (token, _) = register(&app, "ada@example.com").await;
    let response = app
        .oneshot(send_json(
            "POST",
            "/v1/goals",
            Some(&token),
            &json!({"title": "x".repeat(201)}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["message"],
        "Title must be between 1 and 200 characters"
    );
}

#[tokio::test]
async fn test_users_listing_is_admin_only() {
    let app = app();
    let (token, _) = register(&app, "ada@example.com").await;

    let response = app.oneshot(get_authed("/v1/users", &token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_invitation_code_preview_needs_no_token() {
    let app = app();
    let (token, _) = register(&app, "ada@example.com").await;

    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/v1/teams",
            Some(&token),
            &json!({"name": "Rocketeers"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let team_id = body_json(response).await["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            &format!("/v1/teams/{}/invitations", team_id),
            Some(&token),
            &json!({"email": "grace@example.com"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let invitation = body_json(response).await;
    let code = invitation["invite_code"].as_str().unwrap().to_string();
    assert_eq!(code.len(), 12);

    // No Authorization header at all.
    let response = app
        .oneshot(get(&format!("/v1/invitations/code/{}", code)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["email"], "grace@example.com");
    assert_eq!(body["status"], "pending");
}

#[tokio::test]
async fn test_team_membership_routes() {
    let app = app();
    let (alice, _) = register(&app, "alice@example.com").await;
    let (_bob_token, bob_id) = register(&app, "bob@example.com").await;

    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/v1/teams",
            Some(&alice),
            &json!({"name": "Pit crew"}),
        ))
        .await
        .unwrap();
    let team_id = body_json(response).await["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            &format!("/v1/teams/{}/members", team_id),
            Some(&alice),
            &json!({"user_id": bob_id}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["role"], "member");

    let response = app
        .clone()
        .oneshot(send_json(
            "PATCH",
            &format!("/v1/teams/{}/members/{}", team_id, bob_id),
            Some(&alice),
            &json!({"role": "owner"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["role"], "owner");

    let response = app
        .clone()
        .oneshot(get_authed(&format!("/v1/teams/{}/members", team_id), &alice))
        .await
        .unwrap();
    let roster = body_json(response).await;
    assert_eq!(roster.as_array().unwrap().len(), 2);
    // Member rows are joined with account details.
    assert!(roster[0]["email"].is_string());
    assert!(roster[0]["display_name"].is_string());
}

#[tokio::test]
async fn test_file_upload_and_download_round_trip() {
    let app = app();
    let (token, _) = register(&app, "ada@example.com").await;

    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/v1/goals",
            Some(&token),
            &json!({"title": "Scrapbook"}),
        ))
        .await
        .unwrap();
    let goal_id = body_json(response).await["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/v1/goals/{}/files?file_name=notes.txt", goal_id))
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(header::CONTENT_TYPE, "text/plain")
                .body(Body::from("remember the milk"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let file = body_json(response).await;
    assert_eq!(file["file_name"], "notes.txt");
    assert_eq!(file["file_size"], 17);
    assert_eq!(file["mime_type"], "text/plain");
    let file_id = file["id"].as_i64().unwrap();

    let response = app
        .oneshot(get_authed(
            &format!("/v1/goals/{}/files/{}", goal_id, file_id),
            &token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/plain"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"notes.txt\""
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"remember the milk");
}
