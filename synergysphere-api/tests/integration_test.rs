/// Integration tests for the SynergySphere API
///
/// These tests verify the full system works end-to-end:
/// - Authentication flow (register, login)
/// - Project CRUD with membership roles
/// - Task assignment and completion notification side effects
/// - Notification read-state idempotence
/// - Authorization failures distinct from not-found
///
/// They require a running PostgreSQL database and are ignored by default.
/// Run with: cargo test --test integration_test -- --ignored --test-threads=1

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::TestContext;
use serde_json::{json, Value};
use synergysphere_shared::models::notification::Notification;
use tower::Service as _;
use uuid::Uuid;

/// Builds a JSON request with an optional bearer token
fn json_request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");

    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    let body = match body {
        Some(value) => Body::from(value.to_string()),
        None => Body::empty(),
    };

    builder.body(body).unwrap()
}

/// Reads a response body as JSON
async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_health_check() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx
        .app
        .clone()
        .call(json_request("GET", "/health", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_register_and_login() {
    let ctx = TestContext::new().await.unwrap();
    let email = format!("test-{}@example.com", Uuid::new_v4());

    let response = ctx
        .app
        .clone()
        .call(json_request(
            "POST",
            "/v1/auth/register",
            None,
            Some(json!({
                "email": email,
                "password": "integration-test-password-1",
                "name": "Registered User"
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert!(body["access_token"].is_string());
    assert!(body["refresh_token"].is_string());

    let response = ctx
        .app
        .clone()
        .call(json_request(
            "POST",
            "/v1/auth/login",
            None,
            Some(json!({
                "email": email,
                "password": "integration-test-password-1"
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert!(body["access_token"].is_string());

    // Wrong password is rejected
    let response = ctx
        .app
        .clone()
        .call(json_request(
            "POST",
            "/v1/auth/login",
            None,
            Some(json!({
                "email": email,
                "password": "wrong-password-1"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_project_crud_and_membership() {
    let ctx = TestContext::new().await.unwrap();

    // Create a project; the creator becomes owner and manager
    let response = ctx
        .app
        .clone()
        .call(json_request(
            "POST",
            "/v1/projects",
            Some(&ctx.jwt_token),
            Some(json!({ "name": "Apollo", "priority": "high" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let project = response_json(response).await;
    let project_id = project["id"].as_str().unwrap().to_string();
    assert_eq!(project["manager_id"], json!(ctx.user.id));

    // The project shows up in the member-scoped listing
    let response = ctx
        .app
        .clone()
        .call(json_request(
            "GET",
            "/v1/projects",
            Some(&ctx.jwt_token),
            None,
        ))
        .await
        .unwrap();
    let projects = response_json(response).await;
    assert_eq!(projects.as_array().unwrap().len(), 1);

    // Add a second user as member
    let other = TestContext::create_user(&ctx.db, "Other User").await.unwrap();
    let response = ctx
        .app
        .clone()
        .call(json_request(
            "POST",
            &format!("/v1/projects/{}/members", project_id),
            Some(&ctx.jwt_token),
            Some(json!({ "user_id": other.id })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let member = response_json(response).await;
    assert_eq!(member["role"], "member");

    // A plain member cannot delete the project
    let other_token = ctx.token_for(other.id).unwrap();
    let response = ctx
        .app
        .clone()
        .call(json_request(
            "DELETE",
            &format!("/v1/projects/{}", project_id),
            Some(&other_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The owner can
    let response = ctx
        .app
        .clone()
        .call(json_request(
            "DELETE",
            &format!("/v1/projects/{}", project_id),
            Some(&ctx.jwt_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_task_assignment_creates_notification() {
    let ctx = TestContext::new().await.unwrap();
    let assignee = TestContext::create_user(&ctx.db, "Assignee").await.unwrap();

    let response = ctx
        .app
        .clone()
        .call(json_request(
            "POST",
            "/v1/projects",
            Some(&ctx.jwt_token),
            Some(json!({ "name": "Apollo" })),
        ))
        .await
        .unwrap();
    let project = response_json(response).await;
    let project_id = project["id"].as_str().unwrap().to_string();

    // Assign a task to a user who is offline and not yet a member
    let response = ctx
        .app
        .clone()
        .call(json_request(
            "POST",
            "/v1/tasks",
            Some(&ctx.jwt_token),
            Some(json!({
                "title": "Write launch checklist",
                "project_id": project_id,
                "assignee_id": assignee.id
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Exactly one persisted notification row for the assignee
    let rows = Notification::list_by_user(&ctx.db, assignee.id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert!(!rows[0].read);
    assert!(rows[0].message.contains("Write launch checklist"));

    // The assignee was auto-added as a project member
    let response = ctx
        .app
        .clone()
        .call(json_request(
            "GET",
            &format!("/v1/projects/{}", project_id),
            Some(&ctx.token_for(assignee.id).unwrap()),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The assignee's notification list returns the row with read=false
    let response = ctx
        .app
        .clone()
        .call(json_request(
            "GET",
            "/v1/notifications",
            Some(&ctx.token_for(assignee.id).unwrap()),
            None,
        ))
        .await
        .unwrap();
    let body = response_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["read"], false);
    assert_eq!(body[0]["kind"], "task_assigned");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_self_assignment_creates_no_notification() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx
        .app
        .clone()
        .call(json_request(
            "POST",
            "/v1/projects",
            Some(&ctx.jwt_token),
            Some(json!({ "name": "Solo" })),
        ))
        .await
        .unwrap();
    let project = response_json(response).await;
    let project_id = project["id"].as_str().unwrap().to_string();

    let response = ctx
        .app
        .clone()
        .call(json_request(
            "POST",
            "/v1/tasks",
            Some(&ctx.jwt_token),
            Some(json!({
                "title": "Self-assigned chore",
                "project_id": project_id,
                "assignee_id": ctx.user.id
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let rows = Notification::list_by_user(&ctx.db, ctx.user.id).await.unwrap();
    assert!(rows.is_empty());

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_task_completion_notifies_creator() {
    let ctx = TestContext::new().await.unwrap();
    let assignee = TestContext::create_user(&ctx.db, "Assignee").await.unwrap();

    let response = ctx
        .app
        .clone()
        .call(json_request(
            "POST",
            "/v1/projects",
            Some(&ctx.jwt_token),
            Some(json!({ "name": "Apollo" })),
        ))
        .await
        .unwrap();
    let project = response_json(response).await;
    let project_id = project["id"].as_str().unwrap().to_string();

    let response = ctx
        .app
        .clone()
        .call(json_request(
            "POST",
            "/v1/tasks",
            Some(&ctx.jwt_token),
            Some(json!({
                "title": "Ship it",
                "project_id": project_id,
                "assignee_id": assignee.id
            })),
        ))
        .await
        .unwrap();
    let task = response_json(response).await;
    let task_id = task["id"].as_str().unwrap().to_string();

    // The assignee completes the task
    let assignee_token = ctx.token_for(assignee.id).unwrap();
    let response = ctx
        .app
        .clone()
        .call(json_request(
            "PUT",
            &format!("/v1/tasks/{}", task_id),
            Some(&assignee_token),
            Some(json!({ "status": "completed" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The creator gets a task_completed notification
    let rows = Notification::list_by_user(&ctx.db, ctx.user.id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].message.contains("Ship it"));

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_mark_read_is_idempotent() {
    let ctx = TestContext::new().await.unwrap();
    let assignee = TestContext::create_user(&ctx.db, "Assignee").await.unwrap();

    let response = ctx
        .app
        .clone()
        .call(json_request(
            "POST",
            "/v1/projects",
            Some(&ctx.jwt_token),
            Some(json!({ "name": "Apollo" })),
        ))
        .await
        .unwrap();
    let project = response_json(response).await;
    let project_id = project["id"].as_str().unwrap().to_string();

    ctx.app
        .clone()
        .call(json_request(
            "POST",
            "/v1/tasks",
            Some(&ctx.jwt_token),
            Some(json!({
                "title": "Read me",
                "project_id": project_id,
                "assignee_id": assignee.id
            })),
        ))
        .await
        .unwrap();

    let rows = Notification::list_by_user(&ctx.db, assignee.id).await.unwrap();
    let notification_id = rows[0].id;
    let assignee_token = ctx.token_for(assignee.id).unwrap();

    // Mark read twice; both succeed and the state is identical
    for _ in 0..2 {
        let response = ctx
            .app
            .clone()
            .call(json_request(
                "PUT",
                &format!("/v1/notifications/{}/read", notification_id),
                Some(&assignee_token),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        assert_eq!(body["read"], true);
    }

    // Unread count is zero
    let response = ctx
        .app
        .clone()
        .call(json_request(
            "GET",
            "/v1/notifications/unread",
            Some(&assignee_token),
            None,
        ))
        .await
        .unwrap();
    let body = response_json(response).await;
    assert_eq!(body["count"], 0);

    // Another user cannot mark it
    let response = ctx
        .app
        .clone()
        .call(json_request(
            "PUT",
            &format!("/v1/notifications/{}/read", notification_id),
            Some(&ctx.jwt_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_forbidden_distinct_from_not_found() {
    let ctx = TestContext::new().await.unwrap();
    let outsider = TestContext::create_user(&ctx.db, "Outsider").await.unwrap();

    let response = ctx
        .app
        .clone()
        .call(json_request(
            "POST",
            "/v1/projects",
            Some(&ctx.jwt_token),
            Some(json!({ "name": "Private" })),
        ))
        .await
        .unwrap();
    let project = response_json(response).await;
    let project_id = project["id"].as_str().unwrap().to_string();

    // A non-member gets 403 for an existing project
    let outsider_token = ctx.token_for(outsider.id).unwrap();
    let response = ctx
        .app
        .clone()
        .call(json_request(
            "GET",
            &format!("/v1/projects/{}", project_id),
            Some(&outsider_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // A missing project is 404
    let response = ctx
        .app
        .clone()
        .call(json_request(
            "GET",
            &format!("/v1/projects/{}", Uuid::new_v4()),
            Some(&ctx.jwt_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // No token at all is 401
    let response = ctx
        .app
        .clone()
        .call(json_request("GET", "/v1/projects", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    ctx.cleanup().await.unwrap();
}
