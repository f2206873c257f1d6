use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::{Value, json};
use std::sync::Arc;
use task_server::task::{TaskService, TaskState};
use task_server::web::create_app;
use tower::ServiceExt;

mod common;

use crate::common::setup;

fn create_test_app(db: sea_orm::DatabaseConnection) -> Router {
    create_app(Arc::new(TaskState::new(TaskService::new(db))))
}

/// Sends a request to the app and returns the status with the parsed JSON body.
async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn can_manage_task_lifecycle_over_http() {
    let state = setup().await.expect("Failed to setup test context");
    let app = create_test_app(state.db.clone());

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/v1/tasks",
        Some(json!({"title": "Plan sprint", "description": "Pick stories", "status": "new"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["title"], "Plan sprint");
    assert_eq!(created["status"], "new");

    let (status, listed) = send(&app, Method::GET, "/api/v1/tasks", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed, json!([created.clone()]));

    let (status, fetched) = send(&app, Method::GET, &format!("/api/v1/tasks/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/tasks/{id}"),
        Some(json!({"title": "Plan next sprint", "status": "in_progress"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["id"], id);
    assert_eq!(updated["title"], "Plan next sprint");
    assert_eq!(updated["description"], "");
    assert_eq!(updated["status"], "in_progress");
    assert_eq!(updated["created_at"], created["created_at"]);
    assert_ne!(updated["updated_at"], created["updated_at"]);

    let (status, deleted) = send(&app, Method::DELETE, &format!("/api/v1/tasks/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted, updated);

    let (status, missing) = send(&app, Method::GET, &format!("/api/v1/tasks/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(missing["error"], "Failed to get task");
    assert_eq!(missing["reason"], format!("Task with ID {id} not found"));
}

#[tokio::test]
async fn can_reject_invalid_task_without_touching_store() {
    let state = setup().await.expect("Failed to setup test context");
    let app = create_test_app(state.db.clone());

    let (status, error) = send(
        &app,
        Method::POST,
        "/api/v1/tasks",
        Some(json!({"title": "", "status": "new"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        error,
        json!({
            "error": "Invalid request body",
            "reason": "Invalid title: must be non-empty string, got string \"\""
        })
    );

    let (status, listed) = send(&app, Method::GET, "/api/v1/tasks", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn can_hide_malformed_get_id_behind_generic_reason() {
    let state = setup().await.expect("Failed to setup test context");
    let app = create_test_app(state.db.clone());

    let (status, error) = send(&app, Method::GET, "/api/v1/tasks/not-a-number", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        error,
        json!({"error": "Failed to get task", "reason": "Something went wrong"})
    );
}

#[tokio::test]
async fn can_reject_invalid_id_on_update_and_delete() {
    let state = setup().await.expect("Failed to setup test context");
    let app = create_test_app(state.db.clone());

    let (status, update_error) = send(
        &app,
        Method::PUT,
        "/api/v1/tasks/abc",
        Some(json!({"title": "Anything", "status": "done"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        update_error,
        json!({"error": "Failed to update task", "reason": "Invalid task ID format"})
    );

    let (status, delete_error) = send(&app, Method::DELETE, "/api/v1/tasks/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        delete_error,
        json!({"error": "Failed to delete task", "reason": "Invalid task ID format"})
    );
}

#[tokio::test]
async fn can_report_missing_task_on_update_and_delete_as_server_error() {
    let state = setup().await.expect("Failed to setup test context");
    let app = create_test_app(state.db.clone());

    let (status, update_error) = send(
        &app,
        Method::PUT,
        "/api/v1/tasks/4242",
        Some(json!({"title": "Anything", "status": "done"})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        update_error,
        json!({"error": "Failed to update task", "reason": "Task with ID 4242 not found"})
    );

    let (status, delete_error) = send(&app, Method::DELETE, "/api/v1/tasks/4242", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        delete_error,
        json!({"error": "Failed to delete task", "reason": "Task with ID 4242 not found"})
    );
}
