use std::sync::Arc;

use axum::Router;
use utoipa::OpenApi;

use crate::task::TaskState;
use crate::task::api::v1::{self, ErrorResponse, TaskJson, TaskPayload};

/// OpenAPI document for the JSON API.
#[derive(OpenApi)]
#[openapi(
    paths(
        v1::list_tasks_handler,
        v1::create_task_handler,
        v1::get_task_handler,
        v1::update_task_handler,
        v1::delete_task_handler,
    ),
    components(schemas(TaskJson, TaskPayload, ErrorResponse)),
    tags((name = "Tasks", description = "Task management endpoints"))
)]
pub struct ApiDoc;

/// Creates the API routes for JSON API endpoints.
pub fn create_api_router(task_state: Arc<TaskState>) -> Router {
    let tasks_router = v1::create_api_router(task_state);
    Router::new().nest("/api/v1", tasks_router)
}
