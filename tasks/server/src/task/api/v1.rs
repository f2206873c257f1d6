use crate::error::{SafeError, reason_for};
use crate::task::{RepositoryError, Status, Task, TaskChanges, TaskDraft, TaskState, Title, json_kind};
use axum::{
    Router,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::Json,
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::sync::Arc;
use utoipa::ToSchema;

/// Reason returned when a path ID is not an integer.
pub const INVALID_ID_REASON: &str = "Invalid task ID format";

const INVALID_BODY: &str = "Invalid request body";
const LIST_FAILED: &str = "Failed to process tasks";
const CREATE_FAILED: &str = "Failed to create task";
const GET_FAILED: &str = "Failed to get task";
const UPDATE_FAILED: &str = "Failed to update task";
const DELETE_FAILED: &str = "Failed to delete task";

/// JSON representation of a Task for API responses.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskJson {
    /// Unique identifier assigned by the store
    id: i32,
    /// Non-empty title
    title: String,
    /// Free-form description
    description: String,
    /// One of `new`, `in_progress`, `done`
    #[schema(example = "in_progress")]
    status: String,
    /// When the task was created
    created_at: DateTime<Utc>,
    /// When the task was last updated
    updated_at: DateTime<Utc>,
}

impl TryFrom<Task> for TaskJson {
    type Error = SafeError;

    fn try_from(task: Task) -> Result<Self, Self::Error> {
        Ok(Self {
            id: task.id(),
            title: task.title().encode()?.to_string(),
            description: task.description().to_string(),
            status: task.status().encode()?.to_string(),
            created_at: task.created_at(),
            updated_at: task.updated_at(),
        })
    }
}

/// Request body for creating or replacing a task.
///
/// Decoded field by field from a JSON object so that a validation failure
/// reaches the client as the value type's own reason.
#[derive(Debug, ToSchema)]
pub struct TaskPayload {
    /// Non-empty title
    #[schema(value_type = String, min_length = 1, example = "Write release notes")]
    title: Title,
    /// Free-form description, empty when omitted
    #[schema(default = "", required = false)]
    description: String,
    /// One of `new`, `in_progress`, `done`
    #[schema(value_type = String, example = "new")]
    status: Status,
}

impl TryFrom<Value> for TaskPayload {
    type Error = SafeError;

    /// Missing `title` or `status` fields are validated as JSON `null`.
    /// Unknown fields, such as a client supplied `id`, are ignored.
    fn try_from(body: Value) -> Result<Self, Self::Error> {
        let mut fields = match body {
            Value::Object(fields) => fields,
            other => {
                return Err(SafeError::new(format!(
                    "Request body must be a JSON object, got {} {}",
                    json_kind(&other),
                    other
                )));
            }
        };

        let title = Title::from_wire(fields.remove("title").unwrap_or(Value::Null))?;
        let description = match fields.remove("description") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(description)) => description,
            Some(other) => {
                return Err(SafeError::new(format!(
                    "Invalid description: must be string, got {} {}",
                    json_kind(&other),
                    other
                )));
            }
        };
        let status = Status::from_wire(fields.remove("status").unwrap_or(Value::Null))?;

        Ok(Self {
            title,
            description,
            status,
        })
    }
}

impl TaskPayload {
    fn into_draft(self) -> TaskDraft {
        TaskDraft {
            title: self.title,
            description: self.description,
            status: self.status,
        }
    }

    fn into_changes(self, updated_at: DateTime<Utc>) -> TaskChanges {
        TaskChanges {
            title: self.title,
            description: self.description,
            status: self.status,
            updated_at,
        }
    }
}

/// JSON response for API errors.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// What the server was trying to do
    pub error: String,
    /// Why it failed, safe to show to users
    pub reason: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            reason: reason.into(),
        }
    }
}

type ErrorReply = (StatusCode, Json<ErrorResponse>);

/// Logs `err` and builds an error reply carrying only its safe reason.
fn failure(status: StatusCode, context: &str, err: &(dyn Error + 'static)) -> ErrorReply {
    tracing::error!("{}: {}", context, err);
    (status, Json(ErrorResponse::new(context, reason_for(err))))
}

/// Logs a bad path ID and replies with the fixed invalid ID reason.
fn invalid_id(context: &str, err: &dyn Error) -> ErrorReply {
    tracing::error!("{}: {}", context, err);
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new(context, INVALID_ID_REASON)),
    )
}

/// Extracts an integer task ID, answering with the invalid ID reply otherwise.
fn parse_id(path: Result<Path<String>, PathRejection>, context: &str) -> Result<i32, ErrorReply> {
    let Path(id) = path.map_err(|rejection| invalid_id(context, &rejection))?;
    id.parse::<i32>().map_err(|err| invalid_id(context, &err))
}

fn decode_payload(
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<TaskPayload, ErrorReply> {
    let Json(body) =
        payload.map_err(|rejection| failure(StatusCode::BAD_REQUEST, INVALID_BODY, &rejection))?;
    TaskPayload::try_from(body).map_err(|err| failure(StatusCode::BAD_REQUEST, INVALID_BODY, &err))
}

fn encode(task: Task, context: &str) -> Result<TaskJson, ErrorReply> {
    TaskJson::try_from(task)
        .map_err(|err| failure(StatusCode::INTERNAL_SERVER_ERROR, context, &err))
}

/// Handler for GET /api/v1/tasks - Returns all tasks in creation order.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/tasks",
    responses(
        (status = 200, description = "Successfully retrieved tasks", body = [TaskJson]),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn list_tasks_handler(
    State(state): State<Arc<TaskState>>,
) -> Result<Json<Vec<TaskJson>>, ErrorReply> {
    let tasks = state
        .repository
        .list_all()
        .await
        .map_err(|err| failure(StatusCode::INTERNAL_SERVER_ERROR, LIST_FAILED, &err))?;

    let json_tasks = tasks
        .into_iter()
        .map(|task| encode(task, LIST_FAILED))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::info!("Retrieved {} tasks", json_tasks.len());
    Ok(Json(json_tasks))
}

/// Handler for POST /api/v1/tasks - Creates a task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    post,
    path = "/api/v1/tasks",
    request_body = TaskPayload,
    responses(
        (status = 201, description = "Task created", body = TaskJson),
        (status = 400, description = "Invalid request body", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn create_task_handler(
    State(state): State<Arc<TaskState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<TaskJson>), ErrorReply> {
    let payload = decode_payload(payload)?;

    let task = state
        .repository
        .create(payload.into_draft())
        .await
        .map_err(|err| failure(StatusCode::INTERNAL_SERVER_ERROR, CREATE_FAILED, &err))?;
    let task = encode(task, CREATE_FAILED)?;

    tracing::info!("Task {} created", task.id);
    Ok((StatusCode::CREATED, Json(task)))
}

/// Handler for GET /api/v1/tasks/{id} - Returns a single task.
///
/// The ID is handed to the store as is, so a malformed ID surfaces as a store error.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/tasks/{id}",
    params(
        ("id" = String, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Successfully retrieved task", body = TaskJson),
        (status = 400, description = "Task could not be retrieved", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn get_task_handler(
    State(state): State<Arc<TaskState>>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<TaskJson>, ErrorReply> {
    let Path(id) =
        path.map_err(|rejection| failure(StatusCode::BAD_REQUEST, GET_FAILED, &rejection))?;

    let task = state.repository.get_by_id(&id).await.map_err(|err| {
        let status = match err {
            RepositoryError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        };
        failure(status, GET_FAILED, &err)
    })?;
    let task = encode(task, GET_FAILED)?;

    tracing::info!("Task {} retrieved", task.id);
    Ok(Json(task))
}

/// Handler for PUT /api/v1/tasks/{id} - Replaces a task's fields.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    put,
    path = "/api/v1/tasks/{id}",
    params(
        ("id" = i32, Path, description = "Task ID")
    ),
    request_body = TaskPayload,
    responses(
        (status = 200, description = "Task updated", body = TaskJson),
        (status = 400, description = "Invalid task ID or request body", body = ErrorResponse),
        (status = 500, description = "Task not found or internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn update_task_handler(
    State(state): State<Arc<TaskState>>,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<TaskJson>, ErrorReply> {
    let id = parse_id(path, UPDATE_FAILED)?;
    let payload = decode_payload(payload)?;

    let task = state
        .repository
        .update_by_id(id, payload.into_changes(Utc::now()))
        .await
        .map_err(|err| failure(StatusCode::INTERNAL_SERVER_ERROR, UPDATE_FAILED, &err))?;
    let task = encode(task, UPDATE_FAILED)?;

    tracing::info!("Task {} updated", task.id);
    Ok(Json(task))
}

/// Handler for DELETE /api/v1/tasks/{id} - Deletes a task and returns it.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/api/v1/tasks/{id}",
    params(
        ("id" = i32, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task deleted", body = TaskJson),
        (status = 400, description = "Invalid task ID", body = ErrorResponse),
        (status = 500, description = "Task not found or internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn delete_task_handler(
    State(state): State<Arc<TaskState>>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<TaskJson>, ErrorReply> {
    let id = parse_id(path, DELETE_FAILED)?;

    let task = state
        .repository
        .delete_by_id(id)
        .await
        .map_err(|err| failure(StatusCode::INTERNAL_SERVER_ERROR, DELETE_FAILED, &err))?;
    let task = encode(task, DELETE_FAILED)?;

    tracing::info!("Task {} deleted", task.id);
    Ok(Json(task))
}

/// Creates and returns the tasks API router.
pub fn create_api_router(state: Arc<TaskState>) -> Router {
    Router::new()
        .route("/tasks", get(list_tasks_handler).post(create_task_handler))
        .route(
            "/tasks/{id}",
            get(get_task_handler)
                .put(update_task_handler)
                .delete(delete_task_handler),
        )
        .with_state(state)
}
