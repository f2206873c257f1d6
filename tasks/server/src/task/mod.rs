use crate::entities::task;
use crate::error::SafeError;
use chrono::{DateTime, Utc};
use sea_orm::*;
use std::num::ParseIntError;
use std::sync::Arc;

pub mod api {
    pub mod v1;
}
pub mod status;
pub mod title;

pub use status::Status;
pub use title::Title;

/// Names the JSON kind of `value` for validation messages.
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[derive(Debug, PartialEq, Clone, Eq)]
pub struct Task {
    id: i32,
    title: Title,
    description: String,
    status: Status,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(
        id: i32,
        title: Title,
        description: String,
        status: Status,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title,
            description,
            status,
            created_at,
            updated_at,
        }
    }

    /// Returns the store-assigned ID of the task.
    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn title(&self) -> &Title {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Returns when the task was created. Never changes after creation.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the task was last written.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl TryFrom<task::Model> for Task {
    type Error = SafeError;

    fn try_from(model: task::Model) -> Result<Self, Self::Error> {
        Ok(Task::new(
            model.id,
            Title::from_store(model.title)?,
            model.description,
            Status::from_store(model.status)?,
            model.created_at,
            model.updated_at,
        ))
    }
}

/// Fields supplied by a client when creating a task.
#[derive(Debug, PartialEq, Clone, Eq)]
pub struct TaskDraft {
    pub title: Title,
    pub description: String,
    pub status: Status,
}

/// Replacement fields for an existing task, stamped with the update time.
#[derive(Debug, PartialEq, Clone, Eq)]
pub struct TaskChanges {
    pub title: Title,
    pub description: String,
    pub status: Status,
    pub updated_at: DateTime<Utc>,
}

/// Error type for task storage operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// A field failed value-type validation on its way into or out of the store.
    #[error("{0}")]
    Validation(#[from] SafeError),
    /// No task matches the given ID.
    #[error("Task with ID {0} not found")]
    NotFound(String),
    /// The ID could not be read as a task ID.
    #[error("Malformed task ID '{id}'")]
    MalformedId {
        id: String,
        #[source]
        source: ParseIntError,
    },
    /// Represents a database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Storage operations required by the task handlers.
///
/// Each operation is atomic from the caller's point of view.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TaskRepository: Send + Sync {
    /// Returns every task in creation order, or nothing if any row is invalid.
    async fn list_all(&self) -> Result<Vec<Task>, RepositoryError>;

    /// Stores a new task; the store assigns its ID and timestamps.
    async fn create(&self, draft: TaskDraft) -> Result<Task, RepositoryError>;

    /// Looks up a task by an ID that has not been parsed yet.
    async fn get_by_id(&self, id: &str) -> Result<Task, RepositoryError>;

    /// Replaces title, description and status and writes the stamped update time.
    async fn update_by_id(&self, id: i32, changes: TaskChanges) -> Result<Task, RepositoryError>;

    /// Removes a task and returns it as it was before deletion.
    async fn delete_by_id(&self, id: i32) -> Result<Task, RepositoryError>;
}

/// [`TaskRepository`] backed by the `tasks` table.
#[derive(Clone, Debug)]
pub struct TaskService {
    db: DatabaseConnection,
}

impl TaskService {
    pub fn new(db: DatabaseConnection) -> TaskService {
        TaskService { db }
    }
}

#[async_trait::async_trait]
impl TaskRepository for TaskService {
    #[tracing::instrument(skip(self))]
    async fn list_all(&self) -> Result<Vec<Task>, RepositoryError> {
        let tasks = task::Entity::find()
            .order_by_asc(task::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Task::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    #[tracing::instrument(skip(self))]
    async fn create(&self, draft: TaskDraft) -> Result<Task, RepositoryError> {
        let active_model = task::ActiveModel {
            title: ActiveValue::Set(Some(draft.title.to_store()?)),
            description: ActiveValue::Set(draft.description),
            status: ActiveValue::Set(Some(draft.status.to_store()?)),
            ..Default::default()
        };
        let created_model = active_model.insert(&self.db).await?;
        Ok(Task::try_from(created_model)?)
    }

    #[tracing::instrument(skip(self))]
    async fn get_by_id(&self, id: &str) -> Result<Task, RepositoryError> {
        let task_id: i32 = id.parse().map_err(|source| RepositoryError::MalformedId {
            id: id.to_string(),
            source,
        })?;
        let task_model = task::Entity::find_by_id(task_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        Ok(Task::try_from(task_model)?)
    }

    #[tracing::instrument(skip(self))]
    async fn update_by_id(&self, id: i32, changes: TaskChanges) -> Result<Task, RepositoryError> {
        let title = changes.title.to_store()?;
        let status = changes.status.to_store()?;

        let txn = self.db.begin().await?;
        let task_to_update = task::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;

        let mut active_model: task::ActiveModel = task_to_update.into();
        active_model.title = ActiveValue::Set(Some(title));
        active_model.description = ActiveValue::Set(changes.description);
        active_model.status = ActiveValue::Set(Some(status));
        active_model.updated_at = ActiveValue::Set(changes.updated_at);
        let updated_model = active_model.update(&txn).await?;
        let updated_task = Task::try_from(updated_model)?;
        txn.commit().await?;

        Ok(updated_task)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_by_id(&self, id: i32) -> Result<Task, RepositoryError> {
        let txn = self.db.begin().await?;
        let task_to_delete = task::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;

        let deleted_task = Task::try_from(task_to_delete)?;
        task::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        Ok(deleted_task)
    }
}

/// Shared state for the task routes.
#[derive(Clone)]
pub struct TaskState {
    pub repository: Arc<dyn TaskRepository>,
}

impl TaskState {
    pub fn new(repository: impl TaskRepository + 'static) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }
}
