use crate::error::{ServiceError, ServiceResult};
use crate::model::{NewTask, Task, TaskChanges};
use crate::state::AppState;
use crate::storage::TaskFilter;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Query parameters for listing tasks
#[derive(Debug, Deserialize)]
pub struct ListTasksQuery {
    /// Only tasks with this completion state
    #[serde(default)]
    pub completed: Option<bool>,

    /// Number of tasks to return
    #[serde(default = "default_limit")]
    pub limit: usize,
}

/// Response from task listing
#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub total: usize,
    pub tasks: Vec<Task>,
}

/// Response from task deletion
#[derive(Debug, Serialize)]
pub struct TaskDeleteResponse {
    pub id: String,
    pub status: String,
}

fn default_limit() -> usize {
    100
}

const MAX_LIMIT: usize = 1000;

/// Parse a path segment as a task id
fn parse_task_id(id: &str) -> ServiceResult<ObjectId> {
    ObjectId::parse_str(id).map_err(|_| ServiceError::BadRequest(format!("Invalid task id: {id}")))
}

/// List tasks, newest first
pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListTasksQuery>,
) -> ServiceResult<impl IntoResponse> {
    let filter = TaskFilter {
        completed: query.completed,
        limit: query.limit.min(MAX_LIMIT) as i64,
    };

    let documents = state.store.list(filter).await?;
    let tasks: Vec<Task> = documents.into_iter().map(Task::from).collect();

    Ok(Json(TaskListResponse {
        total: tasks.len(),
        tasks,
    }))
}

/// Create a task
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewTask>,
) -> ServiceResult<impl IntoResponse> {
    if request.title.trim().is_empty() {
        return Err(ServiceError::BadRequest(
            "Task title must not be empty".to_string(),
        ));
    }

    let document = state.store.create(request).await?;
    Ok((StatusCode::CREATED, Json(Task::from(document))))
}

/// Fetch a single task
pub async fn get_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ServiceResult<impl IntoResponse> {
    let task_id = parse_task_id(&id)?;

    match state.store.get(task_id).await? {
        Some(document) => Ok(Json(Task::from(document))),
        None => Err(ServiceError::NotFound),
    }
}

/// Apply a partial update to a task
pub async fn update_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(changes): Json<TaskChanges>,
) -> ServiceResult<impl IntoResponse> {
    let task_id = parse_task_id(&id)?;

    if let Some(title) = &changes.title {
        if title.trim().is_empty() {
            return Err(ServiceError::BadRequest(
                "Task title must not be empty".to_string(),
            ));
        }
    }

    match state.store.update(task_id, changes).await? {
        Some(document) => Ok(Json(Task::from(document))),
        None => Err(ServiceError::NotFound),
    }
}

/// Delete a task
pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ServiceResult<impl IntoResponse> {
    let task_id = parse_task_id(&id)?;

    if state.store.delete(task_id).await? {
        Ok(Json(TaskDeleteResponse {
            id,
            status: "deleted".to_string(),
        }))
    } else {
        Err(ServiceError::NotFound)
    }
}
