use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::error::AppError;
use crate::models::{Priority, Task, TaskPayload, TaskQuery, TaskStatus};
use crate::state::AppState;

fn task_not_found() -> AppError {
    AppError::NotFound("Task not found".to_string())
}

fn parse_id(id: &str) -> Result<u64, AppError> {
    id.parse().map_err(|_| task_not_found())
}

fn sorted_tasks(state: &AppState) -> Vec<Task> {
    let mut tasks: Vec<Task> = state.tasks.iter().map(|t| t.value().clone()).collect();
    tasks.sort_by_key(|t| t.id);
    tasks
}

// GET /api/tasks?status=&priority=&assignee=&search=
pub async fn list_tasks_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TaskQuery>,
) -> Json<Value> {
    let tasks: Vec<Task> = sorted_tasks(&state)
        .into_iter()
        .filter(|t| query.matches(t))
        .collect();

    tracing::info!(filters = ?query, count = tasks.len(), "Tasks list requested");
    Json(json!({
        "data": tasks,
        "total": tasks.len(),
        "filters": query,
        "timestamp": Utc::now().to_rfc3339()
    }))
}

// GET /api/tasks/{id}
pub async fn get_task_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(&id)?;
    let task = state.tasks.get(&id).ok_or_else(task_not_found)?;

    Ok(Json(json!({
        "data": task.value(),
        "timestamp": Utc::now().to_rfc3339()
    })))
}

// POST /api/tasks
pub async fn create_task_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TaskPayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;

    let (Some(title), Some(description)) = (payload.title.clone(), payload.description.clone())
    else {
        return Err(AppError::BadRequest(
            "Title and description are required".to_string(),
        ));
    };
    if title.is_empty() || description.is_empty() {
        return Err(AppError::BadRequest(
            "Title and description are required".to_string(),
        ));
    }
    let status = payload.parsed_status()?.unwrap_or(TaskStatus::Todo);
    let priority = payload.parsed_priority()?.unwrap_or(Priority::Medium);

    let now = Utc::now();
    let task = Task {
        id: state.next_task_id(),
        title,
        description,
        status,
        priority,
        assignee: payload.assignee,
        created_at: now,
        updated_at: now,
        due_date: payload.due_date,
        tags: payload.tags.unwrap_or_default(),
    };
    state.tasks.insert(task.id, task.clone());
    tracing::info!(id = task.id, "New task created");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "data": task,
            "message": "Task created successfully",
            "timestamp": Utc::now().to_rfc3339()
        })),
    ))
}

// PUT /api/tasks/{id} - only the fields present in the body change
pub async fn update_task_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<TaskPayload>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(&id)?;
    let Json(payload) = payload?;
    let status = payload.parsed_status()?;
    let priority = payload.parsed_priority()?;

    let mut task = state.tasks.get_mut(&id).ok_or_else(task_not_found)?;
    if let Some(title) = payload.title.filter(|t| !t.is_empty()) {
        task.title = title;
    }
    if let Some(description) = payload.description.filter(|d| !d.is_empty()) {
        task.description = description;
    }
    if let Some(status) = status {
        task.status = status;
    }
    if let Some(priority) = priority {
        task.priority = priority;
    }
    if payload.assignee.is_some() {
        task.assignee = payload.assignee;
    }
    if payload.due_date.is_some() {
        task.due_date = payload.due_date;
    }
    if let Some(tags) = payload.tags {
        task.tags = tags;
    }
    task.updated_at = Utc::now();
    let updated = task.clone();
    drop(task);

    tracing::info!(id, "Task updated");
    Ok(Json(json!({
        "data": updated,
        "message": "Task updated successfully",
        "timestamp": Utc::now().to_rfc3339()
    })))
}

// DELETE /api/tasks/{id}
pub async fn delete_task_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(&id)?;
    let (_, deleted) = state.tasks.remove(&id).ok_or_else(task_not_found)?;

    tracing::info!(id, "Task deleted");
    Ok(Json(json!({
        "data": deleted,
        "message": "Task deleted successfully",
        "timestamp": Utc::now().to_rfc3339()
    })))
}

// GET /api/tasks/stats/summary
pub async fn task_stats_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let tasks = sorted_tasks(&state);
    let now = Utc::now();
    let count = |pred: fn(&Task, DateTime<Utc>) -> bool| {
        tasks.iter().filter(|t| pred(t, now)).count()
    };

    Json(json!({
        "data": {
            "total": tasks.len(),
            "byStatus": {
                "todo": count(|t, _| t.status == TaskStatus::Todo),
                "inProgress": count(|t, _| t.status == TaskStatus::InProgress),
                "done": count(|t, _| t.status == TaskStatus::Done),
            },
            "byPriority": {
                "low": count(|t, _| t.priority == Priority::Low),
                "medium": count(|t, _| t.priority == Priority::Medium),
                "high": count(|t, _| t.priority == Priority::High),
            },
            "assigned": count(|t, _| t.assignee.is_some()),
            "unassigned": count(|t, _| t.assignee.is_none()),
            "overdue": count(|t, now| t.due_date.is_some_and(|d| d < now)),
        },
        "timestamp": now.to_rfc3339()
    }))
}
