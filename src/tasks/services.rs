use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use super::{
    dto::{CreateTaskRequest, UpdateTaskRequest},
    guard, repo,
    repo_types::Task,
};
use crate::{
    auth::extractors::AuthUser,
    error::{ApiError, ApiResult},
    store::DocumentStore,
};

pub async fn create(
    store: &dyn DocumentStore,
    caller: &AuthUser,
    body: CreateTaskRequest,
) -> ApiResult<Task> {
    let title = body.title.trim().to_string();
    if title.is_empty() {
        return Err(ApiError::Validation("Title is required".into()));
    }

    let now = OffsetDateTime::now_utc();
    let task = Task {
        id: Uuid::new_v4().to_string(),
        user_id: caller.id.clone(),
        title,
        description: body.description.unwrap_or_default(),
        completed: false,
        created_at: now,
        updated_at: now,
    };
    repo::put(store, &task).await?;
    info!(task_id = %task.id, user_id = %caller.id, "task created");
    Ok(task)
}

pub async fn list(store: &dyn DocumentStore, caller: &AuthUser) -> ApiResult<Vec<Task>> {
    Ok(repo::list_by_user(store, &caller.id).await?)
}

pub async fn get(store: &dyn DocumentStore, caller: &AuthUser, id: &str) -> ApiResult<Task> {
    guard::load_owned(store, caller, id).await
}

/// Merge the provided fields into `task`. A blank title keeps the old one.
pub fn apply_update(mut task: Task, body: UpdateTaskRequest, now: OffsetDateTime) -> Task {
    if let Some(title) = body.title.map(|t| t.trim().to_string()) {
        if !title.is_empty() {
            task.title = title;
        }
    }
    if let Some(description) = body.description {
        task.description = description;
    }
    if let Some(completed) = body.completed {
        task.completed = completed;
    }
    task.updated_at = now;
    task
}

pub async fn update(
    store: &dyn DocumentStore,
    caller: &AuthUser,
    id: &str,
    body: UpdateTaskRequest,
) -> ApiResult<Task> {
    let existing = guard::load_owned(store, caller, id).await?;
    let task = apply_update(existing, body, OffsetDateTime::now_utc());
    repo::put(store, &task).await?;
    info!(task_id = %task.id, user_id = %caller.id, "task updated");
    Ok(task)
}

pub async fn delete(store: &dyn DocumentStore, caller: &AuthUser, id: &str) -> ApiResult<()> {
    let task = guard::load_owned(store, caller, id).await?;
    repo::delete(store, &task.id).await?;
    info!(task_id = %task.id, user_id = %caller.id, "task deleted");
    Ok(())
}
