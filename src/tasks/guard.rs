//! Ownership check shared by every task endpoint that touches an existing task.

use tracing::warn;

use super::{repo, repo_types::Task};
use crate::{
    auth::extractors::AuthUser,
    error::{ApiError, ApiResult},
    store::DocumentStore,
};

#[derive(Debug, PartialEq)]
pub enum Access {
    Allowed(Task),
    NotFound,
    Forbidden,
}

/// Existence is checked before ownership, so a missing task is always 404
/// even for callers that could never own it.
pub fn authorize(caller_id: &str, task: Option<Task>) -> Access {
    match task {
        None => Access::NotFound,
        Some(task) if task.user_id != caller_id => Access::Forbidden,
        Some(task) => Access::Allowed(task),
    }
}

impl Access {
    pub fn into_result(self) -> ApiResult<Task> {
        match self {
            Access::Allowed(task) => Ok(task),
            Access::NotFound => Err(ApiError::NotFound("Task not found".into())),
            Access::Forbidden => Err(ApiError::Forbidden("Access denied".into())),
        }
    }
}

/// Fetch the task and return it only if `caller` owns it.
pub async fn load_owned(
    store: &dyn DocumentStore,
    caller: &AuthUser,
    id: &str,
) -> ApiResult<Task> {
    let task = repo::get(store, id).await?;
    let access = authorize(&caller.id, task);
    if access == Access::Forbidden {
        warn!(user_id = %caller.id, task_id = %id, "task access denied");
    }
    access.into_result()
}
