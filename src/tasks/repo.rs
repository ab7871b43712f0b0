use anyhow::Context;

use super::repo_types::Task;
use crate::store::{
    from_document,
    tables::{TASKS, TASK_OWNER_INDEX},
    to_document, DocumentStore,
};

pub async fn get(store: &dyn DocumentStore, id: &str) -> anyhow::Result<Option<Task>> {
    let doc = store.get_item(&TASKS, id).await.context("get task")?;
    doc.map(from_document).transpose().context("decode task")
}

/// Insert or fully replace a task. Last write wins.
pub async fn put(store: &dyn DocumentStore, task: &Task) -> anyhow::Result<()> {
    store
        .put_item(&TASKS, to_document(task)?)
        .await
        .with_context(|| format!("put task {}", task.id))
}

pub async fn delete(store: &dyn DocumentStore, id: &str) -> anyhow::Result<()> {
    store
        .delete_item(&TASKS, id)
        .await
        .with_context(|| format!("delete task {}", id))
}

/// All tasks owned by `user_id`, oldest first.
pub async fn list_by_user(store: &dyn DocumentStore, user_id: &str) -> anyhow::Result<Vec<Task>> {
    let docs = store
        .query_by_index(&TASKS, TASK_OWNER_INDEX, user_id)
        .await
        .context("query tasks by owner")?;
    let mut tasks = docs
        .into_iter()
        .map(from_document::<Task>)
        .collect::<Result<Vec<_>, _>>()
        .context("decode task")?;
    tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(tasks)
}
