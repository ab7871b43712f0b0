use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{CreateTaskRequest, UpdateTaskRequest},
    repo_types::Task,
    services,
};
use crate::{
    auth::extractors::AuthUser,
    error::{ApiResult, AppJson},
    state::AppState,
};

pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route(
            "/api/tasks/:id",
            get(get_task).put(update_task).delete(delete_task),
        )
}

#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn create_task(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(body): AppJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let task = services::create(state.store.as_ref(), &user, body).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list_tasks(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<Task>>> {
    Ok(Json(services::list(state.store.as_ref(), &user).await?))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn get_task(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Task>> {
    Ok(Json(services::get(state.store.as_ref(), &user, &id).await?))
}

#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn update_task(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    AppJson(body): AppJson<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    Ok(Json(
        services::update(state.store.as_ref(), &user, &id, body).await?,
    ))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_task(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    services::delete(state.store.as_ref(), &user, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
