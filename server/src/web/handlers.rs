//! Request handlers for `/todos`.
//!
//! Service calls run on tokio's blocking pool: the stores take std locks and
//! SQLite does file I/O.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use tracing::debug;

use super::error::{ApiError, ErrorKey};
use super::extract::{ApiJson, ApiPath, ListParams};
use super::headers::{entity_creation_alert, entity_deletion_alert, entity_update_alert};
use super::AppState;
use crate::model::{SortOrder, Todo, TodoId};
use crate::service::TodoService;
use crate::store::StoreResult;

async fn run_blocking<T, F>(state: &AppState, work: F) -> Result<T, ApiError>
where
    F: FnOnce(&TodoService) -> StoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    let service = Arc::clone(&state.service);
    let result = tokio::task::spawn_blocking(move || work(service.as_ref())).await?;
    Ok(result?)
}

fn persisted_id(todo: &Todo) -> Result<TodoId, ApiError> {
    todo.id.ok_or(ApiError::Internal("store returned a todo without an id"))
}

/// Both the path id and the body id must be present and agree.
fn check_update_ids(path_id: TodoId, todo: &Todo) -> Result<(), ApiError> {
    match todo.id {
        None => Err(ApiError::bad_request("Invalid id", ErrorKey::IdNull)),
        Some(body_id) if body_id != path_id => {
            Err(ApiError::bad_request("Invalid ID", ErrorKey::IdInvalid))
        }
        Some(_) => Ok(()),
    }
}

async fn ensure_exists(state: &AppState, id: TodoId) -> Result<(), ApiError> {
    if run_blocking(state, move |service| service.exists(id)).await? {
        Ok(())
    } else {
        Err(ApiError::bad_request("Entity not found", ErrorKey::IdNotFound))
    }
}

/// Parse every `sort` value; each may hold several `;`-separated keys.
fn parse_sort(values: &[String]) -> Result<Vec<SortOrder>, ApiError> {
    values
        .iter()
        .flat_map(|value| value.split(';'))
        .filter(|key| !key.trim().is_empty())
        .map(|key| {
            key.parse::<SortOrder>()
                .map_err(|err| ApiError::bad_request(err.to_string(), ErrorKey::SortInvalid))
        })
        .collect()
}

pub async fn list_todos(
    State(state): State<AppState>,
    params: ListParams,
) -> Result<Json<Vec<Todo>>, ApiError> {
    debug!(sort = ?params.sort, "REST request to get all Todos");
    let orders = parse_sort(&params.sort)?;
    let todos = run_blocking(&state, move |service| service.find_all_sorted(&orders)).await?;
    Ok(Json(todos))
}

pub async fn create_todo(
    State(state): State<AppState>,
    ApiJson(todo): ApiJson<Todo>,
) -> Result<impl IntoResponse, ApiError> {
    debug!(?todo, "REST request to save Todo");
    if todo.id.is_some() {
        return Err(ApiError::bad_request(
            "A new todo cannot already have an ID",
            ErrorKey::IdExists,
        ));
    }

    let saved = run_blocking(&state, move |service| service.save(todo)).await?;
    let id = persisted_id(&saved)?;
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/todos/{id}"))],
        entity_creation_alert(id),
        Json(saved),
    ))
}

pub async fn get_todo(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<TodoId>,
) -> Result<Json<Todo>, ApiError> {
    debug!(id, "REST request to get Todo");
    run_blocking(&state, move |service| service.find_one(id))
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound(id))
}

pub async fn update_todo(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<TodoId>,
    ApiJson(todo): ApiJson<Todo>,
) -> Result<impl IntoResponse, ApiError> {
    debug!(id, ?todo, "REST request to update Todo");
    check_update_ids(id, &todo)?;
    ensure_exists(&state, id).await?;

    let saved = run_blocking(&state, move |service| service.save(todo)).await?;
    Ok((entity_update_alert(id), Json(saved)))
}

pub async fn partial_update_todo(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<TodoId>,
    ApiJson(todo): ApiJson<Todo>,
) -> Result<impl IntoResponse, ApiError> {
    debug!(id, ?todo, "REST request to partial update Todo");
    check_update_ids(id, &todo)?;
    ensure_exists(&state, id).await?;

    // The record can vanish between the existence check and the merge.
    let merged = run_blocking(&state, move |service| service.partial_update(todo))
        .await?
        .ok_or(ApiError::NotFound(id))?;
    Ok((entity_update_alert(id), Json(merged)))
}

pub async fn delete_todo(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<TodoId>,
) -> Result<impl IntoResponse, ApiError> {
    debug!(id, "REST request to delete Todo");
    run_blocking(&state, move |service| service.delete(id)).await?;
    Ok((StatusCode::NO_CONTENT, entity_deletion_alert(id)))
}
