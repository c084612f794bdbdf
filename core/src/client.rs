//! Stateless HTTP request builder and response parser for the todo API.
//!
//! # Design
//! `TodoClient` holds only a `base_url` and carries no mutable state between
//! calls. Each operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! The caller executes the actual HTTP round-trip.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{CreateTodo, Todo, TodoId};

const JSON: &str = "application/json";
const MERGE_PATCH_JSON: &str = "application/merge-patch+json";
const ERROR_HEADER: &str = "x-todoapp-error";

/// Synchronous, stateless client for the todo API.
#[derive(Debug, Clone)]
pub struct TodoClient {
    base_url: String,
}

impl TodoClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn resource_url(&self, id: TodoId) -> String {
        format!("{}/todos/{id}", self.base_url)
    }

    fn bodiless(method: HttpMethod, path: String) -> HttpRequest {
        HttpRequest {
            method,
            path,
            headers: Vec::new(),
            body: None,
        }
    }

    fn with_body<T: Serialize>(
        method: HttpMethod,
        path: String,
        content_type: &str,
        payload: &T,
    ) -> Result<HttpRequest, ApiError> {
        let body =
            serde_json::to_string(payload).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(HttpRequest {
            method,
            path,
            headers: vec![("content-type".to_string(), content_type.to_string())],
            body: Some(body),
        })
    }

    pub fn build_list_todos(&self) -> HttpRequest {
        Self::bodiless(HttpMethod::Get, format!("{}/todos", self.base_url))
    }

    /// List ordered by `sort` keys such as `completed,asc` then `id,desc`,
    /// one repeated `sort` parameter per key.
    ///
    /// Keys are plain ASCII field names and directions and are sent as-is.
    pub fn build_list_todos_sorted(&self, sort: &[&str]) -> HttpRequest {
        let query = sort
            .iter()
            .map(|key| format!("sort={key}"))
            .collect::<Vec<_>>()
            .join("&");
        let path = if query.is_empty() {
            format!("{}/todos", self.base_url)
        } else {
            format!("{}/todos?{query}", self.base_url)
        };
        Self::bodiless(HttpMethod::Get, path)
    }

    pub fn build_get_todo(&self, id: TodoId) -> HttpRequest {
        Self::bodiless(HttpMethod::Get, self.resource_url(id))
    }

    pub fn build_create_todo(&self, input: &CreateTodo) -> Result<HttpRequest, ApiError> {
        Self::with_body(
            HttpMethod::Post,
            format!("{}/todos", self.base_url),
            JSON,
            input,
        )
    }

    /// Full replacement of `todo`; its id selects the resource.
    pub fn build_update_todo(&self, todo: &Todo) -> Result<HttpRequest, ApiError> {
        let id = todo.id.ok_or(ApiError::MissingId)?;
        Self::with_body(HttpMethod::Put, self.resource_url(id), JSON, todo)
    }

    /// Merge `patch` into the stored todo; omitted fields stay unchanged.
    pub fn build_partial_update_todo(&self, patch: &Todo) -> Result<HttpRequest, ApiError> {
        let id = patch.id.ok_or(ApiError::MissingId)?;
        Self::with_body(HttpMethod::Patch, self.resource_url(id), MERGE_PATCH_JSON, patch)
    }

    pub fn build_delete_todo(&self, id: TodoId) -> HttpRequest {
        Self::bodiless(HttpMethod::Delete, self.resource_url(id))
    }

    pub fn parse_list_todos(&self, response: HttpResponse) -> Result<Vec<Todo>, ApiError> {
        check_status(&response, 200)?;
        parse_body(&response)
    }

    pub fn parse_get_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        check_status(&response, 200)?;
        parse_body(&response)
    }

    pub fn parse_create_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        check_status(&response, 201)?;
        parse_body(&response)
    }

    pub fn parse_update_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        check_status(&response, 200)?;
        parse_body(&response)
    }

    pub fn parse_partial_update_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        check_status(&response, 200)?;
        parse_body(&response)
    }

    pub fn parse_delete_todo(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, 204)?;
        Ok(())
    }
}

fn parse_body<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProblemBody {
    error_key: Option<String>,
}

/// The `errorKey` of a problem body, else the error header without its
/// `error.` prefix.
fn error_key(response: &HttpResponse) -> Option<String> {
    serde_json::from_str::<ProblemBody>(&response.body)
        .ok()
        .and_then(|problem| problem.error_key)
        .or_else(|| {
            response.header(ERROR_HEADER).map(|value| {
                value
                    .strip_prefix("error.")
                    .unwrap_or(value)
                    .to_string()
            })
        })
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    match response.status {
        status if status == expected => Ok(()),
        404 => Err(ApiError::NotFound),
        400 => Err(ApiError::BadRequest {
            error_key: error_key(response),
            body: response.body.clone(),
        }),
        status => Err(ApiError::HttpError {
            status,
            body: response.body.clone(),
        }),
    }
}
