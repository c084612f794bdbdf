//! Errors raised at the HTTP boundary and their responses.
//!
//! Bad-request errors carry an `errorKey` (`idexists`, `idnull`, ...) that is
//! echoed both in the `x-todoapp-error` header and in an
//! `application/problem+json` body, so clients can branch on it.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use super::headers::{failure_alert, ENTITY_NAME};
use crate::model::TodoId;
use crate::store::StoreError;

/// Machine-readable reason attached to an error response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKey {
    IdExists,
    IdNull,
    IdInvalid,
    IdNotFound,
    SortInvalid,
    ParamInvalid,
    BodyInvalid,
    NotFound,
    Internal,
}

impl ErrorKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::IdExists => "idexists",
            Self::IdNull => "idnull",
            Self::IdInvalid => "idinvalid",
            Self::IdNotFound => "idnotfound",
            Self::SortInvalid => "sortinvalid",
            Self::ParamInvalid => "paraminvalid",
            Self::BodyInvalid => "bodyinvalid",
            Self::NotFound => "notfound",
            Self::Internal => "internal",
        }
    }

    /// Translation key sent to clients, e.g. `error.idexists`.
    pub fn message_key(self) -> &'static str {
        match self {
            Self::IdExists => "error.idexists",
            Self::IdNull => "error.idnull",
            Self::IdInvalid => "error.idinvalid",
            Self::IdNotFound => "error.idnotfound",
            Self::SortInvalid => "error.sortinvalid",
            Self::ParamInvalid => "error.paraminvalid",
            Self::BodyInvalid => "error.bodyinvalid",
            Self::NotFound => "error.notfound",
            Self::Internal => "error.internal",
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    BadRequest { message: String, key: ErrorKey },

    #[error("todo {0} not found")]
    NotFound(TodoId),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("{0}")]
    Internal(&'static str),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>, key: ErrorKey) -> Self {
        Self::BadRequest {
            message: message.into(),
            key,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(_) | Self::Join(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn key(&self) -> ErrorKey {
        match self {
            Self::BadRequest { key, .. } => *key,
            Self::NotFound(_) => ErrorKey::NotFound,
            Self::Store(_) | Self::Join(_) | Self::Internal(_) => ErrorKey::Internal,
        }
    }
}

/// Problem-details body returned for every error response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub title: String,
    pub status: u16,
    pub entity_name: &'static str,
    pub error_key: &'static str,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let key = self.key();

        let title = match &self {
            Self::Store(_) | Self::Join(_) | Self::Internal(_) => {
                error!(error = %self, "request failed");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let problem = Problem {
            title,
            status: status.as_u16(),
            entity_name: ENTITY_NAME,
            error_key: key.as_str(),
            message: key.message_key().to_string(),
        };

        let mut response = (status, Json(problem)).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );
        if let Self::BadRequest { .. } = self {
            response.headers_mut().extend(failure_alert(key));
        }
        response
    }
}
