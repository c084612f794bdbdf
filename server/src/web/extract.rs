//! Extractors whose rejections are answered like every other bad request:
//! a problem body with an `errorKey` and the `x-todoapp-error` header.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query};
use axum::http::request::Parts;

use super::error::{ApiError, ErrorKey};

/// JSON body; malformed, mistyped or non-JSON bodies become `bodyinvalid`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Path parameters; unparsable values become `paraminvalid`.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text(), ErrorKey::BodyInvalid)
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::bad_request(rejection.body_text(), ErrorKey::ParamInvalid)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request(rejection.body_text(), ErrorKey::ParamInvalid)
    }
}

/// Query of `GET /todos`.
///
/// `sort` may repeat (`?sort=completed,asc&sort=id,desc`) and a single value
/// may hold several keys separated by `;`. Other parameters are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    pub sort: Vec<String>,
}

impl ListParams {
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let sort = pairs
            .into_iter()
            .filter(|(key, _)| key == "sort")
            .map(|(_, value)| value)
            .collect();
        Self { sort }
    }
}

impl<S> FromRequestParts<S> for ListParams
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::from_request_parts(parts, state).await?;
        Ok(Self::from_pairs(pairs))
    }
}
