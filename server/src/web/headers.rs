//! Alert headers attached to mutation responses.
//!
//! Successful mutations carry `x-todoapp-alert` (a message key such as
//! `todoApp.todo.created`) and `x-todoapp-params` (the affected id).
//! Rejected requests carry `x-todoapp-error` and the entity name.

use axum::http::{HeaderName, HeaderValue};

use super::error::ErrorKey;
use crate::model::TodoId;

pub const APPLICATION_NAME: &str = "todoApp";
pub const ENTITY_NAME: &str = "todo";

pub const ALERT_HEADER: HeaderName = HeaderName::from_static("x-todoapp-alert");
pub const ERROR_HEADER: HeaderName = HeaderName::from_static("x-todoapp-error");
pub const PARAMS_HEADER: HeaderName = HeaderName::from_static("x-todoapp-params");

pub type AlertHeaders = [(HeaderName, HeaderValue); 2];

fn alert(message_key: &'static str, id: TodoId) -> AlertHeaders {
    [
        (ALERT_HEADER, HeaderValue::from_static(message_key)),
        (PARAMS_HEADER, HeaderValue::from(id)),
    ]
}

pub fn entity_creation_alert(id: TodoId) -> AlertHeaders {
    alert("todoApp.todo.created", id)
}

pub fn entity_update_alert(id: TodoId) -> AlertHeaders {
    alert("todoApp.todo.updated", id)
}

pub fn entity_deletion_alert(id: TodoId) -> AlertHeaders {
    alert("todoApp.todo.deleted", id)
}

pub fn failure_alert(key: ErrorKey) -> AlertHeaders {
    [
        (ERROR_HEADER, HeaderValue::from_static(key.message_key())),
        (PARAMS_HEADER, HeaderValue::from_static(ENTITY_NAME)),
    ]
}
