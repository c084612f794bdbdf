//! Todo DTOs and collection helpers.
//!
//! # Design
//! The server may return records with any field absent, so every field is
//! optional. Absent fields are omitted when serializing, which gives
//! merge-patch bodies their "leave unchanged" meaning.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Server-assigned identifier of a todo.
pub type TodoId = i64;

/// A todo as exchanged with the API.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TodoId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

/// Request payload for creating a new todo. Carries no id by construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateTodo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

pub fn todo_identifier(todo: &Todo) -> Option<TodoId> {
    todo.id
}

/// Prepend each candidate whose id is not yet in `collection`.
///
/// `None` candidates, candidates without an id and repeated ids are skipped.
/// The collection comes back untouched when nothing qualifies.
pub fn add_todo_to_collection_if_missing<I>(collection: Vec<Todo>, candidates: I) -> Vec<Todo>
where
    I: IntoIterator<Item = Option<Todo>>,
{
    let mut seen: HashSet<TodoId> = collection.iter().filter_map(todo_identifier).collect();
    let to_add: Vec<Todo> = candidates
        .into_iter()
        .flatten()
        .filter(|todo| todo_identifier(todo).is_some_and(|id| seen.insert(id)))
        .collect();

    if to_add.is_empty() {
        return collection;
    }
    to_add.into_iter().chain(collection).collect()
}
