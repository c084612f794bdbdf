//! The `Todo` entity and list ordering.
//!
//! # Design
//! A single struct serves as the stored record and the JSON body. Every field
//! is optional on the wire: `id` is absent on create, and partial updates
//! carry only the fields to overwrite. Records returned by a store always
//! have `id` set.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Store-assigned identifier of a todo.
pub type TodoId = i64;

/// A todo item as stored and as exchanged over HTTP.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: Option<TodoId>,
    pub title: Option<String>,
    pub completed: Option<bool>,
}

impl Todo {
    pub fn new(title: impl Into<String>, completed: bool) -> Self {
        Self {
            id: None,
            title: Some(title.into()),
            completed: Some(completed),
        }
    }

    pub fn with_id(mut self, id: TodoId) -> Self {
        self.id = Some(id);
        self
    }

    /// Overwrite `title` and `completed` with the fields present in `patch`.
    /// `id` is never touched.
    pub fn merge_from(&mut self, patch: &Todo) {
        if let Some(title) = &patch.title {
            self.title = Some(title.clone());
        }
        if let Some(completed) = patch.completed {
            self.completed = Some(completed);
        }
    }
}

/// Field a todo list can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    Title,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// One `field,direction` sort key, as accepted by `GET /todos?sort=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub field: SortField,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid sort parameter: {0}")]
pub struct ParseSortError(String);

impl FromStr for SortOrder {
    type Err = ParseSortError;

    /// Parses `field` or `field,asc|desc`. Direction defaults to ascending.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(',').map(str::trim);
        let field = match parts.next() {
            Some("id") => SortField::Id,
            Some("title") => SortField::Title,
            Some("completed") => SortField::Completed,
            _ => return Err(ParseSortError(s.to_string())),
        };
        let direction = match parts.next() {
            None => Direction::Asc,
            Some(dir) if dir.eq_ignore_ascii_case("asc") => Direction::Asc,
            Some(dir) if dir.eq_ignore_ascii_case("desc") => Direction::Desc,
            Some(_) => return Err(ParseSortError(s.to_string())),
        };
        if parts.next().is_some() {
            return Err(ParseSortError(s.to_string()));
        }
        Ok(Self { field, direction })
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = match self.field {
            SortField::Id => "id",
            SortField::Title => "title",
            SortField::Completed => "completed",
        };
        let direction = match self.direction {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        };
        write!(f, "{field},{direction}")
    }
}

impl SortOrder {
    fn compare(&self, a: &Todo, b: &Todo) -> Ordering {
        // `None` sorts before any value, matching `Option`'s ordering.
        let ordering = match self.field {
            SortField::Id => a.id.cmp(&b.id),
            SortField::Title => a.title.cmp(&b.title),
            SortField::Completed => a.completed.cmp(&b.completed),
        };
        match self.direction {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        }
    }
}

/// Stable sort by each key in turn; ties fall through to the next key.
pub fn sort_todos(todos: &mut [Todo], orders: &[SortOrder]) {
    if orders.is_empty() {
        return;
    }
    todos.sort_by(|a, b| {
        orders
            .iter()
            .map(|order| order.compare(a, b))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn todo_serializes_absent_fields_as_null() {
        let todo = Todo {
            id: Some(7),
            title: None,
            completed: Some(false),
        };
        let json = serde_json::to_value(&todo).unwrap();
        assert_eq!(json["id"], 7);
        assert!(json["title"].is_null());
        assert_eq!(json["completed"], false);
    }

    #[test]
    fn todo_deserializes_with_missing_fields() {
        let todo: Todo = serde_json::from_str(r#"{"title":"Only title"}"#).unwrap();
        assert_eq!(todo.id, None);
        assert_eq!(todo.title.as_deref(), Some("Only title"));
        assert_eq!(todo.completed, None);
    }

    #[test]
    fn todo_rejects_non_integer_id() {
        let result: Result<Todo, _> = serde_json::from_str(r#"{"id":"abc"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn merge_overwrites_only_present_fields() {
        let mut existing = Todo::new("AAAAAAAAAA", false).with_id(1);

        existing.merge_from(&Todo {
            id: Some(99),
            title: Some("BBBBBBBBBB".to_string()),
            completed: None,
        });
        assert_eq!(existing.id, Some(1));
        assert_eq!(existing.title.as_deref(), Some("BBBBBBBBBB"));
        assert_eq!(existing.completed, Some(false));

        existing.merge_from(&Todo {
            id: None,
            title: None,
            completed: Some(true),
        });
        assert_eq!(existing.title.as_deref(), Some("BBBBBBBBBB"));
        assert_eq!(existing.completed, Some(true));
    }

    #[test]
    fn sort_order_parses_field_and_direction() {
        assert_eq!(
            "id,desc".parse::<SortOrder>().unwrap(),
            SortOrder {
                field: SortField::Id,
                direction: Direction::Desc
            }
        );
        assert_eq!(
            "title".parse::<SortOrder>().unwrap(),
            SortOrder {
                field: SortField::Title,
                direction: Direction::Asc
            }
        );
        assert_eq!(
            "id,Desc".parse::<SortOrder>().unwrap().direction,
            Direction::Desc
        );
        assert!("priority,asc".parse::<SortOrder>().is_err());
        assert!("id,sideways".parse::<SortOrder>().is_err());
        assert!("id,asc,extra".parse::<SortOrder>().is_err());
    }

    #[test]
    fn sort_order_display_round_trips() {
        let order: SortOrder = "completed,desc".parse().unwrap();
        assert_eq!(order.to_string(), "completed,desc");
    }

    #[test]
    fn sort_todos_applies_keys_in_order() {
        let mut todos = vec![
            Todo::new("b", true).with_id(1),
            Todo::new("a", false).with_id(2),
            Todo::new("c", false).with_id(3),
        ];
        let orders: [SortOrder; 2] = [
            "completed,asc".parse().unwrap(),
            "id,desc".parse().unwrap(),
        ];
        sort_todos(&mut todos, &orders);
        let ids: Vec<_> = todos.iter().map(|t| t.id.unwrap()).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn sort_todos_without_keys_keeps_order() {
        let mut todos = vec![Todo::new("z", false).with_id(5), Todo::new("a", false).with_id(1)];
        sort_todos(&mut todos, &[]);
        assert_eq!(todos[0].id, Some(5));
    }
}
