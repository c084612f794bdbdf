//! Todo use-case service.
//!
//! # Design
//! Each public method runs inside exactly one unit of work. The unit is
//! committed when the operation succeeds and rolled back (dropped) on any
//! error. "Not found" is reported as `None`, never as an error.

use std::sync::Arc;

use tracing::debug;

use crate::model::{sort_todos, SortOrder, Todo, TodoId};
use crate::store::{StoreResult, TodoStore, TxMode, UnitOfWork};

pub struct TodoService {
    store: Arc<dyn TodoStore>,
}

impl TodoService {
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        Self { store }
    }

    fn in_unit_of_work<T>(
        &self,
        mode: TxMode,
        work: impl FnOnce(&mut dyn UnitOfWork) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut uow = self.store.begin(mode)?;
        let value = work(uow.as_mut())?;
        uow.commit()?;
        Ok(value)
    }

    /// Persist `todo` as-is: insert when it has no id, replace otherwise.
    pub fn save(&self, todo: Todo) -> StoreResult<Todo> {
        debug!(?todo, "Request to save Todo");
        self.in_unit_of_work(TxMode::ReadWrite, |uow| uow.save(todo))
    }

    /// Merge the present fields of `patch` onto the stored record with the
    /// same id. Returns `None` when `patch` has no id or no such record
    /// exists.
    pub fn partial_update(&self, patch: Todo) -> StoreResult<Option<Todo>> {
        debug!(?patch, "Request to partially update Todo");
        let Some(id) = patch.id else {
            return Ok(None);
        };

        self.in_unit_of_work(TxMode::ReadWrite, |uow| {
            let Some(mut existing) = uow.find_by_id(id)? else {
                return Ok(None);
            };
            existing.merge_from(&patch);
            uow.save(existing).map(Some)
        })
    }

    pub fn find_all(&self) -> StoreResult<Vec<Todo>> {
        debug!("Request to get all Todos");
        self.in_unit_of_work(TxMode::ReadOnly, |uow| uow.find_all())
    }

    pub fn find_all_sorted(&self, orders: &[SortOrder]) -> StoreResult<Vec<Todo>> {
        let mut todos = self.find_all()?;
        sort_todos(&mut todos, orders);
        Ok(todos)
    }

    pub fn find_one(&self, id: TodoId) -> StoreResult<Option<Todo>> {
        debug!(id, "Request to get Todo");
        self.in_unit_of_work(TxMode::ReadOnly, |uow| uow.find_by_id(id))
    }

    pub fn exists(&self, id: TodoId) -> StoreResult<bool> {
        self.in_unit_of_work(TxMode::ReadOnly, |uow| uow.exists_by_id(id))
    }

    pub fn delete(&self, id: TodoId) -> StoreResult<()> {
        debug!(id, "Request to delete Todo");
        self.in_unit_of_work(TxMode::ReadWrite, |uow| uow.delete_by_id(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryTodoStore, SqliteTodoStore};

    const DEFAULT_TITLE: &str = "AAAAAAAAAA";
    const UPDATED_TITLE: &str = "BBBBBBBBBB";

    fn service() -> TodoService {
        TodoService::new(Arc::new(MemoryTodoStore::new()))
    }

    #[test]
    fn save_assigns_id_and_persists_fields() {
        let service = service();
        let saved = service.save(Todo::new(DEFAULT_TITLE, false)).unwrap();
        let id = saved.id.expect("id assigned");

        let found = service.find_one(id).unwrap().unwrap();
        assert_eq!(found.title.as_deref(), Some(DEFAULT_TITLE));
        assert_eq!(found.completed, Some(false));
    }

    #[test]
    fn find_all_returns_every_saved_todo() {
        let service = service();
        let ids: Vec<_> = (0..4)
            .map(|n| service.save(Todo::new(format!("todo {n}"), false)).unwrap().id.unwrap())
            .collect();

        let all = service.find_all().unwrap();
        assert_eq!(all.len(), ids.len());
        for id in ids {
            assert!(service.find_one(id).unwrap().is_some());
        }
    }

    #[test]
    fn partial_update_title_keeps_completed() {
        let service = service();
        let id = service.save(Todo::new(DEFAULT_TITLE, false)).unwrap().id.unwrap();

        let patch = Todo {
            id: Some(id),
            title: Some(UPDATED_TITLE.to_string()),
            completed: None,
        };
        let merged = service.partial_update(patch).unwrap().unwrap();
        assert_eq!(merged.title.as_deref(), Some(UPDATED_TITLE));
        assert_eq!(merged.completed, Some(false));

        let found = service.find_one(id).unwrap().unwrap();
        assert_eq!(found, merged);
    }

    #[test]
    fn partial_update_completed_keeps_title() {
        let service = service();
        let id = service.save(Todo::new(DEFAULT_TITLE, false)).unwrap().id.unwrap();

        let patch = Todo {
            id: Some(id),
            title: None,
            completed: Some(true),
        };
        service.partial_update(patch).unwrap().unwrap();

        let found = service.find_one(id).unwrap().unwrap();
        assert_eq!(found.title.as_deref(), Some(DEFAULT_TITLE));
        assert_eq!(found.completed, Some(true));
    }

    #[test]
    fn partial_update_unknown_id_is_none() {
        let service = service();
        let patch = Todo::new(UPDATED_TITLE, true).with_id(4242);
        assert_eq!(service.partial_update(patch).unwrap(), None);
        assert!(service.find_all().unwrap().is_empty());
    }

    #[test]
    fn partial_update_without_id_is_none() {
        let service = service();
        service.save(Todo::new(DEFAULT_TITLE, false)).unwrap();
        assert_eq!(service.partial_update(Todo::new(UPDATED_TITLE, true)).unwrap(), None);
    }

    #[test]
    fn delete_then_find_one_is_none() {
        let service = service();
        let id = service.save(Todo::new(DEFAULT_TITLE, false)).unwrap().id.unwrap();
        assert!(service.exists(id).unwrap());

        service.delete(id).unwrap();
        assert_eq!(service.find_one(id).unwrap(), None);
        assert!(!service.exists(id).unwrap());
    }

    #[test]
    fn delete_unknown_id_is_a_no_op() {
        let service = service();
        service.delete(999).unwrap();
    }

    #[test]
    fn find_all_sorted_orders_by_id_desc() {
        let service = service();
        for n in 0..3 {
            service.save(Todo::new(format!("todo {n}"), false)).unwrap();
        }
        let order: SortOrder = "id,desc".parse().unwrap();
        let sorted = service.find_all_sorted(&[order]).unwrap();
        let ids: Vec<_> = sorted.iter().map(|t| t.id.unwrap()).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn works_against_sqlite_store() {
        let service = TodoService::new(Arc::new(SqliteTodoStore::open_in_memory().unwrap()));
        let id = service.save(Todo::new(DEFAULT_TITLE, false)).unwrap().id.unwrap();
        service
            .partial_update(Todo {
                id: Some(id),
                title: Some(UPDATED_TITLE.to_string()),
                completed: None,
            })
            .unwrap()
            .unwrap();

        let found = service.find_one(id).unwrap().unwrap();
        assert_eq!(found.title.as_deref(), Some(UPDATED_TITLE));
        assert_eq!(found.completed, Some(false));
    }
}
