use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{StoreError, StoreResult, TodoStore, TxMode, UnitOfWork};
use crate::model::{Todo, TodoId};

#[derive(Debug, Clone)]
struct MemoryState {
    /// Next generated id; `None` once `TodoId::MAX` has been used.
    next_id: Option<TodoId>,
    rows: BTreeMap<TodoId, Todo>,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self {
            next_id: Some(1),
            rows: BTreeMap::new(),
        }
    }
}

/// In-process store. Data lives as long as the value does.
///
/// A read-write unit of work holds the write lock and mutates a private copy
/// of the state, which replaces the shared state only on commit.
#[derive(Debug, Default)]
pub struct MemoryTodoStore {
    state: RwLock<MemoryState>,
}

impl MemoryTodoStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TodoStore for MemoryTodoStore {
    fn begin(&self, mode: TxMode) -> StoreResult<Box<dyn UnitOfWork + '_>> {
        match mode {
            TxMode::ReadOnly => {
                let guard = self.state.read().map_err(|_| StoreError::Poisoned)?;
                Ok(Box::new(MemoryReadUnit { guard }))
            }
            TxMode::ReadWrite => {
                let guard = self.state.write().map_err(|_| StoreError::Poisoned)?;
                let staged = guard.clone();
                Ok(Box::new(MemoryWriteUnit { guard, staged }))
            }
        }
    }
}

struct MemoryReadUnit<'a> {
    guard: RwLockReadGuard<'a, MemoryState>,
}

impl UnitOfWork for MemoryReadUnit<'_> {
    fn save(&mut self, _todo: Todo) -> StoreResult<Todo> {
        Err(StoreError::ReadOnly)
    }

    fn find_by_id(&self, id: TodoId) -> StoreResult<Option<Todo>> {
        Ok(self.guard.rows.get(&id).cloned())
    }

    fn exists_by_id(&self, id: TodoId) -> StoreResult<bool> {
        Ok(self.guard.rows.contains_key(&id))
    }

    fn find_all(&self) -> StoreResult<Vec<Todo>> {
        Ok(self.guard.rows.values().cloned().collect())
    }

    fn delete_by_id(&mut self, _id: TodoId) -> StoreResult<()> {
        Err(StoreError::ReadOnly)
    }

    fn commit(self: Box<Self>) -> StoreResult<()> {
        Ok(())
    }
}

struct MemoryWriteUnit<'a> {
    guard: RwLockWriteGuard<'a, MemoryState>,
    staged: MemoryState,
}

impl UnitOfWork for MemoryWriteUnit<'_> {
    fn save(&mut self, mut todo: Todo) -> StoreResult<Todo> {
        let id = match todo.id {
            Some(id) => id,
            None => self.staged.next_id.ok_or(StoreError::IdSpaceExhausted)?,
        };
        self.staged.next_id = match (self.staged.next_id, id.checked_add(1)) {
            (Some(next), Some(after)) => Some(next.max(after)),
            _ => None,
        };
        todo.id = Some(id);
        self.staged.rows.insert(id, todo.clone());
        Ok(todo)
    }

    fn find_by_id(&self, id: TodoId) -> StoreResult<Option<Todo>> {
        Ok(self.staged.rows.get(&id).cloned())
    }

    fn exists_by_id(&self, id: TodoId) -> StoreResult<bool> {
        Ok(self.staged.rows.contains_key(&id))
    }

    fn find_all(&self) -> StoreResult<Vec<Todo>> {
        Ok(self.staged.rows.values().cloned().collect())
    }

    fn delete_by_id(&mut self, id: TodoId) -> StoreResult<()> {
        self.staged.rows.remove(&id);
        Ok(())
    }

    fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryWriteUnit { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}
