//! Persistence of todo records behind a unit-of-work boundary.
//!
//! # Design
//! Every store access happens inside a `UnitOfWork` obtained from
//! `TodoStore::begin`. `commit` consumes the unit; dropping it without
//! committing rolls back. Read-only units reject mutations so concurrent
//! readers never need the write path.
//!
//! Two backends implement `TodoStore`: `MemoryTodoStore` (default, lost on
//! exit) and `SqliteTodoStore` (durable file or in-memory database).

mod memory;
mod sqlite;

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::config::{StorageBackend, StorageConfig};
use crate::model::{Todo, TodoId};

pub use memory::MemoryTodoStore;
pub use sqlite::{latest_schema_version, SqliteTodoStore};

pub type StoreResult<T> = Result<T, StoreError>;

/// Failures of the persistence layer. Absence of a record is not an error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion { db_version: u32, latest_supported: u32 },

    #[error("store lock poisoned")]
    Poisoned,

    #[error("write attempted in a read-only unit of work")]
    ReadOnly,

    #[error("sqlite storage requires a database path")]
    MissingPath,

    #[error("no identifiers left to assign")]
    IdSpaceExhausted,
}

/// Access mode requested when a unit of work begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxMode {
    ReadOnly,
    ReadWrite,
}

/// One scoped transaction against a store.
pub trait UnitOfWork {
    /// Insert or replace `todo`, assigning an id when absent.
    fn save(&mut self, todo: Todo) -> StoreResult<Todo>;

    fn find_by_id(&self, id: TodoId) -> StoreResult<Option<Todo>>;

    fn exists_by_id(&self, id: TodoId) -> StoreResult<bool>;

    /// All records ordered by ascending id.
    fn find_all(&self) -> StoreResult<Vec<Todo>>;

    /// Removes the record if present; deleting an unknown id is a no-op.
    fn delete_by_id(&mut self, id: TodoId) -> StoreResult<()>;

    fn commit(self: Box<Self>) -> StoreResult<()>;
}

pub trait TodoStore: Send + Sync {
    fn begin(&self, mode: TxMode) -> StoreResult<Box<dyn UnitOfWork + '_>>;
}

/// Open the store selected by `config`.
pub fn open_store(config: &StorageConfig) -> StoreResult<Arc<dyn TodoStore>> {
    match config.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryTodoStore::new())),
        StorageBackend::Sqlite => {
            let path: &PathBuf = config.path.as_ref().ok_or(StoreError::MissingPath)?;
            if path.as_os_str() == ":memory:" {
                Ok(Arc::new(SqliteTodoStore::open_in_memory()?))
            } else {
                Ok(Arc::new(SqliteTodoStore::open(path)?))
            }
        }
    }
}
