//! SQLite-backed todo store.
//!
//! # Invariants
//! - Connections are handed out only after all migrations are applied.
//! - The applied schema version is mirrored to `PRAGMA user_version`.
//! - `AUTOINCREMENT` keeps identifiers unique even after deletes.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{error, info, warn};

use super::{StoreError, StoreResult, TodoStore, TxMode, UnitOfWork};
use crate::model::{Todo, TodoId};

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("migrations/0001_init.sql"),
}];

const TODO_SELECT_SQL: &str = "SELECT id, title, completed FROM todos";

/// Latest schema version known by this binary.
pub fn latest_schema_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Store over a single SQLite connection.
///
/// Units of work serialize on the connection mutex. Read-write units start
/// with `BEGIN IMMEDIATE` so the write lock is taken up front.
pub struct SqliteTodoStore {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for SqliteTodoStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteTodoStore").finish_non_exhaustive()
    }
}

impl SqliteTodoStore {
    /// Open (or create) a database file and apply pending migrations.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let started_at = Instant::now();
        info!(event = "db_open", mode = "file", path = %path.display(), "opening sqlite store");

        let conn = Connection::open(path).map_err(StoreError::from);
        Self::finish_open(conn, "file", started_at)
    }

    /// Open a private in-memory database; contents vanish with the store.
    pub fn open_in_memory() -> StoreResult<Self> {
        let started_at = Instant::now();
        info!(event = "db_open", mode = "memory", "opening sqlite store");

        let conn = Connection::open_in_memory().map_err(StoreError::from);
        Self::finish_open(conn, "memory", started_at)
    }

    fn finish_open(
        conn: StoreResult<Connection>,
        mode: &'static str,
        started_at: Instant,
    ) -> StoreResult<Self> {
        let result = conn.and_then(|mut conn| {
            bootstrap_connection(&mut conn)?;
            Ok(conn)
        });
        let duration_ms = started_at.elapsed().as_millis() as u64;
        match result {
            Ok(conn) => {
                info!(event = "db_open", mode, status = "ok", duration_ms, "sqlite store ready");
                Ok(Self {
                    conn: Mutex::new(conn),
                })
            }
            Err(err) => {
                error!(event = "db_open", mode, status = "error", duration_ms, error = %err, "failed to open sqlite store");
                Err(err)
            }
        }
    }

    /// Schema version recorded in the database.
    pub fn schema_version(&self) -> StoreResult<u32> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        current_user_version(&conn)
    }
}

fn bootstrap_connection(conn: &mut Connection) -> StoreResult<()> {
    conn.busy_timeout(Duration::from_secs(5))?;
    apply_migrations(conn)
}

fn apply_migrations(conn: &mut Connection) -> StoreResult<()> {
    let current_version = current_user_version(conn)?;
    let latest = latest_schema_version();

    if current_version > latest {
        return Err(StoreError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    if current_version == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
    }
    tx.commit()?;

    info!(from = current_version, to = latest, "applied sqlite migrations");
    Ok(())
}

fn current_user_version(conn: &Connection) -> StoreResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

fn parse_todo_row(row: &Row<'_>) -> rusqlite::Result<Todo> {
    Ok(Todo {
        id: Some(row.get(0)?),
        title: row.get(1)?,
        completed: row.get(2)?,
    })
}

impl TodoStore for SqliteTodoStore {
    fn begin(&self, mode: TxMode) -> StoreResult<Box<dyn UnitOfWork + '_>> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let begin_sql = match mode {
            TxMode::ReadOnly => "BEGIN DEFERRED;",
            TxMode::ReadWrite => "BEGIN IMMEDIATE;",
        };
        conn.execute_batch(begin_sql)?;
        Ok(Box::new(SqliteUnit {
            conn,
            mode,
            open: true,
        }))
    }
}

/// A transaction on the locked connection. Rolled back on drop unless
/// committed.
struct SqliteUnit<'a> {
    conn: MutexGuard<'a, Connection>,
    mode: TxMode,
    open: bool,
}

impl SqliteUnit<'_> {
    fn ensure_writable(&self) -> StoreResult<()> {
        match self.mode {
            TxMode::ReadWrite => Ok(()),
            TxMode::ReadOnly => Err(StoreError::ReadOnly),
        }
    }

    fn sequence_exhausted(&self) -> StoreResult<bool> {
        let seq: Option<TodoId> = self
            .conn
            .query_row(
                "SELECT seq FROM sqlite_sequence WHERE name = 'todos';",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(seq == Some(TodoId::MAX))
    }
}

fn is_full(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _) if failure.code == rusqlite::ErrorCode::DiskFull
    )
}

impl UnitOfWork for SqliteUnit<'_> {
    fn save(&mut self, mut todo: Todo) -> StoreResult<Todo> {
        self.ensure_writable()?;

        match todo.id {
            Some(id) => {
                self.conn.execute(
                    "INSERT INTO todos (id, title, completed) VALUES (?1, ?2, ?3)
                     ON CONFLICT(id) DO UPDATE SET
                        title = excluded.title,
                        completed = excluded.completed;",
                    params![id, todo.title.as_deref(), todo.completed],
                )?;
            }
            None => {
                let inserted = self.conn.execute(
                    "INSERT INTO todos (title, completed) VALUES (?1, ?2);",
                    params![todo.title.as_deref(), todo.completed],
                );
                match inserted {
                    Ok(_) => todo.id = Some(self.conn.last_insert_rowid()),
                    // AUTOINCREMENT reports SQLITE_FULL once the largest rowid was used.
                    Err(err) if is_full(&err) && self.sequence_exhausted()? => {
                        return Err(StoreError::IdSpaceExhausted);
                    }
                    Err(err) => return Err(err.into()),
                }
            }
        }

        Ok(todo)
    }

    fn find_by_id(&self, id: TodoId) -> StoreResult<Option<Todo>> {
        let todo = self
            .conn
            .query_row(
                &format!("{TODO_SELECT_SQL} WHERE id = ?1;"),
                params![id],
                parse_todo_row,
            )
            .optional()?;
        Ok(todo)
    }

    fn exists_by_id(&self, id: TodoId) -> StoreResult<bool> {
        let exists = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM todos WHERE id = ?1);",
            params![id],
            |row| row.get::<_, bool>(0),
        )?;
        Ok(exists)
    }

    fn find_all(&self) -> StoreResult<Vec<Todo>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TODO_SELECT_SQL} ORDER BY id ASC;"))?;
        let todos = stmt
            .query_map([], parse_todo_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(todos)
    }

    fn delete_by_id(&mut self, id: TodoId) -> StoreResult<()> {
        self.ensure_writable()?;
        self.conn
            .execute("DELETE FROM todos WHERE id = ?1;", params![id])?;
        Ok(())
    }

    fn commit(mut self: Box<Self>) -> StoreResult<()> {
        self.conn.execute_batch("COMMIT;")?;
        self.open = false;
        Ok(())
    }
}

impl Drop for SqliteUnit<'_> {
    fn drop(&mut self) {
        if self.open {
            if let Err(err) = self.conn.execute_batch("ROLLBACK;") {
                warn!(error = %err, "failed to roll back sqlite unit of work");
            }
        }
    }
}
