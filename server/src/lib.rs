//! Todo CRUD service: store, service layer and HTTP surface.
//!
//! # Overview
//! - `store`: persistence behind an explicit unit of work (memory or SQLite).
//! - `service`: create, partial update, list, fetch and delete, one unit of
//!   work per call.
//! - `web`: axum router mapping `/todos` onto the service.
//!
//! `app()` builds a router over a fresh in-memory store, which is what the
//! integration tests and the client crate's end-to-end test drive.

pub mod config;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;
pub mod web;

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

pub use config::{CliOverrides, ConfigError, ServerConfig, StorageBackend, StorageConfig};
pub use model::{SortOrder, Todo, TodoId};
pub use service::TodoService;
pub use store::{open_store, MemoryTodoStore, SqliteTodoStore, StoreError, TodoStore};
pub use web::{router, ApiError, AppState};

/// Router over a new, empty in-memory store.
pub fn app() -> Router {
    router(Arc::new(TodoService::new(Arc::new(MemoryTodoStore::new()))))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Serve `app` until `shutdown` resolves, then drain in-flight requests.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}
