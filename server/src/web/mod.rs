//! HTTP surface for the todo service.
//!
//! | Method | Path          | Success                         |
//! |--------|---------------|---------------------------------|
//! | POST   | `/todos`      | 201, `Location: /todos/{id}`    |
//! | GET    | `/todos`      | 200, optional repeated `?sort=` |
//! | GET    | `/todos/{id}` | 200                             |
//! | PUT    | `/todos/{id}` | 200                             |
//! | PATCH  | `/todos/{id}` | 200, merge semantics            |
//! | DELETE | `/todos/{id}` | 204                             |

mod error;
mod extract;
mod handlers;
mod headers;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::service::TodoService;

pub use error::{ApiError, ErrorKey, Problem};
pub use extract::{ApiJson, ApiPath, ListParams};
pub use headers::{ALERT_HEADER, APPLICATION_NAME, ENTITY_NAME, ERROR_HEADER, PARAMS_HEADER};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TodoService>,
}

pub fn router(service: Arc<TodoService>) -> Router {
    Router::new()
        .route(
            "/todos",
            get(handlers::list_todos).post(handlers::create_todo),
        )
        .route(
            "/todos/{id}",
            get(handlers::get_todo)
                .put(handlers::update_todo)
                .patch(handlers::partial_update_todo)
                .delete(handlers::delete_todo),
        )
        .with_state(AppState { service })
        .layer(TraceLayer::new_for_http())
}
