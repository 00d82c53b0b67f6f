//! API module
//!
//! HTTP API state, middleware, routes, and the response envelope.

use std::sync::Arc;

use sqlx::PgPool;

use crate::cache::Cache;
use crate::config::Config;

pub mod middleware;
pub mod openapi;
pub mod response;
pub mod routes;
pub mod validation;

pub use routes::create_router;

/// Shared state cloned into every request task.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub cache: Cache,
    pub config: Arc<Config>,
}
