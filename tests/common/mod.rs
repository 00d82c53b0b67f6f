//! Common test utilities

use std::sync::Arc;

use axum::Router;
use sqlx::PgPool;

use magazin_pos::api::{self, AppState};
use magazin_pos::cache::Cache;
use magazin_pos::config::{AdminCredential, Config};

/// Configuration with the two admin credentials the docs-gate tests expect.
pub fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/magazin_test".to_string(),
        database_max_connections: 1,
        redis_url: None,
        host: "127.0.0.1".to_string(),
        port: 0,
        log_filter: "off".to_string(),
        docs_credentials: magazin_pos::config::parse_docs_credentials("alice:s3cret,bob:hunter2")
            .expect("test credentials"),
    }
}

/// Full application router over a lazy pool and a disabled cache.
///
/// The pool never connects unless a handler actually queries it, so routing,
/// middleware, and validation behavior are testable without a database.
pub fn test_router() -> Router {
    let config = test_config();
    let state = AppState {
        pool: PgPool::connect_lazy(&config.database_url).expect("lazy pool"),
        cache: Cache::disabled(),
        config: Arc::new(config),
    };
    api::create_router(state)
}

/// The second credential, for tests that need the raw pair.
pub fn second_admin() -> AdminCredential {
    test_config().docs_credentials[1].clone()
}
