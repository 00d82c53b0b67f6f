//! API Middleware
//!
//! Per-request tracing span, structured request logging, and the basic-auth
//! gate on the documentation subtree.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::prelude::{Engine as _, BASE64_STANDARD};
use opentelemetry::global;
use opentelemetry::propagation::Extractor;
use subtle::ConstantTimeEq;
use tracing::Instrument;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use super::AppState;
use crate::config::AdminCredential;
use crate::error::AppError;

// =========================================================================
// Tracing span wrapper
// =========================================================================

/// Adapts [`HeaderMap`] to the propagator extraction API.
struct HeaderExtractor<'a>(&'a HeaderMap);

impl<'a> Extractor for HeaderExtractor<'a> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|name| name.as_str()).collect()
    }
}

/// Open a span per request and link it to any inbound trace context.
///
/// Must be the outermost middleware: logging and all downstream handler work
/// are attributed to this span.
pub async fn trace_middleware(request: Request<Body>, next: Next) -> Response {
    let parent_context = global::get_text_map_propagator(|propagator| {
        propagator.extract(&HeaderExtractor(request.headers()))
    });

    let span = tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        status = tracing::field::Empty,
    );
    span.set_parent(parent_context);

    let response = next.run(request).instrument(span.clone()).await;

    span.record("status", response.status().as_u16());
    response
}

// =========================================================================
// Request logging
// =========================================================================

/// Headers that should be masked in logs
const SENSITIVE_HEADERS: &[&str] = &["authorization", "cookie", "set-cookie"];

/// Mask sensitive headers for logging
pub fn mask_headers_for_logging(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let name_lower = name.as_str().to_lowercase();
            let masked_value = if SENSITIVE_HEADERS.contains(&name_lower.as_str()) {
                "[REDACTED]".to_string()
            } else {
                value.to_str().unwrap_or("[invalid utf8]").to_string()
            };
            (name.to_string(), masked_value)
        })
        .collect()
}

/// Request logging middleware
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let version = request.version();
    let headers = mask_headers_for_logging(request.headers());

    let start = std::time::Instant::now();

    tracing::info!(
        method = %method,
        uri = %uri,
        version = ?version,
        headers = ?headers,
        "Incoming request"
    );

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %status,
        duration_ms = %duration.as_millis(),
        "Request completed"
    );

    response
}

// =========================================================================
// Docs basic-auth gate
// =========================================================================

/// Gate the documentation subtree behind HTTP basic auth.
///
/// Only the two configured admin credentials pass; everything else is
/// rejected before the documentation handler runs.
pub async fn docs_auth_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Basic "))
        .and_then(decode_basic)
        .map(|(user, pass)| credentials_match(&user, &pass, &state.config.docs_credentials))
        .unwrap_or(false);

    if !authorized {
        return unauthorized_response();
    }

    next.run(request).await
}

/// Decode the base64 `user:password` payload of a Basic authorization header.
fn decode_basic(encoded: &str) -> Option<(String, String)> {
    let decoded = BASE64_STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

/// Constant-time comparison against the configured credential set.
fn credentials_match(username: &str, password: &str, credentials: &[AdminCredential]) -> bool {
    credentials.iter().any(|credential| {
        let user_ok = credential.username.as_bytes().ct_eq(username.as_bytes());
        let pass_ok = credential.password.as_bytes().ct_eq(password.as_bytes());
        bool::from(user_ok & pass_ok)
    })
}

fn unauthorized_response() -> Response {
    let mut response =
        AppError::Unauthorized("documentation requires admin credentials".to_string())
            .into_response();
    response.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"Restricted\""),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{middleware, Router};
    use base64::prelude::{Engine as _, BASE64_STANDARD};
    use sqlx::PgPool;
    use std::sync::Arc;
    use tower::util::ServiceExt;

    use crate::cache::Cache;
    use crate::config::Config;

    #[test]
    fn test_mask_headers_for_logging() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", "application/json".parse().unwrap());
        headers.insert("authorization", "Basic YWxpY2U6czNjcmV0".parse().unwrap());

        let masked = mask_headers_for_logging(&headers);

        let auth = masked.iter().find(|(k, _)| k == "authorization");
        let content_type = masked.iter().find(|(k, _)| k == "content-type");

        assert_eq!(auth.unwrap().1, "[REDACTED]");
        assert_eq!(content_type.unwrap().1, "application/json");
    }

    #[test]
    fn test_sensitive_headers_list() {
        assert!(SENSITIVE_HEADERS.contains(&"authorization"));
        assert!(!SENSITIVE_HEADERS.contains(&"content-type"));
    }

    #[test]
    fn test_decode_basic() {
        let encoded = BASE64_STANDARD.encode("alice:s3cret");
        assert_eq!(
            decode_basic(&encoded),
            Some(("alice".to_string(), "s3cret".to_string()))
        );
        assert_eq!(decode_basic("not-base64!!"), None);
    }

    #[test]
    fn test_credentials_match() {
        let credentials = vec![
            AdminCredential {
                username: "alice".to_string(),
                password: "s3cret".to_string(),
            },
            AdminCredential {
                username: "bob".to_string(),
                password: "hunter2".to_string(),
            },
        ];

        assert!(credentials_match("alice", "s3cret", &credentials));
        assert!(credentials_match("bob", "hunter2", &credentials));
        assert!(!credentials_match("alice", "hunter2", &credentials));
        assert!(!credentials_match("mallory", "s3cret", &credentials));
        assert!(!credentials_match("", "", &credentials));
    }

    fn test_state() -> AppState {
        let config = Config {
            database_url: "postgres://localhost/magazin_test".to_string(),
            database_max_connections: 1,
            redis_url: None,
            host: "127.0.0.1".to_string(),
            port: 0,
            log_filter: "off".to_string(),
            docs_credentials: vec![
                AdminCredential {
                    username: "alice".to_string(),
                    password: "s3cret".to_string(),
                },
                AdminCredential {
                    username: "bob".to_string(),
                    password: "hunter2".to_string(),
                },
            ],
        };
        AppState {
            pool: PgPool::connect_lazy(&config.database_url).unwrap(),
            cache: Cache::disabled(),
            config: Arc::new(config),
        }
    }

    fn gated_router() -> Router {
        let state = test_state();
        Router::new()
            .route("/docs/index.html", get(|| async { "docs" }))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                docs_auth_middleware,
            ))
            .with_state(state)
    }

    fn docs_request(auth: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri("/docs/index.html");
        if let Some(auth) = auth {
            builder = builder.header("Authorization", auth);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_docs_without_credentials_is_rejected() {
        let response = gated_router().oneshot(docs_request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Basic realm=\"Restricted\""
        );
    }

    #[tokio::test]
    async fn test_docs_with_wrong_password_is_rejected() {
        let auth = format!("Basic {}", BASE64_STANDARD.encode("alice:wrong"));
        let response = gated_router()
            .oneshot(docs_request(Some(&auth)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_docs_accepts_both_configured_pairs() {
        for pair in ["alice:s3cret", "bob:hunter2"] {
            let auth = format!("Basic {}", BASE64_STANDARD.encode(pair));
            let response = gated_router()
                .oneshot(docs_request(Some(&auth)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "pair {pair} rejected");
        }
    }
}
