//! Response envelope
//!
//! The one JSON shape every handler returns: `{ "data": ..., "error": [...] }`.
//! `error` is an empty array on success, never null. The kind → HTTP status
//! mapping for classified failures lives here as well, next to the envelope
//! it feeds.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use utoipa::ToSchema;

use crate::error::AppError;

// =========================================================================
// Failure taxonomy
// =========================================================================

/// Failure category attached to every classified error.
///
/// The status mapping below is the only place a kind becomes an HTTP code;
/// handlers and helpers never hard-code statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Unauthorized,
    Internal,
}

impl ErrorKind {
    /// Central kind → status mapping.
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The numeric code carried inside [`ErrorItem`].
    pub fn code(self) -> u16 {
        self.status().as_u16()
    }
}

// =========================================================================
// Envelope types
// =========================================================================

/// One entry in the envelope's error sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorItem {
    pub message: String,
    pub code: u16,
}

impl ErrorItem {
    /// Direct construction from a message and a code.
    pub fn new(message: impl Into<String>, code: u16) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }

    /// Construct through the taxonomy; the code comes from the kind.
    pub fn from_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::new(message, kind.code())
    }
}

/// The uniform response envelope.
#[derive(Debug, Serialize, ToSchema)]
pub struct Output<T> {
    pub data: T,
    pub error: Vec<ErrorItem>,
}

impl<T> Output<T> {
    /// Wrap a payload and an error sequence verbatim.
    pub fn new(data: T, error: Vec<ErrorItem>) -> Self {
        Self { data, error }
    }

    /// Success envelope: payload plus an empty error sequence.
    pub fn ok(data: T) -> Self {
        Self {
            data,
            error: Vec::new(),
        }
    }
}

impl Output<serde_json::Value> {
    /// Failure envelope: `data` is null, errors carry the failure.
    pub fn from_errors(error: Vec<ErrorItem>) -> Self {
        Self {
            data: serde_json::Value::Null,
            error,
        }
    }
}

/// Map unclassified failures to internal-error items, preserving order.
///
/// Classified errors should go through [`ErrorItem::from_kind`] instead so
/// the taxonomy picks the status; this helper exists for error lists with no
/// better category.
pub fn internal_errors<I>(errors: I) -> Vec<ErrorItem>
where
    I: IntoIterator,
    I::Item: fmt::Display,
{
    errors
        .into_iter()
        .map(|e| ErrorItem::from_kind(ErrorKind::Internal, e.to_string()))
        .collect()
}

// =========================================================================
// Transactional error path
// =========================================================================

/// A database unit of work that can be aborted exactly once.
///
/// `abort` consumes the session, so the type system rules out a double abort
/// and a response written while the transaction is still open on this path.
pub trait TxSession: Send {
    type Error: fmt::Display + Send;

    fn abort(self) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

impl<'c> TxSession for sqlx::Transaction<'c, sqlx::Postgres> {
    type Error = sqlx::Error;

    fn abort(self) -> impl Future<Output = Result<(), sqlx::Error>> + Send {
        self.rollback()
    }
}

/// Abort the transaction, then respond with the original error.
///
/// The abort happens-before the response value exists, so no transaction
/// outlives the answer the client sees. An abort failure is logged and never
/// replaces the triggering error.
pub async fn abort_and_respond<S: TxSession>(session: S, err: AppError) -> Response {
    if let Err(abort_err) = session.abort().await {
        tracing::error!(error = %abort_err, "transaction abort failed");
    }
    err.into_response()
}

/// Respond with an error envelope when no transaction is open.
pub fn respond_error(err: AppError) -> Response {
    err.into_response()
}
