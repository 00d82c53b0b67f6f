//! Branch finance journals
//!
//! Journal creation moves the branch balance and records the entry in one
//! database transaction; every failure inside the unit of work goes through
//! the abort-then-respond path.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::api::response::{abort_and_respond, respond_error, Output};
use crate::api::validation::{collect_failures, ValidationFailure};
use crate::api::AppState;
use crate::error::AppError;

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    Income,
    Expense,
}

impl EntryType {
    fn as_str(self) -> &'static str {
        match self {
            EntryType::Income => "income",
            EntryType::Expense => "expense",
        }
    }

    /// The delta this entry applies to the branch balance.
    fn signed(self, amount: Decimal) -> Decimal {
        match self {
            EntryType::Income => amount,
            EntryType::Expense => -amount,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateJournalRequest {
    pub branch_id: Uuid,
    pub entry_type: EntryType,
    /// Positive amount; the direction comes from `entry_type`
    pub amount: Decimal,
    #[validate(length(min = 1, max = 512))]
    pub description: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct JournalResponse {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub entry_type: EntryType,
    pub amount: Decimal,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

// =========================================================================
// POST /journals
// =========================================================================

/// Record a journal entry against a branch
#[utoipa::path(
    post,
    path = "/api/v1/journals",
    tag = "finance",
    request_body = CreateJournalRequest,
    responses(
        (status = 201, description = "Journal entry recorded", body = Output<JournalResponse>),
        (status = 404, description = "Unknown branch"),
        (status = 422, description = "Invalid payload")
    )
)]
pub async fn create_journal(
    State(state): State<AppState>,
    Json(request): Json<CreateJournalRequest>,
) -> Response {
    if let Err(errors) = request.validate() {
        return respond_error(AppError::Validation(collect_failures(&errors)));
    }
    if request.amount <= Decimal::ZERO {
        return respond_error(AppError::Validation(vec![ValidationFailure::new(
            "amount",
            "range",
            serde_json::json!(request.amount.to_string()),
        )]));
    }

    let mut tx = match state.pool.begin().await {
        Ok(tx) => tx,
        Err(e) => return respond_error(e.into()),
    };

    // Move the branch balance first; zero rows means the branch is unknown.
    let updated = match sqlx::query("UPDATE branches SET balance = balance + $1 WHERE id = $2")
        .bind(request.entry_type.signed(request.amount))
        .bind(request.branch_id)
        .execute(&mut *tx)
        .await
    {
        Ok(result) => result.rows_affected(),
        Err(e) => return abort_and_respond(tx, e.into()).await,
    };

    if updated == 0 {
        return abort_and_respond(tx, AppError::NotFound(format!("branch {}", request.branch_id)))
            .await;
    }

    let journal_id = Uuid::new_v4();
    let created_at: DateTime<Utc> = match sqlx::query_scalar(
        r#"
        INSERT INTO journals (id, branch_id, entry_type, amount, description, created_at)
        VALUES ($1, $2, $3, $4, $5, NOW())
        RETURNING created_at
        "#,
    )
    .bind(journal_id)
    .bind(request.branch_id)
    .bind(request.entry_type.as_str())
    .bind(request.amount)
    .bind(&request.description)
    .fetch_one(&mut *tx)
    .await
    {
        Ok(created_at) => created_at,
        Err(e) => return abort_and_respond(tx, e.into()).await,
    };

    if let Err(e) = tx.commit().await {
        return respond_error(e.into());
    }

    (
        StatusCode::CREATED,
        Json(Output::ok(JournalResponse {
            id: journal_id,
            branch_id: request.branch_id,
            entry_type: request.entry_type,
            amount: request.amount,
            description: request.description,
            created_at,
        })),
    )
        .into_response()
}

// =========================================================================
// GET /journals/:journal_id
// =========================================================================

type JournalRow = (Uuid, Uuid, String, Decimal, String, DateTime<Utc>);

fn journal_from_row(row: JournalRow) -> JournalResponse {
    let (id, branch_id, entry_type, amount, description, created_at) = row;
    let entry_type = match entry_type.as_str() {
        "expense" => EntryType::Expense,
        _ => EntryType::Income,
    };
    JournalResponse {
        id,
        branch_id,
        entry_type,
        amount,
        description,
        created_at,
    }
}

/// Get a journal entry by ID
#[utoipa::path(
    get,
    path = "/api/v1/journals/{journal_id}",
    tag = "finance",
    params(("journal_id" = Uuid, Path, description = "Journal entry ID")),
    responses(
        (status = 200, description = "Journal entry found", body = Output<JournalResponse>),
        (status = 404, description = "Unknown journal entry")
    )
)]
pub async fn get_journal(
    State(state): State<AppState>,
    Path(journal_id): Path<Uuid>,
) -> Result<Json<Output<JournalResponse>>, AppError> {
    let row: Option<JournalRow> = sqlx::query_as(
        r#"
        SELECT id, branch_id, entry_type, amount, description, created_at
        FROM journals
        WHERE id = $1
        "#,
    )
    .bind(journal_id)
    .fetch_optional(&state.pool)
    .await?;

    let journal = row
        .map(journal_from_row)
        .ok_or_else(|| AppError::NotFound(format!("journal {journal_id}")))?;

    Ok(Json(Output::ok(journal)))
}

// =========================================================================
// GET /branches/:branch_id/journals
// =========================================================================

/// List a branch's journal entries, newest first
#[utoipa::path(
    get,
    path = "/api/v1/branches/{branch_id}/journals",
    tag = "finance",
    params(("branch_id" = Uuid, Path, description = "Branch ID")),
    responses(
        (status = 200, description = "Journal entries", body = Output<Vec<JournalResponse>>),
        (status = 404, description = "Unknown branch")
    )
)]
pub async fn list_branch_journals(
    State(state): State<AppState>,
    Path(branch_id): Path<Uuid>,
) -> Result<Json<Output<Vec<JournalResponse>>>, AppError> {
    let branch_exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM branches WHERE id = $1)")
            .bind(branch_id)
            .fetch_one(&state.pool)
            .await?;

    if !branch_exists {
        return Err(AppError::NotFound(format!("branch {branch_id}")));
    }

    let rows: Vec<JournalRow> = sqlx::query_as(
        r#"
        SELECT id, branch_id, entry_type, amount, description, created_at
        FROM journals
        WHERE branch_id = $1
        ORDER BY created_at DESC
        LIMIT 100
        "#,
    )
    .bind(branch_id)
    .fetch_all(&state.pool)
    .await?;

    let journals = rows.into_iter().map(journal_from_row).collect();
    Ok(Json(Output::ok(journals)))
}
