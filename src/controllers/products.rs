//! Products controller
//!
//! Catalog CRUD. Single-product reads go through the cache; writes
//! invalidate the cached entry.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::api::response::Output;
use crate::api::validation::{collect_failures, ValidationFailure};
use crate::api::AppState;
use crate::error::AppError;

/// TTL for cached single-product reads.
const PRODUCT_CACHE_TTL_SECONDS: u64 = 60;

fn product_cache_key(product_id: Uuid) -> String {
    format!("product:{product_id}")
}

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(length(min = 1, max = 64))]
    pub sku: String,
    pub price: Decimal,
    #[validate(range(min = 0))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProductRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 128))]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub quantity: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub sku: String,
    pub price: Decimal,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ListProductsQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

type ProductRow = (Uuid, String, String, Decimal, i32, DateTime<Utc>, DateTime<Utc>);

fn product_from_row(row: ProductRow) -> ProductResponse {
    let (id, name, sku, price, quantity, created_at, updated_at) = row;
    ProductResponse {
        id,
        name,
        sku,
        price,
        quantity,
        created_at,
        updated_at,
    }
}

/// Prices come in through the taxonomy, not a validator rule: `Decimal` has
/// no derive support, so the range check is explicit.
fn check_price(price: Decimal) -> Result<(), AppError> {
    if price < Decimal::ZERO {
        return Err(AppError::Validation(vec![ValidationFailure::new(
            "price",
            "range",
            serde_json::json!(price.to_string()),
        )]));
    }
    Ok(())
}

// =========================================================================
// GET /products
// =========================================================================

/// List products
#[utoipa::path(
    get,
    path = "/api/v1/products",
    tag = "products",
    responses(
        (status = 200, description = "Product page", body = Output<Vec<ProductResponse>>)
    )
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListProductsQuery>,
) -> Result<Json<Output<Vec<ProductResponse>>>, AppError> {
    let limit = query.limit.min(500);

    let rows: Vec<ProductRow> = sqlx::query_as(
        r#"
        SELECT id, name, sku, price, quantity, created_at, updated_at
        FROM products
        ORDER BY created_at DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(query.offset)
    .fetch_all(&state.pool)
    .await?;

    let products = rows.into_iter().map(product_from_row).collect();
    Ok(Json(Output::ok(products)))
}

// =========================================================================
// GET /products/:product_id
// =========================================================================

/// Get product by ID, read-through cached
#[utoipa::path(
    get,
    path = "/api/v1/products/{product_id}",
    tag = "products",
    params(("product_id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product found", body = Output<ProductResponse>),
        (status = 404, description = "Unknown product")
    )
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<Output<ProductResponse>>, AppError> {
    let cache_key = product_cache_key(product_id);
    if let Some(cached) = state.cache.get_json::<ProductResponse>(&cache_key).await {
        return Ok(Json(Output::ok(cached)));
    }

    let product = fetch_product(&state.pool, product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;

    state
        .cache
        .set_json(&cache_key, &product, PRODUCT_CACHE_TTL_SECONDS)
        .await;

    Ok(Json(Output::ok(product)))
}

async fn fetch_product(
    pool: &PgPool,
    product_id: Uuid,
) -> Result<Option<ProductResponse>, sqlx::Error> {
    let row: Option<ProductRow> = sqlx::query_as(
        r#"
        SELECT id, name, sku, price, quantity, created_at, updated_at
        FROM products
        WHERE id = $1
        "#,
    )
    .bind(product_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(product_from_row))
}

// =========================================================================
// POST /products
// =========================================================================

/// Create a new product
#[utoipa::path(
    post,
    path = "/api/v1/products",
    tag = "products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = Output<ProductResponse>),
        (status = 409, description = "SKU already in use"),
        (status = 422, description = "Invalid payload")
    )
)]
pub async fn create_product(
    State(state): State<AppState>,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Output<ProductResponse>>), AppError> {
    if let Err(errors) = request.validate() {
        return Err(AppError::Validation(collect_failures(&errors)));
    }
    check_price(request.price)?;

    let product_id = Uuid::new_v4();

    let row: Result<(DateTime<Utc>, DateTime<Utc>), sqlx::Error> = sqlx::query_as(
        r#"
        INSERT INTO products (id, name, sku, price, quantity, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
        RETURNING created_at, updated_at
        "#,
    )
    .bind(product_id)
    .bind(&request.name)
    .bind(&request.sku)
    .bind(request.price)
    .bind(request.quantity)
    .fetch_one(&state.pool)
    .await;

    let (created_at, updated_at) = match row {
        Ok(row) => row,
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if matches!(db_err.kind(), sqlx::error::ErrorKind::UniqueViolation) {
                    return Err(AppError::Conflict(format!(
                        "product sku '{}' already exists",
                        request.sku
                    )));
                }
            }
            return Err(e.into());
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(Output::ok(ProductResponse {
            id: product_id,
            name: request.name,
            sku: request.sku,
            price: request.price,
            quantity: request.quantity,
            created_at,
            updated_at,
        })),
    ))
}

// =========================================================================
// PATCH /products/:product_id
// =========================================================================

/// Update product fields
#[utoipa::path(
    patch,
    path = "/api/v1/products/{product_id}",
    tag = "products",
    params(("product_id" = Uuid, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = Output<ProductResponse>),
        (status = 404, description = "Unknown product"),
        (status = 422, description = "Invalid payload")
    )
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(request): Json<UpdateProductRequest>,
) -> Result<Json<Output<ProductResponse>>, AppError> {
    if let Err(errors) = request.validate() {
        return Err(AppError::Validation(collect_failures(&errors)));
    }
    if let Some(price) = request.price {
        check_price(price)?;
    }

    let row: Option<ProductRow> = sqlx::query_as(
        r#"
        UPDATE products
        SET name = COALESCE($2, name),
            price = COALESCE($3, price),
            quantity = COALESCE($4, quantity),
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, name, sku, price, quantity, created_at, updated_at
        "#,
    )
    .bind(product_id)
    .bind(&request.name)
    .bind(request.price)
    .bind(request.quantity)
    .fetch_optional(&state.pool)
    .await?;

    let product =
        row.map(product_from_row)
            .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;

    state.cache.delete(&product_cache_key(product_id)).await;

    Ok(Json(Output::ok(product)))
}

// =========================================================================
// DELETE /products/:product_id
// =========================================================================

/// Delete a product
#[utoipa::path(
    delete,
    path = "/api/v1/products/{product_id}",
    tag = "products",
    params(("product_id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Unknown product")
    )
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(product_id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("product {product_id}")));
    }

    state.cache.delete(&product_cache_key(product_id)).await;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_product_request_deserialize() {
        let json = r#"{
            "name": "Till roll 80mm",
            "sku": "TR-80",
            "price": "4.50",
            "quantity": 200
        }"#;

        let request: CreateProductRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.sku, "TR-80");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_empty_name_fails_validation() {
        let request = CreateProductRequest {
            name: String::new(),
            sku: "TR-80".to_string(),
            price: Decimal::ONE,
            quantity: 1,
        };
        let errors = request.validate().unwrap_err();
        let failures = collect_failures(&errors);
        assert_eq!(failures[0].field, "name");
    }

    #[test]
    fn test_negative_price_is_a_validation_error() {
        let err = check_price(Decimal::NEGATIVE_ONE).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref f) if f[0].field == "price"));
        assert!(check_price(Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_list_query_defaults() {
        let query: ListProductsQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.limit, 50);
        assert_eq!(query.offset, 0);
    }
}
