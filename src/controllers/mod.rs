//! Domain controllers
//!
//! Route-to-handler binding for the POS domains.

use axum::routing::{get, post};
use axum::Router;

use crate::api::AppState;

pub mod journals;
pub mod products;

/// Bind the domain controllers to their routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/products/:product_id",
            get(products::get_product)
                .patch(products::update_product)
                .delete(products::delete_product),
        )
        .route("/journals", post(journals::create_journal))
        .route("/journals/:journal_id", get(journals::get_journal))
        .route(
            "/branches/:branch_id/journals",
            get(journals::list_branch_journals),
        )
}
