//! OpenAPI document
//!
//! Aggregates the controller paths and schemas; served by the Swagger UI
//! under the gated `/docs` subtree.

use utoipa::OpenApi;

use crate::api::response::ErrorItem;
use crate::api::validation::ValidationFailure;
use crate::controllers::{journals, products};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Magazin POS/ERP API",
        version = "0.1.0",
        description = "Point-of-sale and back-office API for Magazin stores"
    ),
    paths(
        // health
        crate::api::routes::health_check,
        // products
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        // finance
        journals::create_journal,
        journals::get_journal,
        journals::list_branch_journals,
    ),
    components(schemas(
        ErrorItem,
        ValidationFailure,
    )),
    tags(
        (name = "health", description = "Liveness probes"),
        (name = "products", description = "Product catalog"),
        (name = "finance", description = "Branch finance journals"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_contains_all_routes() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();

        assert!(paths.contains(&"/health"));
        assert!(paths.contains(&"/api/v1/products"));
        assert!(paths.contains(&"/api/v1/products/{product_id}"));
        assert!(paths.contains(&"/api/v1/journals"));
        assert!(paths.contains(&"/api/v1/branches/{branch_id}/journals"));
    }
}
