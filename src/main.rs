//! magazin_pos - Magazin POS/ERP Backend API
//!
//! HTTP backend for Magazin stores: product catalog, branch finance
//! journals, and admin-gated API documentation.

use magazin_pos::App;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let app = App::new().await?;
    app.run().await
}
