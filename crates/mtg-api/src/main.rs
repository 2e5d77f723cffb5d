//! # mtg-store
//!
//! Storefront backend for trading-card products.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export MONGODB_CONN_STR=mongodb://localhost:27017
//! export JWT_SECRET=...
//! export CLOUDINARY_CLOUD_NAME=...
//! export CLOUDINARY_API_KEY=...
//! export CLOUDINARY_API_SECRET=...
//!
//! # Run the server
//! mtg-store
//!
//! # Or without MongoDB, seeded from config/seed.toml
//! STORE_BACKEND=memory mtg-store
//! ```

use mtg_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    print_banner();

    let state = AppState::from_env().await?;

    let addr = state.config.bind_address();
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Store backend: {}", state.store.backend_name());
    info!("Image host: {}", state.images.provider_name());

    let app = routes::create_router(state);

    info!("mtg-store starting on http://{}", addr);

    if !is_prod {
        info!("Health: http://{}/health", addr);
        info!("Products: GET http://{}/api/products", addr);
        info!("Login: POST http://{}/api/user/login", addr);
    }

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
  mtg-store
  ━━━━━━━━━━━━━━━━━━━━━━━
  Trading-card storefront API
  Version: {}

"#,
        env!("CARGO_PKG_VERSION")
    );
}
