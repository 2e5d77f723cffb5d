//! # Application State
//!
//! Shared state for the Axum application.
//! Contains the record store, image store, token signer and configuration.

use mtg_cloudinary::CloudinaryImageStore;
use mtg_core::{
    BoxedImageStore, BoxedStore, MemoryImageStore, MemoryStore, SeedCatalog, TokenSigner,
};
use mtg_mongo::{MongoConfig, MongoConnection, MongoStore};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Where records are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// MongoDB (`MONGODB_CONN_STR`)
    Mongo,
    /// Process memory, seeded from `config/seed.toml`; for local development
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StoreBackend::Mongo),
            "memory" | "mem" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend: {}", other)),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Mongo => write!(f, "mongodb"),
            StoreBackend::Memory => write!(f, "memory"),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Record store backend
    pub store_backend: StoreBackend,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let store_backend = match std::env::var("STORE_BACKEND") {
            Ok(value) => value.parse().unwrap_or_else(|e| {
                tracing::warn!("{}, using mongodb", e);
                StoreBackend::Mongo
            }),
            Err(_) => StoreBackend::Mongo,
        };

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            store_backend,
        }
    }

    /// Address to bind to, `host:port`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            environment: "development".to_string(),
            store_backend: StoreBackend::Memory,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Users, products, sets and orders
    pub store: BoxedStore,
    /// Image host for product images and set heroes
    pub images: BoxedImageStore,
    /// Session token signer
    pub tokens: TokenSigner,
    /// Application config
    pub config: AppConfig,
    /// MongoDB handle, when that backend is in use (health reporting)
    pub mongo: Option<Arc<MongoConnection>>,
}

impl AppState {
    /// Assemble state from already-built parts (tests, embedding)
    pub fn new(
        store: BoxedStore,
        images: BoxedImageStore,
        tokens: TokenSigner,
        config: AppConfig,
    ) -> Self {
        Self {
            store,
            images,
            tokens,
            config,
            mongo: None,
        }
    }

    /// In-memory store and image store; nothing external is contacted
    pub fn in_memory(tokens: TokenSigner) -> Self {
        Self::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryImageStore::new()),
            tokens,
            AppConfig::default(),
        )
    }

    /// Build state from environment variables
    pub async fn from_env() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();

        let tokens = TokenSigner::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize token signer: {}", e))?;

        let images = image_store(&config)?;

        let state = match config.store_backend {
            StoreBackend::Mongo => {
                let mongo_config = MongoConfig::from_env()
                    .map_err(|e| anyhow::anyhow!("Failed to initialize MongoDB: {}", e))?;
                tracing::info!("MongoDB: {:?} (connects on first request)", mongo_config);

                let connection = Arc::new(MongoConnection::new(mongo_config));
                let store: BoxedStore = Arc::new(MongoStore::new(connection.clone()));
                Self::new(store, images, tokens, config).with_mongo(connection)
            }
            StoreBackend::Memory => {
                let store = MemoryStore::new();
                let seed = load_seed_catalog()?;
                if !seed.is_empty() {
                    seed.apply(&store)
                        .await
                        .map_err(|e| anyhow::anyhow!("Failed to apply seed catalog: {}", e))?;
                }
                Self::new(Arc::new(store), images, tokens, config)
            }
        };
        Ok(state)
    }

    /// Builder: attach the MongoDB handle for health reporting
    pub fn with_mongo(mut self, connection: Arc<MongoConnection>) -> Self {
        self.mongo = Some(connection);
        self
    }
}

/// Cloudinary when configured; in development the in-memory image store
/// stands in for it
fn image_store(config: &AppConfig) -> anyhow::Result<BoxedImageStore> {
    match CloudinaryImageStore::from_env() {
        Ok(store) => Ok(Arc::new(store)),
        Err(e) if config.is_production() => {
            Err(anyhow::anyhow!("Failed to initialize Cloudinary: {}", e))
        }
        Err(e) => {
            tracing::warn!("{}; uploads are kept in memory", e);
            Ok(Arc::new(MemoryImageStore::new()))
        }
    }
}

/// Load the seed catalog from the config directory
fn load_seed_catalog() -> anyhow::Result<SeedCatalog> {
    let config_paths = [
        "config/seed.toml",
        "../config/seed.toml",
        "../../config/seed.toml",
    ];

    for path in config_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            let catalog = SeedCatalog::from_toml(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path, e))?;
            tracing::info!(
                "Loaded seed catalog from {}: {} products, {} sets",
                path,
                catalog.products.len(),
                catalog.sets.len()
            );
            return Ok(catalog);
        }
    }

    tracing::warn!("No seed catalog found, starting with an empty store");
    Ok(SeedCatalog::default())
}
