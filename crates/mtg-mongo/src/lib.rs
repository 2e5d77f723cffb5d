//! # mtg-mongo
//!
//! MongoDB storage backend for the mtg-store backend.
//!
//! - **MongoConnection** - shared, lazily established connection; a failure is
//!   held for a short retry window, then the next call reconnects
//! - **MongoStore** - implements every `mtg_core::Store` trait
//! - **schema** - unique indexes (`users.email`, `featuredsets.code`) and the
//!   atomic order counter, bootstrapped on connect
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mtg_mongo::{MongoConfig, MongoConnection, MongoStore};
//! use std::sync::Arc;
//!
//! let connection = Arc::new(MongoConnection::new(MongoConfig::from_env()?));
//! let store = MongoStore::new(connection);
//!
//! // First call connects, pings and bootstraps the schema
//! let sets = store.find_sets(0, 10).await?;
//! ```

pub mod config;
pub mod connection;
pub mod documents;
pub mod schema;
pub mod store;

// Re-exports
pub use config::MongoConfig;
pub use connection::MongoConnection;
pub use store::MongoStore;
