//! # Connection Handle
//!
//! One `MongoConnection` is owned by the process and shared through the
//! application state. It connects on first use, pings the server and runs
//! the schema bootstrap before reporting ready.
//!
//! ```text
//!   Absent ──connect ok──▶ Ready
//!     │                      ▲
//!     └──connect err──▶ Failed ──retry_after elapsed──┘ (or Failed again)
//! ```
//!
//! A failure is held for the retry window: calls inside it return the
//! recorded error without touching the network, and the first call after it
//! makes one fresh attempt. [`MongoConnection::reset`] clears the state
//! immediately.

use crate::config::MongoConfig;
use crate::schema;
use mongodb::bson::doc;
use mongodb::{Client, Database};
use mtg_core::{ShopError, ShopResult};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{error, info, instrument, warn};

const SERVICE: &str = "mongodb";

/// Default wait between a failed attempt and the next one
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
enum ConnectionState {
    Absent,
    Ready(Database),
    Failed { reason: String, at: Instant },
}

/// What a caller should do with the current state
enum Next {
    Use(Database),
    Refuse(String),
    Connect,
}

/// Lazily established, shared MongoDB connection
#[derive(Debug)]
pub struct MongoConnection {
    config: MongoConfig,
    retry_after: Duration,
    state: RwLock<ConnectionState>,
}

impl MongoConnection {
    /// Create a handle; nothing is contacted until first use
    pub fn new(config: MongoConfig) -> Self {
        Self {
            config,
            retry_after: DEFAULT_RETRY_AFTER,
            state: RwLock::new(ConnectionState::Absent),
        }
    }

    /// Set how long a failure is held before the next attempt
    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = retry_after;
        self
    }

    pub fn config(&self) -> &MongoConfig {
        &self.config
    }

    fn next(&self, state: &ConnectionState) -> Next {
        match state {
            ConnectionState::Ready(db) => Next::Use(db.clone()),
            ConnectionState::Failed { reason, at } if at.elapsed() < self.retry_after => {
                Next::Refuse(reason.clone())
            }
            ConnectionState::Failed { .. } | ConnectionState::Absent => Next::Connect,
        }
    }

    /// Ready database, connecting when absent or once a failure's retry
    /// window has passed
    pub async fn database(&self) -> ShopResult<Database> {
        match self.next(&*self.state.read().await) {
            Next::Use(db) => return Ok(db),
            Next::Refuse(reason) => return Err(not_connected(&reason)),
            Next::Connect => {}
        }

        let mut state = self.state.write().await;
        // another task may have connected or failed while we waited for the lock
        match self.next(&state) {
            Next::Use(db) => return Ok(db),
            Next::Refuse(reason) => return Err(not_connected(&reason)),
            Next::Connect => {}
        }

        if matches!(&*state, ConnectionState::Failed { .. }) {
            warn!("Retrying MongoDB connection");
        }

        match self.connect().await {
            Ok(db) => {
                *state = ConnectionState::Ready(db.clone());
                Ok(db)
            }
            Err(e) => {
                error!("MongoDB connection error: {}", e);
                *state = ConnectionState::Failed {
                    reason: e.to_string(),
                    at: Instant::now(),
                };
                Err(ShopError::upstream(SERVICE, e))
            }
        }
    }

    #[instrument(skip(self), fields(host = %self.config.redacted_host(), db = %self.config.database))]
    async fn connect(&self) -> mongodb::error::Result<Database> {
        let client = Client::with_uri_str(&self.config.conn_str).await?;
        let db = client.database(&self.config.database);
        db.run_command(doc! { "ping": 1 }).await?;
        schema::bootstrap(&db).await?;
        info!("Connection to DB successful");
        Ok(db)
    }

    /// Forget the current connection or failure; the next call reconnects
    pub async fn reset(&self) {
        *self.state.write().await = ConnectionState::Absent;
    }

    pub async fn is_ready(&self) -> bool {
        matches!(&*self.state.read().await, ConnectionState::Ready(_))
    }

    /// State name for health reporting: `absent`, `ready` or `failed`
    pub async fn status(&self) -> &'static str {
        match &*self.state.read().await {
            ConnectionState::Absent => "absent",
            ConnectionState::Ready(_) => "ready",
            ConnectionState::Failed { .. } => "failed",
        }
    }
}

fn not_connected(reason: &str) -> ShopError {
    ShopError::upstream(SERVICE, format!("not connected: {}", reason))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_starts_absent() {
        let conn = MongoConnection::new(MongoConfig::new("mongodb://localhost:27017"));
        assert_eq!(conn.status().await, "absent");
        assert!(!conn.is_ready().await);
    }

    #[tokio::test]
    async fn test_failure_is_held_until_reset() {
        // rejected while parsing, no network involved
        let conn = MongoConnection::new(MongoConfig::new("not-a-connection-string"));

        let err = conn.database().await.unwrap_err();
        assert!(matches!(err, ShopError::Upstream { .. }));
        assert_eq!(conn.status().await, "failed");

        let err = conn.database().await.unwrap_err();
        assert!(err.to_string().contains("not connected"));

        conn.reset().await;
        assert_eq!(conn.status().await, "absent");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_retried_after_window() {
        let conn = MongoConnection::new(MongoConfig::new("not-a-connection-string"))
            .with_retry_after(Duration::from_secs(5));

        let first = conn.database().await.unwrap_err();
        assert!(!first.to_string().contains("not connected"));

        tokio::time::advance(Duration::from_secs(2)).await;
        let held = conn.database().await.unwrap_err();
        assert!(held.to_string().contains("not connected"));

        // past the window the handle makes a fresh attempt
        tokio::time::advance(Duration::from_secs(4)).await;
        let retried = conn.database().await.unwrap_err();
        assert!(matches!(retried, ShopError::Upstream { .. }));
        assert!(!retried.to_string().contains("not connected"));
        assert_eq!(conn.status().await, "failed");

        // and that attempt opens a new window
        let held = conn.database().await.unwrap_err();
        assert!(held.to_string().contains("not connected"));
    }

    #[tokio::test]
    async fn test_zero_window_retries_every_call() {
        let conn = MongoConnection::new(MongoConfig::new("not-a-connection-string"))
            .with_retry_after(Duration::ZERO);

        for _ in 0..3 {
            let err = conn.database().await.unwrap_err();
            assert!(!err.to_string().contains("not connected"));
        }
    }
}
