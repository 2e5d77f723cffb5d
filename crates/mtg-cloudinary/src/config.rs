//! # Cloudinary Configuration
//!
//! Credentials are loaded from environment variables.

use mtg_core::ShopError;
use std::env;

const DEFAULT_API_BASE_URL: &str = "https://api.cloudinary.com";

/// Cloudinary API configuration
#[derive(Clone)]
pub struct CloudinaryConfig {
    /// Cloud name (account identifier in API paths)
    pub cloud_name: String,

    /// API key, sent with every signed request
    pub api_key: String,

    /// API secret, used only for signing
    pub api_secret: String,

    /// API base URL (for testing/mocking)
    pub api_base_url: String,
}

impl CloudinaryConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `CLOUDINARY_CLOUD_NAME`
    /// - `CLOUDINARY_API_KEY`
    /// - `CLOUDINARY_API_SECRET`
    pub fn from_env() -> Result<Self, ShopError> {
        dotenvy::dotenv().ok();

        let cloud_name = required("CLOUDINARY_CLOUD_NAME")?;
        let api_key = required("CLOUDINARY_API_KEY")?;
        let api_secret = required("CLOUDINARY_API_SECRET")?;

        Ok(Self::new(cloud_name, api_key, api_secret))
    }

    /// Create config with explicit values (for testing)
    pub fn new(
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Upload endpoint; `auto` lets the host detect the resource type
    pub fn upload_url(&self) -> String {
        format!("{}/v1_1/{}/auto/upload", self.api_base_url, self.cloud_name)
    }

    pub fn destroy_url(&self) -> String {
        format!("{}/v1_1/{}/image/destroy", self.api_base_url, self.cloud_name)
    }
}

fn required(name: &str) -> Result<String, ShopError> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ShopError::Configuration(format!("{} not set", name)))
}

impl std::fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}
