//! # Image Store Trait
//!
//! Uploaded product images and set heroes are relayed to an external image
//! host. Implementations: Cloudinary (`mtg-cloudinary`) and
//! [`MemoryImageStore`] for development and tests.

use crate::error::{ShopError, ShopResult};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Uploads of this size or larger are rejected (1 MiB)
pub const MAX_IMAGE_BYTES: usize = 1024 * 1024;

/// Folder on the image host; files go to `mtg-store/<field>/`
pub const ASSET_FOLDER_ROOT: &str = "mtg-store";

/// A file received from a multipart form
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Form field the file came from ("image", "hero")
    pub field: String,
    /// Original file name
    pub file_name: String,
    /// MIME type reported by the client
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(
        field: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            field: field.into(),
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Fail with `PayloadTooLarge` when the file is 1 MiB or more
    pub fn ensure_within_limit(&self) -> ShopResult<()> {
        if self.size() >= MAX_IMAGE_BYTES {
            return Err(ShopError::PayloadTooLarge {
                size: self.size(),
                limit: MAX_IMAGE_BYTES,
            });
        }
        Ok(())
    }

    /// File name without its extension
    pub fn public_id(&self) -> String {
        match self.file_name.rfind('.') {
            Some(dot) if dot > 0 => self.file_name[..dot].to_string(),
            _ => self.file_name.clone(),
        }
    }

    /// Destination folder on the image host
    pub fn asset_folder(&self) -> String {
        format!("{}/{}/", ASSET_FOLDER_ROOT, self.field)
    }
}

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    /// Reference stored on the product / set
    pub public_id: String,
    /// Delivery URL
    pub url: String,
}

/// Core trait for image host implementations.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Upload a file; implementations must call `ensure_within_limit` first
    async fn upload(&self, image: ImageUpload) -> ShopResult<UploadedImage>;

    /// Delete a previously uploaded file
    async fn delete(&self, public_id: &str) -> ShopResult<()>;

    /// Get the provider name (for logging).
    fn provider_name(&self) -> &'static str;
}

/// Type alias for a shared image store (dynamic dispatch)
pub type BoxedImageStore = Arc<dyn ImageStore>;

/// Keeps uploads in memory
#[derive(Debug, Default)]
pub struct MemoryImageStore {
    images: Mutex<Vec<(String, ImageUpload)>>,
}

impl MemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Public ids currently stored
    pub async fn public_ids(&self) -> Vec<String> {
        self.images
            .lock()
            .await
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn upload(&self, image: ImageUpload) -> ShopResult<UploadedImage> {
        image.ensure_within_limit()?;
        let public_id = format!("{}{}", image.asset_folder(), image.public_id());
        let url = format!("memory://{}", public_id);

        let mut images = self.images.lock().await;
        images.retain(|(id, _)| id != &public_id);
        images.push((public_id.clone(), image));
        Ok(UploadedImage { public_id, url })
    }

    async fn delete(&self, public_id: &str) -> ShopResult<()> {
        self.images.lock().await.retain(|(id, _)| id != public_id);
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}
