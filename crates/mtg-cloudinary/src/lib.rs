//! # mtg-cloudinary
//!
//! Cloudinary image store for the mtg-store backend.
//!
//! Product images and featured-set heroes are uploaded with signed requests
//! to `mtg-store/<field>/`; replaced images are destroyed.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mtg_cloudinary::CloudinaryImageStore;
//! use mtg_core::{ImageStore, ImageUpload};
//!
//! let images = CloudinaryImageStore::from_env()?;
//! let uploaded = images
//!     .upload(ImageUpload::new("image", "mh3-box.png", "image/png", bytes))
//!     .await?;
//! println!("stored as {}", uploaded.public_id);
//! ```

pub mod config;
pub mod uploader;

// Re-exports
pub use config::CloudinaryConfig;
pub use uploader::{sign, CloudinaryImageStore};
