//! # mtg-core
//!
//! Core types, storage traits and workflows for the mtg-store backend.
//!
//! This crate provides:
//! - `Product`, `FeaturedSet`, `User` and `Order` domain types
//! - `Store` traits for the document database, plus `MemoryStore`
//! - `ImageStore` trait for the image host, plus `MemoryImageStore`
//! - `TokenSigner` and password hashing for authentication
//! - account, catalog and checkout workflows over `&dyn Store`
//! - `ShopError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use mtg_core::{checkout, Identity, MemoryStore, OrderDraft, TokenSigner, TokenTtl};
//!
//! let store = MemoryStore::new();
//! let signer = TokenSigner::new("secret");
//!
//! // Token for a logged-in user
//! let identity = Identity::new(user_id, "alice@example.com", false);
//! let token = signer.issue(&identity, TokenTtl::Expiring)?;
//!
//! // Place an order on their behalf
//! let order = checkout::place_order(&store, &identity, draft).await?;
//! println!("Order #{} placed", order.number);
//! ```

pub mod account;
pub mod auth;
pub mod catalog;
pub mod checkout;
pub mod error;
pub mod featured_set;
pub mod image;
pub mod memory;
pub mod order;
pub mod pagination;
pub mod password;
pub mod product;
pub mod seed;
pub mod store;
pub mod user;

// Re-exports for convenience
pub use account::{Credentials, Registration};
pub use auth::{token_from_header, Identity, TokenSigner, TokenTtl, AUTH_SCHEME};
pub use error::{ShopError, ShopResult};
pub use featured_set::{FeaturedSet, NewFeaturedSet, SetUpdate};
pub use image::{
    BoxedImageStore, ImageStore, ImageUpload, MemoryImageStore, UploadedImage, MAX_IMAGE_BYTES,
};
pub use memory::MemoryStore;
pub use order::{LineItem, NewOrder, Order, OrderDraft};
pub use pagination::{Page, PageQuery, Pagination};
pub use product::{NewProduct, Product, ProductFilter, ProductUpdate};
pub use seed::{SeedCatalog, SeedReport};
pub use store::{BoxedStore, OrderStore, ProductStore, SetStore, Store, UserStore};
pub use user::{Address, NewUser, PostalAddress, User, UserProfile, UserUpdate};
