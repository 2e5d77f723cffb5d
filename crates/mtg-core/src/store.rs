//! # Storage Traits
//!
//! Data-access seams for the document store.
//! Implementations: MongoDB (`mtg-mongo`) and the in-memory store in this crate.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Store (super trait)                    │
//! │  ├── UserStore     find / create / update / address / order │
//! │  ├── ProductStore  find / find_many / count / create / ...  │
//! │  ├── SetStore      find / find_many / count / create / ...  │
//! │  └── OrderStore    find / find_many / count / create / next │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!                ┌───────────┴───────────┐
//!        ┌───────┴───────┐       ┌───────┴───────┐
//!        │  MongoStore   │       │  MemoryStore  │
//!        └───────────────┘       └───────────────┘
//! ```
//!
//! Uniqueness (user email, set code) is enforced by the implementation at
//! insert time and reported as `ShopError::Duplicate`. Order numbers come from
//! an atomic counter, never from a separate read-then-write.

use crate::error::ShopResult;
use crate::featured_set::{FeaturedSet, NewFeaturedSet, SetUpdate};
use crate::order::{NewOrder, Order};
use crate::product::{NewProduct, Product, ProductFilter, ProductUpdate};
use crate::user::{NewUser, User, UserUpdate};
use async_trait::async_trait;
use std::sync::Arc;

/// User records
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_id(&self, id: &str) -> ShopResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> ShopResult<Option<User>>;

    /// Insert a user; `Duplicate` if the email is taken
    async fn create_user(&self, user: NewUser) -> ShopResult<User>;

    /// Apply a partial update; `NotFound` if no user has this id
    async fn update_user_by_id(&self, id: &str, update: UserUpdate) -> ShopResult<()>;

    /// Write `user.addresses` and `user.default_address` if the stored
    /// address version still equals `user.address_version`, bumping it.
    /// `Ok(false)` when another write landed since `user` was read.
    async fn replace_address_book(&self, user: &User) -> ShopResult<bool>;

    /// Append an order id to the user's order list
    async fn push_user_order(&self, user_id: &str, order_id: &str) -> ShopResult<()>;
}

/// Catalog products
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn find_product_by_id(&self, id: &str) -> ShopResult<Option<Product>>;

    async fn find_products(
        &self,
        filter: &ProductFilter,
        skip: u64,
        limit: u64,
    ) -> ShopResult<Vec<Product>>;

    async fn count_products(&self, filter: &ProductFilter) -> ShopResult<u64>;

    /// Products with the given ids; unknown ids are skipped
    async fn find_products_by_ids(&self, ids: &[String]) -> ShopResult<Vec<Product>>;

    async fn create_product(&self, product: NewProduct) -> ShopResult<Product>;

    /// Apply a partial update and return the updated record
    async fn update_product_by_id(&self, id: &str, update: ProductUpdate) -> ShopResult<Product>;
}

/// Featured sets, listed newest release first
#[async_trait]
pub trait SetStore: Send + Sync {
    async fn find_set_by_id(&self, id: &str) -> ShopResult<Option<FeaturedSet>>;

    async fn find_set_by_code(&self, code: &str) -> ShopResult<Option<FeaturedSet>>;

    async fn find_sets(&self, skip: u64, limit: u64) -> ShopResult<Vec<FeaturedSet>>;

    async fn count_sets(&self) -> ShopResult<u64>;

    /// Insert a set; `Duplicate` if the code is taken
    async fn create_set(&self, set: NewFeaturedSet) -> ShopResult<FeaturedSet>;

    async fn update_set_by_id(&self, id: &str, update: SetUpdate) -> ShopResult<FeaturedSet>;
}

/// Orders, listed newest date first
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn find_order_by_id(&self, id: &str) -> ShopResult<Option<Order>>;

    async fn find_orders_for_user(
        &self,
        user_id: &str,
        skip: u64,
        limit: u64,
    ) -> ShopResult<Vec<Order>>;

    async fn count_orders_for_user(&self, user_id: &str) -> ShopResult<u64>;

    /// Ids of every order owned by the user
    async fn find_order_ids_for_user(&self, user_id: &str) -> ShopResult<Vec<String>>;

    async fn create_order(&self, order: NewOrder) -> ShopResult<Order>;

    /// Atomically allocate the next order number (1 for the first order)
    async fn next_order_number(&self) -> ShopResult<u64>;
}

/// Every entity store behind one object
pub trait Store: UserStore + ProductStore + SetStore + OrderStore {
    /// Backend name (for logging)
    fn backend_name(&self) -> &'static str;
}

/// Type alias for a shared store (dynamic dispatch)
pub type BoxedStore = Arc<dyn Store>;
