//! # In-Memory Store
//!
//! `Store` implementation backed by a single lock-protected document set.
//! Used for local development (`STORE_BACKEND=memory`) and tests. It applies
//! the same uniqueness and ordering rules as the MongoDB store.

use crate::error::{ShopError, ShopResult};
use crate::featured_set::{FeaturedSet, NewFeaturedSet, SetUpdate};
use crate::order::{NewOrder, Order};
use crate::product::{NewProduct, Product, ProductFilter, ProductUpdate};
use crate::store::{OrderStore, ProductStore, SetStore, Store, UserStore};
use crate::user::{NewUser, User, UserUpdate};
use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
struct Collections {
    users: Vec<User>,
    products: Vec<Product>,
    sets: Vec<FeaturedSet>,
    orders: Vec<Order>,
    /// Last allocated order number
    order_counter: u64,
}

/// In-memory document store
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn window<T: Clone>(items: impl Iterator<Item = T>, skip: u64, limit: u64) -> Vec<T> {
    let skip = usize::try_from(skip).unwrap_or(usize::MAX);
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
    items.skip(skip).take(limit).collect()
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_id(&self, id: &str) -> ShopResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> ShopResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, user: NewUser) -> ShopResult<User> {
        let mut inner = self.inner.write().await;
        if inner.users.iter().any(|u| u.email == user.email) {
            return Err(ShopError::Duplicate {
                entity: "user",
                field: "email",
                value: user.email,
            });
        }
        let user = user.into_user(new_id());
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn update_user_by_id(&self, id: &str, update: UserUpdate) -> ShopResult<()> {
        let mut inner = self.inner.write().await;
        let user = inner
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| ShopError::not_found("user", id))?;
        update.apply(user);
        Ok(())
    }

    async fn replace_address_book(&self, user: &User) -> ShopResult<bool> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or_else(|| ShopError::not_found("user", &user.id))?;
        if stored.address_version != user.address_version {
            return Ok(false);
        }
        stored.addresses = user.addresses.clone();
        stored.default_address = user.default_address;
        stored.address_version += 1;
        Ok(true)
    }

    async fn push_user_order(&self, user_id: &str, order_id: &str) -> ShopResult<()> {
        let mut inner = self.inner.write().await;
        let user = inner
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| ShopError::not_found("user", user_id))?;
        if !user.orders.iter().any(|id| id == order_id) {
            user.orders.push(order_id.to_string());
        }
        Ok(())
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn find_product_by_id(&self, id: &str) -> ShopResult<Option<Product>> {
        let inner = self.inner.read().await;
        Ok(inner.products.iter().find(|p| p.id == id).cloned())
    }

    async fn find_products(
        &self,
        filter: &ProductFilter,
        skip: u64,
        limit: u64,
    ) -> ShopResult<Vec<Product>> {
        let inner = self.inner.read().await;
        Ok(window(
            inner.products.iter().filter(|p| filter.matches(p)).cloned(),
            skip,
            limit,
        ))
    }

    async fn count_products(&self, filter: &ProductFilter) -> ShopResult<u64> {
        let inner = self.inner.read().await;
        Ok(inner.products.iter().filter(|p| filter.matches(p)).count() as u64)
    }

    async fn find_products_by_ids(&self, ids: &[String]) -> ShopResult<Vec<Product>> {
        let inner = self.inner.read().await;
        Ok(inner
            .products
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn create_product(&self, product: NewProduct) -> ShopResult<Product> {
        let mut inner = self.inner.write().await;
        let product = product.into_product(new_id());
        inner.products.push(product.clone());
        Ok(product)
    }

    async fn update_product_by_id(&self, id: &str, update: ProductUpdate) -> ShopResult<Product> {
        let mut inner = self.inner.write().await;
        let product = inner
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| ShopError::not_found("product", id))?;
        update.apply(product);
        Ok(product.clone())
    }
}

#[async_trait]
impl SetStore for MemoryStore {
    async fn find_set_by_id(&self, id: &str) -> ShopResult<Option<FeaturedSet>> {
        let inner = self.inner.read().await;
        Ok(inner.sets.iter().find(|s| s.id == id).cloned())
    }

    async fn find_set_by_code(&self, code: &str) -> ShopResult<Option<FeaturedSet>> {
        let inner = self.inner.read().await;
        Ok(inner.sets.iter().find(|s| s.code == code).cloned())
    }

    async fn find_sets(&self, skip: u64, limit: u64) -> ShopResult<Vec<FeaturedSet>> {
        let inner = self.inner.read().await;
        let mut sets = inner.sets.clone();
        // newest first; undated sets last
        sets.sort_by(|a, b| b.released_at.cmp(&a.released_at));
        Ok(window(sets.into_iter(), skip, limit))
    }

    async fn count_sets(&self) -> ShopResult<u64> {
        let inner = self.inner.read().await;
        Ok(inner.sets.len() as u64)
    }

    async fn create_set(&self, set: NewFeaturedSet) -> ShopResult<FeaturedSet> {
        let mut inner = self.inner.write().await;
        if inner.sets.iter().any(|s| s.code == set.code) {
            return Err(ShopError::Duplicate {
                entity: "set",
                field: "code",
                value: set.code,
            });
        }
        let set = set.into_set(new_id());
        inner.sets.push(set.clone());
        Ok(set)
    }

    async fn update_set_by_id(&self, id: &str, update: SetUpdate) -> ShopResult<FeaturedSet> {
        let mut inner = self.inner.write().await;
        if let Some(code) = &update.code {
            if inner.sets.iter().any(|s| &s.code == code && s.id != id) {
                return Err(ShopError::Duplicate {
                    entity: "set",
                    field: "code",
                    value: code.clone(),
                });
            }
        }
        let set = inner
            .sets
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| ShopError::not_found("set", id))?;
        update.apply(set);
        Ok(set.clone())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn find_order_by_id(&self, id: &str) -> ShopResult<Option<Order>> {
        let inner = self.inner.read().await;
        Ok(inner.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn find_orders_for_user(
        &self,
        user_id: &str,
        skip: u64,
        limit: u64,
    ) -> ShopResult<Vec<Order>> {
        let inner = self.inner.read().await;
        let mut orders: Vec<Order> = inner
            .orders
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(window(orders.into_iter(), skip, limit))
    }

    async fn count_orders_for_user(&self, user_id: &str) -> ShopResult<u64> {
        let inner = self.inner.read().await;
        Ok(inner.orders.iter().filter(|o| o.user_id == user_id).count() as u64)
    }

    async fn find_order_ids_for_user(&self, user_id: &str) -> ShopResult<Vec<String>> {
        let inner = self.inner.read().await;
        Ok(inner
            .orders
            .iter()
            .filter(|o| o.user_id == user_id)
            .map(|o| o.id.clone())
            .collect())
    }

    async fn create_order(&self, order: NewOrder) -> ShopResult<Order> {
        let mut inner = self.inner.write().await;
        let order = order.into_order(new_id());
        inner.orders.push(order.clone());
        Ok(order)
    }

    async fn next_order_number(&self) -> ShopResult<u64> {
        let mut inner = self.inner.write().await;
        let max_stored = inner.orders.iter().map(|o| o.number).max().unwrap_or(0);
        inner.order_counter = inner.order_counter.max(max_stored) + 1;
        Ok(inner.order_counter)
    }
}

impl Store for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::{Address, PostalAddress};
    use chrono::{Duration, TimeZone, Utc};

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.into(),
            name: "Test".into(),
            phone: None,
            addresses: vec![Address::from_postal(PostalAddress::default())],
            default_address: 0,
            password_hash: "hash".into(),
            is_admin: false,
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryStore::new();
        store.create_user(new_user("a@x.com")).await.unwrap();

        let err = store.create_user(new_user("a@x.com")).await.unwrap_err();
        assert!(matches!(err, ShopError::Duplicate { field: "email", .. }));
    }

    #[tokio::test]
    async fn test_duplicate_set_code_rejected() {
        let store = MemoryStore::new();
        let mh3 = store
            .create_set(NewFeaturedSet::new("Modern Horizons 3", "MH3"))
            .await
            .unwrap();
        let otj = store
            .create_set(NewFeaturedSet::new("Outlaws of Thunder Junction", "OTJ"))
            .await
            .unwrap();

        assert!(store
            .create_set(NewFeaturedSet::new("Again", "MH3"))
            .await
            .is_err());

        let rename = SetUpdate {
            code: Some("MH3".into()),
            ..Default::default()
        };
        assert!(store.update_set_by_id(&otj.id, rename.clone()).await.is_err());
        // re-saving its own code is fine
        assert!(store.update_set_by_id(&mh3.id, rename).await.is_ok());
    }

    #[tokio::test]
    async fn test_sets_newest_first() {
        let store = MemoryStore::new();
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        for (i, code) in ["A", "B", "C"].iter().enumerate() {
            store
                .create_set(NewFeaturedSet::new(*code, *code).released(base + Duration::days(i as i64)))
                .await
                .unwrap();
        }

        let sets = store.find_sets(0, 2).await.unwrap();
        let codes: Vec<_> = sets.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["C", "B"]);
    }

    #[tokio::test]
    async fn test_order_numbers_increase() {
        let store = MemoryStore::new();
        let first = store.next_order_number().await.unwrap();
        let second = store.next_order_number().await.unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 2);
    }

    #[tokio::test]
    async fn test_product_window() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store
                .create_product(NewProduct::new(format!("P{}", i), 1.0).with_card_set("MH3"))
                .await
                .unwrap();
        }
        store
            .create_product(NewProduct::new("Other", 1.0).with_card_set("OTJ"))
            .await
            .unwrap();

        let filter = ProductFilter::by_set("MH3");
        assert_eq!(store.count_products(&filter).await.unwrap(), 5);

        let page = store.find_products(&filter, 4, 4).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].name, "P4");
    }

    #[tokio::test]
    async fn test_push_user_order_skips_linked_ids() {
        let store = MemoryStore::new();
        let user = store
            .create_user(NewUser {
                email: "a@x.com".into(),
                name: "A".into(),
                phone: None,
                addresses: vec![Address::from_postal(PostalAddress::default())],
                default_address: 0,
                password_hash: "hash".into(),
                is_admin: false,
            })
            .await
            .unwrap();

        store.push_user_order(&user.id, "o1").await.unwrap();
        store.push_user_order(&user.id, "o1").await.unwrap();
        store.push_user_order(&user.id, "o2").await.unwrap();

        let stored = store.find_user_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(stored.orders, vec!["o1".to_string(), "o2".to_string()]);
    }

    #[tokio::test]
    async fn test_stale_address_book_is_refused() {
        let store = MemoryStore::new();
        let user = store
            .create_user(NewUser {
                email: "a@x.com".into(),
                name: "A".into(),
                phone: None,
                addresses: vec![Address::from_postal(PostalAddress::default())],
                default_address: 0,
                password_hash: "hash".into(),
                is_admin: false,
            })
            .await
            .unwrap();

        let mut first = user.clone();
        first.add_address(PostalAddress::new("2 King St", "Toronto", "ON", "M5H"));
        let mut second = user.clone();
        second.add_address(PostalAddress::new("3 Queen St", "Toronto", "ON", "M5C"));

        assert!(store.replace_address_book(&first).await.unwrap());
        // read before the first write landed
        assert!(!store.replace_address_book(&second).await.unwrap());

        let stored = store.find_user_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(stored.addresses, first.addresses);
        assert_eq!(stored.address_version, 1);
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let store = MemoryStore::new();
        let err = store
            .update_user_by_id("nope", UserUpdate::password("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ShopError::NotFound { entity: "user", .. }));
    }
}
