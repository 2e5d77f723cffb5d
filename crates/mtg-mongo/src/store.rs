//! # MongoDB Store
//!
//! Implements the core storage traits over the shared [`MongoConnection`].
//! Ids are ObjectId hex strings; an id that is not valid hex matches nothing.

use crate::connection::MongoConnection;
use crate::documents::{
    address_book_write, id_filter, object_ids, product_update_doc, set_update_doc,
    user_update_doc, CounterDoc, OrderDoc, ProductDoc, SetDoc, UserDoc,
};
use crate::schema::{COUNTERS, FEATURED_SETS, ORDERS, ORDER_COUNTER, PRODUCTS, USERS};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::ReturnDocument;
use mongodb::Collection;
use mtg_core::{
    FeaturedSet, NewFeaturedSet, NewOrder, NewProduct, NewUser, Order, OrderStore, Product,
    ProductFilter, ProductStore, ProductUpdate, SetStore, SetUpdate, ShopError, ShopResult, Store,
    User, UserStore, UserUpdate,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

const SERVICE: &str = "mongodb";
const DUPLICATE_KEY: i32 = 11000;

fn db_error(e: mongodb::error::Error) -> ShopError {
    ShopError::upstream(SERVICE, e)
}

fn is_duplicate_key(e: &mongodb::error::Error) -> bool {
    match e.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(w)) => w.code == DUPLICATE_KEY,
        ErrorKind::Command(c) => c.code == DUPLICATE_KEY,
        _ => false,
    }
}

/// Map a write error, reporting unique-index collisions as `Duplicate`
fn write_error(
    e: mongodb::error::Error,
    entity: &'static str,
    field: &'static str,
    value: &str,
) -> ShopError {
    if is_duplicate_key(&e) {
        ShopError::Duplicate {
            entity,
            field,
            value: value.to_string(),
        }
    } else {
        db_error(e)
    }
}

fn inserted_hex(id: &Bson) -> ShopResult<String> {
    id.as_object_id()
        .map(|oid| oid.to_hex())
        .ok_or_else(|| ShopError::Internal(format!("unexpected inserted id: {}", id)))
}

fn limit_i64(limit: u64) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn product_filter(filter: &ProductFilter) -> Document {
    match &filter.card_set {
        Some(code) => doc! { "cardSet": code.as_str() },
        None => doc! {},
    }
}

/// MongoDB implementation of [`Store`]
#[derive(Debug, Clone)]
pub struct MongoStore {
    connection: Arc<MongoConnection>,
}

impl MongoStore {
    pub fn new(connection: Arc<MongoConnection>) -> Self {
        Self { connection }
    }

    pub fn connection(&self) -> &Arc<MongoConnection> {
        &self.connection
    }

    async fn collection<T>(&self, name: &str) -> ShopResult<Collection<T>>
    where
        T: Send + Sync,
    {
        Ok(self.connection.database().await?.collection::<T>(name))
    }

    async fn find_many<T, D>(
        &self,
        name: &str,
        filter: Document,
        sort: Document,
        skip: u64,
        limit: u64,
    ) -> ShopResult<Vec<D>>
    where
        T: DeserializeOwned + Serialize + Send + Sync + Unpin + Into<D>,
    {
        let docs: Vec<T> = self
            .collection::<T>(name)
            .await?
            .find(filter)
            .sort(sort)
            .skip(skip)
            .limit(limit_i64(limit))
            .await
            .map_err(db_error)?
            .try_collect()
            .await
            .map_err(db_error)?;
        Ok(docs.into_iter().map(Into::into).collect())
    }

    async fn find_by_id<T, D>(&self, name: &str, id: &str) -> ShopResult<Option<D>>
    where
        T: DeserializeOwned + Serialize + Send + Sync + Unpin + Into<D>,
    {
        let Some(filter) = id_filter(id) else {
            return Ok(None);
        };
        let found = self
            .collection::<T>(name)
            .await?
            .find_one(filter)
            .await
            .map_err(db_error)?;
        Ok(found.map(Into::into))
    }
}

// =============================================================================
// Users
// =============================================================================

#[async_trait]
impl UserStore for MongoStore {
    async fn find_user_by_id(&self, id: &str) -> ShopResult<Option<User>> {
        self.find_by_id::<UserDoc, User>(USERS, id).await
    }

    async fn find_user_by_email(&self, email: &str) -> ShopResult<Option<User>> {
        let found = self
            .collection::<UserDoc>(USERS)
            .await?
            .find_one(doc! { "email": email })
            .await
            .map_err(db_error)?;
        Ok(found.map(User::from))
    }

    async fn create_user(&self, user: NewUser) -> ShopResult<User> {
        let email = user.email.clone();
        let doc = UserDoc::from(user.clone());
        let result = self
            .collection::<UserDoc>(USERS)
            .await?
            .insert_one(&doc)
            .await
            .map_err(|e| write_error(e, "user", "email", &email))?;
        let id = inserted_hex(&result.inserted_id)?;
        debug!("Inserted user {}", id);
        Ok(user.into_user(id))
    }

    async fn update_user_by_id(&self, id: &str, update: UserUpdate) -> ShopResult<()> {
        let filter = id_filter(id).ok_or_else(|| ShopError::not_found("user", id))?;
        let set = user_update_doc(&update);
        if set.is_empty() {
            return Ok(());
        }
        let result = self
            .collection::<UserDoc>(USERS)
            .await?
            .update_one(filter, doc! { "$set": set })
            .await
            .map_err(db_error)?;
        if result.matched_count == 0 {
            return Err(ShopError::not_found("user", id));
        }
        Ok(())
    }

    async fn replace_address_book(&self, user: &User) -> ShopResult<bool> {
        let (filter, update) =
            address_book_write(user)?.ok_or_else(|| ShopError::not_found("user", &user.id))?;
        let users = self.collection::<UserDoc>(USERS).await?;
        let result = users.update_one(filter, update).await.map_err(db_error)?;
        if result.matched_count > 0 {
            return Ok(true);
        }

        // no match: either the user is gone or the version moved on
        let exists = users
            .count_documents(id_filter(&user.id).unwrap_or_default())
            .await
            .map_err(db_error)?;
        if exists == 0 {
            return Err(ShopError::not_found("user", &user.id));
        }
        debug!("Stale address book for user {}", user.id);
        Ok(false)
    }

    async fn push_user_order(&self, user_id: &str, order_id: &str) -> ShopResult<()> {
        let filter = id_filter(user_id).ok_or_else(|| ShopError::not_found("user", user_id))?;
        let result = self
            .collection::<UserDoc>(USERS)
            .await?
            .update_one(filter, link_order_update(order_id))
            .await
            .map_err(db_error)?;
        if result.matched_count == 0 {
            return Err(ShopError::not_found("user", user_id));
        }
        Ok(())
    }
}

/// Adds the order id once; linking the same order again is a no-op
fn link_order_update(order_id: &str) -> Document {
    doc! { "$addToSet": { "orders": order_id } }
}

// =============================================================================
// Products
// =============================================================================

#[async_trait]
impl ProductStore for MongoStore {
    async fn find_product_by_id(&self, id: &str) -> ShopResult<Option<Product>> {
        self.find_by_id::<ProductDoc, Product>(PRODUCTS, id).await
    }

    async fn find_products(
        &self,
        filter: &ProductFilter,
        skip: u64,
        limit: u64,
    ) -> ShopResult<Vec<Product>> {
        self.find_many::<ProductDoc, Product>(
            PRODUCTS,
            product_filter(filter),
            doc! { "_id": 1 },
            skip,
            limit,
        )
        .await
    }

    async fn count_products(&self, filter: &ProductFilter) -> ShopResult<u64> {
        self.collection::<ProductDoc>(PRODUCTS)
            .await?
            .count_documents(product_filter(filter))
            .await
            .map_err(db_error)
    }

    async fn find_products_by_ids(&self, ids: &[String]) -> ShopResult<Vec<Product>> {
        let ids = object_ids(ids);
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let docs: Vec<ProductDoc> = self
            .collection::<ProductDoc>(PRODUCTS)
            .await?
            .find(doc! { "_id": { "$in": ids } })
            .await
            .map_err(db_error)?
            .try_collect()
            .await
            .map_err(db_error)?;
        Ok(docs.into_iter().map(Product::from).collect())
    }

    async fn create_product(&self, product: NewProduct) -> ShopResult<Product> {
        let doc = ProductDoc::from(product.clone());
        let result = self
            .collection::<ProductDoc>(PRODUCTS)
            .await?
            .insert_one(&doc)
            .await
            .map_err(db_error)?;
        let id = inserted_hex(&result.inserted_id)?;
        Ok(product.into_product(id))
    }

    async fn update_product_by_id(&self, id: &str, update: ProductUpdate) -> ShopResult<Product> {
        let filter = id_filter(id).ok_or_else(|| ShopError::not_found("product", id))?;
        let set = product_update_doc(&update);
        let collection = self.collection::<ProductDoc>(PRODUCTS).await?;

        let updated = if set.is_empty() {
            collection.find_one(filter).await.map_err(db_error)?
        } else {
            collection
                .find_one_and_update(filter, doc! { "$set": set })
                .return_document(ReturnDocument::After)
                .await
                .map_err(db_error)?
        };
        updated
            .map(Product::from)
            .ok_or_else(|| ShopError::not_found("product", id))
    }
}

// =============================================================================
// Featured sets
// =============================================================================

#[async_trait]
impl SetStore for MongoStore {
    async fn find_set_by_id(&self, id: &str) -> ShopResult<Option<FeaturedSet>> {
        self.find_by_id::<SetDoc, FeaturedSet>(FEATURED_SETS, id).await
    }

    async fn find_set_by_code(&self, code: &str) -> ShopResult<Option<FeaturedSet>> {
        let found = self
            .collection::<SetDoc>(FEATURED_SETS)
            .await?
            .find_one(doc! { "code": code })
            .await
            .map_err(db_error)?;
        Ok(found.map(FeaturedSet::from))
    }

    async fn find_sets(&self, skip: u64, limit: u64) -> ShopResult<Vec<FeaturedSet>> {
        self.find_many::<SetDoc, FeaturedSet>(
            FEATURED_SETS,
            doc! {},
            doc! { "released_at": -1, "_id": 1 },
            skip,
            limit,
        )
        .await
    }

    async fn count_sets(&self) -> ShopResult<u64> {
        self.collection::<SetDoc>(FEATURED_SETS)
            .await?
            .count_documents(doc! {})
            .await
            .map_err(db_error)
    }

    async fn create_set(&self, set: NewFeaturedSet) -> ShopResult<FeaturedSet> {
        let code = set.code.clone();
        let doc = SetDoc::from(set.clone());
        let result = self
            .collection::<SetDoc>(FEATURED_SETS)
            .await?
            .insert_one(&doc)
            .await
            .map_err(|e| write_error(e, "set", "code", &code))?;
        let id = inserted_hex(&result.inserted_id)?;
        Ok(set.into_set(id))
    }

    async fn update_set_by_id(&self, id: &str, update: SetUpdate) -> ShopResult<FeaturedSet> {
        let filter = id_filter(id).ok_or_else(|| ShopError::not_found("set", id))?;
        let set = set_update_doc(&update);
        let collection = self.collection::<SetDoc>(FEATURED_SETS).await?;

        let updated = if set.is_empty() {
            collection.find_one(filter).await.map_err(db_error)?
        } else {
            let code = update.code.clone().unwrap_or_default();
            collection
                .find_one_and_update(filter, doc! { "$set": set })
                .return_document(ReturnDocument::After)
                .await
                .map_err(|e| write_error(e, "set", "code", &code))?
        };
        updated
            .map(FeaturedSet::from)
            .ok_or_else(|| ShopError::not_found("set", id))
    }
}

// =============================================================================
// Orders
// =============================================================================

#[async_trait]
impl OrderStore for MongoStore {
    async fn find_order_by_id(&self, id: &str) -> ShopResult<Option<Order>> {
        self.find_by_id::<OrderDoc, Order>(ORDERS, id).await
    }

    async fn find_orders_for_user(
        &self,
        user_id: &str,
        skip: u64,
        limit: u64,
    ) -> ShopResult<Vec<Order>> {
        self.find_many::<OrderDoc, Order>(
            ORDERS,
            doc! { "user_id": user_id },
            doc! { "date": -1, "_id": -1 },
            skip,
            limit,
        )
        .await
    }

    async fn count_orders_for_user(&self, user_id: &str) -> ShopResult<u64> {
        self.collection::<OrderDoc>(ORDERS)
            .await?
            .count_documents(doc! { "user_id": user_id })
            .await
            .map_err(db_error)
    }

    async fn find_order_ids_for_user(&self, user_id: &str) -> ShopResult<Vec<String>> {
        let docs: Vec<Document> = self
            .collection::<Document>(ORDERS)
            .await?
            .find(doc! { "user_id": user_id })
            .projection(doc! { "_id": 1 })
            .await
            .map_err(db_error)?
            .try_collect()
            .await
            .map_err(db_error)?;
        Ok(docs
            .iter()
            .filter_map(|d| d.get_object_id("_id").ok())
            .map(|oid| oid.to_hex())
            .collect())
    }

    async fn create_order(&self, order: NewOrder) -> ShopResult<Order> {
        let doc = OrderDoc::from(order.clone());
        let result = self
            .collection::<OrderDoc>(ORDERS)
            .await?
            .insert_one(&doc)
            .await
            .map_err(db_error)?;
        let id = inserted_hex(&result.inserted_id)?;
        Ok(order.into_order(id))
    }

    async fn next_order_number(&self) -> ShopResult<u64> {
        let counter = self
            .collection::<CounterDoc>(COUNTERS)
            .await?
            .find_one_and_update(
                doc! { "_id": ORDER_COUNTER },
                doc! { "$inc": { "seq": 1_i64 } },
            )
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .map_err(db_error)?
            .ok_or_else(|| ShopError::Internal("order counter missing after upsert".to_string()))?;

        u64::try_from(counter.seq)
            .map_err(|_| ShopError::Internal(format!("negative order counter: {}", counter.seq)))
    }
}

impl Store for MongoStore {
    fn backend_name(&self) -> &'static str {
        SERVICE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MongoConfig;

    fn unreachable_store() -> MongoStore {
        MongoStore::new(Arc::new(MongoConnection::new(MongoConfig::new(
            "not-a-connection-string",
        ))))
    }

    #[test]
    fn test_product_filter_doc() {
        assert_eq!(product_filter(&ProductFilter::all()), doc! {});
        assert_eq!(
            product_filter(&ProductFilter::by_set("MH3")),
            doc! { "cardSet": "MH3" }
        );
    }

    #[test]
    fn test_order_link_is_idempotent() {
        assert_eq!(
            link_order_update("o1"),
            doc! { "$addToSet": { "orders": "o1" } }
        );
    }

    #[test]
    fn test_limit_conversion() {
        assert_eq!(limit_i64(20), 20);
        assert_eq!(limit_i64(u64::MAX), i64::MAX);
    }

    #[test]
    fn test_inserted_hex() {
        let oid = mongodb::bson::oid::ObjectId::new();
        assert_eq!(inserted_hex(&Bson::ObjectId(oid)).unwrap(), oid.to_hex());
        assert!(inserted_hex(&Bson::Int32(1)).is_err());
    }

    #[tokio::test]
    async fn test_connection_failure_is_upstream() {
        let store = unreachable_store();
        assert_eq!(store.backend_name(), "mongodb");

        let err = store.count_sets().await.unwrap_err();
        assert!(matches!(err, ShopError::Upstream { .. }));
        assert_eq!(err.status_code(), 502);
    }

    #[tokio::test]
    async fn test_invalid_id_matches_nothing() {
        // rejected before the connection is touched
        let store = unreachable_store();
        assert!(store.find_product_by_id("nope").await.unwrap().is_none());
        assert!(matches!(
            store.push_user_order("nope", "o1").await,
            Err(ShopError::NotFound { .. })
        ));

        let user = NewUser {
            email: "a@x.com".into(),
            name: "A".into(),
            phone: None,
            addresses: Vec::new(),
            default_address: 0,
            password_hash: "hash".into(),
            is_admin: false,
        }
        .into_user("nope");
        assert!(matches!(
            store.replace_address_book(&user).await,
            Err(ShopError::NotFound { .. })
        ));
    }
}
