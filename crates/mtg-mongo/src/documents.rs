//! # Stored Documents
//!
//! BSON shapes of the four collections and their conversions to and from
//! the core types. Field names match the documents already in the database
//! (`address`, `defaultAddress`, `password`, `isAdmin`, `prodType`, ...).

use chrono::{DateTime, Utc};
use mongodb::bson::{self, doc, oid::ObjectId, Bson, Document};
use mtg_core::{
    Address, FeaturedSet, LineItem, NewFeaturedSet, NewOrder, NewProduct, NewUser, Order,
    PostalAddress, Product, ProductUpdate, SetUpdate, ShopError, ShopResult, User, UserUpdate,
};
use serde::{Deserialize, Serialize};

pub(crate) fn to_bson_date(at: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(at.timestamp_millis())
}

pub(crate) fn from_bson_date(at: bson::DateTime) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(at.timestamp_millis()).unwrap_or_default()
}

fn hex_id(id: Option<ObjectId>) -> String {
    id.map(|id| id.to_hex()).unwrap_or_default()
}

// =============================================================================
// Users
// =============================================================================

/// Address-book entry. Older entries carry an ObjectId `_id`, newer ones a
/// string id; both are read back as a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressDoc {
    #[serde(rename = "_id")]
    pub id: Bson,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub province: String,
    #[serde(default)]
    pub postal: String,
}

impl From<Address> for AddressDoc {
    fn from(address: Address) -> Self {
        Self {
            id: Bson::String(address.id),
            street: address.street,
            city: address.city,
            province: address.province,
            postal: address.postal,
        }
    }
}

impl From<AddressDoc> for Address {
    fn from(doc: AddressDoc) -> Self {
        let id = match doc.id {
            Bson::String(id) => id,
            Bson::ObjectId(oid) => oid.to_hex(),
            other => other.to_string(),
        };
        Address {
            id,
            street: doc.street,
            city: doc.city,
            province: doc.province,
            postal: doc.postal,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "address", default)]
    pub addresses: Vec<AddressDoc>,
    #[serde(rename = "defaultAddress", default)]
    pub default_address: i64,
    #[serde(rename = "password")]
    pub password_hash: String,
    #[serde(rename = "isAdmin", default)]
    pub is_admin: bool,
    #[serde(default)]
    pub orders: Vec<String>,
    /// Missing on records written before address versioning
    #[serde(rename = "addressVersion", default)]
    pub address_version: i64,
}

impl From<NewUser> for UserDoc {
    fn from(user: NewUser) -> Self {
        Self {
            id: None,
            email: user.email,
            name: user.name,
            phone: user.phone,
            addresses: user.addresses.into_iter().map(AddressDoc::from).collect(),
            default_address: i64::try_from(user.default_address).unwrap_or(0),
            password_hash: user.password_hash,
            is_admin: user.is_admin,
            orders: Vec::new(),
            address_version: 0,
        }
    }
}

impl From<UserDoc> for User {
    fn from(doc: UserDoc) -> Self {
        User {
            id: hex_id(doc.id),
            email: doc.email,
            name: doc.name,
            phone: doc.phone,
            addresses: doc.addresses.into_iter().map(Address::from).collect(),
            default_address: usize::try_from(doc.default_address).unwrap_or(0),
            password_hash: doc.password_hash,
            is_admin: doc.is_admin,
            orders: doc.orders,
            address_version: u64::try_from(doc.address_version).unwrap_or(0),
        }
    }
}

/// `$set` document for a user update
pub fn user_update_doc(update: &UserUpdate) -> Document {
    let mut set = Document::new();
    if let Some(hash) = &update.password_hash {
        set.insert("password", hash.as_str());
    }
    set
}

/// Filter and update for a versioned address-book write.
///
/// The filter matches only while `addressVersion` is still the one read;
/// version 0 also matches records that never had the field.
pub fn address_book_write(user: &User) -> ShopResult<Option<(Document, Document)>> {
    let Some(mut filter) = id_filter(&user.id) else {
        return Ok(None);
    };
    let version = i64::try_from(user.address_version)
        .map_err(|_| ShopError::Internal(format!("address version overflow for {}", user.id)))?;
    if version == 0 {
        filter.insert("addressVersion", doc! { "$in": [0_i64, Bson::Null] });
    } else {
        filter.insert("addressVersion", version);
    }

    let docs: Vec<AddressDoc> = user.addresses.iter().cloned().map(AddressDoc::from).collect();
    let addresses = bson::to_bson(&docs)
        .map_err(|e| ShopError::Internal(format!("failed to encode addresses: {}", e)))?;
    let update = doc! {
        "$set": {
            "address": addresses,
            "defaultAddress": i64::try_from(user.default_address).unwrap_or(0),
        },
        "$inc": { "addressVersion": 1_i64 },
    };
    Ok(Some((filter, update)))
}

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    #[serde(rename = "prodType", default = "default_product_type")]
    pub prod_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "cardSet", default)]
    pub card_set: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub stock: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

fn default_product_type() -> String {
    mtg_core::product::DEFAULT_PRODUCT_TYPE.to_string()
}

impl From<NewProduct> for ProductDoc {
    fn from(product: NewProduct) -> Self {
        Self {
            id: None,
            name: product.name,
            prod_type: product.prod_type,
            description: product.description,
            card_set: product.card_set,
            price: product.price,
            stock: i64::from(product.stock),
            image: product.image,
        }
    }
}

impl From<ProductDoc> for Product {
    fn from(doc: ProductDoc) -> Self {
        Product {
            id: hex_id(doc.id),
            name: doc.name,
            prod_type: doc.prod_type,
            description: doc.description,
            card_set: doc.card_set,
            price: doc.price,
            stock: u32::try_from(doc.stock.max(0)).unwrap_or(u32::MAX),
            image: doc.image,
        }
    }
}

/// `$set` document for a product update
pub fn product_update_doc(update: &ProductUpdate) -> Document {
    let mut set = Document::new();
    if let Some(name) = &update.name {
        set.insert("name", name.as_str());
    }
    if let Some(prod_type) = &update.prod_type {
        set.insert("prodType", prod_type.as_str());
    }
    if let Some(description) = &update.description {
        set.insert("description", description.as_str());
    }
    if let Some(card_set) = &update.card_set {
        set.insert("cardSet", card_set.as_str());
    }
    if let Some(price) = update.price {
        set.insert("price", price);
    }
    if let Some(stock) = update.stock {
        set.insert("stock", i64::from(stock));
    }
    if let Some(image) = &update.image {
        set.insert("image", image.as_str());
    }
    set
}

// =============================================================================
// Featured sets
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released_at: Option<bson::DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scryfall_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero: Option<String>,
    #[serde(default)]
    pub featured: bool,
}

impl From<NewFeaturedSet> for SetDoc {
    fn from(set: NewFeaturedSet) -> Self {
        Self {
            id: None,
            name: set.name,
            code: set.code,
            released_at: set.released_at.map(to_bson_date),
            scryfall_id: set.scryfall_id,
            hero: set.hero,
            featured: set.featured,
        }
    }
}

impl From<SetDoc> for FeaturedSet {
    fn from(doc: SetDoc) -> Self {
        FeaturedSet {
            id: hex_id(doc.id),
            name: doc.name,
            code: doc.code,
            released_at: doc.released_at.map(from_bson_date),
            scryfall_id: doc.scryfall_id,
            hero: doc.hero,
            featured: doc.featured,
        }
    }
}

/// `$set` document for a featured-set update
pub fn set_update_doc(update: &SetUpdate) -> Document {
    let mut set = Document::new();
    if let Some(name) = &update.name {
        set.insert("name", name.as_str());
    }
    if let Some(code) = &update.code {
        set.insert("code", code.as_str());
    }
    if let Some(released_at) = update.released_at {
        set.insert("released_at", to_bson_date(released_at));
    }
    if let Some(scryfall_id) = &update.scryfall_id {
        set.insert("scryfall_id", scryfall_id.as_str());
    }
    if let Some(hero) = &update.hero {
        set.insert("hero", hero.as_str());
    }
    if let Some(featured) = update.featured {
        set.insert("featured", featured);
    }
    set
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,
    pub date: bson::DateTime,
    #[serde(default)]
    pub number: i64,
    pub address: PostalAddress,
    #[serde(default)]
    pub products: Vec<LineItem>,
}

impl From<NewOrder> for OrderDoc {
    fn from(order: NewOrder) -> Self {
        Self {
            id: None,
            user_id: order.user_id,
            date: to_bson_date(order.date),
            number: i64::try_from(order.number).unwrap_or(i64::MAX),
            address: order.address,
            products: order.products,
        }
    }
}

impl From<OrderDoc> for Order {
    fn from(doc: OrderDoc) -> Self {
        Order {
            id: hex_id(doc.id),
            user_id: doc.user_id,
            date: from_bson_date(doc.date),
            number: u64::try_from(doc.number).unwrap_or(0),
            address: doc.address,
            products: doc.products,
        }
    }
}

// =============================================================================
// Counters
// =============================================================================

/// Named sequence; `_id` is the sequence name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterDoc {
    #[serde(rename = "_id")]
    pub name: String,
    pub seq: i64,
}

/// Filter matching a document by ObjectId; `None` if `id` is not valid hex
pub fn id_filter(id: &str) -> Option<Document> {
    ObjectId::parse_str(id).ok().map(|oid| doc! { "_id": oid })
}

/// Valid ObjectIds among `ids`; invalid ones are dropped
pub fn object_ids(ids: &[String]) -> Vec<Bson> {
    ids.iter()
        .filter_map(|id| ObjectId::parse_str(id).ok())
        .map(Bson::ObjectId)
        .collect()
}
