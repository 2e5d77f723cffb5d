//! # Order Types
//!
//! Orders, line items and the checkout payload.

use crate::error::{ShopError, ShopResult};
use crate::user::PostalAddress;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A line item in an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product type (denormalized)
    #[serde(rename = "prodType", default)]
    pub prod_type: String,

    /// Product id
    pub prod_id: String,

    /// Product name (denormalized for display)
    pub name: String,

    /// Card set code (denormalized)
    #[serde(rename = "cardSet", default)]
    pub card_set: String,

    /// Quantity
    pub qty: u32,

    /// Unit price at checkout time
    pub price: f64,
}

impl LineItem {
    /// Calculate the total price for this line item
    pub fn total(&self) -> f64 {
        self.price * f64::from(self.qty)
    }
}

/// A placed order. Never modified after checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: String,

    /// Owning user id
    pub user_id: String,

    /// Checkout date
    pub date: DateTime<Utc>,

    /// Sequential order number
    pub number: u64,

    /// Shipping address snapshot
    pub address: PostalAddress,

    /// Line items
    pub products: Vec<LineItem>,
}

impl Order {
    /// Calculate order total
    pub fn total(&self) -> f64 {
        self.products.iter().map(LineItem::total).sum()
    }

    /// Get item count
    pub fn item_count(&self) -> u32 {
        self.products.iter().map(|i| i.qty).sum()
    }
}

/// A validated, numbered order about to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub user_id: String,
    pub date: DateTime<Utc>,
    pub number: u64,
    pub address: PostalAddress,
    pub products: Vec<LineItem>,
}

impl NewOrder {
    pub fn into_order(self, id: impl Into<String>) -> Order {
        Order {
            id: id.into(),
            user_id: self.user_id,
            date: self.date,
            number: self.number,
            address: self.address,
            products: self.products,
        }
    }
}

/// Checkout payload as submitted by the client. Every field is optional here
/// so that a missing field is reported as an invalid order, not a parse error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderDraft {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub address: Option<PostalAddress>,
    #[serde(default)]
    pub products: Option<Vec<LineItem>>,
}

/// Checkout payload with every required field present
#[derive(Debug, Clone, PartialEq)]
pub struct ValidOrder {
    pub user_id: String,
    pub date: DateTime<Utc>,
    pub address: PostalAddress,
    pub products: Vec<LineItem>,
}

impl ValidOrder {
    /// Attach the allocated order number
    pub fn numbered(self, number: u64) -> NewOrder {
        NewOrder {
            user_id: self.user_id,
            date: self.date,
            number,
            address: self.address,
            products: self.products,
        }
    }
}

impl OrderDraft {
    /// Reject the draft unless `user_id`, `date`, `address` and a non-empty
    /// `products` list are all present
    pub fn validate(self) -> ShopResult<ValidOrder> {
        let user_id = self
            .user_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ShopError::InvalidOrder("missing user_id".to_string()))?;
        let date = self
            .date
            .ok_or_else(|| ShopError::InvalidOrder("missing date".to_string()))?;
        let address = self
            .address
            .ok_or_else(|| ShopError::InvalidOrder("missing address".to_string()))?;
        let products = self
            .products
            .filter(|items| !items.is_empty())
            .ok_or_else(|| ShopError::InvalidOrder("order has no products".to_string()))?;

        if let Some(item) = products.iter().find(|item| item.qty == 0) {
            return Err(ShopError::InvalidOrder(format!(
                "quantity of {} must be at least 1",
                item.prod_id
            )));
        }

        Ok(ValidOrder {
            user_id,
            date,
            address,
            products,
        })
    }
}
