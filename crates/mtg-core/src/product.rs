//! # Product Types
//!
//! Catalog products (sealed boxes, singles, accessories) and their update payloads.

use crate::error::{ShopError, ShopResult};
use serde::{Deserialize, Serialize};

/// Product type used when none is given
pub const DEFAULT_PRODUCT_TYPE: &str = "sealed";

fn default_product_type() -> String {
    DEFAULT_PRODUCT_TYPE.to_string()
}

/// A product in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: String,

    /// Display name
    pub name: String,

    /// Product type (e.g., "sealed", "single")
    #[serde(rename = "prodType", default = "default_product_type")]
    pub prod_type: String,

    #[serde(default)]
    pub description: String,

    /// Originating card set code (e.g., "MH3")
    #[serde(rename = "cardSet", default)]
    pub card_set: String,

    /// Unit price
    pub price: f64,

    /// Units in stock
    #[serde(default)]
    pub stock: u32,

    /// Public id of the image on the image host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// A product about to be inserted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(rename = "prodType", default = "default_product_type")]
    pub prod_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "cardSet", default)]
    pub card_set: String,
    pub price: f64,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub image: Option<String>,
}

impl NewProduct {
    /// Create a sealed product with a name and price
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            prod_type: default_product_type(),
            description: String::new(),
            card_set: String::new(),
            price,
            stock: 0,
            image: None,
        }
    }

    /// Builder: set card set code
    pub fn with_card_set(mut self, code: impl Into<String>) -> Self {
        self.card_set = code.into();
        self
    }

    /// Builder: set stock
    pub fn with_stock(mut self, stock: u32) -> Self {
        self.stock = stock;
        self
    }

    /// Builder: set description
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Builder: set product type
    pub fn with_type(mut self, prod_type: impl Into<String>) -> Self {
        self.prod_type = prod_type.into();
        self
    }

    pub fn validate(&self) -> ShopResult<()> {
        if self.name.trim().is_empty() {
            return Err(ShopError::InvalidRequest("product name is required".to_string()));
        }
        validate_price(self.price)?;
        if self.prod_type.trim().is_empty() {
            return Err(ShopError::InvalidRequest("product type cannot be empty".to_string()));
        }
        Ok(())
    }

    pub fn into_product(self, id: impl Into<String>) -> Product {
        Product {
            id: id.into(),
            name: self.name,
            prod_type: self.prod_type,
            description: self.description,
            card_set: self.card_set,
            price: self.price,
            stock: self.stock,
            image: self.image,
        }
    }
}

fn validate_price(price: f64) -> ShopResult<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(ShopError::InvalidRequest(format!("invalid price: {}", price)));
    }
    Ok(())
}

/// Partial product update; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "prodType", default)]
    pub prod_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "cardSet", default)]
    pub card_set: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub stock: Option<u32>,
    #[serde(default)]
    pub image: Option<String>,
}

impl ProductUpdate {
    pub fn is_empty(&self) -> bool {
        self == &ProductUpdate::default()
    }

    pub fn validate(&self) -> ShopResult<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(ShopError::InvalidRequest("product name cannot be empty".to_string()));
            }
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        Ok(())
    }

    pub fn apply(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(prod_type) = self.prod_type {
            product.prod_type = prod_type;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(card_set) = self.card_set {
            product.card_set = card_set;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        if let Some(image) = self.image {
            product.image = Some(image);
        }
    }
}

/// Filter for product listings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Only products from this card set
    pub card_set: Option<String>,
}

impl ProductFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_set(code: impl Into<String>) -> Self {
        Self {
            card_set: Some(code.into()),
        }
    }

    pub fn matches(&self, product: &Product) -> bool {
        self.card_set
            .as_deref()
            .map_or(true, |code| product.card_set == code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_builder() {
        let product = NewProduct::new("Modern Horizons 3 Play Booster Box", 289.99)
            .with_card_set("MH3")
            .with_stock(5)
            .into_product("p1");

        assert_eq!(product.prod_type, "sealed");
        assert_eq!(product.card_set, "MH3");
        assert_eq!(product.stock, 5);
    }

    #[test]
    fn test_validation() {
        assert!(NewProduct::new("Box", 10.0).validate().is_ok());
        assert!(NewProduct::new("  ", 10.0).validate().is_err());
        assert!(NewProduct::new("Box", -1.0).validate().is_err());
        assert!(NewProduct::new("Box", f64::NAN).validate().is_err());
    }

    #[test]
    fn test_update_apply() {
        let mut product = NewProduct::new("Box", 10.0).into_product("p1");
        let update = ProductUpdate {
            price: Some(12.5),
            stock: Some(3),
            ..Default::default()
        };
        assert!(!update.is_empty());
        update.apply(&mut product);

        assert_eq!(product.name, "Box");
        assert_eq!(product.price, 12.5);
        assert_eq!(product.stock, 3);
    }

    #[test]
    fn test_filter() {
        let product = NewProduct::new("Box", 10.0).with_card_set("MH3").into_product("p1");
        assert!(ProductFilter::all().matches(&product));
        assert!(ProductFilter::by_set("MH3").matches(&product));
        assert!(!ProductFilter::by_set("OTJ").matches(&product));
    }

    #[test]
    fn test_wire_names() {
        let product = NewProduct::new("Box", 10.0).with_card_set("MH3").into_product("p1");
        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["_id"], "p1");
        assert_eq!(json["prodType"], "sealed");
        assert_eq!(json["cardSet"], "MH3");
    }
}
