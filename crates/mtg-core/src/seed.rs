//! # Seed Catalog
//!
//! Starting data for a fresh store, loaded from `config/seed.toml`.
//! Used with the in-memory backend so a development server has products,
//! featured sets and an admin account to log in with.

use crate::error::{ShopError, ShopResult};
use crate::featured_set::NewFeaturedSet;
use crate::password::hash_password;
use crate::product::NewProduct;
use crate::store::Store;
use crate::user::{Address, NewUser, PostalAddress};
use serde::Deserialize;
use tracing::{debug, info};

/// Admin account created from the seed file
#[derive(Debug, Clone, Deserialize)]
pub struct SeedAdmin {
    pub email: String,
    pub name: String,
    /// Plaintext, hashed before insert
    pub password: String,
    #[serde(default)]
    pub address: PostalAddress,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedCatalog {
    #[serde(default)]
    pub admins: Vec<SeedAdmin>,
    #[serde(default)]
    pub products: Vec<NewProduct>,
    #[serde(default)]
    pub sets: Vec<NewFeaturedSet>,
}

/// What [`SeedCatalog::apply`] inserted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub admins: usize,
    pub products: usize,
    pub sets: usize,
}

impl SeedCatalog {
    /// Load catalog from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    pub fn is_empty(&self) -> bool {
        self.admins.is_empty() && self.products.is_empty() && self.sets.is_empty()
    }

    /// Insert the seed records. Admins and sets that already exist (same
    /// email / code) are skipped; products are always inserted.
    pub async fn apply(&self, store: &dyn Store) -> ShopResult<SeedReport> {
        let mut report = SeedReport::default();

        for admin in &self.admins {
            if store.find_user_by_email(&admin.email).await?.is_some() {
                debug!("Seed admin {} already exists", admin.email);
                continue;
            }
            store
                .create_user(NewUser {
                    email: admin.email.clone(),
                    name: admin.name.clone(),
                    phone: None,
                    addresses: vec![Address::from_postal(admin.address.clone())],
                    default_address: 0,
                    password_hash: hash_password(&admin.password)?,
                    is_admin: true,
                })
                .await?;
            report.admins += 1;
        }

        for set in &self.sets {
            set.validate()?;
            if store.find_set_by_code(&set.code).await?.is_some() {
                debug!("Seed set {} already exists", set.code);
                continue;
            }
            store.create_set(set.clone()).await?;
            report.sets += 1;
        }

        for product in &self.products {
            product.validate().map_err(|e| {
                ShopError::Configuration(format!("seed product '{}': {}", product.name, e))
            })?;
            store.create_product(product.clone()).await?;
            report.products += 1;
        }

        info!(
            "Seeded {} admins, {} sets, {} products",
            report.admins, report.sets, report.products
        );
        Ok(report)
    }
}
