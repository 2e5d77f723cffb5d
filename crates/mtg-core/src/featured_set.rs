//! # Featured Sets
//!
//! Card expansions promoted on the storefront.

use crate::error::{ShopError, ShopResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A featured card set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeaturedSet {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    /// Unique set code (e.g., "MH3")
    pub code: String,
    pub released_at: Option<DateTime<Utc>>,
    /// Identifier in the Scryfall catalog
    #[serde(default)]
    pub scryfall_id: Option<String>,
    /// Public id of the hero image on the image host
    #[serde(default)]
    pub hero: Option<String>,
    #[serde(default)]
    pub featured: bool,
}

/// A featured set about to be inserted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFeaturedSet {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub released_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scryfall_id: Option<String>,
    #[serde(default)]
    pub hero: Option<String>,
    #[serde(default)]
    pub featured: bool,
}

impl NewFeaturedSet {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            released_at: None,
            scryfall_id: None,
            hero: None,
            featured: false,
        }
    }

    /// Builder: set release date
    pub fn released(mut self, at: DateTime<Utc>) -> Self {
        self.released_at = Some(at);
        self
    }

    /// Builder: mark as featured
    pub fn featured(mut self) -> Self {
        self.featured = true;
        self
    }

    pub fn validate(&self) -> ShopResult<()> {
        if self.name.trim().is_empty() {
            return Err(ShopError::InvalidRequest("set name is required".to_string()));
        }
        if self.code.trim().is_empty() {
            return Err(ShopError::InvalidRequest("set code is required".to_string()));
        }
        Ok(())
    }

    pub fn into_set(self, id: impl Into<String>) -> FeaturedSet {
        FeaturedSet {
            id: id.into(),
            name: self.name,
            code: self.code,
            released_at: self.released_at,
            scryfall_id: self.scryfall_id,
            hero: self.hero,
            featured: self.featured,
        }
    }
}

/// Partial featured set update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub released_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scryfall_id: Option<String>,
    #[serde(default)]
    pub hero: Option<String>,
    #[serde(default)]
    pub featured: Option<bool>,
}

impl SetUpdate {
    pub fn is_empty(&self) -> bool {
        self == &SetUpdate::default()
    }

    pub fn validate(&self) -> ShopResult<()> {
        if matches!(&self.code, Some(code) if code.trim().is_empty()) {
            return Err(ShopError::InvalidRequest("set code cannot be empty".to_string()));
        }
        if matches!(&self.name, Some(name) if name.trim().is_empty()) {
            return Err(ShopError::InvalidRequest("set name cannot be empty".to_string()));
        }
        Ok(())
    }

    pub fn apply(self, set: &mut FeaturedSet) {
        if let Some(name) = self.name {
            set.name = name;
        }
        if let Some(code) = self.code {
            set.code = code;
        }
        if let Some(released_at) = self.released_at {
            set.released_at = Some(released_at);
        }
        if let Some(scryfall_id) = self.scryfall_id {
            set.scryfall_id = Some(scryfall_id);
        }
        if let Some(hero) = self.hero {
            set.hero = Some(hero);
        }
        if let Some(featured) = self.featured {
            set.featured = featured;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let set = NewFeaturedSet::new("Modern Horizons 3", "MH3").into_set("s1");
        assert!(!set.featured);
        assert!(set.hero.is_none());
    }

    #[test]
    fn test_validate() {
        assert!(NewFeaturedSet::new("Modern Horizons 3", "MH3").validate().is_ok());
        assert!(NewFeaturedSet::new("Modern Horizons 3", "").validate().is_err());
        assert!(SetUpdate {
            code: Some(" ".into()),
            ..Default::default()
        }
        .validate()
        .is_err());
    }

    #[test]
    fn test_update_apply() {
        let mut set = NewFeaturedSet::new("Modern Horizons 3", "MH3").into_set("s1");
        SetUpdate {
            featured: Some(true),
            hero: Some("mtg-store/hero/mh3".into()),
            ..Default::default()
        }
        .apply(&mut set);

        assert!(set.featured);
        assert_eq!(set.hero.as_deref(), Some("mtg-store/hero/mh3"));
        assert_eq!(set.code, "MH3");
    }
}
