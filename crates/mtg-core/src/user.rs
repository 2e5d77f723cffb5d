//! # User Accounts
//!
//! User records, shipping addresses and the address-book rules.
//!
//! A user always keeps at least one address, and `default_address` always
//! indexes into `addresses`.

use crate::error::{ShopError, ShopResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Street address without an identifier (registration form, order snapshot)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostalAddress {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub province: String,
    #[serde(default)]
    pub postal: String,
}

impl PostalAddress {
    pub fn new(
        street: impl Into<String>,
        city: impl Into<String>,
        province: impl Into<String>,
        postal: impl Into<String>,
    ) -> Self {
        Self {
            street: street.into(),
            city: city.into(),
            province: province.into(),
            postal: postal.into(),
        }
    }
}

/// An entry of a user's address book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(rename = "_id")]
    pub id: String,
    pub street: String,
    pub city: String,
    pub province: String,
    pub postal: String,
}

impl Address {
    /// Create an address-book entry with a fresh identifier
    pub fn from_postal(postal: PostalAddress) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            street: postal.street,
            city: postal.city,
            province: postal.province,
            postal: postal.postal,
        }
    }

    /// Snapshot without the identifier
    pub fn to_postal(&self) -> PostalAddress {
        PostalAddress {
            street: self.street.clone(),
            city: self.city.clone(),
            province: self.province.clone(),
            postal: self.postal.clone(),
        }
    }
}

/// A stored user account
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    /// Unique login email
    pub email: String,
    /// Display name
    pub name: String,
    pub phone: Option<String>,
    pub addresses: Vec<Address>,
    /// Index into `addresses`
    pub default_address: usize,
    /// Argon2 PHC string, never the plaintext
    pub password_hash: String,
    pub is_admin: bool,
    /// Ids of orders placed by this user
    pub orders: Vec<String>,
    /// Bumped by every address-book write
    pub address_version: u64,
}

impl User {
    /// Append an address; the default is left unchanged
    pub fn add_address(&mut self, postal: PostalAddress) -> &Address {
        self.addresses.push(Address::from_postal(postal));
        let last = self.addresses.len() - 1;
        &self.addresses[last]
    }

    /// Replace the address with the given id, keeping the id
    pub fn edit_address(&mut self, address_id: &str, postal: PostalAddress) -> ShopResult<()> {
        let index = self.address_index(address_id)?;
        let mut replacement = Address::from_postal(postal);
        replacement.id = address_id.to_string();
        self.addresses[index] = replacement;
        Ok(())
    }

    /// Remove an address, refusing to remove the last one.
    ///
    /// The default keeps pointing at the same entry; if the default itself is
    /// removed the first remaining address becomes the default.
    pub fn remove_address(&mut self, address_id: &str) -> ShopResult<Address> {
        let index = self.address_index(address_id)?;
        if self.addresses.len() <= 1 {
            return Err(ShopError::LastAddress);
        }
        let removed = self.addresses.remove(index);
        if index == self.default_address {
            self.default_address = 0;
        } else if index < self.default_address {
            self.default_address -= 1;
        }
        Ok(removed)
    }

    /// Point the default at the address with the given id
    pub fn set_default_address(&mut self, address_id: &str) -> ShopResult<()> {
        self.default_address = self.address_index(address_id)?;
        Ok(())
    }

    /// Current default address
    pub fn default_address(&self) -> Option<&Address> {
        self.addresses.get(self.default_address)
    }

    fn address_index(&self, address_id: &str) -> ShopResult<usize> {
        self.addresses
            .iter()
            .position(|a| a.id == address_id)
            .ok_or_else(|| ShopError::not_found("address", address_id))
    }

    /// Public view of the account (no password hash)
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            addresses: self.addresses.clone(),
            default_address: self.default_address,
            is_admin: self.is_admin,
            orders: self.orders.clone(),
        }
    }
}

/// A user about to be inserted
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub addresses: Vec<Address>,
    pub default_address: usize,
    pub password_hash: String,
    pub is_admin: bool,
}

impl NewUser {
    pub fn into_user(self, id: impl Into<String>) -> User {
        User {
            id: id.into(),
            email: self.email,
            name: self.name,
            phone: self.phone,
            addresses: self.addresses,
            default_address: self.default_address,
            password_hash: self.password_hash,
            is_admin: self.is_admin,
            orders: Vec::new(),
            address_version: 0,
        }
    }
}

/// Partial update of a user record; `None` fields are left untouched.
/// Address-book writes go through `UserStore::replace_address_book`.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub password_hash: Option<String>,
}

impl UserUpdate {
    pub fn password(hash: impl Into<String>) -> Self {
        Self {
            password_hash: Some(hash.into()),
        }
    }

    pub fn apply(self, user: &mut User) {
        if let Some(hash) = self.password_hash {
            user.password_hash = hash;
        }
    }
}

/// Account data returned to the owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "address")]
    pub addresses: Vec<Address>,
    pub default_address: usize,
    pub is_admin: bool,
    pub orders: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with(addresses: usize) -> User {
        let mut user = NewUser {
            email: "a@x.com".into(),
            name: "A".into(),
            phone: None,
            addresses: vec![],
            default_address: 0,
            password_hash: "hash".into(),
            is_admin: false,
        }
        .into_user("u1");
        for i in 0..addresses {
            user.add_address(PostalAddress::new(format!("{} Main St", i), "Toronto", "ON", "M5V"));
        }
        user
    }

    #[test]
    fn test_add_address_keeps_default() {
        let mut user = user_with(1);
        let first = user.addresses[0].id.clone();
        user.add_address(PostalAddress::new("2 King St", "Toronto", "ON", "M5H"));

        assert_eq!(user.addresses.len(), 2);
        assert_eq!(user.default_address().unwrap().id, first);
    }

    #[test]
    fn test_cannot_remove_last_address() {
        let mut user = user_with(1);
        let id = user.addresses[0].id.clone();

        assert!(matches!(user.remove_address(&id), Err(ShopError::LastAddress)));
        assert_eq!(user.addresses.len(), 1);
    }

    #[test]
    fn test_remove_one_of_two() {
        let mut user = user_with(2);
        let id = user.addresses[1].id.clone();

        user.remove_address(&id).unwrap();
        assert_eq!(user.addresses.len(), 1);
        assert_eq!(user.default_address, 0);
    }

    #[test]
    fn test_remove_shifts_default() {
        let mut user = user_with(3);
        let default_id = user.addresses[2].id.clone();
        user.set_default_address(&default_id).unwrap();

        let first = user.addresses[0].id.clone();
        user.remove_address(&first).unwrap();

        assert_eq!(user.default_address, 1);
        assert_eq!(user.default_address().unwrap().id, default_id);
    }

    #[test]
    fn test_remove_default_falls_back_to_first() {
        let mut user = user_with(3);
        let default_id = user.addresses[1].id.clone();
        user.set_default_address(&default_id).unwrap();

        user.remove_address(&default_id).unwrap();
        assert_eq!(user.default_address, 0);
    }

    #[test]
    fn test_edit_address_keeps_id() {
        let mut user = user_with(1);
        let id = user.addresses[0].id.clone();

        user.edit_address(&id, PostalAddress::new("9 Bay St", "Ottawa", "ON", "K1A"))
            .unwrap();
        assert_eq!(user.addresses[0].id, id);
        assert_eq!(user.addresses[0].city, "Ottawa");
    }

    #[test]
    fn test_unknown_address_id() {
        let mut user = user_with(2);
        assert!(matches!(
            user.set_default_address("nope"),
            Err(ShopError::NotFound { entity: "address", .. })
        ));
        assert!(user
            .edit_address("nope", PostalAddress::default())
            .is_err());
    }

    #[test]
    fn test_profile_has_no_password() {
        let user = user_with(1);
        let json = serde_json::to_value(user.profile()).unwrap();

        assert!(json.get("password").is_none());
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["email"], "a@x.com");
        assert_eq!(json["defaultAddress"], 0);
        assert_eq!(json["address"].as_array().unwrap().len(), 1);
    }
}
