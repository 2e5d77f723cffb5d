//! # Accounts
//!
//! Registration, login, profile, password change and address-book operations.

use crate::auth::Identity;
use crate::error::{ShopError, ShopResult};
use crate::password::{hash_password, verify_password};
use crate::store::Store;
use crate::user::{Address, NewUser, PostalAddress, User, UserProfile, UserUpdate};
use serde::Deserialize;
use tracing::{debug, info, instrument};

/// Registration form
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Confirmation, must equal `password`
    pub password2: String,
    #[serde(default)]
    pub phone: Option<String>,
    /// First shipping address
    #[serde(flatten)]
    pub address: PostalAddress,
}

/// Login form
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub email: String,
    pub password: String,
    /// Ask for a token that never expires
    #[serde(default)]
    pub keep_logged: bool,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_string()
}

/// Create a user with one address, no orders and no admin rights.
///
/// The email pre-check only produces a friendlier error; the store's unique
/// constraint is what actually rejects concurrent duplicates.
#[instrument(skip(store, registration), fields(email = %registration.email))]
pub async fn register(store: &dyn Store, registration: Registration) -> ShopResult<UserProfile> {
    let email = normalize_email(&registration.email);
    if email.is_empty() || !email.contains('@') {
        return Err(ShopError::InvalidRequest("a valid email is required".to_string()));
    }
    if registration.name.trim().is_empty() {
        return Err(ShopError::InvalidRequest("name is required".to_string()));
    }
    if registration.password.is_empty() {
        return Err(ShopError::InvalidRequest("password is required".to_string()));
    }
    if registration.password != registration.password2 {
        return Err(ShopError::InvalidRequest("Passwords don't match".to_string()));
    }

    if store.find_user_by_email(&email).await?.is_some() {
        return Err(ShopError::Duplicate {
            entity: "user",
            field: "email",
            value: email,
        });
    }

    let user = store
        .create_user(NewUser {
            email,
            name: registration.name.trim().to_string(),
            phone: registration.phone.filter(|p| !p.trim().is_empty()),
            addresses: vec![Address::from_postal(registration.address)],
            default_address: 0,
            password_hash: hash_password(&registration.password)?,
            is_admin: false,
        })
        .await?;

    info!("Registered user {}", user.id);
    Ok(user.profile())
}

/// Check credentials and return the identity to put in a token
#[instrument(skip(store, credentials), fields(email = %credentials.email))]
pub async fn login(store: &dyn Store, credentials: &Credentials) -> ShopResult<Identity> {
    let email = normalize_email(&credentials.email);
    let user = store
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| ShopError::not_found("user", email))?;

    if !verify_password(&credentials.password, &user.password_hash)? {
        return Err(ShopError::IncorrectPassword);
    }

    Ok(Identity::new(user.id, user.email, user.is_admin))
}

async fn load_user(store: &dyn Store, user_id: &str) -> ShopResult<User> {
    store
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| ShopError::not_found("user", user_id))
}

/// Account data for the owner
pub async fn profile(store: &dyn Store, user_id: &str) -> ShopResult<UserProfile> {
    Ok(load_user(store, user_id).await?.profile())
}

/// Replace the password after checking the old one
#[instrument(skip(store, old_password, new_password))]
pub async fn change_password(
    store: &dyn Store,
    user_id: &str,
    old_password: &str,
    new_password: &str,
) -> ShopResult<()> {
    if new_password.is_empty() {
        return Err(ShopError::InvalidRequest("new password is required".to_string()));
    }
    let user = load_user(store, user_id).await?;
    if !verify_password(old_password, &user.password_hash)? {
        return Err(ShopError::IncorrectPassword);
    }

    let hash = hash_password(new_password)?;
    store
        .update_user_by_id(user_id, UserUpdate::password(hash))
        .await?;
    info!("Password changed for user {}", user_id);
    Ok(())
}

/// Reads of the user before giving up on a contended address book
const ADDRESS_BOOK_ATTEMPTS: usize = 3;

/// Read-modify-write of the address book. The write only lands if nothing
/// else changed the book since the read; otherwise the edit is replayed on a
/// fresh copy.
async fn update_address_book(
    store: &dyn Store,
    user_id: &str,
    edit: impl Fn(&mut User) -> ShopResult<()>,
) -> ShopResult<UserProfile> {
    for attempt in 1..=ADDRESS_BOOK_ATTEMPTS {
        let mut user = load_user(store, user_id).await?;
        edit(&mut user)?;
        if store.replace_address_book(&user).await? {
            return Ok(user.profile());
        }
        debug!(
            "Address book of user {} changed during edit (attempt {})",
            user_id, attempt
        );
    }
    Err(ShopError::Conflict("address book"))
}

/// Append an address (not made default)
pub async fn add_address(
    store: &dyn Store,
    user_id: &str,
    address: PostalAddress,
) -> ShopResult<UserProfile> {
    update_address_book(store, user_id, |user| {
        user.add_address(address.clone());
        Ok(())
    })
    .await
}

/// Replace an address in place
pub async fn edit_address(
    store: &dyn Store,
    user_id: &str,
    address_id: &str,
    address: PostalAddress,
) -> ShopResult<UserProfile> {
    update_address_book(store, user_id, |user| user.edit_address(address_id, address.clone()))
        .await
}

/// Remove an address; the last one cannot be removed
pub async fn delete_address(
    store: &dyn Store,
    user_id: &str,
    address_id: &str,
) -> ShopResult<UserProfile> {
    update_address_book(store, user_id, |user| {
        user.remove_address(address_id).map(|_| ())
    })
    .await
}

/// Make an address the default
pub async fn set_default_address(
    store: &dyn Store,
    user_id: &str,
    address_id: &str,
) -> ShopResult<UserProfile> {
    update_address_book(store, user_id, |user| user.set_default_address(address_id)).await
}
