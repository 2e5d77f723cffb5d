//! Account handlers: registration, login, profile, password and address book.

use crate::error::ApiResult;
use crate::extract::{ApiJson, AuthUser};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use mtg_core::{account, Credentials, PostalAddress, Registration, TokenTtl, UserProfile};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

/// Password change form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub old_password: String,
    pub new_password: String,
}

fn updated(message: &str, user: UserProfile) -> impl IntoResponse {
    (
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": message,
            "user": user,
        })),
    )
}

/// `POST /api/user/register`
pub async fn register(
    State(state): State<AppState>,
    ApiJson(registration): ApiJson<Registration>,
) -> ApiResult<impl IntoResponse> {
    account::register(state.store.as_ref(), registration).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "message": "new user registered" })),
    ))
}

/// `POST /api/user/login`
#[instrument(skip_all, fields(email = %credentials.email))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> ApiResult<impl IntoResponse> {
    let identity = account::login(state.store.as_ref(), &credentials).await?;
    let token = state
        .tokens
        .issue(&identity, TokenTtl::from_keep_logged(credentials.keep_logged))?;

    info!("User {} logged in", identity.id);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "token": token })),
    ))
}

/// `GET /api/user`
pub async fn profile(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> ApiResult<impl IntoResponse> {
    let user = account::profile(state.store.as_ref(), &caller.id).await?;
    Ok(Json(json!({ "user": user })))
}

/// `GET /api/user/is-admin`
pub async fn is_admin(AuthUser(caller): AuthUser) -> impl IntoResponse {
    Json(json!({ "isAdmin": caller.is_admin }))
}

/// `PUT /api/user/password`
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiJson(change): ApiJson<PasswordChange>,
) -> ApiResult<impl IntoResponse> {
    account::change_password(
        state.store.as_ref(),
        &caller.id,
        &change.old_password,
        &change.new_password,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "message": "password updated" })),
    ))
}

/// `POST /api/user/address`
pub async fn add_address(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiJson(address): ApiJson<PostalAddress>,
) -> ApiResult<impl IntoResponse> {
    let user = account::add_address(state.store.as_ref(), &caller.id, address).await?;
    Ok(updated("address added", user))
}

/// `PUT /api/user/address/{id}`
pub async fn edit_address(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(address_id): Path<String>,
    ApiJson(address): ApiJson<PostalAddress>,
) -> ApiResult<impl IntoResponse> {
    let user = account::edit_address(state.store.as_ref(), &caller.id, &address_id, address).await?;
    Ok(updated("address updated", user))
}

/// `DELETE /api/user/address/{id}`
pub async fn delete_address(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(address_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let user = account::delete_address(state.store.as_ref(), &caller.id, &address_id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "address deleted",
        "user": user,
    })))
}

/// `PUT /api/user/address/{id}/default`
pub async fn set_default_address(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(address_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let user = account::set_default_address(state.store.as_ref(), &caller.id, &address_id).await?;
    Ok(updated("default address updated", user))
}
