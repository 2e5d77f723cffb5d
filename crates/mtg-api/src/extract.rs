//! # Extractors
//!
//! Caller identity from the `Authorization: JWT <token>` header, plus JSON and
//! query extractors whose rejections use the API error body.

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{FromRequest, FromRequestParts, Multipart, Request},
    http::{header::AUTHORIZATION, request::Parts},
};
use mtg_core::Identity;

/// Any authenticated caller.
///
/// ```rust,ignore
/// async fn profile(AuthUser(caller): AuthUser) -> impl IntoResponse {
///     format!("Hello, {}!", caller.email)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

/// An authenticated caller with the admin flag set
#[derive(Debug, Clone)]
pub struct AdminUser(pub Identity);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        let identity = state.tokens.verify_header(header)?;
        Ok(AuthUser(identity))
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthUser(identity) = AuthUser::from_request_parts(parts, state).await?;
        identity.require_admin()?;
        Ok(AdminUser(identity))
    }
}

/// `axum::Json` with [`ApiError`] rejections
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Query` with [`ApiError`] rejections
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// `axum::extract::Multipart` with [`ApiError`] rejections
pub struct ApiMultipart(pub Multipart);

impl<S> FromRequest<S> for ApiMultipart
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let multipart = Multipart::from_request(req, state).await?;
        Ok(ApiMultipart(multipart))
    }
}
