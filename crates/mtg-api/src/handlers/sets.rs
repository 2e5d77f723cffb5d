//! Featured-set handlers.

use super::form::FormData;
use super::listing;
use crate::error::ApiResult;
use crate::extract::{AdminUser, ApiJson, ApiMultipart, ApiQuery};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use mtg_core::pagination::SETS_PAGE_SIZE;
use mtg_core::{catalog, NewFeaturedSet, PageQuery, Pagination, SetUpdate, ShopError, ShopResult};
use serde_json::json;
use tracing::instrument;

/// `GET /api/sets`
pub async fn list_sets(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let pagination = Pagination::from_query(&query, SETS_PAGE_SIZE)?;
    let page = catalog::list_sets(state.store.as_ref(), pagination).await?;
    Ok(listing("featuredSetList", page))
}

/// `GET /api/sets/{code}`
pub async fn get_set(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let set = catalog::set_by_code(state.store.as_ref(), &code).await?;
    Ok(Json(json!({ "set": set })))
}

/// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates (midnight UTC)
fn parse_release_date(raw: &str) -> ShopResult<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|at| at.and_utc())
        .ok_or_else(|| ShopError::InvalidRequest(format!("invalid released_at: {}", raw)))
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.to_ascii_lowercase().as_str(), "true" | "on" | "1" | "yes")
}

fn new_set(form: &FormData) -> ShopResult<NewFeaturedSet> {
    let mut set = NewFeaturedSet::new(form.required("name")?, form.required("code")?);
    if let Some(raw) = form.text("released_at") {
        set = set.released(parse_release_date(&raw)?);
    }
    if form.text("featured").is_some_and(|raw| parse_flag(&raw)) {
        set = set.featured();
    }
    set.scryfall_id = form.text("scryfall_id");
    Ok(set)
}

/// `POST /api/sets` (admin, multipart with optional `hero` file)
#[instrument(skip_all, fields(admin = %admin.email))]
pub async fn create_set(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiMultipart(multipart): ApiMultipart,
) -> ApiResult<impl IntoResponse> {
    let mut form = FormData::read(multipart).await?;
    let set = new_set(&form)?;
    let hero = form.take_file("hero");

    let set = catalog::create_set(state.store.as_ref(), state.images.as_ref(), set, hero).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "form processed",
            "set": set,
        })),
    ))
}

/// `PUT /api/sets/{id}` (admin, JSON)
#[instrument(skip_all, fields(admin = %admin.email, set_id = %id))]
pub async fn edit_set(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<SetUpdate>,
) -> ApiResult<impl IntoResponse> {
    let set = catalog::edit_set(state.store.as_ref(), &id, update).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "set updated",
            "set": set,
        })),
    ))
}
