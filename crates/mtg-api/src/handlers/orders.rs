//! Order handlers; every route is scoped to the authenticated caller.

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiQuery, AuthUser};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use mtg_core::pagination::ORDERS_PAGE_SIZE;
use mtg_core::{checkout, OrderDraft, PageQuery, Pagination};
use serde_json::json;
use tracing::instrument;

/// `GET /api/user/orders`
pub async fn list_orders(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let pagination = Pagination::from_query(&query, ORDERS_PAGE_SIZE)?;
    let page = checkout::list_orders(state.store.as_ref(), &caller.id, pagination).await?;
    Ok(super::listing("orders", page))
}

/// `POST /api/user/orders`
#[instrument(skip_all, fields(user_id = %caller.id))]
pub async fn place_order(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiJson(draft): ApiJson<OrderDraft>,
) -> ApiResult<impl IntoResponse> {
    let order = checkout::place_order(state.store.as_ref(), &caller, draft).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "order processed",
            "order": order,
        })),
    ))
}

/// `GET /api/user/orders/{id}`
pub async fn get_order(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(order_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let order = checkout::order_details(state.store.as_ref(), &caller, &order_id).await?;
    Ok(Json(json!({ "order": order })))
}
