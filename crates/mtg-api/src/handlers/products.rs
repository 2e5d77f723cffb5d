//! Product catalog handlers.

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
use mtg_core::pagination::{PRODUCTS_PAGE_SIZE, SET_PRODUCTS_PAGE_SIZE};
use mtg_core::product::DEFAULT_PRODUCT_TYPE;
use mtg_core::{
    catalog, NewProduct, PageQuery, Pagination, ProductFilter, ProductUpdate, ShopError, ShopResult,
};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

/// Cart contents lookup
#[derive(Debug, Deserialize)]
pub struct CollectionRequest {
    #[serde(rename = "productIdList", default)]
    pub product_id_list: Vec<String>,
}

/// `GET /api/products`
pub async fn list_products(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let pagination = Pagination::from_query(&query, PRODUCTS_PAGE_SIZE)?;
    let page = catalog::list_products(state.store.as_ref(), &ProductFilter::all(), pagination).await?;
    Ok(listing("productList", page))
}

/// `GET /api/products/set/{code}`
pub async fn list_products_by_set(
    State(state): State<AppState>,
    Path(code): Path<String>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let pagination = Pagination::from_query(&query, SET_PRODUCTS_PAGE_SIZE)?;
    let page =
        catalog::list_products(state.store.as_ref(), &ProductFilter::by_set(code), pagination).await?;
    Ok(listing("productList", page))
}

/// `GET /api/products/{id}`
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let product = catalog::product_details(state.store.as_ref(), &id).await?;
    Ok(Json(json!({ "productDetails": product })))
}

/// `POST /api/products/collection`
pub async fn products_collection(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CollectionRequest>,
) -> ApiResult<impl IntoResponse> {
    let products = catalog::products_collection(state.store.as_ref(), &request.product_id_list).await?;
    Ok(Json(json!({ "products": products })))
}

fn new_product(form: &FormData) -> ShopResult<NewProduct> {
    let price = form
        .parse::<f64>("price")?
        .ok_or_else(|| ShopError::InvalidRequest("price is required".to_string()))?;
    let mut product = NewProduct::new(form.required("name")?, price)
        .with_type(form.text("prodType").unwrap_or_else(|| DEFAULT_PRODUCT_TYPE.to_string()))
        .with_stock(form.parse("stock")?.unwrap_or(0));
    if let Some(description) = form.text("description") {
        product = product.with_description(description);
    }
    if let Some(card_set) = form.text("cardSet") {
        product = product.with_card_set(card_set);
    }
    Ok(product)
}

fn product_update(form: &FormData) -> ShopResult<ProductUpdate> {
    Ok(ProductUpdate {
        name: form.text("name"),
        prod_type: form.text("prodType"),
        description: form.text("description"),
        card_set: form.text("cardSet"),
        price: form.parse("price")?,
        stock: form.parse("stock")?,
        image: None,
    })
}

/// `POST /api/products` (admin, multipart with optional `image` file)
#[instrument(skip_all, fields(admin = %admin.email))]
pub async fn create_product(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiMultipart(multipart): ApiMultipart,
) -> ApiResult<impl IntoResponse> {
    let mut form = FormData::read(multipart).await?;
    let product = new_product(&form)?;
    let image = form.take_file("image");

    let product =
        catalog::create_product(state.store.as_ref(), state.images.as_ref(), product, image).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "form processed",
            "product": product,
        })),
    ))
}

/// `PUT /api/products/{id}` (admin, multipart; a new `image` replaces the old one)
#[instrument(skip_all, fields(admin = %admin.email, product_id = %id))]
pub async fn edit_product(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    ApiMultipart(multipart): ApiMultipart,
) -> ApiResult<impl IntoResponse> {
    let mut form = FormData::read(multipart).await?;
    let update = product_update(&form)?;
    let image = form.take_file("image");

    let product =
        catalog::edit_product(state.store.as_ref(), state.images.as_ref(), &id, update, image).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "product updated",
            "product": product,
        })),
    ))
}
