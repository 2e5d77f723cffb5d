//! # Request Handlers
//!
//! Axum request handlers, one module per resource. Handlers only translate
//! between HTTP and the `mtg_core` services.

pub mod form;
pub mod orders;
pub mod products;
pub mod sets;
pub mod user;

use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use mtg_core::Page;
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Paginated listing body: the items under `key` next to
/// `pageSize`, `pageNum` and `count`
pub(crate) fn listing<T: Serialize>(key: &str, page: Page<T>) -> Json<Value> {
    let mut body = Map::new();
    body.insert(key.to_string(), json!(page.items));
    body.insert("pageSize".to_string(), json!(page.page_size));
    body.insert("pageNum".to_string(), json!(page.page_num));
    body.insert("count".to_string(), json!(page.count));
    Json(Value::Object(body))
}

/// `GET /`
pub async fn root() -> &'static str {
    "Access API through /api route"
}

/// `GET /api`
pub async fn api_ready() -> impl IntoResponse {
    Json(json!({ "message": "API ready" }))
}

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let database = match &state.mongo {
        Some(connection) => connection.status().await,
        None => "n/a",
    };

    Json(json!({
        "status": "healthy",
        "service": "mtg-store",
        "version": env!("CARGO_PKG_VERSION"),
        "store": state.store.backend_name(),
        "database": database,
        "images": state.images.provider_name(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mtg_core::Pagination;

    #[test]
    fn test_listing_body() {
        let page = Pagination::new(2, 1).unwrap().page(vec!["a", "b"], 5);
        let Json(body) = listing("productList", page);

        assert_eq!(body["productList"], json!(["a", "b"]));
        assert_eq!(body["pageSize"], 2);
        assert_eq!(body["pageNum"], 1);
        assert_eq!(body["count"], 5);
    }
}
