//! # Routes
//!
//! Axum router configuration for the storefront API.

use crate::handlers::{self, orders, products, sets, user};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Request body cap; product images and set heroes are further limited to 1 MiB
pub const BODY_LIMIT_BYTES: usize = 2 * 1024 * 1024;

/// Create the main application router
///
/// Routes:
/// - Catalog (public reads, admin writes):
///   - GET  /api/products, /api/products/{id}, /api/products/set/{code}
///   - POST /api/products/collection
///   - POST /api/products, PUT /api/products/{id} (admin, multipart)
///   - GET  /api/sets, /api/sets/{code}
///   - POST /api/sets (admin, multipart), PUT /api/sets/{id} (admin)
///
/// - Account (bearer token):
///   - POST /api/user/register, /api/user/login
///   - GET  /api/user, /api/user/is-admin
///   - PUT  /api/user/password
///   - POST /api/user/address, PUT|DELETE /api/user/address/{id},
///     PUT /api/user/address/{id}/default
///   - GET|POST /api/user/orders, GET /api/user/orders/{id}
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let product_routes = Router::new()
        .route("/", get(products::list_products).post(products::create_product))
        .route("/collection", post(products::products_collection))
        .route("/set/{code}", get(products::list_products_by_set))
        .route("/{id}", get(products::get_product).put(products::edit_product));

    let set_routes = Router::new()
        .route("/", get(sets::list_sets).post(sets::create_set))
        // GET takes a set code, PUT a set id
        .route("/{key}", get(sets::get_set).put(sets::edit_set));

    let user_routes = Router::new()
        .route("/", get(user::profile))
        .route("/register", post(user::register))
        .route("/login", post(user::login))
        .route("/is-admin", get(user::is_admin))
        .route("/password", put(user::change_password))
        .route("/address", post(user::add_address))
        .route(
            "/address/{id}",
            put(user::edit_address).delete(user::delete_address),
        )
        .route("/address/{id}/default", put(user::set_default_address))
        .route("/orders", get(orders::list_orders).post(orders::place_order))
        .route("/orders/{id}", get(orders::get_order));

    let api_routes = Router::new()
        .route("/", get(handlers::api_ready))
        .nest("/products", product_routes)
        .nest("/sets", set_routes)
        .nest("/user", user_routes);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .nest("/api", api_routes)
        // Middleware, outermost first
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES)),
        )
        // State
        .with_state(state)
}
