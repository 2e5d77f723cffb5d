//! End-to-end tests against the in-memory store and image store.

use axum::http::{header::AUTHORIZATION, HeaderValue, StatusCode};
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use mtg_api::{create_router, AppState};
use mtg_core::password::hash_password;
use mtg_core::{Address, Identity, NewUser, PostalAddress, TokenSigner, TokenTtl, UserStore};
use serde_json::{json, Value};

struct TestApp {
    server: TestServer,
    state: AppState,
}

fn app() -> TestApp {
    let state = AppState::in_memory(TokenSigner::new("test-secret"));
    let server = TestServer::new(create_router(state.clone())).unwrap();
    TestApp { server, state }
}

fn auth(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("JWT {}", token)).unwrap()
}

fn registration(name: &str, email: &str) -> Value {
    json!({
        "name": name,
        "email": email,
        "password": "hunter22",
        "password2": "hunter22",
        "street": "1 Main St",
        "city": "Toronto",
        "province": "ON",
        "postal": "M5V 2T6",
    })
}

impl TestApp {
    /// Register, log in and return `(user id, token)`
    async fn user(&self, name: &str, email: &str) -> (String, String) {
        self.server
            .post("/api/user/register")
            .json(&registration(name, email))
            .await
            .assert_status(StatusCode::CREATED);

        let login: Value = self
            .server
            .post("/api/user/login")
            .json(&json!({ "email": email, "password": "hunter22" }))
            .await
            .json();
        let token = login["token"].as_str().unwrap().to_string();

        let profile: Value = self
            .server
            .get("/api/user")
            .add_header(AUTHORIZATION, auth(&token))
            .await
            .json();
        let id = profile["user"]["_id"].as_str().unwrap().to_string();

        (id, token)
    }

    /// Admin account inserted straight into the store
    async fn admin(&self) -> String {
        let admin = self
            .state
            .store
            .create_user(NewUser {
                email: "admin@mtg.store".to_string(),
                name: "Admin".to_string(),
                phone: None,
                addresses: vec![Address::from_postal(PostalAddress::default())],
                default_address: 0,
                password_hash: hash_password("changeme").unwrap(),
                is_admin: true,
            })
            .await
            .unwrap();

        self.state
            .tokens
            .issue(&Identity::new(admin.id, admin.email, true), TokenTtl::Expiring)
            .unwrap()
    }

    async fn create_product(&self, token: &str, name: &str, price: &str, stock: &str) -> Value {
        let form = MultipartForm::new()
            .add_text("name", name)
            .add_text("cardSet", "MH3")
            .add_text("price", price)
            .add_text("stock", stock)
            .add_part(
                "image",
                Part::bytes(vec![137, 80, 78, 71]).file_name("mh3-box.png").mime_type("image/png"),
            );

        let response = self
            .server
            .post("/api/products")
            .add_header(AUTHORIZATION, auth(token))
            .multipart(form)
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json::<Value>()["product"].clone()
    }
}

fn order_payload(user_id: &str) -> Value {
    json!({
        "user_id": user_id,
        "date": "2024-06-20T12:00:00Z",
        "address": {
            "street": "1 Main St",
            "city": "Toronto",
            "province": "ON",
            "postal": "M5V 2T6",
        },
        "products": [
            { "prodType": "sealed", "prod_id": "p1", "name": "MH3 Play Booster Box", "cardSet": "MH3", "qty": 1, "price": 289.99 },
            { "prodType": "single", "prod_id": "p2", "name": "The One Ring", "cardSet": "LTR", "qty": 2, "price": 69.0 },
        ],
    })
}

// =============================================================================
// Service routes
// =============================================================================

#[tokio::test]
async fn test_root_and_api_ready() {
    let app = app();

    let root = app.server.get("/").await;
    root.assert_status_ok();
    assert_eq!(root.text(), "Access API through /api route");

    let api: Value = app.server.get("/api").await.json();
    assert_eq!(api["message"], "API ready");

    let health: Value = app.server.get("/health").await.json();
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["store"], "memory");
}

// =============================================================================
// Accounts
// =============================================================================

#[tokio::test]
async fn test_register_login_profile_hides_password() {
    let app = app();
    let (id, token) = app.user("Alice", "alice@example.com").await;

    let response = app
        .server
        .get("/api/user")
        .add_header(AUTHORIZATION, auth(&token))
        .await;
    response.assert_status_ok();

    let user = &response.json::<Value>()["user"];
    assert_eq!(user["_id"], id.as_str());
    assert_eq!(user["email"], "alice@example.com");
    assert_eq!(user["isAdmin"], false);
    assert_eq!(user["defaultAddress"], 0);
    assert_eq!(user["address"].as_array().unwrap().len(), 1);
    assert!(user.get("password").is_none());
    assert!(user.get("password_hash").is_none());

    let is_admin: Value = app
        .server
        .get("/api/user/is-admin")
        .add_header(AUTHORIZATION, auth(&token))
        .await
        .json();
    assert_eq!(is_admin["isAdmin"], false);
}

#[tokio::test]
async fn test_duplicate_registration_is_rejected() {
    let app = app();
    app.user("Alice", "alice@example.com").await;

    let response = app
        .server
        .post("/api/user/register")
        .json(&registration("Alice Again", "alice@example.com"))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json::<Value>()["success"], false);
}

#[tokio::test]
async fn test_login_failures() {
    let app = app();
    app.user("Alice", "alice@example.com").await;

    let wrong = app
        .server
        .post("/api/user/login")
        .json(&json!({ "email": "alice@example.com", "password": "nope" }))
        .await;
    wrong.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(wrong.json::<Value>()["message"], "The password is incorrect");

    let unknown = app
        .server
        .post("/api/user/login")
        .json(&json!({ "email": "bob@example.com", "password": "hunter22" }))
        .await;
    unknown.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_missing_or_bad_token_is_unauthenticated() {
    let app = app();

    let response = app.server.get("/api/user").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["success"], false);

    app.server
        .get("/api/user")
        .add_header(AUTHORIZATION, HeaderValue::from_static("Bearer abc"))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    app.server
        .get("/api/user/orders")
        .add_header(AUTHORIZATION, auth("not-a-jwt"))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_address_book() {
    let app = app();
    let (_, token) = app.user("Alice", "alice@example.com").await;

    let added: Value = app
        .server
        .post("/api/user/address")
        .add_header(AUTHORIZATION, auth(&token))
        .json(&json!({ "street": "2 Side St", "city": "Ottawa", "province": "ON", "postal": "K1A 0A6" }))
        .await
        .json();
    let addresses = added["user"]["address"].as_array().unwrap().clone();
    assert_eq!(addresses.len(), 2);
    let first = addresses[0]["_id"].as_str().unwrap().to_string();
    let second = addresses[1]["_id"].as_str().unwrap().to_string();

    let defaulted: Value = app
        .server
        .put(&format!("/api/user/address/{}/default", second))
        .add_header(AUTHORIZATION, auth(&token))
        .await
        .json();
    assert_eq!(defaulted["user"]["defaultAddress"], 1);

    let deleted = app
        .server
        .delete(&format!("/api/user/address/{}", first))
        .add_header(AUTHORIZATION, auth(&token))
        .await;
    deleted.assert_status_ok();
    let user = &deleted.json::<Value>()["user"];
    assert_eq!(user["address"].as_array().unwrap().len(), 1);
    assert_eq!(user["defaultAddress"], 0);

    app.server
        .delete(&format!("/api/user/address/{}", second))
        .add_header(AUTHORIZATION, auth(&token))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_change_password() {
    let app = app();
    let (_, token) = app.user("Alice", "alice@example.com").await;

    app.server
        .put("/api/user/password")
        .add_header(AUTHORIZATION, auth(&token))
        .json(&json!({ "oldPassword": "wrong", "newPassword": "s3cret!" }))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    app.server
        .put("/api/user/password")
        .add_header(AUTHORIZATION, auth(&token))
        .json(&json!({ "oldPassword": "hunter22", "newPassword": "s3cret!" }))
        .await
        .assert_status(StatusCode::CREATED);

    app.server
        .post("/api/user/login")
        .json(&json!({ "email": "alice@example.com", "password": "s3cret!" }))
        .await
        .assert_status(StatusCode::CREATED);
}

// =============================================================================
// Catalog
// =============================================================================

#[tokio::test]
async fn test_admin_creates_product() {
    let app = app();
    let token = app.admin().await;

    let product = app.create_product(&token, "MH3 Play Booster Box", "10", "5").await;
    let id = product["_id"].as_str().unwrap();
    assert!(product["image"].as_str().unwrap().starts_with("mtg-store/image/"));

    let response = app.server.get(&format!("/api/products/{}", id)).await;
    response.assert_status_ok();
    let details = &response.json::<Value>()["productDetails"];
    assert_eq!(details["name"], "MH3 Play Booster Box");
    assert_eq!(details["price"], 10.0);
    assert_eq!(details["stock"], 5);
    assert_eq!(details["prodType"], "sealed");

    let by_set: Value = app.server.get("/api/products/set/MH3").await.json();
    assert_eq!(by_set["count"], 1);
    assert_eq!(by_set["pageSize"], 4);

    let collection: Value = app
        .server
        .post("/api/products/collection")
        .json(&json!({ "productIdList": [id, "missing"] }))
        .await
        .json();
    assert_eq!(collection["products"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_admin_edits_product() {
    let app = app();
    let token = app.admin().await;
    let product = app.create_product(&token, "MH3 Bundle", "50", "3").await;
    let id = product["_id"].as_str().unwrap();

    let response = app
        .server
        .put(&format!("/api/products/{}", id))
        .add_header(AUTHORIZATION, auth(&token))
        .multipart(MultipartForm::new().add_text("price", "45.5"))
        .await;
    response.assert_status(StatusCode::CREATED);

    let updated = &response.json::<Value>()["product"];
    assert_eq!(updated["price"], 45.5);
    assert_eq!(updated["name"], "MH3 Bundle");
    assert_eq!(updated["stock"], 3);
}

#[tokio::test]
async fn test_non_admin_cannot_create_product() {
    let app = app();
    let (_, token) = app.user("Alice", "alice@example.com").await;

    let response = app
        .server
        .post("/api/products")
        .add_header(AUTHORIZATION, auth(&token))
        .multipart(MultipartForm::new().add_text("name", "Fake").add_text("price", "1"))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_oversized_image_is_rejected() {
    let app = app();
    let token = app.admin().await;

    let form = MultipartForm::new()
        .add_text("name", "Big Picture")
        .add_text("price", "1")
        .add_part(
            "image",
            Part::bytes(vec![0u8; 1024 * 1024]).file_name("big.png").mime_type("image/png"),
        );

    let response = app
        .server
        .post("/api/products")
        .add_header(AUTHORIZATION, auth(&token))
        .multipart(form)
        .await;
    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);

    let listing: Value = app.server.get("/api/products").await.json();
    assert_eq!(listing["count"], 0);
}

#[tokio::test]
async fn test_product_pagination() {
    let app = app();

    let empty = app.server.get("/api/products").await;
    empty.assert_status_ok();
    let body = empty.json::<Value>();
    assert_eq!(body["count"], 0);
    assert_eq!(body["pageSize"], 20);
    assert_eq!(body["pageNum"], 1);
    assert_eq!(body["productList"], json!([]));

    let token = app.admin().await;
    for i in 0..3 {
        app.create_product(&token, &format!("Product {}", i), "1", "1").await;
    }

    let second: Value = app
        .server
        .get("/api/products")
        .add_query_param("pageSize", 2)
        .add_query_param("pageNum", 2)
        .await
        .json();
    assert_eq!(second["productList"].as_array().unwrap().len(), 1);
    assert_eq!(second["count"], 3);

    app.server
        .get("/api/products")
        .add_query_param("pageSize", 2)
        .add_query_param("pageNum", 3)
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    app.server
        .get("/api/products")
        .add_query_param("pageNum", 0)
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_featured_sets() {
    let app = app();
    let token = app.admin().await;

    let form = MultipartForm::new()
        .add_text("name", "Modern Horizons 3")
        .add_text("code", "MH3")
        .add_text("released_at", "2024-06-14")
        .add_text("featured", "true")
        .add_part(
            "hero",
            Part::bytes(vec![1, 2, 3]).file_name("mh3-hero.jpg").mime_type("image/jpeg"),
        );
    let created = app
        .server
        .post("/api/sets")
        .add_header(AUTHORIZATION, auth(&token))
        .multipart(form)
        .await;
    created.assert_status(StatusCode::CREATED);
    let set_id = created.json::<Value>()["set"]["_id"].as_str().unwrap().to_string();

    let set: Value = app.server.get("/api/sets/MH3").await.json();
    assert_eq!(set["set"]["name"], "Modern Horizons 3");
    assert_eq!(set["set"]["featured"], true);
    assert_eq!(set["set"]["hero"], "mtg-store/hero/mh3-hero");

    let duplicate = app
        .server
        .post("/api/sets")
        .add_header(AUTHORIZATION, auth(&token))
        .multipart(MultipartForm::new().add_text("name", "Again").add_text("code", "MH3"))
        .await;
    duplicate.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let edited = app
        .server
        .put(&format!("/api/sets/{}", set_id))
        .add_header(AUTHORIZATION, auth(&token))
        .json(&json!({ "featured": false }))
        .await;
    edited.assert_status(StatusCode::CREATED);
    assert_eq!(edited.json::<Value>()["set"]["featured"], false);

    let listing: Value = app.server.get("/api/sets").await.json();
    assert_eq!(listing["count"], 1);
    assert_eq!(listing["featuredSetList"][0]["code"], "MH3");

    app.server
        .get("/api/sets/XYZ")
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

// =============================================================================
// Orders
// =============================================================================

#[tokio::test]
async fn test_checkout_list_and_owner_only_details() {
    let app = app();
    let (alice_id, alice) = app.user("Alice", "alice@example.com").await;
    let (_, bob) = app.user("Bob", "bob@example.com").await;

    let placed = app
        .server
        .post("/api/user/orders")
        .add_header(AUTHORIZATION, auth(&alice))
        .json(&order_payload(&alice_id))
        .await;
    placed.assert_status(StatusCode::CREATED);
    let order = placed.json::<Value>()["order"].clone();
    let order_id = order["_id"].as_str().unwrap().to_string();
    assert_eq!(order["number"], 1);
    assert_eq!(order["products"].as_array().unwrap().len(), 2);

    let listing: Value = app
        .server
        .get("/api/user/orders")
        .add_header(AUTHORIZATION, auth(&alice))
        .await
        .json();
    assert_eq!(listing["count"], 1);
    assert_eq!(listing["pageSize"], 10);
    assert_eq!(listing["orders"][0]["_id"], order_id.as_str());

    let profile: Value = app
        .server
        .get("/api/user")
        .add_header(AUTHORIZATION, auth(&alice))
        .await
        .json();
    assert_eq!(profile["user"]["orders"], json!([order_id.clone()]));

    app.server
        .get(&format!("/api/user/orders/{}", order_id))
        .add_header(AUTHORIZATION, auth(&alice))
        .await
        .assert_status_ok();

    let other = app
        .server
        .get(&format!("/api/user/orders/{}", order_id))
        .add_header(AUTHORIZATION, auth(&bob))
        .await;
    other.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(other.json::<Value>()["success"], false);
}

#[tokio::test]
async fn test_order_numbers_increase() {
    let app = app();
    let (alice_id, alice) = app.user("Alice", "alice@example.com").await;

    let mut numbers = Vec::new();
    for _ in 0..3 {
        let placed: Value = app
            .server
            .post("/api/user/orders")
            .add_header(AUTHORIZATION, auth(&alice))
            .json(&order_payload(&alice_id))
            .await
            .json();
        numbers.push(placed["order"]["number"].as_u64().unwrap());
    }
    assert_eq!(numbers, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_invalid_orders() {
    let app = app();
    let (alice_id, alice) = app.user("Alice", "alice@example.com").await;
    let (bob_id, _) = app.user("Bob", "bob@example.com").await;

    let mut empty = order_payload(&alice_id);
    empty["products"] = json!([]);
    app.server
        .post("/api/user/orders")
        .add_header(AUTHORIZATION, auth(&alice))
        .json(&empty)
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let mut no_address = order_payload(&alice_id);
    no_address.as_object_mut().unwrap().remove("address");
    app.server
        .post("/api/user/orders")
        .add_header(AUTHORIZATION, auth(&alice))
        .json(&no_address)
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    app.server
        .post("/api/user/orders")
        .add_header(AUTHORIZATION, auth(&alice))
        .json(&order_payload(&bob_id))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let listing: Value = app
        .server
        .get("/api/user/orders")
        .add_header(AUTHORIZATION, auth(&alice))
        .await
        .json();
    assert_eq!(listing["count"], 0);
}
