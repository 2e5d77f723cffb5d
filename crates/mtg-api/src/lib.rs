//! # mtg-api
//!
//! HTTP API layer for the mtg-store backend.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - JWT caller extraction (`Authorization: JWT <token>`)
//! - REST endpoints for products, featured sets, accounts and orders
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | GET | `/api/products` | List products |
//! | GET | `/api/products/{id}` | Get product |
//! | GET | `/api/products/set/{code}` | List products of a set |
//! | POST | `/api/products/collection` | Products for a list of ids |
//! | POST | `/api/products` | Create product (admin) |
//! | PUT | `/api/products/{id}` | Edit product (admin) |
//! | GET | `/api/sets` | List featured sets |
//! | GET | `/api/sets/{code}` | Get featured set |
//! | POST | `/api/sets` | Create featured set (admin) |
//! | PUT | `/api/sets/{id}` | Edit featured set (admin) |
//! | POST | `/api/user/register` | Register |
//! | POST | `/api/user/login` | Log in, returns a token |
//! | GET | `/api/user` | Caller's profile |
//! | GET | `/api/user/orders` | Caller's orders |
//! | POST | `/api/user/orders` | Check out |

pub mod error;
pub mod extract;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::{AppConfig, AppState, StoreBackend};
