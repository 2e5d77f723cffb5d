//! # Schema Bootstrap
//!
//! Runs once per established connection:
//! - unique indexes on `users.email` and `featuredsets.code`
//! - the `orders` counter, raised to the highest stored order number

use crate::documents::{CounterDoc, OrderDoc};
use mongodb::bson::{doc, Document};
use mongodb::options::IndexOptions;
use mongodb::{Database, IndexModel};
use tracing::{debug, info};

pub const USERS: &str = "users";
pub const PRODUCTS: &str = "products";
pub const ORDERS: &str = "orders";
pub const FEATURED_SETS: &str = "featuredsets";
pub const COUNTERS: &str = "counters";

/// Counter document used for order numbers
pub const ORDER_COUNTER: &str = "orders";

fn unique_index(field: &str, name: &str) -> IndexModel {
    let mut keys = Document::new();
    keys.insert(field, 1);
    IndexModel::builder()
        .keys(keys)
        .options(
            IndexOptions::builder()
                .unique(true)
                .name(name.to_string())
                .build(),
        )
        .build()
}

/// Create indexes and seed counters. Safe to run repeatedly.
pub async fn bootstrap(db: &Database) -> mongodb::error::Result<()> {
    db.collection::<Document>(USERS)
        .create_index(unique_index("email", "users_email_unique"))
        .await?;
    db.collection::<Document>(FEATURED_SETS)
        .create_index(unique_index("code", "featuredsets_code_unique"))
        .await?;
    db.collection::<Document>(ORDERS)
        .create_index(IndexModel::builder().keys(doc! { "user_id": 1, "date": -1 }).build())
        .await?;
    debug!("Indexes ensured");

    let highest = highest_order_number(db).await?;
    db.collection::<CounterDoc>(COUNTERS)
        .update_one(
            doc! { "_id": ORDER_COUNTER },
            doc! { "$max": { "seq": highest } },
        )
        .upsert(true)
        .await?;
    info!("Order counter at or above {}", highest);

    Ok(())
}

async fn highest_order_number(db: &Database) -> mongodb::error::Result<i64> {
    let latest = db
        .collection::<OrderDoc>(ORDERS)
        .find_one(doc! { "number": { "$exists": true } })
        .sort(doc! { "number": -1 })
        .await?;
    Ok(latest.map(|order| order.number).unwrap_or(0))
}
