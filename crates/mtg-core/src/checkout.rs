//! # Checkout Workflow
//!
//! Each order goes through `validated → numbered → persisted → linked`:
//!
//! 1. the payload must carry `user_id`, `date`, `address` and at least one
//!    product, and `user_id` must be the caller
//! 2. the order number comes from the store's atomic counter
//! 3. the order document is inserted
//! 4. the order id is appended to the owner's order list
//!
//! Step 4 can fail after step 3 succeeded. The order is kept and the failure
//! reported; [`reconcile`] later links any order its owner does not reference.

use crate::auth::Identity;
use crate::error::{ShopError, ShopResult};
use crate::order::{Order, OrderDraft};
use crate::pagination::{Page, Pagination};
use crate::store::Store;
use tracing::{error, info, instrument, warn};

/// Validate, number, persist and link a new order
#[instrument(skip(store, caller, draft), fields(user_id = %caller.id))]
pub async fn place_order(store: &dyn Store, caller: &Identity, draft: OrderDraft) -> ShopResult<Order> {
    let valid = draft.validate()?;
    if valid.user_id != caller.id {
        return Err(ShopError::Unauthorized(
            "orders can only be placed for your own account".to_string(),
        ));
    }

    let number = store.next_order_number().await?;
    let order = store.create_order(valid.numbered(number)).await?;

    if let Err(e) = store.push_user_order(&order.user_id, &order.id).await {
        error!(
            order_id = %order.id,
            number = order.number,
            "Order persisted but not linked to user: {}", e
        );
        return Err(ShopError::upstream(
            store.backend_name(),
            format!("order {} saved but not linked to its user: {}", order.id, e),
        ));
    }

    info!(
        "Order processed: id={}, number={}, items={}, total={:.2}",
        order.id,
        order.number,
        order.item_count(),
        order.total()
    );
    Ok(order)
}

/// Link every order owned by `user_id` that is missing from the user's list.
/// Returns how many orders were linked.
#[instrument(skip(store))]
pub async fn reconcile(store: &dyn Store, user_id: &str) -> ShopResult<usize> {
    let user = store
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| ShopError::not_found("user", user_id))?;

    let mut linked = 0;
    for order_id in store.find_order_ids_for_user(user_id).await? {
        if !user.orders.contains(&order_id) {
            store.push_user_order(user_id, &order_id).await?;
            warn!("Linked orphaned order {} to user {}", order_id, user_id);
            linked += 1;
        }
    }
    Ok(linked)
}

/// One page of the caller's orders, newest first
pub async fn list_orders(
    store: &dyn Store,
    user_id: &str,
    pagination: Pagination,
) -> ShopResult<Page<Order>> {
    if let Err(e) = reconcile(store, user_id).await {
        warn!("Order reconciliation failed for user {}: {}", user_id, e);
    }

    let count = store.count_orders_for_user(user_id).await?;
    pagination.ensure_in_range(count)?;
    let orders = store
        .find_orders_for_user(user_id, pagination.skip(), pagination.limit())
        .await?;
    Ok(pagination.page(orders, count))
}

/// A single order; only its owner may read it
pub async fn order_details(store: &dyn Store, caller: &Identity, order_id: &str) -> ShopResult<Order> {
    let order = store
        .find_order_by_id(order_id)
        .await?
        .ok_or_else(|| ShopError::not_found("order", order_id))?;

    if order.user_id != caller.id {
        return Err(ShopError::Unauthorized(
            "this order belongs to another account".to_string(),
        ));
    }
    Ok(order)
}
