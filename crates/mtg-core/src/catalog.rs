//! # Catalog
//!
//! Product and featured-set listings plus the admin-side create/edit flows,
//! including relaying images to the image store.

use crate::error::{ShopError, ShopResult};
use crate::featured_set::{FeaturedSet, NewFeaturedSet, SetUpdate};
use crate::image::{ImageStore, ImageUpload};
use crate::pagination::{Page, Pagination};
use crate::product::{NewProduct, Product, ProductFilter, ProductUpdate};
use crate::store::Store;
use tracing::{info, instrument, warn};

// =============================================================================
// Products
// =============================================================================

/// One page of products matching `filter`
pub async fn list_products(
    store: &dyn Store,
    filter: &ProductFilter,
    pagination: Pagination,
) -> ShopResult<Page<Product>> {
    let count = store.count_products(filter).await?;
    pagination.ensure_in_range(count)?;
    let products = store
        .find_products(filter, pagination.skip(), pagination.limit())
        .await?;
    Ok(pagination.page(products, count))
}

pub async fn product_details(store: &dyn Store, id: &str) -> ShopResult<Product> {
    store
        .find_product_by_id(id)
        .await?
        .ok_or_else(|| ShopError::not_found("product", id))
}

/// Products for a list of ids (cart contents); unknown ids are skipped
pub async fn products_collection(store: &dyn Store, ids: &[String]) -> ShopResult<Vec<Product>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    store.find_products_by_ids(ids).await
}

/// Upload the image (if any), then insert the product.
/// If the insert fails the uploaded image is removed again.
#[instrument(skip(store, images, product, image), fields(name = %product.name))]
pub async fn create_product(
    store: &dyn Store,
    images: &dyn ImageStore,
    mut product: NewProduct,
    image: Option<ImageUpload>,
) -> ShopResult<Product> {
    product.validate()?;

    let uploaded = match image {
        Some(image) => Some(images.upload(image).await?),
        None => None,
    };
    if let Some(uploaded) = &uploaded {
        product.image = Some(uploaded.public_id.clone());
    }

    match store.create_product(product).await {
        Ok(created) => {
            info!("Created product {} ({})", created.id, created.name);
            Ok(created)
        }
        Err(e) => {
            if let Some(uploaded) = uploaded {
                discard_image(images, &uploaded.public_id).await;
            }
            Err(e)
        }
    }
}

/// Apply a partial update, optionally replacing the image.
/// The previous image is deleted only after the update succeeded.
#[instrument(skip(store, images, update, image))]
pub async fn edit_product(
    store: &dyn Store,
    images: &dyn ImageStore,
    id: &str,
    mut update: ProductUpdate,
    image: Option<ImageUpload>,
) -> ShopResult<Product> {
    update.validate()?;
    let existing = product_details(store, id).await?;

    let uploaded = match image {
        Some(image) => Some(images.upload(image).await?),
        None => None,
    };
    if let Some(uploaded) = &uploaded {
        update.image = Some(uploaded.public_id.clone());
    }

    let updated = match store.update_product_by_id(id, update).await {
        Ok(updated) => updated,
        Err(e) => {
            if let Some(uploaded) = uploaded {
                discard_unless_referenced(images, &uploaded.public_id, existing.image.as_deref())
                    .await;
            }
            return Err(e);
        }
    };

    if let Some(previous) = existing.image {
        if updated.image.as_deref() != Some(previous.as_str()) {
            discard_image(images, &previous).await;
        }
    }

    info!("Updated product {}", updated.id);
    Ok(updated)
}

/// Drop an upload whose write failed, keeping it when the stored record
/// already points at the same public id (re-uploads overwrite in place).
async fn discard_unless_referenced(
    images: &dyn ImageStore,
    public_id: &str,
    referenced: Option<&str>,
) {
    if referenced != Some(public_id) {
        discard_image(images, public_id).await;
    }
}

async fn discard_image(images: &dyn ImageStore, public_id: &str) {
    if let Err(e) = images.delete(public_id).await {
        warn!(
            "Failed to delete image {} from {}: {}",
            public_id,
            images.provider_name(),
            e
        );
    }
}

// =============================================================================
// Featured sets
// =============================================================================

/// One page of featured sets, newest release first
pub async fn list_sets(store: &dyn Store, pagination: Pagination) -> ShopResult<Page<FeaturedSet>> {
    let count = store.count_sets().await?;
    pagination.ensure_in_range(count)?;
    let sets = store.find_sets(pagination.skip(), pagination.limit()).await?;
    Ok(pagination.page(sets, count))
}

pub async fn set_by_code(store: &dyn Store, code: &str) -> ShopResult<FeaturedSet> {
    store
        .find_set_by_code(code)
        .await?
        .ok_or_else(|| ShopError::not_found("set", code))
}

/// Insert a featured set, uploading its hero image first.
///
/// The code pre-check gives a clear error before anything is uploaded; the
/// store's unique constraint remains the real guard.
#[instrument(skip(store, images, set, hero), fields(code = %set.code))]
pub async fn create_set(
    store: &dyn Store,
    images: &dyn ImageStore,
    mut set: NewFeaturedSet,
    hero: Option<ImageUpload>,
) -> ShopResult<FeaturedSet> {
    set.validate()?;
    if store.find_set_by_code(&set.code).await?.is_some() {
        return Err(ShopError::Duplicate {
            entity: "set",
            field: "code",
            value: set.code,
        });
    }

    let uploaded = match hero {
        Some(hero) => Some(images.upload(hero).await?),
        None => None,
    };
    if let Some(uploaded) = &uploaded {
        set.hero = Some(uploaded.public_id.clone());
    }

    match store.create_set(set).await {
        Ok(created) => {
            info!("Created featured set {} ({})", created.code, created.id);
            Ok(created)
        }
        Err(e) => {
            if let Some(uploaded) = uploaded {
                discard_image(images, &uploaded.public_id).await;
            }
            Err(e)
        }
    }
}

pub async fn edit_set(store: &dyn Store, id: &str, update: SetUpdate) -> ShopResult<FeaturedSet> {
    update.validate()?;
    if update.is_empty() {
        return store
            .find_set_by_id(id)
            .await?
            .ok_or_else(|| ShopError::not_found("set", id));
    }
    let updated = store.update_set_by_id(id, update).await?;
    info!("Updated featured set {}", updated.code);
    Ok(updated)
}
