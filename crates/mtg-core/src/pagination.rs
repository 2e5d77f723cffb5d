//! # Pagination
//!
//! Page arithmetic shared by every paginated listing.
//!
//! A request for page `n` of size `s` skips `(n - 1) * s` records. It is out of
//! range only when the page would *start* past the last record, so the first
//! page is always valid, even for an empty collection.

use crate::error::{ShopError, ShopResult};
use serde::{Deserialize, Serialize};

/// Default page size for the product listing
pub const PRODUCTS_PAGE_SIZE: u64 = 20;
/// Default page size for the per-set product listing
pub const SET_PRODUCTS_PAGE_SIZE: u64 = 4;
/// Default page size for the featured set listing
pub const SETS_PAGE_SIZE: u64 = 10;
/// Default page size for a user's order history
pub const ORDERS_PAGE_SIZE: u64 = 10;

/// Requested page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Records per page (>= 1)
    pub page_size: u64,
    /// 1-based page number
    pub page_num: u64,
}

impl Pagination {
    /// Create a page window, rejecting zero sizes and page numbers
    pub fn new(page_size: u64, page_num: u64) -> ShopResult<Self> {
        if page_size == 0 {
            return Err(ShopError::InvalidRequest(
                "pageSize must be a positive integer".to_string(),
            ));
        }
        if page_num == 0 {
            return Err(ShopError::InvalidRequest(
                "pageNum must be a positive integer".to_string(),
            ));
        }
        Ok(Self {
            page_size,
            page_num,
        })
    }

    /// First page with the given size
    pub fn first(page_size: u64) -> Self {
        Self {
            page_size: page_size.max(1),
            page_num: 1,
        }
    }

    /// Fill in missing query values with the call site's defaults
    pub fn from_query(query: &PageQuery, default_page_size: u64) -> ShopResult<Self> {
        Self::new(
            query.page_size.unwrap_or(default_page_size),
            query.page_num.unwrap_or(1),
        )
    }

    /// Number of records to skip
    pub fn skip(&self) -> u64 {
        if self.page_num > 1 {
            (self.page_num - 1).saturating_mul(self.page_size)
        } else {
            0
        }
    }

    /// Maximum number of records on this page
    pub fn limit(&self) -> u64 {
        self.page_size
    }

    /// Fail with `OutOfRange` when the page starts past `count` records
    pub fn ensure_in_range(&self, count: u64) -> ShopResult<()> {
        if count < self.skip() {
            return Err(ShopError::OutOfRange {
                page_size: self.page_size,
                page_num: self.page_num,
                count,
            });
        }
        Ok(())
    }

    /// Wrap fetched records into a page
    pub fn page<T>(&self, items: Vec<T>, count: u64) -> Page<T> {
        Page {
            items,
            page_size: self.page_size,
            page_num: self.page_num,
            count,
        }
    }
}

/// `?pageSize=&pageNum=` query parameters
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    #[serde(default)]
    pub page_size: Option<u64>,
    #[serde(default)]
    pub page_num: Option<u64>,
}

/// One page of a listing
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_size: u64,
    pub page_num: u64,
    /// Total records matching the filter
    pub count: u64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page_size: self.page_size,
            page_num: self.page_num,
            count: self.count,
        }
    }
}
