//! Storefront backend response types.
//!
//! List endpoints answer in one of two shapes: a bare JSON array, or a
//! page envelope `{"count": N, "results": [...]}` when the endpoint is
//! paginated. [`Listing`] accepts either.

use rust_decimal::Decimal;
use serde::Deserialize;

/// A list response in either shape.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Page {
        count: usize,
        results: Vec<T>,
    },
    Bare(Vec<T>),
}

impl<T> Listing<T> {
    /// Items regardless of shape.
    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        match self {
            Listing::Page { results, .. } => results,
            Listing::Bare(items) => items,
        }
    }
}

// ---------------------------------------------------------------------------
// /categories/
// ---------------------------------------------------------------------------

/// One category. The tree endpoint nests `children`; the admin listing
/// is flat and relies on `parent`.
#[derive(Debug, Deserialize)]
pub struct WireCategory {
    pub category_id: i64,
    pub category_name: String,
    #[serde(default)]
    pub parent: Option<i64>,
    #[serde(default)]
    pub children: Vec<WireCategory>,
}

// ---------------------------------------------------------------------------
// /brands/
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct WireBrand {
    pub brand_id: i64,
    pub brand_name: String,
}

// ---------------------------------------------------------------------------
// /products/...
// ---------------------------------------------------------------------------

/// Category summary embedded in a product.
#[derive(Debug, Deserialize)]
pub struct WireProductCategory {
    pub category_id: i64,
}

/// A product as serialized by every product endpoint. Prices arrive as
/// decimal strings (`"25.00"`).
#[derive(Debug, Deserialize)]
pub struct WireProduct {
    pub productid: i64,
    pub product_name: String,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub sale_price: Option<Decimal>,
    #[serde(default)]
    pub avg_rating: Option<f64>,
    #[serde(default)]
    pub reviews_count: Option<u32>,
    #[serde(default)]
    pub brand_id: Option<i64>,
    #[serde(default)]
    pub brand_name: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub category: Option<WireProductCategory>,
}
