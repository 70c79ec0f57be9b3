use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type ProductId = i64;
pub type BrandId = i64;

/// A catalog product as consumed by the browsing engine.
///
/// Read-only input: the engine never mutates a product, it only selects,
/// orders, and slices them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// List price. `None` for products the backend has not priced yet.
    pub price: Option<Decimal>,
    /// Promotional price, when the product is on sale.
    pub sale_price: Option<Decimal>,
    /// Average review rating on a 0–5 scale, `None` when unreviewed.
    pub rating: Option<f64>,
    pub review_count: u32,
    pub brand_id: Option<BrandId>,
    pub brand_name: Option<String>,
    pub category_id: Option<crate::CategoryId>,
}

impl Product {
    /// The price a shopper actually pays: the sale price when present,
    /// otherwise the list price.
    #[must_use]
    pub fn effective_price(&self) -> Option<Decimal> {
        self.sale_price.or(self.price)
    }

    /// `true` when a sale price exists and is strictly below the list price.
    #[must_use]
    pub fn is_discounted(&self) -> bool {
        matches!((self.sale_price, self.price), (Some(sale), Some(list)) if sale < list)
    }

    /// Rating used for rating-floor comparisons; unreviewed counts as zero.
    #[must_use]
    pub fn rating_or_zero(&self) -> f64 {
        self.rating.unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
    pub id: BrandId,
    pub name: String,
}
