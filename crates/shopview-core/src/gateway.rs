//! Backend seam: what a browsing view asks for and what it gets back.
//!
//! Implementations own the wire format. The core only sees a built
//! [`CategoryTree`], a brand list, and a [`ProductCollection`].

use std::future::Future;

use crate::category::{CategoryId, CategoryTree};
use crate::filter::{Facet, FilterState};
use crate::products::{Brand, Product};

/// Which backend listing a view reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductSource {
    /// Products in any of these categories. Empty means every category.
    Category { scope: Vec<CategoryId> },
    Recommended { limit: u32 },
    Search { query: String },
    NewArrivals { limit: u32 },
    /// The admin console's full product list.
    AdminList,
}

impl ProductSource {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            ProductSource::Category { .. } => "category",
            ProductSource::Recommended { .. } => "recommended",
            ProductSource::Search { .. } => "search",
            ProductSource::NewArrivals { .. } => "new-arrivals",
            ProductSource::AdminList => "admin",
        }
    }

    /// Facets this listing applies on the backend with the same result the
    /// engine would give. The storefront bounds and sorts prices on the
    /// list price, not the price a shopper pays, so neither is listed.
    #[must_use]
    pub fn supported_facets(&self) -> &'static [Facet] {
        match self {
            // The scope already stands in for the category facet.
            ProductSource::Category { .. } => &[Facet::RatingFloor, Facet::Discount],
            ProductSource::Recommended { .. } => &[
                Facet::Category,
                Facet::Brands,
                Facet::RatingFloor,
                Facet::Discount,
            ],
            ProductSource::Search { .. } => &[Facet::Brands, Facet::RatingFloor],
            ProductSource::NewArrivals { .. } | ProductSource::AdminList => &[],
        }
    }

    /// `true` when a backend page for `filters` is exactly a page of the
    /// filtered, sorted result, so its total can be trusted.
    #[must_use]
    pub fn supports(&self, filters: &FilterState) -> bool {
        let supported = self.supported_facets();
        filters
            .active_facets()
            .iter()
            .all(|facet| supported.contains(facet))
    }
}

/// Server-side slicing request. `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub source: ProductSource,
    /// Facets forwarded to the backend. Backends may ignore any of them;
    /// the engine applies them again on whatever comes back.
    pub filters: FilterState,
    /// `None` asks for the whole collection, every page of it when the
    /// listing is paginated.
    pub page: Option<PageRequest>,
}

/// A product listing in either of the two shapes backends return.
#[derive(Debug, Clone, PartialEq)]
pub enum ProductCollection {
    /// Every candidate; the engine slices locally.
    Full(Vec<Product>),
    /// One page already sliced by the backend, plus the backend's total.
    Page {
        items: Vec<Product>,
        total_count: usize,
    },
}

impl ProductCollection {
    /// Items actually held, not the backend total.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    #[must_use]
    pub fn items(&self) -> &[Product] {
        match self {
            ProductCollection::Full(items) | ProductCollection::Page { items, .. } => items,
        }
    }

    #[must_use]
    pub fn is_paginated(&self) -> bool {
        matches!(self, ProductCollection::Page { .. })
    }
}

/// Read operations a browsing view needs from the catalog backend.
pub trait CatalogGateway: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn fetch_categories(&self) -> impl Future<Output = Result<CategoryTree, Self::Error>> + Send;

    fn fetch_brands(&self) -> impl Future<Output = Result<Vec<Brand>, Self::Error>> + Send;

    fn fetch_products(
        &self,
        query: &ProductQuery,
    ) -> impl Future<Output = Result<ProductCollection, Self::Error>> + Send;
}

/// Category forest and brand list, fetched together on view load.
#[derive(Debug, Clone, Default)]
pub struct CatalogData {
    pub tree: CategoryTree,
    pub brands: Vec<Brand>,
}

/// Fetches the category forest and the brand list concurrently.
///
/// # Errors
///
/// Returns the first gateway error; neither half is kept on failure.
pub async fn load_catalog<G: CatalogGateway>(gateway: &G) -> Result<CatalogData, G::Error> {
    let (tree, brands) = futures::try_join!(gateway.fetch_categories(), gateway.fetch_brands())?;
    tracing::debug!(
        categories = tree.len(),
        brands = brands.len(),
        "catalog metadata loaded"
    );
    Ok(CatalogData { tree, brands })
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::filter::{FacetChange, SortBy};

    #[test]
    fn category_listing_supports_rating_and_sale_only() {
        let source = ProductSource::Category { scope: vec![1, 2] };
        let rated = FilterState::default()
            .change_facet(FacetChange::RatingFloor(Some(4)))
            .change_facet(FacetChange::DiscountOnly(true));
        assert!(source.supports(&rated));
        assert!(source.supports(&FilterState::default()));
        assert!(!source.supports(&rated.change_facet(FacetChange::ToggleBrand(3))));
        assert!(!source.supports(&rated.change_facet(FacetChange::Sort(SortBy::PriceAsc))));
    }

    #[test]
    fn search_listing_supports_brands_but_not_price() {
        let source = ProductSource::Search {
            query: "serum".to_string(),
        };
        let branded = FilterState::default().change_facet(FacetChange::ToggleBrand(3));
        assert!(source.supports(&branded));
        let priced = branded.change_facet(FacetChange::MinPrice(Some(Decimal::from(10))));
        assert!(!source.supports(&priced));
        assert!(!source.supports(&branded.change_facet(FacetChange::DiscountOnly(true))));
    }

    #[test]
    fn feeds_support_nothing() {
        let rated = FilterState::default().change_facet(FacetChange::RatingFloor(Some(1)));
        assert!(!ProductSource::NewArrivals { limit: 50 }.supports(&rated));
        assert!(!ProductSource::AdminList.supports(&rated));
        assert!(ProductSource::AdminList
            .supports(&FilterState::default().change_facet(FacetChange::RatingFloor(Some(0)))));
    }
}
