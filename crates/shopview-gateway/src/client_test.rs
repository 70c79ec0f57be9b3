use std::collections::BTreeSet;

use rust_decimal::Decimal;
use shopview_core::{FacetChange, SortBy};

use super::*;

fn test_client(base_url: &str) -> HttpCatalogGateway {
    HttpCatalogGateway::with_base_url(base_url, 30, "shopview-test/0.1")
        .expect("client construction should not fail")
}

fn expected(pairs: &[(&'static str, &str)]) -> Vec<(&'static str, String)> {
    pairs.iter().map(|(k, v)| (*k, (*v).to_string())).collect()
}

fn busy_filters() -> FilterState {
    FilterState::for_category(Some(4))
        .change_facet(FacetChange::Brands(BTreeSet::from([9, 2])))
        .change_facet(FacetChange::PriceRange {
            min: Some(Decimal::new(1550, 2)),
            max: Some(Decimal::from(80)),
        })
        .change_facet(FacetChange::RatingFloor(Some(4)))
        .change_facet(FacetChange::Sort(SortBy::PriceDesc))
}

#[test]
fn build_url_joins_below_base_path() {
    let client = test_client("https://shop.example/api");
    let url = client
        .build_url(BRANDS_PATH, &[])
        .expect("url should build");
    assert_eq!(url.as_str(), "https://shop.example/api/brands/");
}

#[test]
fn build_url_strips_trailing_slash() {
    let client = test_client("https://shop.example/api/");
    let url = client
        .build_url(SEARCH_PATH, &[("q", "serum".to_string())])
        .expect("url should build");
    assert_eq!(url.as_str(), "https://shop.example/api/products/search/?q=serum");
}

#[test]
fn build_url_encodes_special_characters() {
    let client = test_client("https://shop.example/api");
    let url = client
        .build_url(SEARCH_PATH, &[("q", "lip & cheek".to_string())])
        .expect("url should build");
    assert!(
        url.as_str().contains("lip+%26+cheek") || url.as_str().contains("lip%20%26%20cheek"),
        "query param should be percent-encoded: {url}"
    );
}

#[test]
fn invalid_base_url_is_rejected() {
    let result = HttpCatalogGateway::with_base_url("not a url", 30, "ua");
    assert!(
        matches!(result, Err(GatewayError::InvalidBaseUrl { .. })),
        "expected InvalidBaseUrl"
    );
}

#[test]
fn category_request_sends_scope_and_rating_only() {
    let query = ProductQuery {
        source: ProductSource::Category {
            scope: vec![4, 7],
        },
        filters: busy_filters(),
        page: Some(PageRequest { page: 2, size: 12 }),
    };
    let (path, params) = product_request(&query);
    assert_eq!(path, PRODUCTS_BY_CATEGORIES_PATH);
    assert_eq!(
        params,
        expected(&[("category_ids", "4"), ("category_ids", "7"), ("rating", "4")])
    );
}

#[test]
fn price_bounds_and_sorts_are_never_sent() {
    for source in [
        ProductSource::Category { scope: vec![4] },
        ProductSource::Recommended { limit: 200 },
        ProductSource::Search {
            query: "gloss".to_string(),
        },
    ] {
        let query = ProductQuery {
            source,
            filters: busy_filters(),
            page: None,
        };
        let (_, params) = product_request(&query);
        for key in ["min_price", "max_price", "sort_by", "page", "size"] {
            assert!(
                !params.iter().any(|(k, _)| *k == key),
                "{key} sent for {}: {params:?}",
                query.source.label()
            );
        }
    }
}

#[test]
fn sale_flag_is_sent_where_supported() {
    let filters = FilterState::default()
        .change_facet(FacetChange::Sort(SortBy::PriceAsc))
        .change_facet(FacetChange::DiscountOnly(true));
    let query = ProductQuery {
        source: ProductSource::Category { scope: vec![] },
        filters: filters.clone(),
        page: None,
    };
    assert_eq!(product_request(&query).1, expected(&[("sort_by", "sale")]));

    let search = ProductQuery {
        source: ProductSource::Search {
            query: "mascara".to_string(),
        },
        filters,
        page: None,
    };
    assert_eq!(product_request(&search).1, expected(&[("q", "mascara")]));
}

#[test]
fn zero_rating_floor_is_not_sent() {
    let query = ProductQuery {
        source: ProductSource::Category { scope: vec![1] },
        filters: FilterState::default().change_facet(FacetChange::RatingFloor(Some(0))),
        page: None,
    };
    assert_eq!(product_request(&query).1, expected(&[("category_ids", "1")]));
}

#[test]
fn search_request_joins_brand_ids() {
    let query = ProductQuery {
        source: ProductSource::Search {
            query: "blush".to_string(),
        },
        filters: busy_filters(),
        page: Some(PageRequest { page: 1, size: 12 }),
    };
    let (path, params) = product_request(&query);
    assert_eq!(path, SEARCH_PATH);
    assert_eq!(
        params,
        expected(&[("q", "blush"), ("brand_ids", "2,9"), ("rating", "4")])
    );
}

#[test]
fn recommended_request_repeats_brand_and_sends_limit() {
    let query = ProductQuery {
        source: ProductSource::Recommended { limit: 200 },
        filters: busy_filters(),
        page: None,
    };
    let (path, params) = product_request(&query);
    assert_eq!(path, CHOSEN_FOR_YOU_PATH);
    assert_eq!(
        params,
        expected(&[
            ("brand", "2"),
            ("brand", "9"),
            ("category", "4"),
            ("rating", "4"),
            ("limit", "200"),
        ])
    );
}

#[test]
fn feed_and_admin_requests_ignore_facets() {
    let arrivals = ProductQuery {
        source: ProductSource::NewArrivals { limit: 50 },
        filters: busy_filters(),
        page: None,
    };
    assert_eq!(
        product_request(&arrivals),
        (NEW_ARRIVALS_PATH, expected(&[("limit", "50")]))
    );

    let admin = ProductQuery {
        source: ProductSource::AdminList,
        filters: busy_filters(),
        page: Some(PageRequest { page: 3, size: 20 }),
    };
    assert_eq!(product_request(&admin), (PRODUCTS_PATH, Vec::new()));
}
