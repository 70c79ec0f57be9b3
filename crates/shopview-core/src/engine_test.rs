use std::collections::BTreeSet;

use rust_decimal::Decimal;

use super::*;
use crate::filter::FacetChange;

fn product(id: i64, price: i64) -> Product {
    Product {
        id,
        name: format!("Product {id}"),
        price: Some(Decimal::from(price)),
        sale_price: None,
        rating: None,
        review_count: 0,
        brand_id: None,
        brand_name: None,
        category_id: None,
    }
}

fn ids(products: &[Product]) -> Vec<i64> {
    products.iter().map(|p| p.id).collect()
}

fn scenario_products() -> Vec<Product> {
    vec![product(1, 10), product(2, 30), product(3, 20)]
}

/// Twenty-five products with varied facets, for property-style checks.
fn catalog() -> Vec<Product> {
    (1..=25)
        .map(|id| {
            let mut p = product(id, (id * 7) % 60 + 5);
            p.name = format!("{} item", ["delta", "Alpha", "charlie", "bravo"][(id % 4) as usize]);
            p.brand_id = Some(id % 3 + 1);
            p.category_id = Some(id % 2 + 10);
            p.rating = if id % 5 == 0 { None } else { Some(f64::from((id % 5) as u8)) };
            if id % 4 == 0 {
                p.sale_price = p.price.map(|price| price - Decimal::from(2));
            }
            p
        })
        .collect()
}

fn everything() -> PageWindow {
    PageWindow::new(1, 1000)
}

#[test]
fn scenario_a_min_price_keeps_input_order() {
    let state = FilterState::default().change_facet(FacetChange::MinPrice(Some(Decimal::from(15))));
    let outcome = apply(&scenario_products(), &state, everything());
    assert_eq!(ids(&outcome.items), vec![2, 3]);
    assert_eq!(outcome.total_count(), 2);
}

#[test]
fn scenario_b_price_ascending() {
    let state = FilterState::default().change_facet(FacetChange::Sort(SortBy::PriceAsc));
    let outcome = apply(&scenario_products(), &state, everything());
    let prices: Vec<Decimal> = outcome.items.iter().filter_map(|p| p.price).collect();
    assert_eq!(
        prices,
        vec![Decimal::from(10), Decimal::from(20), Decimal::from(30)]
    );
}

#[test]
fn scenario_c_unknown_brand_yields_empty_result() {
    let state = FilterState::default().change_facet(FacetChange::ToggleBrand(5));
    let outcome = apply(&scenario_products(), &state, everything());
    assert!(outcome.items.is_empty());
    assert_eq!(outcome.total_count(), 0);
    assert_eq!(outcome.window.page_number(), 1);
}

#[test]
fn category_filter_is_exact_not_subtree() {
    let mut parent = product(1, 10);
    parent.category_id = Some(1);
    let mut child = product(2, 10);
    child.category_id = Some(2);
    let state = FilterState::for_category(Some(1));
    let outcome = apply(&[parent, child], &state, everything());
    assert_eq!(ids(&outcome.items), vec![1]);
}

#[test]
fn price_filter_uses_sale_price_when_present() {
    let mut on_sale = product(1, 40);
    on_sale.sale_price = Some(Decimal::from(18));
    let state = FilterState::default().change_facet(FacetChange::MaxPrice(Some(Decimal::from(20))));
    let outcome = apply(&[on_sale, product(2, 25)], &state, everything());
    assert_eq!(ids(&outcome.items), vec![1]);
}

#[test]
fn price_bounds_are_inclusive() {
    let state = FilterState::default().change_facet(FacetChange::PriceRange {
        min: Some(Decimal::from(10)),
        max: Some(Decimal::from(20)),
    });
    let outcome = apply(&scenario_products(), &state, everything());
    assert_eq!(ids(&outcome.items), vec![1, 3]);
}

#[test]
fn unpriced_products_only_pass_without_bounds() {
    let mut unpriced = product(9, 0);
    unpriced.price = None;
    let products = vec![unpriced, product(1, 10)];
    assert_eq!(apply(&products, &FilterState::default(), everything()).total_count(), 2);
    let bounded = FilterState::default().change_facet(FacetChange::MinPrice(Some(Decimal::ZERO)));
    assert_eq!(ids(&apply(&products, &bounded, everything()).items), vec![1]);
}

#[test]
fn unrated_products_count_as_zero() {
    let mut rated = product(1, 10);
    rated.rating = Some(4.2);
    let unrated = product(2, 10);
    let products = vec![rated, unrated];

    let floor_four = FilterState::default().change_facet(FacetChange::RatingFloor(Some(4)));
    assert_eq!(ids(&apply(&products, &floor_four, everything()).items), vec![1]);

    let floor_zero = FilterState::default().change_facet(FacetChange::RatingFloor(Some(0)));
    assert_eq!(apply(&products, &floor_zero, everything()).total_count(), 2);
}

#[test]
fn rating_floor_above_five_selects_nothing() {
    let state = FilterState::default().change_facet(FacetChange::RatingFloor(Some(9)));
    assert_eq!(apply(&catalog(), &state, everything()).total_count(), 0);
}

#[test]
fn brand_match_is_by_id_even_when_names_collide() {
    let mut a = product(1, 10);
    a.brand_id = Some(5);
    a.brand_name = Some("Glow".to_string());
    let mut b = product(2, 10);
    b.brand_id = Some(6);
    b.brand_name = Some("glow".to_string());
    let state = FilterState::default().change_facet(FacetChange::ToggleBrand(5));
    assert_eq!(ids(&apply(&[a, b], &state, everything()).items), vec![1]);
}

#[test]
fn discount_only_requires_sale_below_price() {
    let mut discounted = product(1, 30);
    discounted.sale_price = Some(Decimal::from(25));
    let mut same_price = product(2, 30);
    same_price.sale_price = Some(Decimal::from(30));
    let state = FilterState::default().change_facet(FacetChange::DiscountOnly(true));
    let outcome = apply(&[discounted, same_price, product(3, 5)], &state, everything());
    assert_eq!(ids(&outcome.items), vec![1]);
}

#[test]
fn name_sort_is_case_insensitive_and_stable() {
    let names = ["beta", "Alpha", "alpha", "Beta"];
    let products: Vec<Product> = names
        .iter()
        .zip(1..)
        .map(|(name, id)| {
            let mut p = product(id, 10);
            p.name = (*name).to_string();
            p
        })
        .collect();
    let asc = FilterState::default().change_facet(FacetChange::Sort(SortBy::NameAsc));
    assert_eq!(ids(&apply(&products, &asc, everything()).items), vec![2, 3, 1, 4]);
    let desc = FilterState::default().change_facet(FacetChange::Sort(SortBy::NameDesc));
    assert_eq!(ids(&apply(&products, &desc, everything()).items), vec![1, 4, 2, 3]);
}

#[test]
fn unpriced_products_sort_last_in_both_directions() {
    let mut unpriced = product(1, 0);
    unpriced.price = None;
    let products = vec![unpriced, product(2, 10), product(3, 20)];
    let asc = FilterState::default().change_facet(FacetChange::Sort(SortBy::PriceAsc));
    assert_eq!(ids(&apply(&products, &asc, everything()).items), vec![2, 3, 1]);
    let desc = FilterState::default().change_facet(FacetChange::Sort(SortBy::PriceDesc));
    assert_eq!(ids(&apply(&products, &desc, everything()).items), vec![3, 2, 1]);
}

#[test]
fn sort_none_preserves_input_order_of_ties() {
    let products = vec![product(1, 10), product(2, 10), product(3, 5), product(4, 10)];
    let unsorted = apply(&products, &FilterState::default(), everything());
    assert_eq!(ids(&unsorted.items), vec![1, 2, 3, 4]);

    // Ties under price-asc keep the order `none` produced.
    let by_price = FilterState::default().change_facet(FacetChange::Sort(SortBy::PriceAsc));
    assert_eq!(ids(&apply(&products, &by_price, everything()).items), vec![3, 1, 2, 4]);
}

#[test]
fn stricter_state_never_returns_more() {
    let products = catalog();
    let chain = [
        FacetChange::Category(Some(10)),
        FacetChange::MinPrice(Some(Decimal::from(15))),
        FacetChange::RatingFloor(Some(2)),
        FacetChange::Brands(BTreeSet::from([1, 2])),
        FacetChange::DiscountOnly(true),
        FacetChange::MaxPrice(Some(Decimal::from(40))),
    ];
    let mut state = FilterState::default();
    let mut previous = apply(&products, &state, everything()).total_count();
    for change in chain {
        state = state.change_facet(change);
        let current = apply(&products, &state, everything()).total_count();
        assert!(current <= previous, "{current} > {previous} after {state:?}");
        previous = current;
    }
}

#[test]
fn pages_cover_the_filtered_set_exactly_once() {
    let products = catalog();
    let state = FilterState::default()
        .change_facet(FacetChange::RatingFloor(Some(1)))
        .change_facet(FacetChange::Sort(SortBy::PriceDesc));
    let full = apply(&products, &state, everything());

    for page_size in [1, 4, 7, 100] {
        let first = apply(&products, &state, PageWindow::new(1, page_size));
        let mut collected = Vec::new();
        for page in 1..=first.window.total_pages() {
            let outcome = apply(&products, &state, PageWindow::new(page, page_size));
            assert_eq!(outcome.window.page_number(), page);
            assert!(outcome.items.len() <= page_size as usize);
            collected.extend(outcome.items);
        }
        assert_eq!(ids(&collected), ids(&full.items), "page size {page_size}");
    }
}

#[test]
fn page_beyond_the_end_is_clamped() {
    let outcome = apply(&scenario_products(), &FilterState::default(), PageWindow::new(9, 2));
    assert_eq!(outcome.window.page_number(), 2);
    assert_eq!(ids(&outcome.items), vec![3]);
}

#[test]
fn server_page_keeps_backend_total() {
    let collection = ProductCollection::Page {
        items: vec![product(1, 10), product(2, 50)],
        total_count: 40,
    };
    let state = FilterState::default().change_facet(FacetChange::MaxPrice(Some(Decimal::from(20))));
    let outcome = apply_collection(&collection, &state, PageWindow::new(3, 12));
    assert_eq!(ids(&outcome.items), vec![1]);
    assert_eq!(outcome.total_count(), 40);
    assert_eq!(outcome.window.page_number(), 3);
    assert_eq!(outcome.window.total_pages(), 4);
}

#[test]
fn full_collection_is_sliced_locally() {
    let collection = ProductCollection::Full(catalog());
    let outcome = apply_collection(&collection, &FilterState::default(), PageWindow::new(3, 12));
    assert_eq!(ids(&outcome.items), vec![25]);
    assert_eq!(outcome.total_count(), 25);
}

#[test]
fn window_total_pages_and_neighbours() {
    let window = PageWindow::new(2, 12).with_total(25);
    assert_eq!(window.total_pages(), 3);
    assert_eq!(window.offset(), 12);
    assert!(window.has_previous());
    assert!(window.has_next());

    let empty = PageWindow::new(5, 12).with_total(0);
    assert_eq!(empty.total_pages(), 0);
    assert_eq!(empty.page_number(), 1);
    assert!(!empty.has_next());
}

#[test]
fn window_zero_size_is_raised_to_one() {
    let window = PageWindow::new(0, 0).with_total(3);
    assert_eq!(window.page_size(), 1);
    assert_eq!(window.page_number(), 1);
    assert_eq!(window.total_pages(), 3);
}

#[test]
fn page_links_single_page_is_empty() {
    assert!(PageWindow::new(1, 12).with_total(12).page_links().is_empty());
    assert!(PageWindow::new(1, 12).with_total(0).page_links().is_empty());
}

#[test]
fn page_links_compact_with_ellipses() {
    let links = PageWindow::new(5, 10).with_total(100).page_links();
    let page = |number, current| PageLink::Page { number, current };
    assert_eq!(
        links,
        vec![
            page(1, false),
            PageLink::Ellipsis,
            page(4, false),
            page(5, true),
            page(6, false),
            PageLink::Ellipsis,
            page(10, false),
        ]
    );
}

#[test]
fn page_links_near_the_edges() {
    let page = |number, current| PageLink::Page { number, current };
    assert_eq!(
        PageWindow::new(1, 10).with_total(50).page_links(),
        vec![page(1, true), page(2, false), PageLink::Ellipsis, page(5, false)]
    );
    assert_eq!(
        PageWindow::new(3, 10).with_total(30).with_page(3).page_links(),
        vec![page(1, false), page(2, false), page(3, true)]
    );
}

#[test]
fn page_links_stay_compact_for_huge_totals() {
    let page = |number, current| PageLink::Page { number, current };
    let last = PageWindow::new(u32::MAX, 1).with_total(usize::MAX);
    assert_eq!(last.page_number(), u32::MAX);
    assert_eq!(
        last.page_links(),
        vec![
            page(1, false),
            PageLink::Ellipsis,
            page(u32::MAX - 1, false),
            page(u32::MAX, true),
        ]
    );

    let middle = PageWindow::new(2_000_000_000, 1).with_total(4_000_000_000);
    assert_eq!(middle.page_links().len(), 7);
}
