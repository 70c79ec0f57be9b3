//! Filter, sort, and paginate a product collection against a [`FilterState`].
//!
//! Everything here is synchronous and I/O free. Stages run in a fixed order
//! (category, price, rating, brand, discount, sort, paginate). The predicates
//! are independent, so the order never changes which products survive; it
//! only keeps trace output comparable between runs.

use std::cmp::Ordering;

use crate::filter::{FilterState, SortBy};
use crate::gateway::ProductCollection;
use crate::products::Product;

type Predicate = fn(&Product, &FilterState) -> bool;

const STAGES: [(&str, Predicate); 5] = [
    ("category", matches_category),
    ("price", matches_price),
    ("rating", matches_rating),
    ("brand", matches_brand),
    ("discount", matches_discount),
];

/// Position within a paginated result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    page_number: u32,
    page_size: u32,
    total_count: usize,
}

/// One entry in the compact page strip under a product grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLink {
    Page { number: u32, current: bool },
    Ellipsis,
}

impl PageWindow {
    /// A window before any result is known. `page_number` and `page_size`
    /// are raised to 1 if given as 0.
    #[must_use]
    pub fn new(page_number: u32, page_size: u32) -> Self {
        Self {
            page_number: page_number.max(1),
            page_size: page_size.max(1),
            total_count: 0,
        }
    }

    /// Records a new total and clamps the page number into
    /// `[1, total_pages]`.
    #[must_use]
    pub fn with_total(self, total_count: usize) -> Self {
        let mut window = Self {
            total_count,
            ..self
        };
        window.page_number = window.page_number.min(window.total_pages()).max(1);
        window
    }

    /// Same size and total, different page; clamped like [`Self::with_total`].
    #[must_use]
    pub fn with_page(self, page_number: u32) -> Self {
        Self {
            page_number,
            ..self
        }
        .with_total(self.total_count)
    }

    #[must_use]
    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    #[must_use]
    pub fn total_count(&self) -> usize {
        self.total_count
    }

    /// `ceil(total_count / page_size)`; zero for an empty result.
    #[must_use]
    pub fn total_pages(&self) -> u32 {
        let pages = self.total_count.div_ceil(self.page_size as usize);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// Index of the first item on this page.
    #[must_use]
    pub fn offset(&self) -> usize {
        (self.page_number as usize - 1).saturating_mul(self.page_size as usize)
    }

    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.page_number > 1
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.page_number < self.total_pages()
    }

    /// First page, last page, and the current page with its neighbours,
    /// with [`PageLink::Ellipsis`] wherever numbers are skipped. Empty when
    /// there is at most one page.
    #[must_use]
    pub fn page_links(&self) -> Vec<PageLink> {
        let total = self.total_pages();
        if total <= 1 {
            return Vec::new();
        }
        let current = self.page_number;
        let mut candidates = [
            1,
            current.saturating_sub(1),
            current,
            current.saturating_add(1),
            total,
        ];
        candidates.sort_unstable();

        let mut links = Vec::new();
        let mut previous: Option<u32> = None;
        for number in candidates {
            if number == 0 || number > total || previous == Some(number) {
                continue;
            }
            if previous.is_some_and(|p| number - p > 1) {
                links.push(PageLink::Ellipsis);
            }
            links.push(PageLink::Page {
                number,
                current: number == current,
            });
            previous = Some(number);
        }
        links
    }
}

/// The visible page of a filtered collection.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
    pub items: Vec<Product>,
    /// Window carrying the pre-slice total and the clamped page number.
    pub window: PageWindow,
}

impl FilterOutcome {
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.window.total_count()
    }
}

/// Filters, sorts, and slices a full collection.
///
/// `total_count` in the returned window is the filtered count before
/// slicing. An empty result is a normal outcome.
#[must_use]
pub fn apply(products: &[Product], state: &FilterState, window: PageWindow) -> FilterOutcome {
    let matched = filter_and_sort(products, state);
    let window = window.with_total(matched.len());
    let items = matched
        .into_iter()
        .skip(window.offset())
        .take(window.page_size() as usize)
        .cloned()
        .collect();
    FilterOutcome { items, window }
}

/// Applies a state to whatever the gateway returned.
///
/// A full collection is sliced here. A server page is already sliced by a
/// backend that applied every active facet; its items are filtered and
/// sorted in place and the backend's total stays authoritative for
/// pagination.
#[must_use]
pub fn apply_collection(
    collection: &ProductCollection,
    state: &FilterState,
    window: PageWindow,
) -> FilterOutcome {
    match collection {
        ProductCollection::Full(products) => apply(products, state, window),
        ProductCollection::Page { items, total_count } => FilterOutcome {
            items: filter_and_sort(items, state).into_iter().cloned().collect(),
            window: window.with_total(*total_count),
        },
    }
}

/// Runs every predicate stage, then the stable sort.
#[must_use]
pub fn filter_and_sort<'a>(products: &'a [Product], state: &FilterState) -> Vec<&'a Product> {
    let mut working: Vec<&Product> = products.iter().collect();
    for (stage, predicate) in STAGES {
        working.retain(|product| predicate(product, state));
        tracing::trace!(stage, remaining = working.len(), "filter stage applied");
    }
    sort_products(&mut working, state.sort_by());
    working
}

/// Stable sort; [`SortBy::None`] leaves the order untouched. Products
/// without a price sort last in both price directions.
pub fn sort_products(products: &mut [&Product], sort_by: SortBy) {
    match sort_by {
        SortBy::None => {}
        SortBy::PriceAsc => products.sort_by(|a, b| compare_price(a, b, false)),
        SortBy::PriceDesc => products.sort_by(|a, b| compare_price(a, b, true)),
        SortBy::NameAsc => products.sort_by(|a, b| compare_name(a, b)),
        SortBy::NameDesc => products.sort_by(|a, b| compare_name(b, a)),
    }
}

fn compare_price(a: &Product, b: &Product, descending: bool) -> Ordering {
    match (a.effective_price(), b.effective_price()) {
        (Some(x), Some(y)) if descending => y.cmp(&x),
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_name(a: &Product, b: &Product) -> Ordering {
    a.name.to_lowercase().cmp(&b.name.to_lowercase())
}

/// Exact category match. A parent category does not include its
/// children's products; views scope their source collection instead.
fn matches_category(product: &Product, state: &FilterState) -> bool {
    state
        .category_id()
        .is_none_or(|id| product.category_id == Some(id))
}

/// Inclusive bounds on the effective price. An unpriced product only
/// passes when neither bound is set.
fn matches_price(product: &Product, state: &FilterState) -> bool {
    let (min, max) = (state.min_price(), state.max_price());
    if min.is_none() && max.is_none() {
        return true;
    }
    product.effective_price().is_some_and(|price| {
        min.is_none_or(|min| price >= min) && max.is_none_or(|max| price <= max)
    })
}

fn matches_rating(product: &Product, state: &FilterState) -> bool {
    state
        .rating_floor()
        .is_none_or(|floor| product.rating_or_zero() >= f64::from(floor))
}

/// Membership by brand id only. Matching on brand names is deliberately
/// unsupported: two brands may share a display name.
fn matches_brand(product: &Product, state: &FilterState) -> bool {
    let brands = state.brand_ids();
    brands.is_empty() || product.brand_id.is_some_and(|id| brands.contains(&id))
}

fn matches_discount(product: &Product, state: &FilterState) -> bool {
    !state.discount_only() || product.is_discounted()
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
