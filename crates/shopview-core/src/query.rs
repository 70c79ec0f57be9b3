//! Query-string codec for browsing addresses.
//!
//! ## Schema
//!
//! | key | value | notes |
//! |---|---|---|
//! | `category` | positive integer | |
//! | `brand` | positive integer | repeated once per selected brand |
//! | `min_price`, `max_price` | non-negative decimal | inclusive bounds |
//! | `rating` | integer 0–255 | usually 1–5; larger values are kept and select nothing |
//! | `sort_by` | `price-asc`, `price-desc`, `name-asc`, `name-desc`, `sale` | see below |
//! | `page` | integer ≥ 1 | omitted on page 1 |
//!
//! `sale` is the discount flag rather than an ordering and may accompany a
//! comparator.
//!
//! Parsing is permissive: a value that does not parse is treated as absent
//! and the rest of the address still applies. Hand-edited URLs are common
//! and a bad parameter must never block a page from rendering.
//!
//! Serialization is canonical: fixed key order, brands ascending, decimals
//! normalized, absent facets omitted entirely.

use std::str::FromStr;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rust_decimal::Decimal;

use crate::filter::{FilterState, SortBy};

pub const KEY_CATEGORY: &str = "category";
pub const KEY_BRAND: &str = "brand";
pub const KEY_MIN_PRICE: &str = "min_price";
pub const KEY_MAX_PRICE: &str = "max_price";
pub const KEY_RATING: &str = "rating";
pub const KEY_SORT_BY: &str = "sort_by";
pub const KEY_PAGE: &str = "page";

/// Comma-separated brand list some older links still carry.
const LEGACY_KEY_BRAND_IDS: &str = "brand_ids";
const SALE_FLAG: &str = "sale";

/// Unreserved characters stay literal; everything else is escaped.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Everything a browsing view keeps in its address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewAddress {
    pub filters: FilterState,
    /// 1-based page number.
    pub page: u32,
    /// Keys this codec does not own (e.g. a search page's `query`), kept in
    /// their original order so rewrites do not drop them.
    pub passthrough: Vec<(String, String)>,
}

impl Default for ViewAddress {
    fn default() -> Self {
        Self::new(FilterState::default(), 1)
    }
}

impl ViewAddress {
    #[must_use]
    pub fn new(filters: FilterState, page: u32) -> Self {
        Self {
            filters,
            page: page.max(1),
            passthrough: Vec::new(),
        }
    }

    /// Value of the first passthrough key named `key`.
    #[must_use]
    pub fn passthrough_value(&self, key: &str) -> Option<&str> {
        self.passthrough
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Parses a query string, with or without the leading `?`.
    ///
    /// Never fails. Single-valued keys take their first occurrence; if that
    /// occurrence is malformed the facet is absent.
    #[must_use]
    pub fn parse(query: &str) -> Self {
        let mut address = ViewAddress::default();
        let filters = &mut address.filters;

        let mut seen_category = false;
        let mut seen_min = false;
        let mut seen_max = false;
        let mut seen_rating = false;
        let mut seen_page = false;

        for (key, value) in decode_pairs(query) {
            match key.as_str() {
                KEY_CATEGORY => {
                    if !std::mem::replace(&mut seen_category, true) {
                        filters.category_id = parse_id(KEY_CATEGORY, &value);
                    }
                }
                KEY_BRAND => {
                    if let Some(id) = parse_id(KEY_BRAND, &value) {
                        filters.brand_ids.insert(id);
                    }
                }
                LEGACY_KEY_BRAND_IDS => {
                    filters.brand_ids.extend(
                        value
                            .split(',')
                            .filter(|part| !part.trim().is_empty())
                            .filter_map(|part| parse_id(LEGACY_KEY_BRAND_IDS, part)),
                    );
                }
                KEY_MIN_PRICE => {
                    if !std::mem::replace(&mut seen_min, true) {
                        filters.min_price = parse_price(KEY_MIN_PRICE, &value);
                    }
                }
                KEY_MAX_PRICE => {
                    if !std::mem::replace(&mut seen_max, true) {
                        filters.max_price = parse_price(KEY_MAX_PRICE, &value);
                    }
                }
                KEY_RATING => {
                    if !std::mem::replace(&mut seen_rating, true) {
                        filters.rating_floor = parse_number::<u8>(KEY_RATING, &value);
                    }
                }
                KEY_SORT_BY => {
                    let token = value.trim();
                    if token == SALE_FLAG {
                        filters.discount_only = true;
                    } else if let Some(sort_by) = SortBy::from_query_value(token) {
                        if filters.sort_by == SortBy::None {
                            filters.sort_by = sort_by;
                        }
                    } else {
                        discarded(KEY_SORT_BY, token);
                    }
                }
                KEY_PAGE => {
                    if !std::mem::replace(&mut seen_page, true) {
                        address.page = parse_number::<u32>(KEY_PAGE, &value)
                            .filter(|p| *p >= 1)
                            .unwrap_or(1);
                    }
                }
                _ => address.passthrough.push((key, value)),
            }
        }

        address
    }

    /// Canonical query string without the leading `?`. Empty when nothing
    /// is set and the view is on page 1.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut pairs = filter_pairs(&self.filters);
        if self.page > 1 {
            pairs.push((KEY_PAGE.to_string(), self.page.to_string()));
        }
        pairs.extend(self.passthrough.iter().cloned());
        encode_pairs(&pairs)
    }
}

/// Parses only the facet part of a query string.
#[must_use]
pub fn parse_filter_state(query: &str) -> FilterState {
    ViewAddress::parse(query).filters
}

/// Canonical query string for the facets alone.
#[must_use]
pub fn to_query_string(filters: &FilterState) -> String {
    encode_pairs(&filter_pairs(filters))
}

/// Facets as ordered `(key, value)` pairs, the form the gateway forwards to
/// the backend.
#[must_use]
pub fn filter_pairs(filters: &FilterState) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    if let Some(id) = filters.category_id {
        pairs.push((KEY_CATEGORY.to_string(), id.to_string()));
    }
    for id in &filters.brand_ids {
        pairs.push((KEY_BRAND.to_string(), id.to_string()));
    }
    if let Some(min) = filters.min_price {
        pairs.push((KEY_MIN_PRICE.to_string(), min.normalize().to_string()));
    }
    if let Some(max) = filters.max_price {
        pairs.push((KEY_MAX_PRICE.to_string(), max.normalize().to_string()));
    }
    if let Some(rating) = filters.rating_floor {
        pairs.push((KEY_RATING.to_string(), rating.to_string()));
    }
    if let Some(sort) = filters.sort_by.as_query_value() {
        pairs.push((KEY_SORT_BY.to_string(), sort.to_string()));
    }
    if filters.discount_only {
        pairs.push((KEY_SORT_BY.to_string(), SALE_FLAG.to_string()));
    }
    pairs
}

fn encode_pairs(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                utf8_percent_encode(k, QUERY_VALUE),
                utf8_percent_encode(v, QUERY_VALUE)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Splits and decodes `a=1&b=2`. Pairs that are not valid UTF-8 after
/// decoding are skipped.
fn decode_pairs(query: &str) -> impl Iterator<Item = (String, String)> + '_ {
    query
        .trim_start_matches('?')
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            Some((decode_component(key)?, decode_component(value)?))
        })
}

fn decode_component(raw: &str) -> Option<String> {
    let spaced = raw.replace('+', " ");
    match percent_decode_str(&spaced).decode_utf8() {
        Ok(decoded) => Some(decoded.into_owned()),
        Err(_) => {
            tracing::debug!(raw, "skipping query component that is not valid UTF-8");
            None
        }
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Option<T> {
    let parsed = value.trim().parse::<T>().ok();
    if parsed.is_none() {
        discarded(key, value);
    }
    parsed
}

fn parse_id(key: &str, value: &str) -> Option<i64> {
    parse_number::<i64>(key, value).filter(|id| {
        let ok = *id > 0;
        if !ok {
            discarded(key, value);
        }
        ok
    })
}

fn parse_price(key: &str, value: &str) -> Option<Decimal> {
    parse_number::<Decimal>(key, value).filter(|price| {
        let ok = !price.is_sign_negative();
        if !ok {
            discarded(key, value);
        }
        ok
    })
}

fn discarded(key: &str, value: &str) {
    tracing::debug!(key, value, "discarding malformed query value");
}

#[cfg(test)]
#[path = "query_test.rs"]
mod tests;
