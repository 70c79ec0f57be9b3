//! Canonical snapshot of every active facet for one browsing view.
//!
//! A [`FilterState`] is never edited in place. Each user interaction is
//! expressed as a [`FacetChange`] and [`FilterState::change_facet`] returns a
//! new snapshot, so the previous one stays available for comparison.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{BrandId, CategoryId};

/// Comparator applied after filtering. `None` keeps input order, which is
/// the backend's relevance/insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortBy {
    #[default]
    None,
    PriceAsc,
    PriceDesc,
    NameAsc,
    NameDesc,
}

impl SortBy {
    /// Canonical `sort_by` query value; `None` is never written.
    #[must_use]
    pub fn as_query_value(self) -> Option<&'static str> {
        match self {
            SortBy::None => None,
            SortBy::PriceAsc => Some("price-asc"),
            SortBy::PriceDesc => Some("price-desc"),
            SortBy::NameAsc => Some("name-asc"),
            SortBy::NameDesc => Some("name-desc"),
        }
    }

    /// Parses a `sort_by` value. Accepts the backend's underscore spellings
    /// as aliases. Returns `None` for anything unrecognised, including the
    /// `sale` flag which is not a comparator.
    #[must_use]
    pub fn from_query_value(value: &str) -> Option<SortBy> {
        match value {
            "price-asc" | "price_asc" => Some(SortBy::PriceAsc),
            "price-desc" | "price_desc" => Some(SortBy::PriceDesc),
            "name-asc" | "name_asc" => Some(SortBy::NameAsc),
            "name-desc" | "name_desc" => Some(SortBy::NameDesc),
            _ => None,
        }
    }
}

/// The sidebar's fixed price ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PricePreset {
    Under25,
    From25To50,
    From50To100,
    Over100,
}

impl PricePreset {
    pub const ALL: [PricePreset; 4] = [
        PricePreset::Under25,
        PricePreset::From25To50,
        PricePreset::From50To100,
        PricePreset::Over100,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            PricePreset::Under25 => "Under $25",
            PricePreset::From25To50 => "$25 to $50",
            PricePreset::From50To100 => "$50 to $100",
            PricePreset::Over100 => "$100 and above",
        }
    }

    /// Inclusive `(min, max)` bounds; `None` is open.
    #[must_use]
    pub fn bounds(self) -> (Option<Decimal>, Option<Decimal>) {
        let (min, max) = match self {
            PricePreset::Under25 => (0, Some(25)),
            PricePreset::From25To50 => (25, Some(50)),
            PricePreset::From50To100 => (50, Some(100)),
            PricePreset::Over100 => (100, None),
        };
        (Some(Decimal::from(min)), max.map(Decimal::from))
    }
}

/// One explicit facet edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacetChange {
    Category(Option<CategoryId>),
    MinPrice(Option<Decimal>),
    MaxPrice(Option<Decimal>),
    PriceRange {
        min: Option<Decimal>,
        max: Option<Decimal>,
    },
    Preset(PricePreset),
    RatingFloor(Option<u8>),
    ToggleBrand(BrandId),
    Brands(BTreeSet<BrandId>),
    DiscountOnly(bool),
    Sort(SortBy),
    /// Drops every facet.
    Clear,
}

impl FacetChange {
    /// Category changes are navigations and get their own history entry;
    /// every other facet edit replaces the current entry.
    #[must_use]
    pub fn is_navigation(&self) -> bool {
        matches!(self, FacetChange::Category(_))
    }
}

/// A facet as a unit a backend may or may not apply itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facet {
    Category,
    Brands,
    PriceRange,
    RatingFloor,
    Discount,
    Sort,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterState {
    pub(crate) category_id: Option<CategoryId>,
    pub(crate) min_price: Option<Decimal>,
    pub(crate) max_price: Option<Decimal>,
    pub(crate) rating_floor: Option<u8>,
    pub(crate) brand_ids: BTreeSet<BrandId>,
    pub(crate) discount_only: bool,
    pub(crate) sort_by: SortBy,
}

impl FilterState {
    /// Default state scoped to one category, as a category page mounts.
    #[must_use]
    pub fn for_category(category_id: Option<CategoryId>) -> Self {
        Self {
            category_id,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn category_id(&self) -> Option<CategoryId> {
        self.category_id
    }

    #[must_use]
    pub fn min_price(&self) -> Option<Decimal> {
        self.min_price
    }

    #[must_use]
    pub fn max_price(&self) -> Option<Decimal> {
        self.max_price
    }

    #[must_use]
    pub fn rating_floor(&self) -> Option<u8> {
        self.rating_floor
    }

    #[must_use]
    pub fn brand_ids(&self) -> &BTreeSet<BrandId> {
        &self.brand_ids
    }

    #[must_use]
    pub fn discount_only(&self) -> bool {
        self.discount_only
    }

    #[must_use]
    pub fn sort_by(&self) -> SortBy {
        self.sort_by
    }

    /// `true` when no facet constrains or reorders the collection.
    #[must_use]
    pub fn is_unconstrained(&self) -> bool {
        *self == Self::default()
    }

    /// Facets that currently constrain or reorder the collection. A rating
    /// floor of 0 passes every product and does not count.
    #[must_use]
    pub fn active_facets(&self) -> Vec<Facet> {
        let mut active = Vec::new();
        if self.category_id.is_some() {
            active.push(Facet::Category);
        }
        if !self.brand_ids.is_empty() {
            active.push(Facet::Brands);
        }
        if self.min_price.is_some() || self.max_price.is_some() {
            active.push(Facet::PriceRange);
        }
        if self.rating_floor.is_some_and(|floor| floor > 0) {
            active.push(Facet::RatingFloor);
        }
        if self.discount_only {
            active.push(Facet::Discount);
        }
        if self.sort_by != SortBy::None {
            active.push(Facet::Sort);
        }
        active
    }

    /// Copy of this state with every facet outside `keep` reset.
    #[must_use]
    pub fn retain_facets(&self, keep: &[Facet]) -> FilterState {
        let mut kept = self.clone();
        for facet in self.active_facets() {
            if keep.contains(&facet) {
                continue;
            }
            match facet {
                Facet::Category => kept.category_id = None,
                Facet::Brands => kept.brand_ids.clear(),
                Facet::PriceRange => {
                    kept.min_price = None;
                    kept.max_price = None;
                }
                Facet::RatingFloor => kept.rating_floor = None,
                Facet::Discount => kept.discount_only = false,
                Facet::Sort => kept.sort_by = SortBy::None,
            }
        }
        kept
    }

    /// The preset whose bounds match the current price facets exactly.
    #[must_use]
    pub fn active_preset(&self) -> Option<PricePreset> {
        PricePreset::ALL
            .into_iter()
            .find(|p| p.bounds() == (self.min_price, self.max_price))
    }

    /// Returns a new state with `change` applied. `self` is untouched.
    ///
    /// Negative prices and non-positive ids are dropped, mirroring how the
    /// query parser treats them, so any state produced here survives an
    /// address round-trip.
    #[must_use]
    pub fn change_facet(&self, change: FacetChange) -> FilterState {
        let mut next = self.clone();
        match change {
            FacetChange::Category(id) => next.category_id = id.filter(|id| is_valid_id(*id)),
            FacetChange::MinPrice(min) => next.min_price = non_negative(min),
            FacetChange::MaxPrice(max) => next.max_price = non_negative(max),
            FacetChange::PriceRange { min, max } => {
                next.min_price = non_negative(min);
                next.max_price = non_negative(max);
            }
            FacetChange::Preset(preset) => {
                let (min, max) = preset.bounds();
                next.min_price = min;
                next.max_price = max;
            }
            FacetChange::RatingFloor(floor) => next.rating_floor = floor,
            FacetChange::ToggleBrand(id) => {
                if is_valid_id(id) && !next.brand_ids.remove(&id) {
                    next.brand_ids.insert(id);
                }
            }
            FacetChange::Brands(ids) => {
                next.brand_ids = ids.into_iter().filter(|id| is_valid_id(*id)).collect();
            }
            FacetChange::DiscountOnly(on) => next.discount_only = on,
            FacetChange::Sort(sort_by) => next.sort_by = sort_by,
            FacetChange::Clear => next = FilterState::default(),
        }
        next
    }
}

fn non_negative(price: Option<Decimal>) -> Option<Decimal> {
    price.filter(|p| !p.is_sign_negative())
}

fn is_valid_id(id: i64) -> bool {
    id > 0
}
