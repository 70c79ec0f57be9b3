//! Keeps one browsing view's state and its address bar in step.
//!
//! A [`ViewSync`] owns the current [`ViewAddress`], the loaded catalog, and
//! the last applied result. User interaction goes in through
//! [`ViewSync::change_facet`] and [`ViewSync::go_to_page`]; address changes
//! made outside the view (back/forward, hand edits) go in through
//! [`ViewSync::on_address_changed`]. Each returns a [`Refresh`] telling the
//! caller whether the result was recomputed locally or a fetch must be sent.
//!
//! Fetches are tagged with a [`RequestTicket`]. Only the latest ticket of
//! each [`FetchKind`] is applied; anything older is dropped without error.

use crate::category::{CategoryId, CategoryNode, Resolved};
use crate::engine::{self, FilterOutcome, PageLink, PageWindow};
use crate::filter::{FacetChange, FilterState};
use crate::gateway::{
    load_catalog, CatalogData, CatalogGateway, PageRequest, ProductCollection, ProductQuery,
    ProductSource,
};
use crate::products::Brand;
use crate::query::ViewAddress;
use crate::views::{PaginationMode, ViewKind, ViewProfile};

/// Passthrough key carrying the search text on search views.
pub const SEARCH_QUERY_KEY: &str = "query";

/// Clamping a server page can move the address once; a second move means
/// the backend total changed under us and the user can refetch.
const MAX_CLAMP_REFETCHES: usize = 1;

/// How an address write is recorded in history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryMode {
    /// New entry; "back" returns to the previous address.
    Push,
    /// Overwrites the current entry.
    Replace,
}

/// The page's address bar, reduced to its query string.
pub trait AddressBar {
    /// Current query string, with or without the leading `?`.
    fn current_query(&self) -> String;

    fn write(&mut self, query: &str, mode: HistoryMode);
}

/// In-process [`AddressBar`] with a back/forward stack.
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    entries: Vec<String>,
    cursor: usize,
}

impl MemoryHistory {
    #[must_use]
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            entries: vec![initial.into().trim_start_matches('?').to_string()],
            cursor: 0,
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Steps back one entry and returns the new current query, or `None`
    /// at the oldest entry.
    pub fn back(&mut self) -> Option<&str> {
        self.cursor = self.cursor.checked_sub(1)?;
        Some(&self.entries[self.cursor])
    }

    pub fn forward(&mut self) -> Option<&str> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        Some(&self.entries[self.cursor])
    }
}

impl AddressBar for MemoryHistory {
    fn current_query(&self) -> String {
        self.entries[self.cursor].clone()
    }

    fn write(&mut self, query: &str, mode: HistoryMode) {
        match mode {
            HistoryMode::Push => {
                self.entries.truncate(self.cursor + 1);
                self.entries.push(query.to_string());
                self.cursor = self.entries.len() - 1;
            }
            HistoryMode::Replace => self.entries[self.cursor] = query.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchKind {
    /// Category forest plus brand list.
    Catalog,
    Products,
}

/// Tag attached to one in-flight fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    pub kind: FetchKind,
    pub seq: u64,
}

/// Issues monotonically increasing sequence numbers and remembers the
/// latest one per fetch kind.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    next_seq: u64,
    latest_catalog: Option<u64>,
    latest_products: Option<u64>,
}

impl RequestSequencer {
    pub fn issue(&mut self, kind: FetchKind) -> RequestTicket {
        self.next_seq += 1;
        let seq = self.next_seq;
        *self.latest_mut(kind) = Some(seq);
        RequestTicket { kind, seq }
    }

    #[must_use]
    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        let latest = match ticket.kind {
            FetchKind::Catalog => self.latest_catalog,
            FetchKind::Products => self.latest_products,
        };
        latest == Some(ticket.seq)
    }

    fn latest_mut(&mut self, kind: FetchKind) -> &mut Option<u64> {
        match kind {
            FetchKind::Catalog => &mut self.latest_catalog,
            FetchKind::Products => &mut self.latest_products,
        }
    }
}

/// What happened to a completed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// A newer fetch of the same kind was issued; the response was dropped.
    Stale,
    /// The gateway failed; the previous result is still shown.
    Failed,
    /// Applied, but the requested server page was past the end. The
    /// address now points at the last page and [`ViewSync::refresh`] should
    /// be called again.
    Clamped,
}

/// Work the caller has to do after a state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refresh {
    /// The result was recomputed from the collection already held.
    Local,
    /// Send `query` to the gateway and hand the response to
    /// [`ViewSync::complete_products`] with `ticket`.
    Fetch {
        ticket: RequestTicket,
        query: ProductQuery,
    },
}

/// Notifications delivered to subscribers.
#[derive(Debug)]
pub enum ViewEvent<'a> {
    StateChanged {
        address: &'a ViewAddress,
        mode: HistoryMode,
    },
    ResultsApplied {
        outcome: &'a FilterOutcome,
    },
    FetchFailed {
        kind: FetchKind,
        message: &'a str,
    },
}

type Subscriber = Box<dyn FnMut(&ViewEvent<'_>)>;

/// State of one mounted browsing view.
pub struct ViewSync<A: AddressBar> {
    profile: ViewProfile,
    address_bar: A,
    /// Category fixed by the route (`/category/{id}`), kept through Clear.
    route_category: Option<CategoryId>,
    address: ViewAddress,
    /// Last address this view wrote itself, for loop suppression.
    last_written: Option<ViewAddress>,
    catalog: CatalogData,
    catalog_loaded: bool,
    collection: Option<ProductCollection>,
    applied_query: Option<ProductQuery>,
    in_flight: Option<(RequestTicket, ProductQuery)>,
    outcome: Option<FilterOutcome>,
    error: Option<String>,
    sequencer: RequestSequencer,
    subscribers: Vec<Subscriber>,
}

impl<A: AddressBar> std::fmt::Debug for ViewSync<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewSync")
            .field("view", &self.profile.name)
            .field("address", &self.address)
            .field("catalog_loaded", &self.catalog_loaded)
            .field("outcome", &self.outcome.as_ref().map(FilterOutcome::total_count))
            .field("error", &self.error)
            .field("subscribers", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}

impl<A: AddressBar> ViewSync<A> {
    /// Mounts a view on the address bar's current query.
    ///
    /// `route_category` is the category carried by the route itself; it
    /// applies whenever the query does not name one. Nothing is written to
    /// the address bar on mount.
    pub fn mount(profile: ViewProfile, address_bar: A, route_category: Option<CategoryId>) -> Self {
        let mut address = ViewAddress::parse(&address_bar.current_query());
        if address.filters.category_id.is_none() {
            address.filters.category_id = route_category;
        }
        tracing::debug!(
            view = %profile.name,
            query = %address.to_query_string(),
            "view mounted"
        );
        Self {
            profile,
            address_bar,
            route_category,
            address,
            last_written: None,
            catalog: CatalogData::default(),
            catalog_loaded: false,
            collection: None,
            applied_query: None,
            in_flight: None,
            outcome: None,
            error: None,
            sequencer: RequestSequencer::default(),
            subscribers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&ViewEvent<'_>) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    #[must_use]
    pub fn profile(&self) -> &ViewProfile {
        &self.profile
    }

    #[must_use]
    pub fn address(&self) -> &ViewAddress {
        &self.address
    }

    #[must_use]
    pub fn filters(&self) -> &FilterState {
        &self.address.filters
    }

    #[must_use]
    pub fn address_bar(&self) -> &A {
        &self.address_bar
    }

    pub fn address_bar_mut(&mut self) -> &mut A {
        &mut self.address_bar
    }

    #[must_use]
    pub fn outcome(&self) -> Option<&FilterOutcome> {
        self.outcome.as_ref()
    }

    /// User-visible message of the last failed fetch, cleared by the next
    /// successful one.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn brands(&self) -> &[Brand] {
        &self.catalog.brands
    }

    #[must_use]
    pub fn is_catalog_loaded(&self) -> bool {
        self.catalog_loaded
    }

    #[must_use]
    pub fn resolved_category(&self) -> Resolved<'_> {
        self.catalog.tree.resolve(self.address.filters.category_id)
    }

    #[must_use]
    pub fn breadcrumb(&self) -> Vec<&str> {
        self.resolved_category().breadcrumb()
    }

    #[must_use]
    pub fn sidebar(&self) -> Vec<&CategoryNode> {
        self.catalog.tree.sidebar(self.address.filters.category_id)
    }

    /// Page strip for the current result; empty before the first result.
    #[must_use]
    pub fn page_links(&self) -> Vec<PageLink> {
        self.outcome
            .as_ref()
            .map(|o| o.window.page_links())
            .unwrap_or_default()
    }

    /// Applies one facet edit.
    ///
    /// Returns `None` when the edit changes nothing. Otherwise the page
    /// goes back to 1 and the address is rewritten: category changes push
    /// a history entry, every other facet replaces the current one.
    /// [`FacetChange::Clear`] keeps the route category.
    pub fn change_facet(&mut self, change: FacetChange) -> Option<Refresh> {
        let mode = if change.is_navigation() {
            HistoryMode::Push
        } else {
            HistoryMode::Replace
        };
        let is_clear = change == FacetChange::Clear;
        let mut next = self.address.filters.change_facet(change);
        if is_clear {
            next = next.change_facet(FacetChange::Category(self.route_category));
        }
        if next == self.address.filters && self.address.page == 1 {
            return None;
        }
        tracing::debug!(view = %self.profile.name, ?mode, "facet changed");
        self.address.filters = next;
        self.address.page = 1;
        self.write_address(mode);
        Some(self.refresh())
    }

    /// Moves to another page (a new history entry). The page is clamped
    /// against the last known total; `None` when it does not move.
    pub fn go_to_page(&mut self, page: u32) -> Option<Refresh> {
        let mut target = page.max(1);
        if let Some(outcome) = &self.outcome {
            target = outcome.window.with_page(target).page_number();
        }
        if target == self.address.page {
            return None;
        }
        self.address.page = target;
        self.write_address(HistoryMode::Push);
        Some(self.refresh())
    }

    /// Handles an address change the view did not make itself.
    ///
    /// Skipped (`None`) when the parsed address equals the one this view
    /// last wrote or the one it already shows, so the view's own writes do
    /// not loop back into it.
    pub fn on_address_changed(&mut self, query: &str) -> Option<Refresh> {
        let mut incoming = ViewAddress::parse(query);
        if incoming.filters.category_id.is_none() {
            incoming.filters.category_id = self.route_category;
        }
        if self.last_written.as_ref() == Some(&incoming) || incoming == self.address {
            tracing::debug!(view = %self.profile.name, "address change already applied; skipping");
            return None;
        }
        self.address = incoming;
        self.last_written = None;
        emit(
            &mut self.subscribers,
            &ViewEvent::StateChanged {
                address: &self.address,
                mode: HistoryMode::Replace,
            },
        );
        Some(self.refresh())
    }

    /// The product request the current address calls for.
    ///
    /// Client-paginated views ask for the whole collection with no facets
    /// and filter locally. Server-paginated views forward the facets and
    /// the requested page when the listing applies every active facet
    /// itself. Otherwise a backend page would not be a page of the filtered
    /// result, so they fall back to the whole collection, narrowed by the
    /// facets the listing does apply, and slice locally.
    #[must_use]
    pub fn product_query(&self) -> ProductQuery {
        let source = match self.profile.kind {
            ViewKind::Category => ProductSource::Category {
                scope: self.category_scope(),
            },
            ViewKind::Recommended => ProductSource::Recommended {
                limit: self.profile.feed_limit(),
            },
            ViewKind::Search => ProductSource::Search {
                query: self
                    .address
                    .passthrough_value(SEARCH_QUERY_KEY)
                    .unwrap_or_default()
                    .trim()
                    .to_string(),
            },
            ViewKind::NewArrivals => ProductSource::NewArrivals {
                limit: self.profile.feed_limit(),
            },
            ViewKind::Admin => ProductSource::AdminList,
        };
        match self.profile.pagination {
            PaginationMode::Client => ProductQuery {
                source,
                filters: FilterState::default(),
                page: None,
            },
            PaginationMode::Server => {
                let filters = self.engine_filters();
                if source.supports(&filters) {
                    ProductQuery {
                        source,
                        filters,
                        page: Some(PageRequest {
                            page: self.address.page,
                            size: self.profile.page_size,
                        }),
                    }
                } else {
                    let filters = filters.retain_facets(source.supported_facets());
                    ProductQuery {
                        source,
                        filters,
                        page: None,
                    }
                }
            }
        }
    }

    /// Recomputes locally when the collection held already answers the
    /// current address; otherwise issues a new products ticket.
    pub fn refresh(&mut self) -> Refresh {
        let query = self.product_query();
        if self.collection.is_some() && self.applied_query.as_ref() == Some(&query) {
            self.recompute();
            return Refresh::Local;
        }
        self.begin_products_fetch(query)
    }

    /// Issues a products ticket for `query`, superseding any fetch in flight.
    pub fn begin_products_fetch(&mut self, query: ProductQuery) -> Refresh {
        let ticket = self.sequencer.issue(FetchKind::Products);
        tracing::debug!(
            view = %self.profile.name,
            seq = ticket.seq,
            source = query.source.label(),
            "products fetch issued"
        );
        self.in_flight = Some((ticket, query.clone()));
        Refresh::Fetch { ticket, query }
    }

    pub fn begin_catalog_fetch(&mut self) -> RequestTicket {
        self.sequencer.issue(FetchKind::Catalog)
    }

    /// Applies a catalog response if `ticket` is still the latest.
    pub fn complete_catalog<E: std::fmt::Display>(
        &mut self,
        ticket: RequestTicket,
        result: Result<CatalogData, E>,
    ) -> FetchOutcome {
        if !self.sequencer.is_current(ticket) {
            tracing::debug!(
                view = %self.profile.name,
                seq = ticket.seq,
                "discarding stale catalog response"
            );
            return FetchOutcome::Stale;
        }
        match result {
            Ok(catalog) => {
                self.catalog = catalog;
                self.catalog_loaded = true;
                self.error = None;
                FetchOutcome::Applied
            }
            Err(e) => self.fail(FetchKind::Catalog, &e),
        }
    }

    /// Applies a products response if `ticket` is still the latest.
    ///
    /// On failure the previous result stays in place and [`Self::error`]
    /// carries the message.
    pub fn complete_products<E: std::fmt::Display>(
        &mut self,
        ticket: RequestTicket,
        result: Result<ProductCollection, E>,
    ) -> FetchOutcome {
        let Some((_, query)) = self.in_flight.take_if(|(pending, _)| *pending == ticket) else {
            tracing::debug!(
                view = %self.profile.name,
                seq = ticket.seq,
                "discarding stale products response"
            );
            return FetchOutcome::Stale;
        };
        match result {
            Ok(collection) => {
                let paginated = collection.is_paginated();
                self.collection = Some(collection);
                self.applied_query = Some(query);
                self.error = None;
                let clamped = self.recompute();
                if clamped && paginated {
                    FetchOutcome::Clamped
                } else {
                    FetchOutcome::Applied
                }
            }
            Err(e) => self.fail(FetchKind::Products, &e),
        }
    }

    /// Loads catalog metadata, then products. Also the explicit re-fetch
    /// after a failure.
    pub async fn load<G: CatalogGateway>(&mut self, gateway: &G) -> FetchOutcome {
        let ticket = self.begin_catalog_fetch();
        let catalog = load_catalog(gateway).await;
        match self.complete_catalog(ticket, catalog) {
            FetchOutcome::Applied => {}
            other => return other,
        }
        // Scope and query depend on the catalog just loaded.
        self.applied_query = None;
        let refresh = self.refresh();
        self.run(gateway, refresh).await
    }

    /// Drives a [`Refresh`] to completion against `gateway`.
    pub async fn run<G: CatalogGateway>(&mut self, gateway: &G, refresh: Refresh) -> FetchOutcome {
        let mut refresh = refresh;
        let mut clamp_refetches = 0;
        loop {
            let Refresh::Fetch { ticket, query } = refresh else {
                return FetchOutcome::Applied;
            };
            let result = gateway.fetch_products(&query).await;
            match self.complete_products(ticket, result) {
                FetchOutcome::Clamped if clamp_refetches < MAX_CLAMP_REFETCHES => {
                    clamp_refetches += 1;
                    refresh = self.refresh();
                }
                other => return other,
            }
        }
    }

    /// Facets the engine applies. Category views scope their source to the
    /// selected subtree, so the exact-match category facet is dropped there.
    fn engine_filters(&self) -> FilterState {
        match self.profile.kind {
            ViewKind::Category => self.address.filters.change_facet(FacetChange::Category(None)),
            _ => self.address.filters.clone(),
        }
    }

    /// Selected category and all its descendants; empty (every category)
    /// when nothing is selected or the id is unknown.
    fn category_scope(&self) -> Vec<CategoryId> {
        self.address
            .filters
            .category_id
            .map(|id| self.catalog.tree.subtree_ids(id))
            .unwrap_or_default()
    }

    /// Rebuilds the outcome from the collection held. Returns `true` when
    /// the page number had to be clamped (the address is rewritten).
    fn recompute(&mut self) -> bool {
        let Some(collection) = &self.collection else {
            return false;
        };
        let window = PageWindow::new(self.address.page, self.profile.page_size);
        let outcome = engine::apply_collection(collection, &self.engine_filters(), window);
        tracing::info!(
            view = %self.profile.name,
            shown = outcome.items.len(),
            total = outcome.total_count(),
            page = outcome.window.page_number(),
            "results applied"
        );

        let page = outcome.window.page_number();
        let clamped = page != self.address.page;
        self.outcome = Some(outcome);
        if clamped {
            self.address.page = page;
            self.write_address(HistoryMode::Replace);
        }
        if let Some(outcome) = &self.outcome {
            emit(&mut self.subscribers, &ViewEvent::ResultsApplied { outcome });
        }
        clamped
    }

    fn fail(&mut self, kind: FetchKind, error: &dyn std::fmt::Display) -> FetchOutcome {
        let message = error.to_string();
        tracing::warn!(view = %self.profile.name, ?kind, error = %message, "fetch failed");
        emit(
            &mut self.subscribers,
            &ViewEvent::FetchFailed {
                kind,
                message: &message,
            },
        );
        self.error = Some(message);
        FetchOutcome::Failed
    }

    fn write_address(&mut self, mode: HistoryMode) {
        let query = self.address.to_query_string();
        tracing::debug!(view = %self.profile.name, %query, ?mode, "address written");
        self.address_bar.write(&query, mode);
        self.last_written = Some(self.address.clone());
        emit(
            &mut self.subscribers,
            &ViewEvent::StateChanged {
                address: &self.address,
                mode,
            },
        );
    }
}

fn emit(subscribers: &mut [Subscriber], event: &ViewEvent<'_>) {
    for subscriber in subscribers.iter_mut() {
        subscriber(event);
    }
}

#[cfg(test)]
#[path = "sync_test.rs"]
mod tests;
