//! HTTP client for the storefront REST backend.
//!
//! Wraps `reqwest` with typed response decoding and the per-endpoint facet
//! parameters each product listing understands. Only the facets a listing
//! applies the way the engine does are forwarded (see
//! [`ProductSource::supported_facets`]); the engine re-applies every facet
//! on whatever comes back.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use shopview_core::views::MAX_PAGE_SIZE;
use shopview_core::{
    AppConfig, Brand, CatalogGateway, CategoryTree, FilterState, PageRequest, Product,
    ProductCollection, ProductQuery, ProductSource,
};

use crate::error::GatewayError;
use crate::normalize::{category_payload, normalize_brand, normalize_product};
use crate::types::{Listing, WireBrand, WireCategory, WireProduct};

const CATEGORIES_PATH: &str = "categories/";
const BRANDS_PATH: &str = "brands/";
const PRODUCTS_PATH: &str = "products/";
const PRODUCTS_BY_CATEGORIES_PATH: &str = "products/products-by-categories/";
const CHOSEN_FOR_YOU_PATH: &str = "products/chosen-for-you/";
const SEARCH_PATH: &str = "products/search/";
const NEW_ARRIVALS_PATH: &str = "products/new-arrivals/";

/// Client for the storefront backend.
///
/// Use [`HttpCatalogGateway::new`] with the loaded configuration, or
/// [`HttpCatalogGateway::with_base_url`] to point at a mock server in tests.
pub struct HttpCatalogGateway {
    client: Client,
    base_url: Url,
    api_token: Option<String>,
}

impl HttpCatalogGateway {
    /// Creates a client from application configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`GatewayError::InvalidBaseUrl`] if the
    /// configured base URL does not parse.
    pub fn new(config: &AppConfig) -> Result<Self, GatewayError> {
        let gateway = Self::with_base_url(
            &config.api_base_url,
            config.request_timeout_secs,
            &config.user_agent,
        )?;
        Ok(match &config.api_token {
            Some(token) => gateway.with_api_token(token),
            None => gateway,
        })
    }

    /// Creates a client with an explicit base URL.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`GatewayError::InvalidBaseUrl`] if
    /// `base_url` is not a valid URL.
    pub fn with_base_url(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Exactly one trailing slash, so relative endpoint paths join below
        // the base path instead of replacing its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| GatewayError::InvalidBaseUrl {
            base_url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            api_token: None,
        })
    }

    /// Sends `Authorization: Bearer <token>` with every request.
    #[must_use]
    pub fn with_api_token(mut self, token: &str) -> Self {
        self.api_token = Some(token.to_owned());
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds the full request URL with properly percent-encoded query parameters.
    fn build_url(&self, path: &str, params: &[(&str, String)]) -> Result<Url, GatewayError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| GatewayError::InvalidBaseUrl {
                base_url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    /// Sends a GET request, asserts a 2xx status, and decodes the body.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Http`] on network failure,
    /// [`GatewayError::UnexpectedStatus`] on a non-2xx status, and
    /// [`GatewayError::Deserialize`] if the body does not match `T`.
    async fn request_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, GatewayError> {
        tracing::debug!(%url, "backend request");
        let mut request = self.client.get(url.clone());
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| GatewayError::Deserialize {
            context: url.path().to_string(),
            source: e,
        })
    }

    async fn fetch_listing(
        &self,
        path: &str,
        params: &[(&'static str, String)],
        page: PageRequest,
    ) -> Result<Listing<WireProduct>, GatewayError> {
        let mut params = params.to_vec();
        params.push(("page", page.page.to_string()));
        params.push(("size", page.size.to_string()));
        let url = self.build_url(path, &params)?;
        self.request_json(&url).await
    }

    /// Collects a whole listing. Paginated listings are walked at the
    /// largest page size the backend allows until `count` items arrived;
    /// listings that answer with a bare array ignore the paging parameters
    /// and are done after one request.
    async fn fetch_every_page(
        &self,
        path: &str,
        params: &[(&'static str, String)],
    ) -> Result<Vec<Product>, GatewayError> {
        let mut products = Vec::new();
        let mut page = 1;
        loop {
            let request = PageRequest {
                page,
                size: MAX_PAGE_SIZE,
            };
            match self.fetch_listing(path, params, request).await? {
                Listing::Bare(items) => {
                    products.extend(items.into_iter().map(normalize_product));
                    return Ok(products);
                }
                Listing::Page { count, results } => {
                    let received = results.len();
                    products.extend(results.into_iter().map(normalize_product));
                    if received == 0 || products.len() >= count {
                        tracing::debug!(
                            path,
                            pages = page,
                            items = products.len(),
                            "listing walked"
                        );
                        return Ok(products);
                    }
                    page += 1;
                }
            }
        }
    }
}

impl CatalogGateway for HttpCatalogGateway {
    type Error = GatewayError;

    async fn fetch_categories(&self) -> Result<CategoryTree, GatewayError> {
        let url = self.build_url(CATEGORIES_PATH, &[])?;
        let listing: Listing<WireCategory> = self.request_json(&url).await?;
        let tree = CategoryTree::build(category_payload(listing.into_items()))?;
        Ok(tree)
    }

    async fn fetch_brands(&self) -> Result<Vec<Brand>, GatewayError> {
        let url = self.build_url(BRANDS_PATH, &[])?;
        let listing: Listing<WireBrand> = self.request_json(&url).await?;
        Ok(listing.into_items().into_iter().map(normalize_brand).collect())
    }

    async fn fetch_products(
        &self,
        query: &ProductQuery,
    ) -> Result<ProductCollection, GatewayError> {
        let (path, params) = product_request(query);
        let collection = match query.page {
            Some(page) => match self.fetch_listing(path, &params, page).await? {
                Listing::Page { count, results } => ProductCollection::Page {
                    items: results.into_iter().map(normalize_product).collect(),
                    total_count: count,
                },
                Listing::Bare(items) => {
                    ProductCollection::Full(items.into_iter().map(normalize_product).collect())
                }
            },
            None => ProductCollection::Full(self.fetch_every_page(path, &params).await?),
        };
        tracing::debug!(
            source = query.source.label(),
            items = collection.len(),
            paginated = collection.is_paginated(),
            "products received"
        );
        Ok(collection)
    }
}

/// Endpoint path and facet parameters for one product request. Paging
/// parameters are added per request.
fn product_request(query: &ProductQuery) -> (&'static str, Vec<(&'static str, String)>) {
    let filters = query.filters.retain_facets(query.source.supported_facets());
    let mut params = Vec::new();
    let path = match &query.source {
        ProductSource::Category { scope } => {
            params.extend(scope.iter().map(|id| ("category_ids", id.to_string())));
            push_rating(&mut params, &filters);
            push_sale(&mut params, &filters);
            PRODUCTS_BY_CATEGORIES_PATH
        }
        ProductSource::Recommended { limit } => {
            params.extend(filters.brand_ids().iter().map(|id| ("brand", id.to_string())));
            if let Some(category) = filters.category_id() {
                params.push(("category", category.to_string()));
            }
            push_rating(&mut params, &filters);
            push_sale(&mut params, &filters);
            params.push(("limit", limit.to_string()));
            CHOSEN_FOR_YOU_PATH
        }
        ProductSource::Search { query: text } => {
            params.push(("q", text.clone()));
            if !filters.brand_ids().is_empty() {
                let joined = filters
                    .brand_ids()
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(",");
                params.push(("brand_ids", joined));
            }
            push_rating(&mut params, &filters);
            SEARCH_PATH
        }
        ProductSource::NewArrivals { limit } => {
            params.push(("limit", limit.to_string()));
            NEW_ARRIVALS_PATH
        }
        ProductSource::AdminList => PRODUCTS_PATH,
    };
    (path, params)
}

/// A floor of 0 is no constraint; the backend would drop unrated products.
fn push_rating(params: &mut Vec<(&'static str, String)>, filters: &FilterState) {
    if let Some(rating) = filters.rating_floor().filter(|floor| *floor > 0) {
        params.push(("rating", rating.to_string()));
    }
}

/// `sort_by=sale` is a filter on the backend, not an ordering.
fn push_sale(params: &mut Vec<(&'static str, String)>, filters: &FilterState) {
    if filters.discount_only() {
        params.push(("sort_by", "sale".to_string()));
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
