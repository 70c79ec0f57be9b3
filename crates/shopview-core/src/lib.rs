//! Category resolution and faceted browsing for the storefront catalog.

pub mod app_config;
pub mod category;
pub mod config;
pub mod engine;
pub mod filter;
pub mod gateway;
pub mod products;
pub mod query;
pub mod sync;
pub mod views;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use category::{
    CategoryId, CategoryNode, CategoryPayload, CategoryTree, FlatCategory, MalformedTreeError,
    NestedCategory, Resolved, ALL_PRODUCTS_LABEL,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use engine::{apply, apply_collection, FilterOutcome, PageLink, PageWindow};
pub use filter::{Facet, FacetChange, FilterState, PricePreset, SortBy};
pub use gateway::{
    load_catalog, CatalogData, CatalogGateway, PageRequest, ProductCollection, ProductQuery,
    ProductSource,
};
pub use products::{Brand, BrandId, Product, ProductId};
pub use query::{filter_pairs, parse_filter_state, to_query_string, ViewAddress};
pub use sync::{
    AddressBar, FetchKind, FetchOutcome, HistoryMode, MemoryHistory, Refresh, RequestTicket,
    ViewEvent, ViewSync,
};
pub use views::{
    load_views, load_views_or_builtin, PaginationMode, ViewKind, ViewProfile, ViewsFile,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read views file {path}: {source}")]
    ViewsFileIo {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse views file: {0}")]
    ViewsFileParse(#[from] serde_yaml::Error),

    #[error("views validation failed: {0}")]
    Validation(String),
}
