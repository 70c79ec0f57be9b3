//! Storefront backend implementation of [`shopview_core::CatalogGateway`].

pub mod client;
pub mod error;
pub mod normalize;
pub mod types;

pub use client::HttpCatalogGateway;
pub use error::GatewayError;
