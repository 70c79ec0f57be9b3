//! Command handlers that drive a [`ViewSync`] against the live backend.
//!
//! Each handler loads configuration-dependent pieces itself so `main` stays
//! a thin dispatcher.

use anyhow::Context;
use shopview_core::{
    load_views_or_builtin, AppConfig, CatalogGateway, CategoryId, FetchOutcome, MemoryHistory,
    PageLink, ViewAddress, ViewSync,
};
use shopview_gateway::HttpCatalogGateway;

/// Load one view and print what a shopper would see.
///
/// # Errors
///
/// Returns an error if the view is unknown, the gateway cannot be built,
/// or the backend fails before any result is shown.
pub(crate) async fn run_browse(
    config: &AppConfig,
    view_name: &str,
    address: Option<&str>,
    route_category: Option<CategoryId>,
    page: Option<u32>,
) -> anyhow::Result<()> {
    let views = load_views_or_builtin(&config.views_path)?;
    let profile = views
        .find(view_name)
        .cloned()
        .with_context(|| format!("unknown view '{view_name}'"))?;
    let gateway = HttpCatalogGateway::new(config)?;

    let history = MemoryHistory::new(address.unwrap_or_default());
    let mut view = ViewSync::mount(profile, history, route_category);

    let mut outcome = view.load(&gateway).await;
    if let Some(page) = page {
        if let Some(refresh) = view.go_to_page(page) {
            outcome = view.run(&gateway, refresh).await;
        }
    }
    if outcome == FetchOutcome::Failed && view.outcome().is_none() {
        anyhow::bail!(
            "failed to load view '{view_name}': {}",
            view.error().unwrap_or("unknown error")
        );
    }

    print_view(&view);
    Ok(())
}

fn print_view(view: &ViewSync<MemoryHistory>) {
    let breadcrumb = view.breadcrumb();
    if !breadcrumb.is_empty() {
        println!("{}", breadcrumb.join(" > "));
    }
    let sidebar: Vec<&str> = view.sidebar().iter().map(|n| n.name.as_str()).collect();
    if !sidebar.is_empty() {
        println!("categories: {}", sidebar.join(", "));
    }
    println!("address: ?{}", view.address().to_query_string());

    let Some(outcome) = view.outcome() else {
        println!("no results");
        return;
    };
    if let Some(error) = view.error() {
        println!("warning: showing previous results ({error})");
    }

    println!(
        "{} products, page {} of {}",
        outcome.total_count(),
        outcome.window.page_number(),
        outcome.window.total_pages()
    );
    println!("{:<8}{:<10}{:<8}{:<24}NAME", "ID", "PRICE", "RATING", "BRAND");
    for product in &outcome.items {
        let price = product
            .effective_price()
            .map_or_else(|| "-".to_string(), |p| p.to_string());
        let rating = product
            .rating
            .map_or_else(|| "-".to_string(), |r| format!("{r:.1}"));
        println!(
            "{:<8}{:<10}{:<8}{:<24}{}",
            product.id,
            price,
            rating,
            product.brand_name.as_deref().unwrap_or("-"),
            product.name
        );
    }

    let strip = format_page_links(&view.page_links());
    if !strip.is_empty() {
        println!("{strip}");
    }
}

/// Render the page strip, bracketing the current page.
pub(crate) fn format_page_links(links: &[PageLink]) -> String {
    links
        .iter()
        .map(|link| match link {
            PageLink::Page {
                number,
                current: true,
            } => format!("[{number}]"),
            PageLink::Page { number, .. } => number.to_string(),
            PageLink::Ellipsis => "...".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Print the category forest, one indented line per node.
///
/// # Errors
///
/// Returns an error if the gateway cannot be built or the request fails.
pub(crate) async fn run_tree(config: &AppConfig) -> anyhow::Result<()> {
    let gateway = HttpCatalogGateway::new(config)?;
    let tree = gateway
        .fetch_categories()
        .await
        .context("failed to fetch categories")?;

    if tree.is_empty() {
        println!("no categories");
        return Ok(());
    }
    for (depth, node) in tree.picker_entries() {
        println!("{}{} ({})", "  ".repeat(depth), node.name, node.id);
    }
    Ok(())
}

/// List view profiles from the views file, or the built-ins when it is absent.
///
/// # Errors
///
/// Returns an error if the views file exists but is invalid.
pub(crate) fn run_views(config: &AppConfig) -> anyhow::Result<()> {
    let views = load_views_or_builtin(&config.views_path)?;
    println!("{:<18}{:<14}{:<12}{:<10}LIMIT", "NAME", "KIND", "PAGINATION", "SIZE");
    for profile in &views.views {
        let limit = profile
            .limit
            .map_or_else(|| "-".to_string(), |l| l.to_string());
        let pagination = match profile.pagination {
            shopview_core::PaginationMode::Client => "client",
            shopview_core::PaginationMode::Server => "server",
        };
        println!(
            "{:<18}{:<14}{:<12}{:<10}{}",
            profile.name, profile.kind, pagination, profile.page_size, limit
        );
    }
    Ok(())
}

/// Canonical form of a hand-written query string.
pub(crate) fn canonicalize(query: &str) -> String {
    let canonical = ViewAddress::parse(query).to_query_string();
    if canonical.is_empty() {
        canonical
    } else {
        format!("?{canonical}")
    }
}
