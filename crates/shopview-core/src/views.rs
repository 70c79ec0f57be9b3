use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// The backend's `max_page_size`; larger requests are silently capped there.
pub const MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_PAGE_SIZE: u32 = 12;
/// Feed length requested by recommendation and new-arrival views.
pub const DEFAULT_FEED_LIMIT: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewKind {
    /// A category page scoped to one subtree.
    Category,
    /// "Chosen for you" recommendations.
    Recommended,
    /// Search results for the address's `query` parameter.
    Search,
    NewArrivals,
    /// The admin console's product list.
    Admin,
}

impl std::fmt::Display for ViewKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewKind::Category => write!(f, "category"),
            ViewKind::Recommended => write!(f, "recommended"),
            ViewKind::Search => write!(f, "search"),
            ViewKind::NewArrivals => write!(f, "new-arrivals"),
            ViewKind::Admin => write!(f, "admin"),
        }
    }
}

/// Where slicing into pages happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaginationMode {
    /// The gateway returns the whole collection; the engine slices it.
    Client,
    /// The gateway returns one page and a total count.
    Server,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewProfile {
    pub name: String,
    pub kind: ViewKind,
    pub pagination: PaginationMode,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Feed length for recommendation and new-arrival views.
    #[serde(default)]
    pub limit: Option<u32>,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl ViewProfile {
    #[must_use]
    pub fn feed_limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_FEED_LIMIT)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ViewsFile {
    pub views: Vec<ViewProfile>,
}

impl ViewsFile {
    /// The five views the storefront and console ship with.
    #[must_use]
    pub fn builtin() -> Self {
        let profile = |name: &str, kind, pagination, page_size, limit| ViewProfile {
            name: name.to_string(),
            kind,
            pagination,
            page_size,
            limit,
        };
        Self {
            views: vec![
                profile("category", ViewKind::Category, PaginationMode::Server, 12, None),
                profile(
                    "chosen-for-you",
                    ViewKind::Recommended,
                    PaginationMode::Client,
                    12,
                    Some(200),
                ),
                profile("search", ViewKind::Search, PaginationMode::Server, 12, None),
                profile(
                    "new-arrivals",
                    ViewKind::NewArrivals,
                    PaginationMode::Client,
                    12,
                    Some(50),
                ),
                profile("admin-products", ViewKind::Admin, PaginationMode::Server, 20, None),
            ],
        }
    }

    /// Case-insensitive lookup by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&ViewProfile> {
        self.views
            .iter()
            .find(|v| v.name.eq_ignore_ascii_case(name))
    }
}

/// Load and validate view profiles from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_views(path: &Path) -> Result<ViewsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ViewsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let views_file: ViewsFile =
        serde_yaml::from_str(&content).map_err(ConfigError::ViewsFileParse)?;

    validate_views(&views_file)?;

    Ok(views_file)
}

/// Like [`load_views`], but falls back to [`ViewsFile::builtin`] when the
/// file does not exist. A file that exists but is invalid is still an error.
///
/// # Errors
///
/// Returns `ConfigError` if an existing file cannot be read, parsed, or fails
/// validation.
pub fn load_views_or_builtin(path: &Path) -> Result<ViewsFile, ConfigError> {
    if path.exists() {
        load_views(path)
    } else {
        tracing::debug!(path = %path.display(), "views file not found; using built-in profiles");
        Ok(ViewsFile::builtin())
    }
}

fn validate_views(views_file: &ViewsFile) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();

    for view in &views_file.views {
        if view.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "view name must be non-empty".to_string(),
            ));
        }

        if !(1..=MAX_PAGE_SIZE).contains(&view.page_size) {
            return Err(ConfigError::Validation(format!(
                "view '{}' has invalid page_size {}; must be 1..={MAX_PAGE_SIZE}",
                view.name, view.page_size
            )));
        }

        if view.limit == Some(0) {
            return Err(ConfigError::Validation(format!(
                "view '{}' has a zero limit",
                view.name
            )));
        }

        let lower_name = view.name.to_lowercase();
        if !seen_names.insert(lower_name) {
            return Err(ConfigError::Validation(format!(
                "duplicate view name: '{}'",
                view.name
            )));
        }
    }

    Ok(())
}
