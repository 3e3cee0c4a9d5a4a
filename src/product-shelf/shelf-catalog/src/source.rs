//! Where catalogs come from.

use crate::{LoadFailure, Product, parse_catalog};
use std::fmt;
use std::path::PathBuf;

/// The public catalog endpoint used when nothing else is configured.
pub const DEFAULT_CATALOG_URL: &str = "https://dummyjson.com/products";

const USER_AGENT: &str = "product-shelf (https://github.com/product-shelf/product-shelf)";

/// Anything that can hand the store a full catalog.
pub trait CatalogProvider {
    fn fetch(&self) -> Result<Vec<Product>, LoadFailure>;
}

/// Where to read the catalog from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    /// HTTP GET against a fixed endpoint; no query parameters are sent.
    Remote(String),
    /// A local JSON file with the same body as the endpoint.
    Local(PathBuf),
}

impl Default for CatalogSource {
    fn default() -> Self {
        CatalogSource::Remote(DEFAULT_CATALOG_URL.to_string())
    }
}

impl CatalogSource {
    /// `http://` and `https://` locations are remote, anything else is a path.
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            CatalogSource::Remote(location.to_string())
        } else {
            CatalogSource::Local(PathBuf::from(location))
        }
    }
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogSource::Remote(url) => f.write_str(url),
            CatalogSource::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

impl CatalogProvider for CatalogSource {
    fn fetch(&self) -> Result<Vec<Product>, LoadFailure> {
        match self {
            CatalogSource::Remote(url) => fetch_remote(url),
            CatalogSource::Local(path) => {
                let body = std::fs::read_to_string(path).map_err(|e| LoadFailure::Io {
                    path: path.display().to_string(),
                    source: e,
                })?;
                parse_catalog(&body)
            }
        }
    }
}

fn fetch_remote(url: &str) -> Result<Vec<Product>, LoadFailure> {
    let request_failed = |e: reqwest::Error| LoadFailure::Request {
        url: url.to_string(),
        source: e,
    };

    let client = reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(request_failed)?;

    let response = client.get(url).send().map_err(request_failed)?;

    if !response.status().is_success() {
        return Err(LoadFailure::Status {
            url: url.to_string(),
            status: response.status(),
        });
    }

    let body = response.text().map_err(request_failed)?;
    parse_catalog(&body)
}
