//! Product records and catalog body decoding.

use crate::LoadFailure;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Identifier of a product, unique within one catalog.
pub type ProductId = u64;

/// A single catalog entry, immutable once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub price: f64,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub category: String,
    /// Image URL.
    #[serde(default)]
    pub thumbnail: String,
}

impl Product {
    /// Price formatted the way cards and listings show it (`$12.99`).
    pub fn display_price(&self) -> String {
        format!("${:.2}", self.price)
    }
}

/// Response body of the catalog endpoint. Anything besides `products`
/// (`total`, `skip`, `limit`, ...) is ignored.
#[derive(Deserialize)]
struct CatalogBody {
    products: Vec<Product>,
}

/// Decode a catalog body and check the invariants the store relies on.
pub fn parse_catalog(body: &str) -> Result<Vec<Product>, LoadFailure> {
    let parsed: CatalogBody = serde_json::from_str(body)?;
    validate_products(&parsed.products)?;
    Ok(parsed.products)
}

/// Prices must be finite and non-negative; ids must be unique.
fn validate_products(products: &[Product]) -> Result<(), LoadFailure> {
    let mut seen = BTreeSet::new();
    for product in products {
        if !product.price.is_finite() || product.price < 0.0 {
            return Err(LoadFailure::InvalidProduct {
                id: product.id,
                reason: format!("price {} is not a non-negative number", product.price),
            });
        }
        if !seen.insert(product.id) {
            return Err(LoadFailure::InvalidProduct {
                id: product.id,
                reason: "duplicate id".to_string(),
            });
        }
    }
    Ok(())
}
