//! product-shelf: fetch a product catalog, filter it, and pick products.
//!
//! The library side is a plain owned store with no rendering dependency:
//!
//! ```rust,no_run
//! use product_shelf::{CatalogSource, CatalogStore, CriteriaUpdate};
//!
//! let mut store = CatalogStore::default();
//! store.load(&CatalogSource::default())?;
//! store.set_criteria(CriteriaUpdate::new().search("phone").max_price(Some(500.0)));
//! for product in store.visible() {
//!     println!("{} {}", product.title, product.display_price());
//! }
//! # Ok::<(), product_shelf::LoadFailure>(())
//! ```
//!
//! Enable the `cli` feature for the command line and terminal browser
//! (`shelf browse`, `shelf list`, `shelf categories`).

pub use shelf_catalog::*;

#[cfg(feature = "cli")]
pub use shelf_cli as cli;
