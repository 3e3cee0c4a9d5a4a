//! Product catalog loading, filtering and selection.
//!
//! A [`CatalogStore`] owns the fetched catalog, the current
//! [`FilterCriteria`] and the set of selected product ids. Every mutating
//! operation recomputes the visible set explicitly, so the store can be
//! driven and inspected without any rendering environment.

mod criteria;
mod error;
mod product;
mod source;
mod store;

pub use criteria::{CriteriaUpdate, FilterCriteria};
pub use error::LoadFailure;
pub use product::{Product, ProductId, parse_catalog};
pub use source::{CatalogProvider, CatalogSource, DEFAULT_CATALOG_URL};
pub use store::{CatalogStore, LoadState, StoreOptions};
