//! The catalog store: owned catalog, criteria and selection, plus the
//! visible set derived from them.

use crate::{CatalogProvider, CriteriaUpdate, FilterCriteria, LoadFailure, Product, ProductId};
use std::collections::BTreeSet;
use tracing::{debug, error, info};

/// Progress of the catalog load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    NotLoaded,
    Loading,
    Loaded,
}

/// Behavior switches for a [`CatalogStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// When false, the category criterion is kept but never applied.
    pub category_filter: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            category_filter: true,
        }
    }
}

#[derive(Debug)]
pub struct CatalogStore {
    options: StoreOptions,
    products: Vec<Product>,
    criteria: FilterCriteria,
    selection: BTreeSet<ProductId>,
    /// Indices into `products`; refreshed by `recompute` after every mutation.
    visible: Vec<usize>,
    state: LoadState,
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new(StoreOptions::default())
    }
}

impl CatalogStore {
    pub fn new(options: StoreOptions) -> Self {
        Self {
            options,
            products: Vec::new(),
            criteria: FilterCriteria::default(),
            selection: BTreeSet::new(),
            visible: Vec::new(),
            state: LoadState::NotLoaded,
        }
    }

    /// Store pre-populated with `products`, as if a load had succeeded.
    pub fn with_products(options: StoreOptions, products: Vec<Product>) -> Self {
        let mut store = Self::new(options);
        store.products = products;
        store.state = LoadState::Loaded;
        store.recompute();
        store
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Fetch the full catalog from `provider`.
    ///
    /// On failure the catalog, criteria and selection are left as they were
    /// and the load state falls back to what it was before the call.
    pub fn load<P>(&mut self, provider: &P) -> Result<(), LoadFailure>
    where
        P: CatalogProvider + ?Sized,
    {
        let previous = self.state;
        self.state = LoadState::Loading;

        match provider.fetch() {
            Ok(products) => {
                info!(count = products.len(), "loaded catalog");
                self.products = products;
                self.state = LoadState::Loaded;
                self.recompute();
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "failed to load catalog");
                self.state = previous;
                Err(e)
            }
        }
    }

    /// Merge `update` into the criteria and recompute the visible set.
    pub fn set_criteria(&mut self, update: CriteriaUpdate) {
        self.criteria.merge(update);
        debug!(criteria = ?self.criteria, "criteria changed");
        self.recompute();
    }

    /// Reset every criterion.
    pub fn clear_criteria(&mut self) {
        self.set_criteria(CriteriaUpdate::clear_all());
    }

    /// Flip membership of `id` in the selection. Returns true if `id` is now
    /// selected.
    pub fn toggle_selection(&mut self, id: ProductId) -> bool {
        let selected = if self.selection.remove(&id) {
            false
        } else {
            self.selection.insert(id);
            true
        };
        debug!(id, selected, "toggled selection");
        selected
    }

    /// Rebuild the visible set from the catalog and the current criteria.
    pub fn recompute(&mut self) {
        let with_category = self.options.category_filter;
        self.visible = self
            .products
            .iter()
            .enumerate()
            .filter(|(_, p)| self.criteria.matches(p, with_category))
            .map(|(i, _)| i)
            .collect();
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn options(&self) -> StoreOptions {
        self.options
    }

    pub fn load_state(&self) -> LoadState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == LoadState::Loading
    }

    /// The full catalog.
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// Products matching the current criteria, in catalog order.
    pub fn visible(&self) -> impl ExactSizeIterator<Item = &Product> + '_ {
        self.visible.iter().map(|&i| &self.products[i])
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    /// The `index`th visible product.
    pub fn visible_at(&self, index: usize) -> Option<&Product> {
        self.visible.get(index).map(|&i| &self.products[i])
    }

    pub fn selection(&self) -> &BTreeSet<ProductId> {
        &self.selection
    }

    pub fn is_selected(&self, id: ProductId) -> bool {
        self.selection.contains(&id)
    }

    /// Distinct categories of the full catalog, in first-seen order.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.products
            .iter()
            .map(|p| p.category.as_str())
            .filter(|c| seen.insert(*c))
            .collect()
    }
}
