//! Filter criteria and the predicates built from them.

use crate::Product;

/// What the user currently filters by. An unset field imposes no constraint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub search: String,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub category: Option<String>,
}

impl FilterCriteria {
    /// True when no predicate is active.
    pub fn is_empty(&self) -> bool {
        self.search.trim().is_empty()
            && self.min_price.is_none()
            && self.max_price.is_none()
            && self.active_category().is_none()
    }

    /// The category to match, ignoring an empty label.
    pub fn active_category(&self) -> Option<&str> {
        self.category.as_deref().filter(|c| !c.is_empty())
    }

    /// Apply a partial update in place.
    ///
    /// A bound that is not a finite number is stored as unset.
    pub fn merge(&mut self, update: CriteriaUpdate) {
        if let Some(search) = update.search {
            self.search = search;
        }
        if let Some(min) = update.min_price {
            self.min_price = min.filter(|v| v.is_finite());
        }
        if let Some(max) = update.max_price {
            self.max_price = max.filter(|v| v.is_finite());
        }
        if let Some(category) = update.category {
            self.category = category;
        }
    }

    /// Whether `product` passes every active predicate.
    ///
    /// `with_category` switches the category predicate off entirely, for
    /// stores configured without category filtering.
    pub fn matches(&self, product: &Product, with_category: bool) -> bool {
        self.matches_search(product)
            && self.min_price.is_none_or(|min| product.price >= min)
            && self.max_price.is_none_or(|max| product.price <= max)
            && (!with_category
                || self
                    .active_category()
                    .is_none_or(|category| product.category == category))
    }

    fn matches_search(&self, product: &Product) -> bool {
        if self.search.trim().is_empty() {
            return true;
        }
        product
            .title
            .to_lowercase()
            .contains(&self.search.to_lowercase())
    }
}

/// A partial change to [`FilterCriteria`].
///
/// `None` leaves a field alone. Bounds and category use `Some(None)` to clear.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CriteriaUpdate {
    pub search: Option<String>,
    pub min_price: Option<Option<f64>>,
    pub max_price: Option<Option<f64>>,
    pub category: Option<Option<String>>,
}

impl CriteriaUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    pub fn min_price(mut self, bound: Option<f64>) -> Self {
        self.min_price = Some(bound);
        self
    }

    pub fn max_price(mut self, bound: Option<f64>) -> Self {
        self.max_price = Some(bound);
        self
    }

    pub fn category(mut self, category: Option<String>) -> Self {
        self.category = Some(category);
        self
    }

    /// An update that resets every field.
    pub fn clear_all() -> Self {
        Self::new()
            .search("")
            .min_price(None)
            .max_price(None)
            .category(None)
    }
}
