//! Per-user favorites list.

use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// Insertion-ordered set of favorited products.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Favorites(Vec<ProductId>);

impl Favorites {
    /// Create an empty favorites list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `product` at the end unless it is already present.
    ///
    /// Returns `false` when the product was already a favorite.
    pub fn insert(&mut self, product: ProductId) -> bool {
        if self.contains(product) {
            return false;
        }
        self.0.push(product);
        true
    }

    /// Remove `product` if present. Returns whether anything was removed.
    pub fn remove(&mut self, product: ProductId) -> bool {
        let before = self.0.len();
        self.0.retain(|p| *p != product);
        before != self.0.len()
    }

    /// Whether `product` is a favorite.
    #[must_use]
    pub fn contains(&self, product: ProductId) -> bool {
        self.0.contains(&product)
    }

    /// Favorites in the order they were added.
    #[must_use]
    pub fn as_slice(&self) -> &[ProductId] {
        &self.0
    }

    /// Number of favorites.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no favorites.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<ProductId>> for Favorites {
    /// Duplicates in stored data are collapsed to their first occurrence.
    fn from(products: Vec<ProductId>) -> Self {
        let mut favorites = Self::new();
        for product in products {
            favorites.insert(product);
        }
        favorites
    }
}

impl<'de> Deserialize<'de> for Favorites {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<ProductId>::deserialize(deserializer).map(Self::from)
    }
}

impl From<Favorites> for Vec<i32> {
    fn from(favorites: Favorites) -> Self {
        favorites.0.into_iter().map(i32::from).collect()
    }
}
