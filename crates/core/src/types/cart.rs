//! Per-user shopping cart.
//!
//! A cart is a map from a composite key `"<productId>-<size>"` to a
//! non-negative quantity. Accounts created at signup carry 300 zeroed numeric
//! slots (`"0"` .. `"299"`) that older frontends index into directly; they are
//! kept and returned verbatim.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use super::id::ProductId;

/// Number of zeroed slots a new account's cart is created with.
pub const LEGACY_CART_SLOTS: usize = 300;

/// Errors that can occur when building a [`CartKey`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartKeyError {
    /// The item ID is missing or empty.
    #[error("item id is required")]
    MissingItemId,
    /// The item ID is not an integer.
    #[error("item id must be numeric")]
    NonNumericItemId,
    /// The size is missing or empty.
    #[error("size is required")]
    MissingSize,
}

/// Composite cart key identifying one size of one product.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CartKey {
    item_id: ProductId,
    size: String,
}

impl CartKey {
    /// Build a key from a raw item ID and size as submitted by a client.
    ///
    /// # Errors
    ///
    /// Returns `CartKeyError` if the item ID is empty or non-numeric, or the
    /// size is empty.
    pub fn parse(item_id: &str, size: &str) -> Result<Self, CartKeyError> {
        let item_id = item_id.trim();
        if item_id.is_empty() {
            return Err(CartKeyError::MissingItemId);
        }
        let item_id = item_id
            .parse::<ProductId>()
            .map_err(|_| CartKeyError::NonNumericItemId)?;

        Self::new(item_id, size)
    }

    /// Build a key from an already-typed product ID.
    ///
    /// # Errors
    ///
    /// Returns `CartKeyError::MissingSize` if the size is empty.
    pub fn new(item_id: ProductId, size: &str) -> Result<Self, CartKeyError> {
        let size = size.trim();
        if size.is_empty() {
            return Err(CartKeyError::MissingSize);
        }
        Ok(Self {
            item_id,
            size: size.to_owned(),
        })
    }

    /// The product this key refers to.
    #[must_use]
    pub const fn item_id(&self) -> ProductId {
        self.item_id
    }

    /// The size name this key refers to.
    #[must_use]
    pub fn size(&self) -> &str {
        &self.size
    }
}

impl fmt::Display for CartKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.item_id, self.size)
    }
}

/// A shopper's cart: composite key to quantity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Cart(BTreeMap<String, u32>);

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the cart a new account starts with: [`LEGACY_CART_SLOTS`] zeroed slots.
    #[must_use]
    pub fn with_legacy_slots() -> Self {
        Self(
            (0..LEGACY_CART_SLOTS)
                .map(|slot| (slot.to_string(), 0))
                .collect(),
        )
    }

    /// Current quantity for `key` (0 when absent).
    #[must_use]
    pub fn quantity(&self, key: &CartKey) -> u32 {
        self.0.get(&key.to_string()).copied().unwrap_or(0)
    }

    /// Add one unit of `key`, creating the entry at 0 first if needed.
    ///
    /// Returns the new quantity.
    pub fn add(&mut self, key: &CartKey) -> u32 {
        let count = self.0.entry(key.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    /// Remove one unit of `key` if its quantity is above zero.
    ///
    /// Absent or zero entries are left as they are. Returns the quantity
    /// after the call.
    pub fn remove(&mut self, key: &CartKey) -> u32 {
        match self.0.get_mut(&key.to_string()) {
            Some(count) if *count > 0 => {
                *count -= 1;
                *count
            }
            _ => 0,
        }
    }

    /// Drop every entry for `product`: all `"<id>-<size>"` keys plus the flat
    /// `"<id>"` key some older carts carry.
    ///
    /// Returns the number of entries removed.
    pub fn strip_product(&mut self, product: ProductId) -> usize {
        let flat = product.to_string();
        let prefix = format!("{flat}-");
        let before = self.0.len();
        self.0.retain(|key, _| key != &flat && !key.starts_with(&prefix));
        before - self.0.len()
    }

    /// Iterate over `(key, quantity)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(key, count)| (key.as_str(), *count))
    }

    /// Number of entries, zero-valued ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the cart has no entries at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for Cart {
    /// Stored carts are read leniently: any value that is not a usable
    /// non-negative count is treated as 0 rather than failing the request.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<BTreeMap<String, serde_json::Value>>::deserialize(deserializer)?;
        Ok(Self(
            raw.unwrap_or_default()
                .into_iter()
                .map(|(key, value)| (key, coerce_count(&value)))
                .collect(),
        ))
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn coerce_count(value: &serde_json::Value) -> u32 {
    match value {
        serde_json::Value::Number(n) => n.as_u64().map_or_else(
            || {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f > 0.0)
                    .map_or(0, |f| f.min(f64::from(u32::MAX)) as u32)
            },
            |n| u32::try_from(n).unwrap_or(u32::MAX),
        ),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}
