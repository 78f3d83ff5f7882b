//! Catalog product types and the identifier allocation rule.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// Errors that can occur when validating product input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProductError {
    /// A required text field is missing or blank.
    #[error("{0} is required")]
    MissingField(&'static str),
    /// A size entry has a blank name.
    #[error("size name cannot be empty")]
    EmptySizeName,
    /// No identifier is left above the current maximum.
    #[error("product identifier space exhausted")]
    IdSpaceExhausted,
}

/// Stock on hand for one size of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeStock {
    /// Size label, e.g. `"M"` or `"42"`.
    pub name: String,
    /// Units in stock.
    pub quantity: u32,
}

/// A catalog product as stored and returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Image URLs, first one is the listing thumbnail.
    pub images: Vec<String>,
    pub category: String,
    /// Current selling price.
    pub new_price: Price,
    /// Previous price, shown struck through.
    pub old_price: Price,
    /// Sizes in display order.
    pub sizes: Vec<SizeStock>,
    /// When the product was added.
    pub date: DateTime<Utc>,
    pub available: bool,
}

/// Fields submitted to create a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub category: String,
    pub new_price: Price,
    pub old_price: Price,
    #[serde(default)]
    pub sizes: Vec<SizeStock>,
}

impl NewProduct {
    /// Trim text fields and check that required ones are present.
    ///
    /// # Errors
    ///
    /// Returns `ProductError` if the name or category is blank, or a size has
    /// a blank name.
    pub fn validate(mut self) -> Result<Self, ProductError> {
        self.name = self.name.trim().to_owned();
        self.category = self.category.trim().to_owned();
        if self.name.is_empty() {
            return Err(ProductError::MissingField("name"));
        }
        if self.category.is_empty() {
            return Err(ProductError::MissingField("category"));
        }
        for size in &mut self.sizes {
            size.name = size.name.trim().to_owned();
            if size.name.is_empty() {
                return Err(ProductError::EmptySizeName);
            }
        }
        Ok(self)
    }

    /// The first image URL, if any.
    #[must_use]
    pub fn first_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// Identifier for the next product: one above the current maximum, or 1 for
/// an empty catalog.
///
/// Callers must hold whatever lock serialises product creation while they
/// read the maximum and insert.
///
/// # Errors
///
/// Returns `ProductError::IdSpaceExhausted` if the maximum is `i32::MAX`.
pub fn next_product_id(current_max: Option<ProductId>) -> Result<ProductId, ProductError> {
    match current_max {
        None => Ok(ProductId::new(1)),
        Some(max) => max
            .as_i32()
            .checked_add(1)
            .map(ProductId::new)
            .ok_or(ProductError::IdSpaceExhausted),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn shirt() -> NewProduct {
        serde_json::from_value(serde_json::json!({
            "name": "  Shirt ",
            "images": ["http://localhost:4000/images/product_1.png"],
            "category": "men",
            "new_price": 20,
            "old_price": 25.5,
            "sizes": [{"name": "M", "quantity": 3}]
        }))
        .unwrap()
    }

    #[test]
    fn test_first_id_on_empty_catalog() {
        assert_eq!(next_product_id(None).unwrap(), ProductId::new(1));
    }

    #[test]
    fn test_next_id_is_max_plus_one() {
        let first = next_product_id(None).unwrap();
        let second = next_product_id(Some(first)).unwrap();
        assert_eq!(second, ProductId::new(2));
        assert_eq!(
            next_product_id(Some(ProductId::new(41))).unwrap(),
            ProductId::new(42)
        );
    }

    #[test]
    fn test_next_id_overflow() {
        assert_eq!(
            next_product_id(Some(ProductId::new(i32::MAX))),
            Err(ProductError::IdSpaceExhausted)
        );
    }

    #[test]
    fn test_validate_trims() {
        let product = shirt().validate().unwrap();
        assert_eq!(product.name, "Shirt");
        assert_eq!(
            product.first_image(),
            Some("http://localhost:4000/images/product_1.png")
        );
    }

    #[test]
    fn test_validate_rejects_blank_fields() {
        let mut blank_name = shirt();
        blank_name.name = "   ".to_owned();
        assert_eq!(
            blank_name.validate(),
            Err(ProductError::MissingField("name"))
        );

        let mut blank_size = shirt();
        blank_size.sizes.push(SizeStock {
            name: String::new(),
            quantity: 1,
        });
        assert_eq!(blank_size.validate(), Err(ProductError::EmptySizeName));
    }

    #[test]
    fn test_no_images_means_no_first_image() {
        let mut product = shirt();
        product.images.clear();
        assert_eq!(product.first_image(), None);
    }

    #[test]
    fn test_negative_price_rejected_on_input() {
        let result = serde_json::from_value::<NewProduct>(serde_json::json!({
            "name": "Shirt",
            "category": "men",
            "new_price": -1,
            "old_price": 5
        }));
        assert!(result.is_err());
    }
}
