//! Core types for Threadline.
//!
//! This module provides type-safe wrappers for the shop's domain concepts and
//! the pure rules that mutate them.

pub mod cart;
pub mod email;
pub mod favorites;
pub mod id;
pub mod price;
pub mod product;

pub use cart::{Cart, CartKey, CartKeyError, LEGACY_CART_SLOTS};
pub use email::{Email, EmailError};
pub use favorites::Favorites;
pub use id::*;
pub use price::{Price, PriceError};
pub use product::{NewProduct, Product, ProductError, SizeStock, next_product_id};
