//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Signup, login and profile
//! - `cart` - Per-user cart counts
//! - `favorites` - Per-user favorites list
//! - `catalog` - Product create/delete, listings and search
//! - `uploads` - Product image storage
//! - `payments` - Payment intent creation
//! - `token` - Identity token issue/verify

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod favorites;
pub mod payments;
pub mod token;
pub mod uploads;

pub use auth::{AuthError, AuthService, LoginOutcome};
pub use cart::CartService;
pub use catalog::{CatalogError, CatalogService};
pub use favorites::FavoritesService;
pub use payments::{IntentRequest, PaymentClient, PaymentError};
pub use token::{TokenError, TokenService};
pub use uploads::{ImageStore, UploadError, UploadedFile};
