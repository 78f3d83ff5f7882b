//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transactions)
//! 2. CORS (any origin)
//! 3. `TraceLayer` (request spans)
//! 4. Request ID (add unique ID to each request)
//! 5. Rate limiting on `/signup` and `/login` (governor)
//!
//! Token authentication is an extractor rather than a layer so that only the
//! handlers that need a user pay for it.

pub mod auth;
pub mod rate_limit;
pub mod request_id;

pub use auth::{AUTH_TOKEN_HEADER, RequireUser};
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
