//! Rate limiting middleware using governor and `tower_governor`.
//!
//! `auth_rate_limiter` guards `/signup` and `/login` against credential
//! stuffing: about ten requests a minute per client IP. The server must be
//! served with `into_make_service_with_connect_info::<SocketAddr>()` so the
//! peer address is available.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

// =============================================================================
// Client IP Key Extractor
// =============================================================================

/// Key extractor keyed on the client IP.
///
/// By default only the socket peer address counts, so a client cannot choose
/// its own key. With `trust_proxy_headers` set, the CDN's `CF-Connecting-IP`,
/// then `X-Forwarded-For`, `X-Real-IP` and `Fly-Client-IP` are tried before the
/// peer address.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClientIpKeyExtractor {
    trust_proxy_headers: bool,
}

impl ClientIpKeyExtractor {
    #[must_use]
    pub const fn new(trust_proxy_headers: bool) -> Self {
        Self {
            trust_proxy_headers,
        }
    }
}

/// Client IP as reported by a fronting proxy, if any header carries one.
fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    // Try CF-Connecting-IP first (Cloudflare's real client IP)
    if let Some(ip) = header("cf-connecting-ip").and_then(|s| s.trim().parse().ok()) {
        return Some(ip);
    }

    // Try X-Forwarded-For (first IP in the chain)
    if let Some(ip) = header("x-forwarded-for")
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse().ok())
    {
        return Some(ip);
    }

    // Try X-Real-IP, then Fly-Client-IP (Fly.io's header)
    ["x-real-ip", "fly-client-ip"]
        .into_iter()
        .find_map(|name| header(name).and_then(|s| s.trim().parse().ok()))
}

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        if self.trust_proxy_headers
            && let Some(ip) = forwarded_ip(req.headers())
        {
            return Ok(ip);
        }

        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

// =============================================================================
// Rate Limiter Configuration
// =============================================================================

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create rate limiter for auth endpoints: ~10 requests per minute per IP.
///
/// Configuration: 1 request every 6 seconds (replenish), burst of 5.
/// Requests with no usable client address are rejected by the layer.
///
/// # Panics
///
/// This function will not panic. The configuration uses only valid positive
/// integers (`per_second(6)` and `burst_size(5)`), which are always accepted
/// by `GovernorConfigBuilder`.
#[must_use]
pub fn auth_rate_limiter(trust_proxy_headers: bool) -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor::new(trust_proxy_headers))
        .per_second(6) // Replenish 1 token every 6 seconds (~10/minute)
        .burst_size(5) // Allow burst of 5 requests
        .finish()
        .expect("rate limiter config with per_second(6) and burst_size(5) is valid");
    GovernorLayer::new(Arc::new(config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tower_governor::key_extractor::KeyExtractor;

    use super::*;

    const PEER: &str = "192.0.2.7:50123";

    fn request(headers: &[(&str, &str)], peer: Option<&str>) -> Request<()> {
        let mut builder = Request::builder().uri("/login");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let mut req = builder.body(()).unwrap();
        if let Some(peer) = peer {
            let addr: SocketAddr = peer.parse().unwrap();
            req.extensions_mut().insert(ConnectInfo(addr));
        }
        req
    }

    #[test]
    fn test_forwarding_headers_ignored_by_default() {
        let extractor = ClientIpKeyExtractor::default();
        for header in ["cf-connecting-ip", "x-forwarded-for", "x-real-ip", "fly-client-ip"] {
            let req = request(&[(header, "198.51.100.1")], Some(PEER));
            assert_eq!(extractor.extract(&req).unwrap().to_string(), "192.0.2.7", "{header}");
        }
    }

    #[test]
    fn test_forwarding_headers_alone_are_not_a_key() {
        let req = request(&[("x-forwarded-for", "198.51.100.1")], None);
        assert!(ClientIpKeyExtractor::default().extract(&req).is_err());
    }

    #[test]
    fn test_cdn_header_wins_when_trusted() {
        let req = request(
            &[
                ("cf-connecting-ip", "203.0.113.9"),
                ("x-forwarded-for", "198.51.100.1"),
            ],
            Some(PEER),
        );
        let ip = ClientIpKeyExtractor::new(true).extract(&req).unwrap();
        assert_eq!(ip.to_string(), "203.0.113.9");
    }

    #[test]
    fn test_first_forwarded_address_used_when_trusted() {
        let req = request(&[("x-forwarded-for", "198.51.100.1, 10.0.0.1")], Some(PEER));
        let ip = ClientIpKeyExtractor::new(true).extract(&req).unwrap();
        assert_eq!(ip.to_string(), "198.51.100.1");
    }

    #[test]
    fn test_trusted_mode_falls_back_to_peer() {
        let req = request(&[("x-forwarded-for", "not-an-ip")], Some(PEER));
        let ip = ClientIpKeyExtractor::new(true).extract(&req).unwrap();
        assert_eq!(ip.to_string(), "192.0.2.7");
    }

    #[test]
    fn test_no_address_is_an_error() {
        assert!(ClientIpKeyExtractor::new(true).extract(&request(&[], None)).is_err());
    }
}
