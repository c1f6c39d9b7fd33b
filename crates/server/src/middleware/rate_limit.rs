//! Rate limiting middleware using governor and `tower_governor`.
//!
//! Two buckets, both keyed by client IP: a strict one for `/api/auth`
//! (~10/min) and a relaxed one for the rest of `/api` (~100/min). Health
//! checks are not limited.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

// =============================================================================
// Client IP Key Extractor
// =============================================================================

/// Proxy headers carrying the client IP, most trusted first.
///
/// `X-Forwarded-For` may list several hops; only the first is used.
const CLIENT_IP_HEADERS: &[&str] = &[
    "cf-connecting-ip",
    "x-forwarded-for",
    "x-real-ip",
    "fly-client-ip",
];

/// Rate-limit key: the client IP from proxy headers, else the peer address.
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let from_headers = CLIENT_IP_HEADERS.iter().find_map(|name| {
            req.headers()
                .get(*name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .and_then(|v| v.trim().parse::<IpAddr>().ok())
        });

        from_headers
            .or_else(|| {
                req.extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip())
            })
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

// =============================================================================
// Rate Limiter Configuration
// =============================================================================

/// Rate limiter layer type for Axum.
///
/// Uses `ClientIpKeyExtractor` to get the real client IP behind a proxy.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Limiter replenishing one request every `replenish_secs`, up to `burst`.
///
/// # Panics
///
/// Panics if either argument is zero. Callers in this module pass constants.
fn limiter(replenish_secs: u64, burst: u32) -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(replenish_secs)
        .burst_size(burst)
        .finish()
        .expect("rate limiter period and burst are non-zero");
    GovernorLayer::new(Arc::new(config))
}

/// Register and login: one request every 6 seconds, burst of 5.
#[must_use]
pub fn auth_rate_limiter() -> RateLimiterLayer {
    limiter(6, 5)
}

/// Everything else under `/api`: one request per second, burst of 50.
#[must_use]
pub fn api_rate_limiter() -> RateLimiterLayer {
    limiter(1, 50)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tower_governor::key_extractor::KeyExtractor;

    use super::*;

    fn extract(headers: &[(&str, &str)], peer: Option<SocketAddr>) -> Option<IpAddr> {
        let mut builder = Request::builder().uri("/api/auth/login");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let mut request = builder.body(()).unwrap();
        if let Some(addr) = peer {
            request.extensions_mut().insert(ConnectInfo(addr));
        }
        ClientIpKeyExtractor.extract(&request).ok()
    }

    #[test]
    fn test_cloudflare_header_wins() {
        let ip = extract(
            &[
                ("x-forwarded-for", "10.0.0.1"),
                ("cf-connecting-ip", "203.0.113.7"),
            ],
            None,
        );
        assert_eq!(ip, Some("203.0.113.7".parse().unwrap()));
    }

    #[test]
    fn test_first_forwarded_hop() {
        let ip = extract(&[("x-forwarded-for", "198.51.100.2, 10.0.0.1")], None);
        assert_eq!(ip, Some("198.51.100.2".parse().unwrap()));
    }

    #[test]
    fn test_unparseable_header_skipped() {
        let ip = extract(
            &[("cf-connecting-ip", "unknown"), ("x-real-ip", " 203.0.113.8 ")],
            None,
        );
        assert_eq!(ip, Some("203.0.113.8".parse().unwrap()));
    }

    #[test]
    fn test_peer_address_fallback() {
        let peer: SocketAddr = "192.0.2.9:51234".parse().unwrap();
        assert_eq!(extract(&[], Some(peer)), Some(peer.ip()));
        assert_eq!(extract(&[], None), None);
    }
}
