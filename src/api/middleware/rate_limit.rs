//! Rate limiting middleware using token bucket algorithm.

use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::PeerIpKeyExtractor,
};

pub type RateLimitLayer =
    GovernorLayer<PeerIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Token bucket parameters for one limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    /// Seconds needed to replenish one request.
    pub per_second: u64,
    pub burst_size: u32,
}

impl RateLimit {
    /// General limit for the API: one request every 2 seconds, bursts of 100.
    pub const GENERAL: RateLimit = RateLimit {
        per_second: 2,
        burst_size: 100,
    };

    /// Credential endpoints: one request per second, bursts of 10.
    pub const STRICT: RateLimit = RateLimit {
        per_second: 1,
        burst_size: 10,
    };
}

fn governor(limit: RateLimit) -> RateLimitLayer {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(limit.per_second)
            .burst_size(limit.burst_size)
            .finish()
            .unwrap(),
    );

    GovernorLayer::new(governor_conf)
}

/// Creates the general per-client rate limiter for the API.
///
/// Requests exceeding the limit receive `429 Too Many Requests`.
///
/// # Key Extraction
///
/// Rate limits are applied per client IP address extracted from the
/// socket peer address, so the service must be served with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn layer() -> RateLimitLayer {
    governor(RateLimit::GENERAL)
}

/// Creates a stricter rate limiter for login and registration.
pub fn secure_layer() -> RateLimitLayer {
    governor(RateLimit::STRICT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_limit_is_tighter() {
        assert!(RateLimit::STRICT.burst_size < RateLimit::GENERAL.burst_size);
    }

    #[test]
    fn test_layers_build() {
        let _ = layer();
        let _ = secure_layer();
    }
}
