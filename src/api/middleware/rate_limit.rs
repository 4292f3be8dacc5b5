//! Rate limiting middleware using token bucket algorithm.

use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder, key_extractor::KeyExtractor};

/// Governor layer keyed by `K`, with response headers disabled.
pub type RateLimitLayer<K> = GovernorLayer<K, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Creates a rate limiter for the authenticated API.
///
/// # Limits
///
/// - **Rate**: 2 requests per second
/// - **Burst**: 100 requests
///
/// Requests exceeding the limit receive `429 Too Many Requests`.
///
/// # Key Extraction
///
/// Pass `PeerIpKeyExtractor` to key on the socket peer address, or
/// `SmartIpKeyExtractor` behind a trusted reverse proxy to key on
/// `X-Forwarded-For` / `X-Real-IP`.
///
/// # Example
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/borrow", post(create_borrow_handler))
///     .layer(rate_limit::layer(PeerIpKeyExtractor));
/// ```
pub fn layer<K: KeyExtractor>(key_extractor: K) -> RateLimitLayer<K> {
    build(key_extractor, 2, 100)
}

/// Creates a stricter rate limiter for credential endpoints.
///
/// # Limits
///
/// - **Rate**: 1 request per second
/// - **Burst**: 10 requests
///
/// Used for registration and login, where each request hashes a password.
pub fn secure_layer<K: KeyExtractor>(key_extractor: K) -> RateLimitLayer<K> {
    build(key_extractor, 1, 10)
}

fn build<K: KeyExtractor>(key_extractor: K, per_second: u64, burst_size: u32) -> RateLimitLayer<K> {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(key_extractor)
            .per_second(per_second)
            .burst_size(burst_size)
            .finish()
            .expect("rate limit quotas are non-zero"),
    );

    GovernorLayer::new(governor_conf)
}
