use crate::AppState;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use tracing::warn;

/// Default allowance per client address.
pub const DEFAULT_REQUESTS_PER_MINUTE: NonZeroU32 = nonzero!(5u32);

/// Per-client-address limiter. The full allowance is available as a burst
/// and replenishes evenly over one minute.
pub struct ClientRateLimiter {
    limiter: DefaultKeyedRateLimiter<IpAddr>,
    per_minute: NonZeroU32,
}

impl std::fmt::Debug for ClientRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRateLimiter")
            .field("per_minute", &self.per_minute)
            .finish()
    }
}

impl ClientRateLimiter {
    pub fn per_minute(requests: u32) -> Self {
        let per_minute = NonZeroU32::new(requests).unwrap_or(DEFAULT_REQUESTS_PER_MINUTE);
        Self {
            limiter: RateLimiter::keyed(Quota::per_minute(per_minute)),
            per_minute,
        }
    }

    /// Consume one request for `client`; `false` when its allowance is spent.
    pub fn check(&self, client: IpAddr) -> bool {
        self.limiter.check_key(&client).is_ok()
    }

    pub fn requests_per_minute(&self) -> u32 {
        self.per_minute.get()
    }
}

/// Peer address of the connection, when the server was started with connect info.
fn client_ip(req: &Request) -> IpAddr {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED), |ConnectInfo(addr)| {
            addr.ip()
        })
}

/// Middleware to enforce rate limits
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    if state.config.resilience.rate_limit_enabled {
        let client = client_ip(&req);
        if !state.rate_limiter.check(client) {
            warn!(name: "answer.rate_limited", client = %client, "Rate limit exceeded");
            return (
                StatusCode::TOO_MANY_REQUESTS,
                format!(
                    "Rate limit exceeded: {} per 1 minute",
                    state.rate_limiter.requests_per_minute()
                ),
            )
                .into_response();
        }
    }
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyed_rate_limiter() {
        let limiter = ClientRateLimiter::per_minute(2);
        let a: IpAddr = "10.0.0.1".parse().unwrap();
        let b: IpAddr = "10.0.0.2".parse().unwrap();

        // Consume all burst
        assert!(limiter.check(a));
        assert!(limiter.check(a));

        // Next should fail (immediate)
        assert!(!limiter.check(a));

        // Other clients have their own allowance
        assert!(limiter.check(b));
    }

    #[test]
    fn test_zero_falls_back_to_default() {
        let limiter = ClientRateLimiter::per_minute(0);
        assert_eq!(limiter.requests_per_minute(), 5);
    }
}
