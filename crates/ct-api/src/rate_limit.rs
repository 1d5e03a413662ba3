use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::Response,
};
use governor::{
    Quota, RateLimiter, clock::DefaultClock, middleware::NoOpMiddleware,
    state::keyed::DashMapStateStore,
};

use crate::SharedState;
use crate::config::RateLimitConfig;
use crate::error::ApiError;

type KeyedLimiter = RateLimiter<IpAddr, DashMapStateStore<IpAddr>, DefaultClock, NoOpMiddleware>;

/// Token bucket per client IP shared by every route.
#[derive(Clone)]
pub struct ClientRateLimiter {
    inner: Arc<KeyedLimiter>,
}

impl ClientRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let replenish = Duration::from_nanos((1_000_000_000 / config.per_sec.max(1)).max(1));
        let burst = NonZeroU32::new(config.burst).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::with_period(replenish)
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
            .allow_burst(burst);

        Self {
            inner: Arc::new(RateLimiter::keyed(quota)),
        }
    }

    /// Requests without a known peer address (in-process tests) are not limited.
    pub fn check(&self, client: Option<IpAddr>) -> Result<(), ApiError> {
        match client {
            Some(ip) if self.inner.check_key(&ip).is_err() => Err(ApiError::RateLimited),
            _ => Ok(()),
        }
    }
}

fn client_ip(req: &Request<Body>) -> Option<IpAddr> {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

pub(crate) async fn limit_by_client_ip(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    state.rate_limiter.check(client_ip(&req))?;
    Ok(next.run(req).await)
}
