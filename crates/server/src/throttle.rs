//! Per-caller throttle for the query endpoint.
//!
//! Each caller gets two independent quotas, one per minute and one per hour.
//! A request must pass both before the orchestrator runs. Callers are keyed
//! by socket peer address unless proxy headers are explicitly trusted.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use governor::{Quota, RateLimiter, clock::DefaultClock};
use stackpager_core::Error;

use crate::error::ApiError;

type DirectRateLimiter = RateLimiter<governor::state::NotKeyed, governor::state::InMemoryState, DefaultClock>;

/// A caller idle this long has both quotas fully replenished.
const IDLE_AFTER: Duration = Duration::from_secs(3600);

/// Both quota scopes for one caller.
struct CallerLimiters {
    per_minute: DirectRateLimiter,
    per_hour: DirectRateLimiter,
    /// Milliseconds since `ThrottleState::epoch` at the last request.
    last_seen_ms: AtomicU64,
}

/// Shared throttle state, keyed by client IP.
#[derive(Clone)]
pub struct ThrottleState {
    per_minute: NonZeroU32,
    per_hour: NonZeroU32,
    trust_proxy_headers: bool,
    epoch: Instant,
    limiters: Arc<DashMap<IpAddr, Arc<CallerLimiters>>>,
}

impl ThrottleState {
    pub fn new(per_minute: u32, per_hour: u32, trust_proxy_headers: bool) -> Self {
        Self {
            per_minute: NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN),
            per_hour: NonZeroU32::new(per_hour).unwrap_or(NonZeroU32::MIN),
            trust_proxy_headers,
            epoch: Instant::now(),
            limiters: Arc::new(DashMap::new()),
        }
    }

    fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn limiters_for(&self, caller: IpAddr) -> Arc<CallerLimiters> {
        let limiters = self
            .limiters
            .entry(caller)
            .or_insert_with(|| {
                Arc::new(CallerLimiters {
                    per_minute: RateLimiter::direct(Quota::per_minute(self.per_minute)),
                    per_hour: RateLimiter::direct(Quota::per_hour(self.per_hour)),
                    last_seen_ms: AtomicU64::new(0),
                })
            })
            .clone();
        limiters.last_seen_ms.store(self.elapsed_ms(), Ordering::Relaxed);
        limiters
    }

    /// Admit or reject one request from `caller`.
    pub fn check(&self, caller: IpAddr) -> Result<(), Error> {
        let limiters = self.limiters_for(caller);

        for limiter in [&limiters.per_minute, &limiters.per_hour] {
            if let Err(not_until) = limiter.check() {
                let retry_after = not_until
                    .wait_time_from(governor::clock::Clock::now(&DefaultClock::default()))
                    .as_secs()
                    .max(1);
                return Err(Error::CallerThrottled { retry_after });
            }
        }

        Ok(())
    }

    /// Drop callers not seen for `idle`. Returns how many were removed.
    pub fn prune_idle(&self, idle: Duration) -> usize {
        let now = self.elapsed_ms();
        let idle_ms = u64::try_from(idle.as_millis()).unwrap_or(u64::MAX);
        let before = self.limiters.len();
        self.limiters
            .retain(|_, limiters| now.saturating_sub(limiters.last_seen_ms.load(Ordering::Relaxed)) < idle_ms);
        before.saturating_sub(self.limiters.len())
    }

    /// Drop callers whose quotas have fully replenished.
    pub fn prune(&self) -> usize {
        self.prune_idle(IDLE_AFTER)
    }

    /// Resolve the key a request is throttled under.
    fn caller_of(&self, request: &Request) -> IpAddr {
        let header_ip = |name: &str| {
            request
                .headers()
                .get(name)
                .and_then(|h| h.to_str().ok())
                .and_then(|v| v.split(',').next())
                .and_then(|v| v.trim().parse::<IpAddr>().ok())
        };

        let forwarded = if self.trust_proxy_headers {
            header_ip("x-forwarded-for").or_else(|| header_ip("x-real-ip"))
        } else {
            None
        };

        forwarded
            .or_else(|| {
                request
                    .extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip())
            })
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
    }
}

/// Throttle middleware. Rejected requests get 429 with `Retry-After`.
pub async fn throttle_middleware(
    State(state): State<ThrottleState>, request: Request, next: Next,
) -> Result<Response, ApiError> {
    let caller = state.caller_of(&request);

    if let Err(e) = state.check(caller) {
        tracing::info!(%caller, error = %e, "caller throttled");
        return Err(e.into());
    }

    Ok(next.run(request).await)
}
