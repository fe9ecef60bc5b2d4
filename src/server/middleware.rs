// Per-client rate limiting for the gateway
//
// Token bucket per source IP. Every debate request costs one provider call,
// so the limiter sits in front of the handler and answers 429 with the
// standard error body once a client's bucket is empty. Clients are keyed by
// socket peer; a caller-supplied `X-Forwarded-For` is only believed when the
// gateway is configured to sit behind a trusted proxy.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::error::GatewayError;

/// Tokens left for one client and when they were last topped up
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl Bucket {
    /// Top up for the time elapsed since the last request, then spend one token
    fn take(&mut self, now: Instant, refill_rate: f64, capacity: f64) -> bool {
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        self.last_refill = now;

        if self.tokens < 1.0 {
            return false;
        }
        self.tokens -= 1.0;
        true
    }
}

/// Per-IP token-bucket limiter; cheap to clone, all clones share buckets
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<RateLimiterInner>,
}

struct RateLimiterInner {
    buckets: DashMap<IpAddr, Bucket>,
    /// Burst size: a fresh client may send this many requests back to back
    capacity: f64,
    /// Sustained requests per second
    refill_rate: f64,
    /// Key on the first `X-Forwarded-For` hop instead of the socket peer.
    /// Only safe behind a proxy that overwrites the header.
    trust_forwarded_for: bool,
}

impl RateLimiter {
    /// `requests_per_second` is the sustained rate, `burst` the bucket size.
    /// Clients are keyed by their socket peer address.
    pub fn new(requests_per_second: f64, burst: f64) -> Self {
        Self {
            inner: Arc::new(RateLimiterInner {
                buckets: DashMap::new(),
                capacity: burst,
                refill_rate: requests_per_second,
                trust_forwarded_for: false,
            }),
        }
    }

    /// Key clients by `X-Forwarded-For` when a trusted proxy sets it.
    ///
    /// Must be called before the limiter is cloned into the router.
    pub fn trusting_forwarded_for(self, trust: bool) -> Self {
        let inner = RateLimiterInner {
            buckets: DashMap::new(),
            capacity: self.inner.capacity,
            refill_rate: self.inner.refill_rate,
            trust_forwarded_for: trust,
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn trusts_forwarded_for(&self) -> bool {
        self.inner.trust_forwarded_for
    }

    /// Spend one of `ip`'s tokens; false when the bucket is empty
    pub fn check(&self, ip: IpAddr) -> bool {
        let now = Instant::now();
        self.inner
            .buckets
            .entry(ip)
            .or_insert_with(|| Bucket {
                tokens: self.inner.capacity,
                last_refill: now,
            })
            .take(now, self.inner.refill_rate, self.inner.capacity)
    }

    /// Drop buckets idle for longer than `idle`
    pub fn purge_idle(&self, idle: Duration) {
        let now = Instant::now();
        self.inner
            .buckets
            .retain(|_, bucket| now.duration_since(bucket.last_refill) < idle);
    }

    /// Number of currently tracked IPs
    pub fn tracked_ips(&self) -> usize {
        self.inner.buckets.len()
    }

    /// Background task that keeps the bucket map bounded
    pub fn spawn_purge_task(&self, every: Duration) -> tokio::task::JoinHandle<()> {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                limiter.purge_idle(every);
                tracing::debug!(tracked = limiter.tracked_ips(), "Purged idle rate-limit buckets");
            }
        })
    }
}

/// Axum middleware enforcing the per-IP limit
pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let ip = client_ip(&request, limiter.trusts_forwarded_for());

    if limiter.check(ip) {
        next.run(request).await
    } else {
        tracing::warn!(ip = %ip, "Rate limit exceeded");
        GatewayError::RateLimited.into_response()
    }
}

/// Client IP: the socket peer, or loopback when there is none (in-process
/// tests). With `trust_forwarded_for`, the first `X-Forwarded-For` hop wins.
fn client_ip(request: &Request<Body>, trust_forwarded_for: bool) -> IpAddr {
    let forwarded = trust_forwarded_for
        .then(|| {
            request
                .headers()
                .get("x-forwarded-for")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.split(',').next())
                .and_then(|first| first.trim().parse::<IpAddr>().ok())
        })
        .flatten();

    forwarded
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|info| info.0.ip())
        })
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}
