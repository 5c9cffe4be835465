//! Login throttling middleware.
//!
//! Per-IP sliding window over the credential endpoints, so password
//! guessing burns out quickly without affecting authenticated traffic.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

#[derive(Clone)]
pub struct RateLimitConfig {
    /// Attempts allowed per window.
    pub max_attempts: u32,
    /// Window duration.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            window: Duration::from_secs(60),
        }
    }
}

/// Tracks login attempts per client IP.
#[derive(Clone)]
pub struct LoginRateLimiter {
    config: RateLimitConfig,
    state: Arc<Mutex<HashMap<IpAddr, WindowEntry>>>,
}

struct WindowEntry {
    count: u32,
    window_start: Instant,
}

impl LoginRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Record one attempt. Returns how long to back off when over budget.
    fn hit(&self, ip: IpAddr) -> Option<Duration> {
        let mut state = self.state.lock();
        let now = Instant::now();

        let entry = state.entry(ip).or_insert(WindowEntry {
            count: 0,
            window_start: now,
        });

        if now.duration_since(entry.window_start) >= self.config.window {
            entry.count = 0;
            entry.window_start = now;
        }

        entry.count += 1;

        if entry.count > self.config.max_attempts {
            let reset_at = entry.window_start + self.config.window;
            Some(reset_at.duration_since(now))
        } else {
            None
        }
    }
}

/// Middleware guarding the login/register routes.
pub async fn login_rate_limit(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(limiter): State<LoginRateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let ip = addr.ip();

    match limiter.hit(ip) {
        None => next.run(request).await,
        Some(retry_after) => {
            warn!(
                ip = %ip,
                retry_after_secs = retry_after.as_secs(),
                "Login rate limit exceeded"
            );

            let body = serde_json::json!({
                "error": "rate_limit_exceeded",
                "message": "Too many login attempts. Please slow down.",
                "retry_after_seconds": retry_after.as_secs(),
            });

            (
                StatusCode::TOO_MANY_REQUESTS,
                [("Retry-After", retry_after.as_secs().to_string())],
                Json(body),
            )
                .into_response()
        }
    }
}
