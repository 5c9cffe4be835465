//! Middleware for observability and login throttling.
//!
//! - Request logging with latency tracking
//! - Per-IP rate limiting on the credential-guessing surface

pub mod logging;
pub mod rate_limit;

pub use logging::request_logging;
pub use rate_limit::{LoginRateLimiter, RateLimitConfig};
