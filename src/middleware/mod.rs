mod core;
mod cors;
mod metrics;
mod tracing;

pub use core::Middleware;
pub use cors::{CorsConfigError, CorsDecision, CorsMiddleware, CorsPolicy};
pub use metrics::MetricsMiddleware;
pub use tracing::TracingMiddleware;
