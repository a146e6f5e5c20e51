//! Prometheus metrics for the storefront server.
//!
//! Counters are recorded through the `metrics` facade and are no-ops until an
//! exporter is installed with [`init_metrics`].
//!
//! # Metrics Categories
//!
//! - **HTTP Metrics**: Request counts and duration by method, route and status
//! - **Wallet Metrics**: Purchase and fund-addition outcomes
//! - **Database Metrics**: Connection pool size
//! - **Auth Metrics**: Login attempts and signups
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use sf_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::purchases_total("success");
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request; `path` is the matched route template.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record HTTP request duration in milliseconds.
pub fn http_request_duration_ms(method: &str, path: &str, duration_ms: f64) {
    metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_ms);
}

// ============================================================================
// Wallet Metrics
// ============================================================================

/// Count a purchase attempt by outcome (`success` or a reason code).
pub fn purchases_total(outcome: &str) {
    metrics::counter!("purchases_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Count a fund addition by outcome (`success` or a reason code).
pub fn funds_added_total(outcome: &str) {
    metrics::counter!("funds_added_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

// ============================================================================
// Database Metrics
// ============================================================================

/// Set current database connection pool size.
pub fn db_connections_active(pool: &str, count: u32) {
    metrics::gauge!("db_connections_active",
        "pool" => pool.to_string()
    )
    .set(count as f64);
}

// ============================================================================
// Auth Metrics
// ============================================================================

/// Increment login attempts counter.
pub fn login_attempts_total(success: bool) {
    metrics::counter!("login_attempts_total",
        "success" => success.to_string()
    )
    .increment(1);
}

/// Increment signups counter.
pub fn signups_total() {
    metrics::counter!("signups_total").increment(1);
}
