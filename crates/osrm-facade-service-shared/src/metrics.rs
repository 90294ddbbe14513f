//! Prometheus metrics infrastructure.
//!
//! This module provides:
//! - [`MetricsConfig`]: Configuration for the metrics system
//! - [`init_metrics`]: Initialize the Prometheus metrics recorder
//! - [`metrics_handler`]: Axum handler for `/metrics` endpoint
//! - Business metric helpers for the route handler
//!
//! # Example
//!
//! ```no_run
//! use osrm_facade_service_shared::metrics::{MetricsConfig, init_metrics, metrics_handler};
//! use axum::{Router, routing::get};
//!
//! let config = MetricsConfig::default();
//! init_metrics(&config).expect("failed to initialize metrics");
//!
//! let app: Router = Router::new()
//!     .route("/metrics", get(metrics_handler));
//! ```

use std::time::Duration;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{parse_bool, ConfigError};

/// Global Prometheus handle for rendering metrics.
static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    /// Path for the metrics endpoint.
    pub path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/metrics".to_string(),
        }
    }
}

impl MetricsConfig {
    /// - `METRICS_ENABLED`: boolean switch (default: true)
    /// - `METRICS_PATH`: Path for metrics endpoint (default: "/metrics")
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_values(
            std::env::var("METRICS_ENABLED").ok().as_deref(),
            std::env::var("METRICS_PATH").ok().as_deref(),
        )
    }

    fn from_values(enabled: Option<&str>, path: Option<&str>) -> Result<Self, ConfigError> {
        let enabled = match enabled.map(str::trim).filter(|v| !v.is_empty()) {
            Some(raw) => parse_bool("METRICS_ENABLED", raw)?,
            None => true,
        };
        let path = path
            .filter(|p| p.starts_with('/'))
            .unwrap_or("/metrics")
            .to_string();

        Ok(Self { enabled, path })
    }
}

/// Install the Prometheus recorder. Must run before any metric is recorded
/// for it to be exported; subsequent calls fail.
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    if !config.enabled {
        return Err(MetricsError::Disabled);
    }
    if PROMETHEUS_HANDLE.get().is_some() {
        return Err(MetricsError::AlreadyInitialized);
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| MetricsError::InstallFailed(e.to_string()))?;

    PROMETHEUS_HANDLE
        .set(handle)
        .map_err(|_| MetricsError::AlreadyInitialized)?;

    Ok(())
}

/// Axum handler for the `/metrics` endpoint, in Prometheus exposition format.
pub async fn metrics_handler() -> String {
    PROMETHEUS_HANDLE
        .get()
        .map(|h| h.render())
        .unwrap_or_else(|| "# Metrics not initialized\n".to_string())
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MetricsError {
    #[error("metrics are disabled")]
    Disabled,
    #[error("metrics recorder already initialized")]
    AlreadyInitialized,
    #[error("failed to install metrics recorder: {0}")]
    InstallFailed(String),
}

// =============================================================================
// Business Metrics Helpers
// =============================================================================

/// Increment `osrm_facade_routes_calculated_total{selection}`.
pub fn record_route_calculated(selection: &str) {
    metrics::counter!(
        "osrm_facade_routes_calculated_total",
        "selection" => selection.to_string()
    )
    .increment(1);
}

/// Increment `osrm_facade_routes_failed_total{reason}`.
///
/// `reason` is a short label such as "validation_error", "no_route" or
/// "upstream_timeout".
pub fn record_route_failed(reason: &str) {
    metrics::counter!(
        "osrm_facade_routes_failed_total",
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// Record the returned route length into `osrm_facade_route_distance_meters`.
pub fn record_route_distance(distance_m: f64) {
    metrics::histogram!("osrm_facade_route_distance_meters").record(distance_m);
}

/// Record how long the routing engine took into
/// `osrm_facade_upstream_duration_seconds{outcome}`.
pub fn record_upstream_duration(elapsed: Duration, outcome: &str) {
    metrics::histogram!(
        "osrm_facade_upstream_duration_seconds",
        "outcome" => outcome.to_string()
    )
    .record(elapsed.as_secs_f64());
}
