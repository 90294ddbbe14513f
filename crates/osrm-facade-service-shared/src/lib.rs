//! Shared infrastructure for the OSRM façade HTTP service.
//!
//! - [`AppState`]: The routing engine client and the configuration it came from
//! - [`ServiceConfig`]: Environment-driven configuration, read once at startup
//! - [`health`]: Liveness handlers that never touch the routing engine
//! - [`ProblemDetails`]: RFC 9457 Problem Details for consistent error responses
//! - [`metrics`]: Prometheus metrics infrastructure
//! - [`logging`]: Structured JSON logging setup
//! - [`middleware`]: Request id propagation and HTTP metrics
//! - [`RouteRequest`]: Lenient body parsing with strict validation
//!
//! # Architecture
//!
//! Handlers stay thin; everything about talking to OSRM lives in
//! `osrm-facade-lib`. This crate provides only HTTP glue:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  axum Handler                                               │
//! │  - Parse request JSON                                       │
//! │  - Validate coordinate pairs                                │
//! │  - Call OsrmClient::route                                   │
//! │  - Map the outcome to 200 / 400 / 404 / 502                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Testing Support
//!
//! The [`test_utils`] module provides a fake OSRM server and ready-made state.
//! Enable the `test-utils` feature to access it from dependent crates.

pub mod config;
mod health;
pub mod logging;
pub mod metrics;
pub mod middleware;
mod problem;
mod request;
mod state;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{AllowedOrigins, ConfigError, CorsConfig, ServiceConfig};
pub use health::{health, health_live, HealthStatus, ServiceInfo};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use metrics::{
    init_metrics, metrics_handler, record_route_calculated, record_route_distance,
    record_route_failed, record_upstream_duration, MetricsConfig, MetricsError,
};
pub use middleware::{extract_or_generate_request_id, RequestId, RequestTrackingLayer};
pub use problem::{
    from_lib_error, ProblemDetails, PROBLEM_INTERNAL_ERROR, PROBLEM_INVALID_REQUEST,
    PROBLEM_ROUTE_NOT_FOUND, PROBLEM_UPSTREAM_FAILURE,
};
pub use request::{RouteEndpoints, RouteRequest};
pub use state::{AppState, AppStateError};
