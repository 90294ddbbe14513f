//! OSRM route façade HTTP service.
//!
//! Forwards `POST /route` queries to an OSRM server and reshapes the answer
//! into `{distance_m, duration_s, geometry}`. See the library crate docs for
//! the endpoint list.
//!
//! # Configuration
//!
//! - `OSRM_BASE` - Routing engine base URL (default: public demo server)
//! - `OSRM_TIMEOUT` - Upstream timeout in seconds (default: 15)
//! - `OSRM_PROFILE` - Routing profile (default: driving)
//! - `OSRM_ALTERNATIVES` - Request alternatives and keep the shortest (default: false)
//! - `CORS_ENABLED` / `CORS_ORIGINS` - Cross-origin policy (default: on, any origin)
//! - `SERVICE_PORT` / `PORT` - HTTP port (default: 5000)
//! - `METRICS_ENABLED` / `METRICS_PATH` - Prometheus endpoint (default: on, /metrics)
//! - `RUST_LOG` - Log level (default: info)
//! - `LOG_FORMAT` - Log format: json (default) or text

use std::net::SocketAddr;

use tracing::{error, info, warn};

use osrm_facade_service_route::router;
use osrm_facade_service_shared::{
    AppState, LoggingConfig, MetricsConfig, MetricsError, ServiceConfig, init_logging,
    init_metrics,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logging_config = LoggingConfig::from_env().with_service("route");
    init_logging(&logging_config);

    let metrics_config = MetricsConfig::from_env().inspect_err(|e| {
        error!(error = %e, "invalid metrics configuration");
    })?;
    match init_metrics(&metrics_config) {
        Ok(()) => info!(path = %metrics_config.path, "metrics enabled"),
        Err(MetricsError::Disabled) => info!("metrics disabled"),
        // Metrics are optional; keep serving without them.
        Err(e) => warn!(error = %e, "failed to initialize metrics, continuing without metrics"),
    }

    let config = ServiceConfig::from_env().inspect_err(|e| {
        error!(error = %e, "invalid configuration");
    })?;
    let port = config.port;

    info!(
        osrm_base = %config.osrm.base_url,
        port = port,
        cors_enabled = config.cors.enabled,
        "starting route service"
    );

    let state = AppState::new(config).inspect_err(|e| {
        error!(error = %e, "failed to build application state");
    })?;

    let app = router(state, &metrics_config);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("route service stopped");
    Ok(())
}

/// Resolve on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
