//! Application state for the HTTP service.
//!
//! Holds the routing engine client and the configuration it was built from.
//! Nothing in here changes after startup, so handlers share it without locks.

use std::sync::Arc;

use thiserror::Error;

use osrm_facade_lib::{Error as LibError, OsrmClient};

use crate::config::ServiceConfig;

/// Error during application state initialization.
#[derive(Debug, Error)]
pub enum AppStateError {
    /// The routing engine client could not be constructed.
    #[error("failed to initialise routing engine client: {0}")]
    Client(#[from] LibError),
}

/// Shared application state for all axum handlers.
///
/// This struct is cheaply cloneable (using `Arc` internally) and should be
/// shared via axum's `State` extractor.
///
/// # Example
///
/// ```ignore
/// use axum::{Router, routing::post, extract::State};
/// use osrm_facade_service_shared::{AppState, ServiceConfig};
///
/// async fn handler(State(state): State<AppState>) {
///     let client = state.client();
///     // ... query the engine
/// }
///
/// let state = AppState::new(ServiceConfig::from_env()?)?;
/// let app = Router::new()
///     .route("/route", post(handler))
///     .with_state(state);
/// ```
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    client: OsrmClient,
    config: ServiceConfig,
}

impl AppState {
    /// Build state from configuration, validating the engine settings.
    pub fn new(config: ServiceConfig) -> Result<Self, AppStateError> {
        let client = OsrmClient::new(config.osrm.clone())?;
        tracing::info!(
            base_url = %config.osrm.base_url,
            profile = %config.osrm.profile,
            timeout_s = config.osrm.timeout.as_secs_f64(),
            selection = %config.osrm.selection,
            "routing engine client ready"
        );

        Ok(Self {
            inner: Arc::new(AppStateInner { client, config }),
        })
    }

    /// Access the routing engine client.
    pub fn client(&self) -> &OsrmClient {
        &self.inner.client
    }

    /// Access the configuration the state was built from.
    pub fn config(&self) -> &ServiceConfig {
        &self.inner.config
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("base_url", &self.inner.config.osrm.base_url)
            .field("profile", &self.inner.config.osrm.profile)
            .field("cors_enabled", &self.inner.config.cors.enabled)
            .finish()
    }
}
