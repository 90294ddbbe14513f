//! Health check handlers.
//!
//! `/health` answers with the fixed `{"status":"ok"}` payload; `/health/live`
//! adds the service name and version for orchestrators. Neither contacts the
//! routing engine.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

/// Liveness payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Always "ok" while the process can serve requests.
    pub status: String,

    /// Service name for identification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,

    /// Service version from build-time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl HealthStatus {
    /// The bare `{"status":"ok"}` payload.
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            service: None,
            version: None,
        }
    }

    /// A healthy status carrying service identification.
    pub fn alive(service: &str, version: &str) -> Self {
        Self {
            service: Some(service.to_string()),
            version: Some(version.to_string()),
            ..Self::ok()
        }
    }
}

/// Name and version reported by `/health/live`.
///
/// Supplied by the binary crate so the payload names the running service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceInfo {
    pub name: &'static str,
    pub version: &'static str,
}

/// `GET /health`.
///
/// ```text
/// GET /health
/// {"status":"ok"}
/// ```
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthStatus::ok()))
}

/// Liveness probe response for `info`; mount it behind a closure.
///
/// ```text
/// GET /health/live
/// {"status":"ok","service":"osrm-facade-service-route","version":"0.1.0"}
/// ```
pub async fn health_live(info: ServiceInfo) -> impl IntoResponse {
    (StatusCode::OK, Json(HealthStatus::alive(info.name, info.version)))
}
