//! Async client for the OSRM `route` service.
//!
//! Only the slice of the API the façade needs is modelled: one
//! `GET /route/v1/{profile}/{lon,lat};{lon,lat}` query with full GeoJSON
//! geometry and no turn-by-turn steps. See
//! <https://project-osrm.org/docs/v5.24.0/api/#route-service>.

use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::geo::{LatLon, LineString};
use crate::route::{RouteResult, RouteSelection};

/// Public demo server, used when no base URL is configured.
pub const DEFAULT_BASE_URL: &str = "https://router.project-osrm.org";
/// Profile path segment used when none is configured.
pub const DEFAULT_PROFILE: &str = "driving";
/// Upstream timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Longest upstream body echoed back inside an error.
const MAX_ERROR_BODY: usize = 512;

/// Connection settings for the routing engine.
#[derive(Debug, Clone, PartialEq)]
pub struct OsrmConfig {
    /// Base URL of the OSRM HTTP server, optionally with a path prefix.
    pub base_url: String,
    /// Routing profile (for example `driving`, `cycling`, `foot`).
    pub profile: String,
    /// Upper bound for the whole upstream exchange.
    pub timeout: Duration,
    /// How to pick among returned routes.
    pub selection: RouteSelection,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            profile: DEFAULT_PROFILE.to_string(),
            timeout: DEFAULT_TIMEOUT,
            selection: RouteSelection::Fastest,
        }
    }
}

/// Thin wrapper over a pooled `reqwest` client bound to one OSRM server.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct OsrmClient {
    inner: Client,
    base: String,
    config: OsrmConfig,
}

impl OsrmClient {
    /// Build a client, validating the base URL up front so misconfiguration
    /// fails at startup rather than on the first request.
    pub fn new(config: OsrmConfig) -> Result<Self> {
        let parsed = Url::parse(&config.base_url).map_err(|e| Error::InvalidBaseUrl {
            url: config.base_url.clone(),
            message: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::InvalidBaseUrl {
                url: config.base_url.clone(),
                message: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }
        if config.profile.is_empty() || config.profile.contains(&['/', '?', '#'][..]) {
            return Err(Error::InvalidBaseUrl {
                url: config.base_url.clone(),
                message: format!("invalid profile '{}'", config.profile),
            });
        }

        let inner = Client::builder()
            .timeout(config.timeout)
            .user_agent(user_agent())
            .build()?;

        Ok(Self {
            inner,
            base: config.base_url.trim_end_matches('/').to_string(),
            config,
        })
    }

    pub fn config(&self) -> &OsrmConfig {
        &self.config
    }

    /// The exact upstream URL queried for a pair of positions.
    pub fn route_url(&self, from: LatLon, to: LatLon) -> Result<Url> {
        let raw = format!(
            "{}/route/v1/{}/{};{}",
            self.base,
            self.config.profile,
            from.to_osrm(),
            to.to_osrm()
        );
        let alternatives = if self.config.selection.wants_alternatives() {
            "true"
        } else {
            "false"
        };
        Url::parse_with_params(
            &raw,
            &[
                ("overview", "full"),
                ("geometries", "geojson"),
                ("steps", "false"),
                ("alternatives", alternatives),
            ],
        )
        .map_err(|e| Error::InvalidBaseUrl {
            url: self.base.clone(),
            message: e.to_string(),
        })
    }

    /// Query the engine for a route between two positions.
    pub async fn route(&self, from: LatLon, to: LatLon) -> Result<RouteResult> {
        let url = self.route_url(from, to)?;
        debug!(url = %url, "querying routing engine");

        let started = Instant::now();
        let response = self
            .inner
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.classify(e))?;

        debug!(
            status = status.as_u16(),
            bytes = body.len(),
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            "routing engine responded"
        );

        interpret_response(status, &body, self.config.selection)
    }

    fn classify(&self, error: reqwest::Error) -> Error {
        if error.is_timeout() {
            Error::UpstreamTimeout {
                timeout: self.config.timeout,
            }
        } else if error.is_connect() {
            Error::UpstreamUnreachable(error)
        } else {
            Error::Http(error)
        }
    }
}

fn user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    #[serde(default)]
    distance: Option<f64>,
    duration: f64,
    geometry: LineString,
}

impl TryFrom<OsrmRoute> for RouteResult {
    type Error = Error;

    fn try_from(route: OsrmRoute) -> Result<Self> {
        let distance_m = route
            .distance
            .ok_or(Error::IncompleteRoute { field: "distance" })?;
        Ok(RouteResult {
            distance_m,
            duration_s: route.duration,
            geometry: route.geometry,
        })
    }
}

/// Codes OSRM uses when the points cannot be connected or snapped to the road
/// network.
fn is_no_route_code(code: &str) -> bool {
    matches!(code, "NoRoute" | "NoSegment")
}

fn interpret_response(
    status: StatusCode,
    body: &str,
    selection: RouteSelection,
) -> Result<RouteResult> {
    let parsed: OsrmResponse = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(_) if !status.is_success() => {
            return Err(Error::UpstreamStatus {
                status: status.as_u16(),
                body: truncate(body, MAX_ERROR_BODY).to_string(),
            });
        }
        Err(e) => return Err(Error::MalformedResponse(e)),
    };

    if is_no_route_code(&parsed.code) {
        return Err(Error::RouteNotFound {
            message: parsed.message,
        });
    }

    if parsed.code != "Ok" {
        warn!(code = %parsed.code, status = status.as_u16(), "routing engine rejected query");
        return Err(Error::UpstreamRejected {
            code: parsed.code,
            message: parsed.message,
        });
    }

    if !status.is_success() {
        return Err(Error::UpstreamStatus {
            status: status.as_u16(),
            body: truncate(body, MAX_ERROR_BODY).to_string(),
        });
    }

    selection
        .pick(parsed.routes, |route| route.distance)
        .ok_or(Error::RouteNotFound { message: None })
        .and_then(RouteResult::try_from)
}

fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
