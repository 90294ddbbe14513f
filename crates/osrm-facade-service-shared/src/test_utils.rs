//! Test utilities for handler testing.
//!
//! [`FakeOsrm`] is a real HTTP server on an ephemeral local port that answers
//! every `GET /route/v1/{profile}/{coordinates}` with a canned reply and keeps
//! the request targets it saw, so tests can assert on the exact upstream
//! query without touching the network.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::config::ServiceConfig;
use crate::request::RouteRequest;
use crate::state::AppState;

/// Origin used by the sample route: Atocha, Madrid, as `[lat, lon]`.
pub const MADRID_FROM: [f64; 2] = [40.4066, -3.6893];

/// Destination used by the sample route: Plaza de Castilla, Madrid, as `[lat, lon]`.
pub const MADRID_TO: [f64; 2] = [40.4723, -3.6834];

/// Canned answer served by [`FakeOsrm`].
#[derive(Debug, Clone)]
pub struct FakeReply {
    pub status: StatusCode,
    pub body: String,
    pub delay: Duration,
}

impl FakeReply {
    pub fn json(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn raw(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    /// A successful OSRM answer for the Madrid sample, with one alternative.
    ///
    /// The primary route is faster; the alternative is shorter.
    pub fn madrid_routes() -> Self {
        Self::json(
            StatusCode::OK,
            json!({
                "code": "Ok",
                "routes": [
                    {
                        "distance": 9120.4,
                        "duration": 742.1,
                        "weight": 742.1,
                        "weight_name": "routability",
                        "geometry": {
                            "type": "LineString",
                            "coordinates": [
                                [-3.689325, 40.406603],
                                [-3.690911, 40.425012],
                                [-3.688012, 40.451337],
                                [-3.683398, 40.472288]
                            ]
                        },
                        "legs": []
                    },
                    {
                        "distance": 8430.0,
                        "duration": 905.6,
                        "weight": 905.6,
                        "weight_name": "routability",
                        "geometry": {
                            "type": "LineString",
                            "coordinates": [
                                [-3.689325, 40.406603],
                                [-3.686001, 40.440120],
                                [-3.683398, 40.472288]
                            ]
                        },
                        "legs": []
                    }
                ],
                "waypoints": [
                    {"name": "Paseo del Prado", "location": [-3.689325, 40.406603]},
                    {"name": "Paseo de la Castellana", "location": [-3.683398, 40.472288]}
                ]
            }),
        )
    }

    /// The error OSRM returns when the points cannot be connected.
    pub fn no_route() -> Self {
        Self::json(
            StatusCode::BAD_REQUEST,
            json!({"code": "NoRoute", "message": "Impossible route between points"}),
        )
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Clone)]
struct FakeState {
    reply: FakeReply,
    seen: Arc<Mutex<Vec<String>>>,
}

/// A local stand-in for an OSRM server. Shut down on drop.
pub struct FakeOsrm {
    base_url: String,
    seen: Arc<Mutex<Vec<String>>>,
    handle: JoinHandle<()>,
}

impl FakeOsrm {
    /// Bind to `127.0.0.1:0` and serve `reply` for every route query.
    pub async fn start(reply: FakeReply) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake OSRM listener");
        let addr = listener.local_addr().expect("fake OSRM local address");
        let seen = Arc::new(Mutex::new(Vec::new()));

        let app = Router::new()
            .route("/route/v1/{profile}/{coordinates}", get(fake_route))
            .with_state(FakeState {
                reply,
                seen: Arc::clone(&seen),
            });

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{addr}"),
            seen,
            handle,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Path and query of every request received so far.
    pub fn requests(&self) -> Vec<String> {
        self.seen.lock().expect("fake OSRM request log").clone()
    }
}

impl Drop for FakeOsrm {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn fake_route(State(state): State<FakeState>, uri: Uri) -> impl IntoResponse {
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    state.seen.lock().expect("fake OSRM request log").push(target);

    if !state.reply.delay.is_zero() {
        tokio::time::sleep(state.reply.delay).await;
    }

    (
        state.reply.status,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        state.reply.body.clone(),
    )
}

/// A base URL on which nothing is listening.
pub async fn unreachable_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind probe listener");
    let addr = listener.local_addr().expect("probe local address");
    drop(listener);
    format!("http://{addr}")
}

/// Service configuration pointed at `base_url` with a short timeout.
pub fn test_config(base_url: &str) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.osrm.base_url = base_url.to_string();
    config.osrm.timeout = Duration::from_secs(2);
    config
}

/// Application state pointed at `base_url`.
///
/// # Panics
///
/// Panics if `base_url` is not a valid http(s) URL.
pub fn test_state(base_url: &str) -> AppState {
    AppState::new(test_config(base_url))
        .unwrap_or_else(|e| panic!("failed to build test state for {base_url}: {e}"))
}

/// The Madrid sample request.
pub fn madrid_request() -> RouteRequest {
    RouteRequest::new(MADRID_FROM, MADRID_TO)
}
