//! Router and handlers for the OSRM route façade.
//!
//! # Endpoints
//!
//! - `POST /route` - Route between two `[lat, lon]` points via OSRM
//! - `GET /health` - Fixed `{"status":"ok"}` liveness payload
//! - `GET /health/live` - Liveness with service name and version
//! - `GET /metrics` - Prometheus metrics endpoint (when enabled)

use std::time::Instant;

use axum::{
    Extension, Json, Router,
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Serialize;
use tracing::{error, info, warn};

use osrm_facade_lib::RouteResult;
use osrm_facade_service_shared::{
    AppState, MetricsConfig, ProblemDetails, RequestId, RequestTrackingLayer, RouteRequest,
    ServiceInfo, from_lib_error, health, health_live, metrics_handler, record_route_calculated,
    record_route_distance, record_route_failed, record_upstream_duration,
};

/// Identity reported by `/health/live`.
pub const SERVICE_INFO: ServiceInfo = ServiceInfo {
    name: env!("CARGO_PKG_NAME"),
    version: env!("CARGO_PKG_VERSION"),
};

/// HTTP response - either the route or an RFC 9457 error.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Response {
    Success(RouteResult),
    Error(ProblemDetails),
}

impl IntoResponse for Response {
    fn into_response(self) -> axum::response::Response {
        match self {
            Response::Success(route) => (StatusCode::OK, Json(route)).into_response(),
            Response::Error(problem) => problem.into_response(),
        }
    }
}

/// Build the service router with the default metrics settings.
pub fn app(state: AppState) -> Router {
    router(state, &MetricsConfig::default())
}

/// Build the service router.
///
/// CORS is applied only when enabled in the state's configuration; request
/// tracking wraps everything, preflight responses included.
pub fn router(state: AppState, metrics: &MetricsConfig) -> Router {
    let cors = state.config().cors.layer();

    let mut routes = Router::new()
        .route("/route", post(route_handler))
        .route("/health", get(health))
        .route("/health/live", get(|| health_live(SERVICE_INFO)));

    if metrics.enabled {
        routes = routes.route(&metrics.path, get(metrics_handler));
    }

    let mut app = routes.with_state(state);
    if let Some(cors) = cors {
        app = app.layer(cors);
    }
    app.layer(RequestTrackingLayer)
}

/// Handle `POST /route`.
///
/// The body is read as raw bytes and parsed leniently so that every malformed
/// payload maps to a 400 problem, whatever its content type. Bodies that
/// cannot be buffered (over the 2 MB default limit) are 400 as well.
pub async fn route_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!(error = %rejection, "unreadable route request body");
            record_route_failed("validation_error");
            return Response::Error(ProblemDetails::bad_request(
                format!("Request body could not be read: {}", rejection.body_text()),
                request_id.as_str(),
            ));
        }
    };

    let request = RouteRequest::from_body(&body);
    let endpoints = match request.endpoints(request_id.as_str()) {
        Ok(endpoints) => endpoints,
        Err(problem) => {
            warn!(detail = problem.detail.as_deref().unwrap_or(""), "rejected route request");
            record_route_failed("validation_error");
            return Response::Error(*problem);
        }
    };

    let selection = state.client().config().selection;
    info!(
        from = %endpoints.from,
        to = %endpoints.to,
        selection = %selection,
        "handling route request"
    );

    let started = Instant::now();
    let outcome = state.client().route(endpoints.from, endpoints.to).await;
    let elapsed = started.elapsed();

    match outcome {
        Ok(route) => {
            record_upstream_duration(elapsed, "ok");
            record_route_calculated(selection.as_str());
            record_route_distance(route.distance_m);
            info!(
                distance_m = route.distance_m,
                duration_s = route.duration_s,
                points = route.geometry.len(),
                upstream_ms = elapsed.as_secs_f64() * 1000.0,
                "route computed successfully"
            );
            Response::Success(route)
        }
        Err(e) => {
            let reason = e.reason();
            record_upstream_duration(elapsed, reason);
            record_route_failed(reason);
            if e.is_upstream_failure() {
                error!(error = %e, reason, "routing engine failure");
            } else {
                info!(error = %e, reason, "route request failed");
            }
            Response::Error(from_lib_error(&e, request_id.as_str()))
        }
    }
}
