//! RFC 9457 Problem Details for HTTP APIs.
//!
//! Provides structured error responses following the Problem Details standard.
//! See: <https://www.rfc-editor.org/rfc/rfc9457.html>

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use osrm_facade_lib::Error as LibError;

/// Problem type URI for malformed route requests.
pub const PROBLEM_INVALID_REQUEST: &str = "/problems/invalid-request";

/// Problem type URI for coordinate pairs the engine cannot connect.
pub const PROBLEM_ROUTE_NOT_FOUND: &str = "/problems/route-not-found";

/// Problem type URI for routing engine failures (unreachable, timeout, error).
pub const PROBLEM_UPSTREAM_FAILURE: &str = "/problems/upstream-failure";

/// Problem type URI for internal server errors.
pub const PROBLEM_INTERNAL_ERROR: &str = "/problems/internal-error";

/// RFC 9457 Problem Details response structure.
///
/// # Example
///
/// ```
/// use osrm_facade_service_shared::{ProblemDetails, PROBLEM_UPSTREAM_FAILURE};
/// use axum::http::StatusCode;
///
/// let problem = ProblemDetails::new(
///     PROBLEM_UPSTREAM_FAILURE,
///     "Upstream Failure",
///     StatusCode::BAD_GATEWAY,
/// )
/// .with_detail("routing engine did not respond within 15s")
/// .with_request_id("req-12345");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDetails {
    /// URI reference identifying the problem type (relative).
    #[serde(rename = "type")]
    pub type_uri: String,

    /// Short, human-readable summary of the problem.
    pub title: String,

    /// HTTP status code for this problem.
    pub status: u16,

    /// Human-readable explanation specific to this occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// Request identifier of the failing occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

impl ProblemDetails {
    pub fn new(type_uri: impl Into<String>, title: impl Into<String>, status: StatusCode) -> Self {
        Self {
            type_uri: type_uri.into(),
            title: title.into(),
            status: status.as_u16(),
            detail: None,
            instance: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.instance = Some(request_id.into());
        self
    }

    /// 400: the body is missing `from`/`to` or they are not coordinate pairs.
    pub fn bad_request(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_INVALID_REQUEST,
            "Invalid Request",
            StatusCode::BAD_REQUEST,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

    /// 404: the engine found no route between the two points.
    pub fn route_not_found(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_ROUTE_NOT_FOUND,
            "Route Not Found",
            StatusCode::NOT_FOUND,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

    /// 502: the engine was unreachable, timed out, or answered with an error.
    pub fn upstream_failure(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_UPSTREAM_FAILURE,
            "Upstream Failure",
            StatusCode::BAD_GATEWAY,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

    pub fn internal_error(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_INTERNAL_ERROR,
            "Internal Error",
            StatusCode::INTERNAL_SERVER_ERROR,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl std::fmt::Display for ProblemDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.title,
            self.detail.as_deref().unwrap_or("")
        )
    }
}

impl std::error::Error for ProblemDetails {}

impl IntoResponse for ProblemDetails {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let mut response = Json(&self).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );
        *response.status_mut() = status;
        response
    }
}

/// Convert library errors to ProblemDetails.
///
/// The `request_id` must be provided separately since library errors don't have it.
pub fn from_lib_error(error: &LibError, request_id: &str) -> ProblemDetails {
    match error {
        LibError::InvalidCoordinate { .. } => {
            ProblemDetails::bad_request(error.to_string(), request_id)
        }
        LibError::RouteNotFound { .. } => {
            ProblemDetails::route_not_found(error.to_string(), request_id)
        }
        LibError::InvalidBaseUrl { .. } => {
            ProblemDetails::internal_error(error.to_string(), request_id)
        }
        e if e.is_upstream_failure() => {
            ProblemDetails::upstream_failure(error.to_string(), request_id)
        }
        _ => ProblemDetails::internal_error(error.to_string(), request_id),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_problem_details_new() {
        let problem = ProblemDetails::new(
            PROBLEM_ROUTE_NOT_FOUND,
            "Route Not Found",
            StatusCode::NOT_FOUND,
        );
        assert_eq!(problem.type_uri, PROBLEM_ROUTE_NOT_FOUND);
        assert_eq!(problem.title, "Route Not Found");
        assert_eq!(problem.status, 404);
        assert!(problem.detail.is_none());
    }

    #[test]
    fn test_problem_details_bad_request() {
        let problem = ProblemDetails::bad_request("Invalid JSON", "req-123");
        assert_eq!(problem.status, 400);
        assert_eq!(problem.instance.as_deref(), Some("req-123"));
    }

    #[test]
    fn test_problem_details_serialization() {
        let problem = ProblemDetails::upstream_failure("engine down", "req-test");
        let json = serde_json::to_string(&problem).unwrap();

        assert!(json.contains("\"type\":\"/problems/upstream-failure\""));
        assert!(json.contains("\"title\":\"Upstream Failure\""));
        assert!(json.contains("\"status\":502"));
        assert!(json.contains("\"detail\":\"engine down\""));
        assert!(json.contains("\"instance\":\"req-test\""));
    }

    #[test]
    fn test_into_response_sets_problem_content_type() {
        let response = ProblemDetails::route_not_found("nope", "req-1").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/problem+json"
        );
    }

    #[test]
    fn test_from_lib_error_route_not_found() {
        let error = LibError::RouteNotFound {
            message: Some("Impossible route between points".to_string()),
        };
        let problem = from_lib_error(&error, "req-route");

        assert_eq!(problem.type_uri, PROBLEM_ROUTE_NOT_FOUND);
        assert_eq!(problem.status, 404);
        assert!(problem.detail.as_deref().unwrap().contains("Impossible"));
    }

    #[test]
    fn test_from_lib_error_timeout_is_bad_gateway() {
        let error = LibError::UpstreamTimeout {
            timeout: Duration::from_secs(15),
        };
        let problem = from_lib_error(&error, "req-timeout");

        assert_eq!(problem.type_uri, PROBLEM_UPSTREAM_FAILURE);
        assert_eq!(problem.status, 502);
    }

    #[test]
    fn test_from_lib_error_upstream_status_is_bad_gateway() {
        let error = LibError::UpstreamStatus {
            status: 500,
            body: "boom".to_string(),
        };
        let problem = from_lib_error(&error, "req-status");

        assert_eq!(problem.status, 502);
        assert!(problem.detail.as_deref().unwrap().contains("500"));
    }

    #[test]
    fn test_from_lib_error_invalid_coordinate_is_bad_request() {
        let error = LibError::InvalidCoordinate {
            axis: "latitude",
            value: 123.0,
            min: -90.0,
            max: 90.0,
        };
        assert_eq!(from_lib_error(&error, "req-coord").status, 400);
    }
}
