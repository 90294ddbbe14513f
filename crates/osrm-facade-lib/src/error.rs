use std::time::Duration;

use thiserror::Error;

/// Convenient result alias for the OSRM façade library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// A coordinate component was not finite or fell outside its valid range.
    #[error("invalid {axis} {value}; expected a finite number in [{min}, {max}]")]
    InvalidCoordinate {
        axis: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// The configured routing engine base URL could not be parsed.
    #[error("invalid routing engine base URL '{url}': {message}")]
    InvalidBaseUrl { url: String, message: String },

    /// The routing engine did not answer within the configured timeout.
    #[error("routing engine did not respond within {}s", .timeout.as_secs_f64())]
    UpstreamTimeout { timeout: Duration },

    /// The routing engine could not be reached at all.
    #[error("routing engine unreachable: {0}")]
    UpstreamUnreachable(#[source] reqwest::Error),

    /// The routing engine answered with an unexpected HTTP status.
    #[error("routing engine responded with HTTP {status}{}", format_body(.body))]
    UpstreamStatus { status: u16, body: String },

    /// The routing engine answered but rejected the query with an error code.
    #[error("routing engine rejected the query: {code}{}", format_message(.message))]
    UpstreamRejected {
        code: String,
        message: Option<String>,
    },

    /// Raised when the routing engine finds no path between the two points.
    #[error("no route found{}", format_message(.message))]
    RouteNotFound { message: Option<String> },

    /// The routing engine's payload did not have the expected shape.
    #[error("malformed routing engine response: {0}")]
    MalformedResponse(#[from] serde_json::Error),

    /// The chosen route lacked a field the response needs.
    #[error("routing engine route has no {field}")]
    IncompleteRoute { field: &'static str },

    /// Wrapper for any other HTTP client error.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Whether this error should be reported as a failure of the routing engine
    /// rather than of the caller.
    pub fn is_upstream_failure(&self) -> bool {
        matches!(
            self,
            Error::UpstreamTimeout { .. }
                | Error::UpstreamUnreachable(_)
                | Error::UpstreamStatus { .. }
                | Error::UpstreamRejected { .. }
                | Error::MalformedResponse(_)
                | Error::IncompleteRoute { .. }
                | Error::Http(_)
        )
    }

    /// Short label used for metrics and log fields.
    pub fn reason(&self) -> &'static str {
        match self {
            Error::InvalidCoordinate { .. } => "invalid_coordinate",
            Error::InvalidBaseUrl { .. } => "invalid_base_url",
            Error::UpstreamTimeout { .. } => "upstream_timeout",
            Error::UpstreamUnreachable(_) => "upstream_unreachable",
            Error::UpstreamStatus { .. } => "upstream_status",
            Error::UpstreamRejected { .. } => "upstream_rejected",
            Error::RouteNotFound { .. } => "no_route",
            Error::MalformedResponse(_) | Error::IncompleteRoute { .. } => "upstream_malformed",
            Error::Http(_) => "upstream_http",
        }
    }
}

fn format_body(body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        String::new()
    } else {
        format!(": {}", body)
    }
}

fn format_message(message: &Option<String>) -> String {
    match message.as_deref().map(str::trim) {
        Some(message) if !message.is_empty() => format!(" ({})", message),
        _ => String::new(),
    }
}
