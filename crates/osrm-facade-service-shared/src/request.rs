//! Request types and validation for HTTP endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use osrm_facade_lib::LatLon;

use crate::ProblemDetails;

const SHAPE_HINT: &str = "Body must include 'from' and 'to' as [lat, lon]";

/// Body of `POST /route`.
///
/// Fields are kept as raw JSON so that every malformed shape (missing field,
/// wrong arity, strings instead of numbers) is reported as a 400 problem
/// rather than a framework-level rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteRequest {
    /// Origin as `[latitude, longitude]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Value>,

    /// Destination as `[latitude, longitude]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Value>,
}

/// A validated pair of endpoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteEndpoints {
    pub from: LatLon,
    pub to: LatLon,
}

impl RouteRequest {
    /// Build a request from coordinate pairs in `[lat, lon]` order.
    pub fn new(from: [f64; 2], to: [f64; 2]) -> Self {
        Self {
            from: Some(Value::from(from.to_vec())),
            to: Some(Value::from(to.to_vec())),
        }
    }

    /// Parse a raw body, ignoring the declared content type.
    ///
    /// A body that is not a JSON object yields an empty request, which then
    /// fails validation with the usual "missing field" problem.
    pub fn from_body(body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) => Self {
                from: map.get("from").cloned(),
                to: map.get("to").cloned(),
            },
            _ => Self::default(),
        }
    }

    /// Validate and convert both endpoints.
    ///
    /// The `request_id` becomes the `instance` of the returned problem. The
    /// problem is boxed to keep the `Err` variant small.
    pub fn endpoints(&self, request_id: &str) -> Result<RouteEndpoints, Box<ProblemDetails>> {
        let from = parse_pair("from", self.from.as_ref(), request_id)?;
        let to = parse_pair("to", self.to.as_ref(), request_id)?;
        Ok(RouteEndpoints { from, to })
    }
}

fn parse_pair(
    field: &str,
    value: Option<&Value>,
    request_id: &str,
) -> Result<LatLon, Box<ProblemDetails>> {
    let bad = |reason: String| {
        Box::new(ProblemDetails::bad_request(
            format!("{SHAPE_HINT}: {reason}"),
            request_id,
        ))
    };

    let items = match value {
        None | Some(Value::Null) => return Err(bad(format!("'{field}' is missing"))),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(bad(format!("'{field}' must be an array"))),
    };

    let [lat, lon] = items.as_slice() else {
        return Err(bad(format!(
            "'{field}' must have exactly 2 elements, got {}",
            items.len()
        )));
    };

    let (Some(lat), Some(lon)) = (lat.as_f64(), lon.as_f64()) else {
        return Err(bad(format!("'{field}' must contain only numbers")));
    };

    LatLon::new(lat, lon).map_err(|e| bad(format!("'{field}' {e}")))
}
