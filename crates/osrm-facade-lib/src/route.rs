use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geo::LineString;

/// A route reshaped into the façade's response contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    /// Total distance in meters.
    pub distance_m: f64,
    /// Total travel time in seconds.
    pub duration_s: f64,
    /// Full-resolution path geometry.
    pub geometry: LineString,
}

/// How to choose one route when the engine returns several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RouteSelection {
    /// Take the engine's primary route, which it already ranks fastest.
    #[default]
    Fastest,
    /// Ask for alternatives and keep the one with the smallest distance.
    Shortest,
}

impl RouteSelection {
    /// Selection implied by the "request alternatives" switch.
    pub fn from_alternatives(alternatives: bool) -> Self {
        if alternatives {
            RouteSelection::Shortest
        } else {
            RouteSelection::Fastest
        }
    }

    /// Whether the engine should be asked for alternative routes.
    pub fn wants_alternatives(self) -> bool {
        matches!(self, RouteSelection::Shortest)
    }

    /// Metric/log label.
    pub fn as_str(self) -> &'static str {
        match self {
            RouteSelection::Fastest => "fastest",
            RouteSelection::Shortest => "shortest",
        }
    }

    /// Pick one candidate. `distance` is only consulted for [`RouteSelection::Shortest`];
    /// missing or non-finite distances rank after every finite one.
    pub fn pick<T>(self, candidates: Vec<T>, distance: impl Fn(&T) -> Option<f64>) -> Option<T> {
        match self {
            RouteSelection::Fastest => candidates.into_iter().next(),
            RouteSelection::Shortest => candidates.into_iter().min_by(|a, b| {
                rank_distance(distance(a)).total_cmp(&rank_distance(distance(b)))
            }),
        }
    }
}

impl fmt::Display for RouteSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn rank_distance(distance: Option<f64>) -> f64 {
    match distance {
        Some(distance) if distance.is_finite() => distance,
        _ => f64::INFINITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fastest_takes_first_candidate() {
        let picked = RouteSelection::Fastest.pick(vec![900.0, 100.0, 500.0], |d| Some(*d));
        assert_eq!(picked, Some(900.0));
    }

    #[test]
    fn test_shortest_takes_minimum_distance() {
        let picked = RouteSelection::Shortest.pick(vec![900.0, 100.0, 500.0], |d| Some(*d));
        assert_eq!(picked, Some(100.0));
    }

    #[test]
    fn test_shortest_ranks_nan_last() {
        let picked = RouteSelection::Shortest.pick(vec![f64::NAN, 700.0], |d| Some(*d));
        assert_eq!(picked, Some(700.0));
    }

    #[test]
    fn test_shortest_ranks_missing_distance_last() {
        let picked = RouteSelection::Shortest.pick(vec![None, Some(700.0), None], |d| *d);
        assert_eq!(picked, Some(Some(700.0)));
    }

    #[test]
    fn test_pick_on_empty_returns_none() {
        let empty: Vec<f64> = Vec::new();
        assert!(RouteSelection::Shortest.pick(empty, |d| Some(*d)).is_none());
    }

    #[test]
    fn test_from_alternatives() {
        assert_eq!(RouteSelection::from_alternatives(true), RouteSelection::Shortest);
        assert_eq!(RouteSelection::from_alternatives(false), RouteSelection::Fastest);
        assert!(RouteSelection::Shortest.wants_alternatives());
        assert!(!RouteSelection::Fastest.wants_alternatives());
    }

    #[test]
    fn test_route_result_field_names() {
        let result = RouteResult {
            distance_m: 1234.5,
            duration_s: 321.0,
            geometry: LineString::new(vec![[-3.6893, 40.4066]]),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["distance_m"], 1234.5);
        assert_eq!(json["duration_s"], 321.0);
        assert_eq!(json["geometry"]["type"], "LineString");
    }
}
