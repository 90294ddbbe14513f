//! Geographic primitives shared by the request and response contracts.
//!
//! Callers speak `[latitude, longitude]`; OSRM and GeoJSON speak
//! `[longitude, latitude]`. [`LatLon`] is the single place where the two
//! orderings meet.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const LATITUDE_RANGE: (f64, f64) = (-90.0, 90.0);
const LONGITUDE_RANGE: (f64, f64) = (-180.0, 180.0);

/// A WGS84 position in caller order (latitude first).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    /// Build a position, rejecting non-finite or out-of-range components.
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        check_axis("latitude", lat, LATITUDE_RANGE)?;
        check_axis("longitude", lon, LONGITUDE_RANGE)?;
        Ok(Self { lat, lon })
    }

    /// Render as an OSRM coordinate (`lon,lat`).
    pub fn to_osrm(&self) -> String {
        format!("{},{}", self.lon, self.lat)
    }
}

impl fmt::Display for LatLon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lat, self.lon)
    }
}

fn check_axis(axis: &'static str, value: f64, (min, max): (f64, f64)) -> Result<()> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidCoordinate {
            axis,
            value,
            min,
            max,
        })
    }
}

/// GeoJSON `LineString` geometry; positions are `[longitude, latitude]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "LineString")]
pub struct LineString {
    pub coordinates: Vec<[f64; 2]>,
}

impl LineString {
    pub fn new(coordinates: Vec<[f64; 2]>) -> Self {
        Self { coordinates }
    }

    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_osrm_ordering_is_lon_lat() {
        let point = LatLon::new(40.4066, -3.6893).unwrap();
        assert_eq!(point.to_osrm(), "-3.6893,40.4066");
    }

    #[test]
    fn test_rejects_out_of_range_latitude() {
        let err = LatLon::new(90.5, 0.0).unwrap_err();
        assert!(err.to_string().contains("latitude"));
    }

    #[test]
    fn test_rejects_out_of_range_longitude() {
        let err = LatLon::new(0.0, -180.01).unwrap_err();
        assert!(err.to_string().contains("longitude"));
    }

    #[test]
    fn test_rejects_non_finite() {
        assert!(LatLon::new(f64::NAN, 0.0).is_err());
        assert!(LatLon::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_accepts_boundaries() {
        assert!(LatLon::new(-90.0, 180.0).is_ok());
        assert!(LatLon::new(90.0, -180.0).is_ok());
    }

    #[test]
    fn test_line_string_serializes_as_geojson() {
        let line = LineString::new(vec![[-3.6893, 40.4066], [-3.6834, 40.4723]]);
        let json = serde_json::to_value(&line).unwrap();
        assert_eq!(json["type"], "LineString");
        assert_eq!(json["coordinates"][0][0], -3.6893);
        assert_eq!(json["coordinates"][1][1], 40.4723);
    }
}
