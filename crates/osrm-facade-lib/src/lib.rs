//! OSRM façade library entry points.
//!
//! This crate owns everything the HTTP layer should not care about: the
//! coordinate types and their ordering conventions, the GeoJSON geometry
//! returned to callers, and the async client that talks to the OSRM `route`
//! service. Route computation itself happens in OSRM; nothing here searches a
//! graph.
//!

pub mod error;
pub mod geo;
pub mod osrm;
pub mod route;

pub use error::{Error, Result};
pub use geo::{LatLon, LineString};
pub use osrm::{OsrmClient, OsrmConfig};
pub use route::{RouteResult, RouteSelection};
