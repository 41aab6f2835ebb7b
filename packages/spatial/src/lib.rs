#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Great-circle distance and radius predicates for mangrove geometries.
//!
//! Radius queries over the reference dataset are a flat linear scan; there
//! is no spatial index. Point features are compared by haversine distance.
//! Polygon features count as distance zero when they contain the query
//! point, otherwise the distance to the closest point on their boundary is
//! used.

use geo::{ClosestPoint, Contains, Point, Polygon};

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometers between two (latitude, longitude)
/// pairs, using the haversine formula.
#[must_use]
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Whether a geometry lies within `radius_km` of `(lat, lng)`.
///
/// `Point` geometries are included when their haversine distance is at most
/// the radius. `Polygon` geometries are included when they contain the query
/// point or their boundary comes within the radius. All other geometry
/// types are excluded (the mangrove dataset only carries points and
/// polygons).
#[must_use]
pub fn within_radius(lat: f64, lng: f64, geometry: &geojson::Geometry, radius_km: f64) -> bool {
    match &geometry.value {
        geojson::Value::Point(position) => {
            let Some((f_lng, f_lat)) = lng_lat(position) else {
                log::warn!("Skipping point feature with malformed coordinates");
                return false;
            };
            haversine_km(lat, lng, f_lat, f_lng) <= radius_km
        }
        geojson::Value::Polygon(_) => {
            let converted: Result<geo::Geometry<f64>, _> = geometry.clone().try_into();
            let Ok(geo::Geometry::Polygon(polygon)) = converted else {
                log::warn!("Skipping polygon feature with malformed coordinates");
                return false;
            };
            polygon_within_radius(lat, lng, &polygon, radius_km)
        }
        _ => false,
    }
}

/// Distance from `(lat, lng)` to a polygon: zero when contained, otherwise
/// haversine distance to the closest point on the boundary.
fn polygon_within_radius(lat: f64, lng: f64, polygon: &Polygon<f64>, radius_km: f64) -> bool {
    let query = Point::new(lng, lat);
    if polygon.contains(&query) {
        return true;
    }

    match polygon.closest_point(&query) {
        geo::Closest::Intersection(_) => true,
        geo::Closest::SinglePoint(nearest) => {
            haversine_km(lat, lng, nearest.y(), nearest.x()) <= radius_km
        }
        geo::Closest::Indeterminate => {
            log::warn!("Skipping degenerate polygon feature");
            false
        }
    }
}

/// Reads a `[longitude, latitude]` position, rejecting non-finite values.
fn lng_lat(position: &[f64]) -> Option<(f64, f64)> {
    match position {
        [lng, lat, ..] if lng.is_finite() && lat.is_finite() => Some((*lng, *lat)),
        _ => None,
    }
}
