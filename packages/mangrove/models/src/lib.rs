#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Mangrove reference feature types.
//!
//! These types describe the bulk-loaded mangrove reference dataset (a
//! `GeoJSON` feature collection), independent of user-submitted incident
//! reports. The stored wire format uses `snake_case` keys (`area_hectares`,
//! `threat_level`, ...) and is fixed by the existing stored data, so the
//! structs here do not rename fields.

use geojson::{Feature, JsonObject};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Categorical risk label attached to a mangrove reference feature.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum ThreatLevel {
    /// Stable or well-protected area.
    Low,
    /// Degradation pressure exists but is contained.
    Medium,
    /// Active, large-scale degradation.
    High,
}

/// Descriptive properties of a mangrove reference feature.
///
/// All fields except `name` are optional in the wire data; older entries in
/// the dataset use `region` where newer ones use `state`. The `state` value
/// is the key used for filtering and statistics. Unknown keys are preserved
/// through `extra` so that re-serializing a feature never loses data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MangroveProperties {
    /// Human-readable site name (e.g. "Sundarbans Mangrove Complex").
    pub name: String,
    /// State or administrative region; the filter/statistics key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Broader region label used by older dataset entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Country name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Covered area in hectares.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_hectares: Option<f64>,
    /// Conservation status label (e.g. "National Park").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conservation_status: Option<String>,
    /// Threat level classification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threat_level: Option<ThreatLevel>,
    /// Number of recorded species.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub species_count: Option<u32>,
    /// Free-text description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Any additional keys present in the stored data.
    #[serde(flatten)]
    pub extra: JsonObject,
}

impl MangroveProperties {
    /// Reads typed properties out of a raw `GeoJSON` feature.
    ///
    /// # Errors
    ///
    /// Returns [`PropertiesError`] if the feature has no properties object
    /// or the object does not deserialize (e.g. missing `name`).
    pub fn from_feature(feature: &Feature) -> Result<Self, PropertiesError> {
        let props = feature
            .properties
            .as_ref()
            .ok_or(PropertiesError::Missing)?;
        serde_json::from_value(serde_json::Value::Object(props.clone()))
            .map_err(PropertiesError::Invalid)
    }

    /// Converts the typed properties back into a `GeoJSON` properties object.
    ///
    /// # Panics
    ///
    /// Never panics: serializing this struct always yields a JSON object.
    #[must_use]
    pub fn to_json_object(&self) -> JsonObject {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => unreachable!("struct serializes to an object"),
        }
    }
}

/// Errors reading typed properties from a raw feature.
#[derive(Debug, thiserror::Error)]
pub enum PropertiesError {
    /// The feature carries no properties object at all.
    #[error("feature has no properties")]
    Missing,

    /// The properties object does not match the expected shape.
    #[error("invalid properties: {0}")]
    Invalid(#[source] serde_json::Error),
}

/// Errors describing a malformed feature geometry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    /// The feature has no geometry.
    #[error("feature has no geometry")]
    Missing,

    /// A `Point` position must be a (longitude, latitude) pair of finite
    /// numbers (an optional third altitude value is tolerated).
    #[error("malformed point position")]
    BadPoint,

    /// A `Polygon` ring must contain at least four positions.
    #[error("polygon ring {ring} has only {len} positions")]
    ShortRing {
        /// Ring index within the polygon.
        ring: usize,
        /// Number of positions found.
        len: usize,
    },

    /// A `Polygon` ring must be closed (first position equals last).
    #[error("polygon ring {ring} is not closed")]
    OpenRing {
        /// Ring index within the polygon.
        ring: usize,
    },

    /// Geometry types other than `Point` and `Polygon` are not part of the
    /// mangrove dataset.
    #[error("unsupported geometry type {0}")]
    Unsupported(&'static str),
}

/// Validates that a feature's geometry is well-formed for its declared type.
///
/// `Point` must be a finite (longitude, latitude) pair; `Polygon` rings must
/// be closed and contain at least four positions.
///
/// # Errors
///
/// Returns [`GeometryError`] naming the first violation found.
pub fn validate_geometry(feature: &Feature) -> Result<(), GeometryError> {
    let geometry = feature.geometry.as_ref().ok_or(GeometryError::Missing)?;

    match &geometry.value {
        geojson::Value::Point(position) => validate_position(position),
        geojson::Value::Polygon(rings) => {
            for (ring_idx, ring) in rings.iter().enumerate() {
                if ring.len() < 4 {
                    return Err(GeometryError::ShortRing {
                        ring: ring_idx,
                        len: ring.len(),
                    });
                }
                if ring.first() != ring.last() {
                    return Err(GeometryError::OpenRing { ring: ring_idx });
                }
                for position in ring {
                    validate_position(position)?;
                }
            }
            Ok(())
        }
        other => Err(GeometryError::Unsupported(geometry_type_name(other))),
    }
}

const fn geometry_type_name(value: &geojson::Value) -> &'static str {
    match value {
        geojson::Value::Point(_) => "Point",
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::Polygon(_) => "Polygon",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
    }
}

fn validate_position(position: &[f64]) -> Result<(), GeometryError> {
    if !(2..=3).contains(&position.len()) || position.iter().any(|v| !v.is_finite()) {
        return Err(GeometryError::BadPoint);
    }
    Ok(())
}
