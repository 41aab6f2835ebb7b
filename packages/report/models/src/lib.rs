#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident report and leaderboard types.
//!
//! These types are session-scoped: reports and leaderboard entries live in
//! memory for the lifetime of one session and are never written to the
//! persistence layer. Only the reference mangrove dataset is durable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Points credited to a reporter for each submitted report.
pub const POINTS_PER_REPORT: u32 = 10;

/// Unique, monotonically increasing report identifier.
///
/// Derived from the submission timestamp in milliseconds; ties within the
/// same millisecond are broken by incrementing past the last issued id.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ReportId(pub u64);

impl std::fmt::Display for ReportId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A resolved (latitude, longitude) pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
}

/// Reference to an evidence attachment supplied with a report.
///
/// The attachment bytes themselves are never persisted; only this
/// descriptor is carried in session memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceRef {
    /// Original file name of the attachment.
    pub file_name: String,
    /// MIME type, when known.
    pub mime_type: Option<String>,
}

/// A user-submitted record of an observed environmental incident.
///
/// Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Unique time-based identifier.
    pub id: ReportId,
    /// Non-empty incident description.
    pub description: String,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Identity of the reporter.
    pub submitted_by: String,
    /// Submission timestamp.
    pub submitted_at: DateTime<Utc>,
    /// Optional evidence attachment reference.
    pub evidence: Option<EvidenceRef>,
}

/// Per-user running point total used for gamification.
///
/// At most one entry exists per `user_name`; `points` only ever grows, by
/// [`POINTS_PER_REPORT`] per attributed report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// Unique reporter identity.
    pub user_name: String,
    /// Non-negative running point total.
    pub points: u32,
}

/// Aggregate session statistics, derived on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    /// Number of reports submitted this session.
    pub total_reports: usize,
    /// Number of distinct reporters on the leaderboard.
    pub total_contributors: usize,
    /// Sum of all leaderboard points.
    pub total_points: u64,
}
