#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory session state for incident reports and gamification points.
//!
//! [`SessionState`] is the single source of truth consumed by the map,
//! leaderboard, and statistics views. It owns the report sequence and the
//! per-user point totals for the lifetime of one session; nothing here is
//! durable. Submitting a report is the only point-earning path: there is no
//! deduction, decay, or cap.

use chrono::Utc;
use mangrove_map_report_models::{
    Coordinates, EvidenceRef, LeaderboardEntry, POINTS_PER_REPORT, Report, ReportId, SessionStats,
};

/// Reporter identity used when the caller does not track accounts.
pub const DEFAULT_REPORTER: &str = "User1";

/// Issues unique, monotonically increasing time-based report ids.
#[derive(Debug, Default)]
struct ReportIdAllocator {
    last: u64,
}

impl ReportIdAllocator {
    /// Returns the current timestamp in milliseconds, bumped past the last
    /// issued id if the clock has not advanced (or went backwards).
    fn next(&mut self, now_ms: u64) -> ReportId {
        self.last = now_ms.max(self.last + 1);
        ReportId(self.last)
    }
}

/// Session state holding submitted reports and leaderboard totals.
#[derive(Debug, Default)]
pub struct SessionState {
    reports: Vec<Report>,
    leaderboard: Vec<LeaderboardEntry>,
    show_data_manager: bool,
    ids: ReportIdAllocator,
}

impl SessionState {
    /// Creates an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Submits a new incident report attributed to `submitted_by`.
    ///
    /// Rejected as a no-op (returning `None`, with no state mutated) when
    /// the location has not been resolved or the description is blank.
    /// Otherwise the report is appended in insertion order and the
    /// reporter is credited [`POINTS_PER_REPORT`] points, creating their
    /// leaderboard entry on first submission.
    pub fn submit_report(
        &mut self,
        submitted_by: &str,
        description: &str,
        location: Option<Coordinates>,
        evidence: Option<EvidenceRef>,
    ) -> Option<&Report> {
        let Some(location) = location else {
            log::info!("Rejecting report submission with no resolved location");
            return None;
        };
        if description.trim().is_empty() {
            log::info!("Rejecting report submission with empty description");
            return None;
        }

        let now = Utc::now();
        #[allow(clippy::cast_sign_loss)]
        let id = self.ids.next(now.timestamp_millis() as u64);

        self.reports.push(Report {
            id,
            description: description.to_string(),
            latitude: location.latitude,
            longitude: location.longitude,
            submitted_by: submitted_by.to_string(),
            submitted_at: now,
            evidence,
        });

        self.credit(submitted_by);
        log::debug!("Report {id} submitted by {submitted_by}");

        self.reports.last()
    }

    /// Credits the fixed per-report increment, creating the entry on first
    /// contact.
    fn credit(&mut self, user_name: &str) {
        if let Some(entry) = self
            .leaderboard
            .iter_mut()
            .find(|entry| entry.user_name == user_name)
        {
            entry.points += POINTS_PER_REPORT;
        } else {
            self.leaderboard.push(LeaderboardEntry {
                user_name: user_name.to_string(),
                points: POINTS_PER_REPORT,
            });
        }
    }

    /// Flips the data-manager panel flag. UI state only; no data effect.
    pub const fn toggle_data_manager(&mut self) {
        self.show_data_manager = !self.show_data_manager;
    }

    /// Whether the data-manager panel is shown.
    #[must_use]
    pub const fn show_data_manager(&self) -> bool {
        self.show_data_manager
    }

    /// Submitted reports in insertion order (the display order unless a
    /// view re-sorts).
    #[must_use]
    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    /// Leaderboard entries in first-contribution order.
    #[must_use]
    pub fn leaderboard(&self) -> &[LeaderboardEntry] {
        &self.leaderboard
    }

    /// Leaderboard in display order: descending by points, ties broken by
    /// first-contribution order.
    #[must_use]
    pub fn leaderboard_sorted(&self) -> Vec<LeaderboardEntry> {
        let mut sorted = self.leaderboard.clone();
        sorted.sort_by(|a, b| b.points.cmp(&a.points));
        sorted
    }

    /// Derived session statistics.
    #[must_use]
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            total_reports: self.reports.len(),
            total_contributors: self.leaderboard.len(),
            total_points: self
                .leaderboard
                .iter()
                .map(|entry| u64::from(entry.points))
                .sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn here() -> Option<Coordinates> {
        Some(Coordinates {
            latitude: 11.43,
            longitude: 79.77,
        })
    }

    #[test]
    fn points_scale_with_report_count_for_one_identity() {
        let mut state = SessionState::new();
        for i in 0..5 {
            let report = state.submit_report(DEFAULT_REPORTER, &format!("cutting #{i}"), here(), None);
            assert!(report.is_some());
        }

        let stats = state.stats();
        assert_eq!(stats.total_reports, 5);
        assert_eq!(stats.total_contributors, 1);
        assert_eq!(stats.total_points, 5 * u64::from(POINTS_PER_REPORT));
        assert_eq!(state.leaderboard().len(), 1);
    }

    #[test]
    fn missing_location_is_a_no_op() {
        let mut state = SessionState::new();
        assert!(state.submit_report(DEFAULT_REPORTER, "dumping", None, None).is_none());
        assert!(state.reports().is_empty());
        assert!(state.leaderboard().is_empty());
    }

    #[test]
    fn blank_description_is_a_no_op() {
        let mut state = SessionState::new();
        assert!(state.submit_report(DEFAULT_REPORTER, "   ", here(), None).is_none());
        assert!(state.reports().is_empty());
        assert!(state.leaderboard().is_empty());
    }

    #[test]
    fn leaderboard_sorts_descending_with_stable_ties() {
        let mut state = SessionState::new();
        state.submit_report("asha", "felled trees", here(), None);
        state.submit_report("asha", "oil sheen", here(), None);
        state.submit_report("asha", "net damage", here(), None);
        state.submit_report("ravi", "felled trees", here(), None);

        let sorted = state.leaderboard_sorted();
        assert_eq!(sorted.len(), 2);
        assert_eq!((sorted[0].user_name.as_str(), sorted[0].points), ("asha", 30));
        assert_eq!((sorted[1].user_name.as_str(), sorted[1].points), ("ravi", 10));

        // Tie: same points, first contributor first.
        state.submit_report("ravi", "more damage", here(), None);
        state.submit_report("ravi", "more damage", here(), None);
        let sorted = state.leaderboard_sorted();
        assert_eq!(sorted[0].user_name, "asha");
        assert_eq!(sorted[1].user_name, "ravi");
        assert_eq!(sorted[0].points, sorted[1].points);
    }

    #[test]
    fn report_ids_are_strictly_increasing() {
        let mut state = SessionState::new();
        for _ in 0..100 {
            state.submit_report(DEFAULT_REPORTER, "rapid-fire", here(), None);
        }
        let ids: Vec<_> = state.reports().iter().map(|r| r.id).collect();
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn evidence_is_carried_in_memory() {
        let mut state = SessionState::new();
        let evidence = EvidenceRef {
            file_name: "stumps.jpg".to_string(),
            mime_type: Some("image/jpeg".to_string()),
        };
        let report = state
            .submit_report(DEFAULT_REPORTER, "fresh stumps", here(), Some(evidence.clone()))
            .unwrap();
        assert_eq!(report.evidence.as_ref(), Some(&evidence));
    }

    #[test]
    fn toggle_flips_flag_without_touching_data() {
        let mut state = SessionState::new();
        state.submit_report(DEFAULT_REPORTER, "report", here(), None);
        assert!(!state.show_data_manager());
        state.toggle_data_manager();
        assert!(state.show_data_manager());
        state.toggle_data_manager();
        assert!(!state.show_data_manager());
        assert_eq!(state.stats().total_reports, 1);
    }
}
