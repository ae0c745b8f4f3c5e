//! Session statistics aggregation
//!
//! [`SessionStats`] is the sole source of truth for violation totals. It is a
//! pure reducer over [`ViolationEvent`]s plus an independently recomputed
//! duration; the integrity score is derived from it on every change, never
//! maintained incrementally.

use crate::score;
use crate::types::{ViolationEvent, ViolationKind};
use serde::{Deserialize, Serialize};

/// Aggregated violation counters and derived score for one session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Session duration in seconds (`now - start_time`, frozen at stop)
    pub duration_seconds: u64,
    /// Looking-away events plus no-face events
    pub focus_loss_events: u32,
    /// Suspicious-object events
    pub suspicious_items: u32,
    /// Multiple-face events
    pub multiple_face_events: u32,
    /// No-face events
    pub no_face_events: u32,
    /// Derived integrity score (0-100), recomputed on every change
    pub integrity_score: u32,
}

impl SessionStats {
    pub fn new() -> Self {
        Self {
            integrity_score: 100,
            ..Default::default()
        }
    }

    /// Fold one violation event into the counters.
    ///
    /// A no-face event counts as a focus loss as well. Session-control
    /// markers update nothing.
    pub fn apply(&mut self, event: &ViolationEvent) {
        match event.kind {
            ViolationKind::NoFace => {
                self.no_face_events += 1;
                self.focus_loss_events += 1;
            }
            ViolationKind::LookingAway => self.focus_loss_events += 1,
            ViolationKind::MultipleFaces => self.multiple_face_events += 1,
            ViolationKind::SuspiciousObject => self.suspicious_items += 1,
            ViolationKind::SessionControl => {}
        }
        self.integrity_score = score::integrity_score(self);
    }

    /// Update the duration and re-derive the score
    pub fn set_duration(&mut self, duration_seconds: u64) {
        self.duration_seconds = duration_seconds;
        self.integrity_score = score::integrity_score(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn event(kind: ViolationKind) -> ViolationEvent {
        ViolationEvent {
            timestamp: Utc::now(),
            kind,
            detail: String::new(),
            session_id: "s".to_string(),
        }
    }

    #[test]
    fn test_new_session_scores_100() {
        let stats = SessionStats::new();
        assert_eq!(stats.integrity_score, 100);
    }

    #[test]
    fn test_no_face_counts_as_focus_loss_too() {
        let mut stats = SessionStats::new();
        stats.apply(&event(ViolationKind::NoFace));

        assert_eq!(stats.no_face_events, 1);
        assert_eq!(stats.focus_loss_events, 1);
        assert_eq!(stats.integrity_score, 87);
    }

    #[test]
    fn test_each_kind_maps_to_its_counter() {
        let mut stats = SessionStats::new();
        stats.apply(&event(ViolationKind::LookingAway));
        stats.apply(&event(ViolationKind::SuspiciousObject));
        stats.apply(&event(ViolationKind::MultipleFaces));

        assert_eq!(stats.focus_loss_events, 1);
        assert_eq!(stats.suspicious_items, 1);
        assert_eq!(stats.multiple_face_events, 1);
        assert_eq!(stats.no_face_events, 0);
    }

    #[test]
    fn test_session_control_updates_nothing() {
        let mut stats = SessionStats::new();
        stats.apply(&event(ViolationKind::SessionControl));
        assert_eq!(stats, SessionStats::new());
    }

    #[test]
    fn test_duration_update_rederives_score() {
        let mut stats = SessionStats::new();
        // 3 focus losses in 1 minute: rate 3/min > 2 adds the rate penalty
        for _ in 0..3 {
            stats.apply(&event(ViolationKind::LookingAway));
        }
        assert_eq!(stats.integrity_score, 85);

        stats.set_duration(60);
        assert_eq!(stats.integrity_score, 75);
    }
}
