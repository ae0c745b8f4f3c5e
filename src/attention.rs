//! Attention state machine
//!
//! Converts a single [`FaceObservation`] into an [`AttentionSignal`] and
//! maintains the consecutive-tick counters the violation debouncer thresholds
//! against. The counters are owned here and mutated only by this module (the
//! debouncer resets them through the dedicated reset methods when an event
//! fires).
//!
//! The looking-away check is a cheap head-roll proxy, not gaze estimation:
//! it compares the vertical skew between the two eye centers against their
//! horizontal distance. Its false-positive rate under head tilt vs. genuine
//! gaze diversion is a known limitation.

use crate::types::{AttentionSignal, FaceLandmarks, FaceObservation, Point2D};
use chrono::{DateTime, Utc};

/// Vertical eye skew beyond this fraction of the horizontal eye distance
/// counts as looking away.
const GAZE_SKEW_RATIO: f64 = 0.3;

/// Rolling attention state for one session
#[derive(Debug, Default)]
pub struct AttentionMonitor {
    consecutive_no_face: u32,
    consecutive_looking_away: u32,
    last_face_at: Option<DateTime<Utc>>,
    last_attentive_at: Option<DateTime<Utc>>,
}

impl AttentionMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify one face observation and advance the counters.
    ///
    /// Invariants:
    /// - a no-face tick never advances the looking-away counter (gaze cannot
    ///   be evaluated without a face);
    /// - a multi-face tick leaves the looking-away counter untouched
    ///   (multiplicity is independent of gaze);
    /// - missing or empty landmark sets count as attentive — absence of data
    ///   is not evidence of a violation.
    pub fn observe(&mut self, face: &FaceObservation, now: DateTime<Utc>) -> AttentionSignal {
        match face.count {
            0 => {
                self.consecutive_no_face += 1;
                AttentionSignal::NoFace
            }
            1 => {
                self.consecutive_no_face = 0;
                self.last_face_at = Some(now);

                if is_looking_away(face.landmarks.as_ref()) {
                    self.consecutive_looking_away += 1;
                    AttentionSignal::SingleInattentive
                } else {
                    self.consecutive_looking_away = 0;
                    self.last_attentive_at = Some(now);
                    AttentionSignal::SingleAttentive
                }
            }
            count => {
                self.consecutive_no_face = 0;
                self.last_face_at = Some(now);
                AttentionSignal::MultiFace { count }
            }
        }
    }

    /// Consecutive ticks without a face
    pub fn consecutive_no_face(&self) -> u32 {
        self.consecutive_no_face
    }

    /// Consecutive single-face ticks spent looking away
    pub fn consecutive_looking_away(&self) -> u32 {
        self.consecutive_looking_away
    }

    /// Timestamp of the last tick with at least one face
    pub fn last_face_at(&self) -> Option<DateTime<Utc>> {
        self.last_face_at
    }

    /// Timestamp of the last attentive tick
    pub fn last_attentive_at(&self) -> Option<DateTime<Utc>> {
        self.last_attentive_at
    }

    /// Reset the no-face counter after a debounced event fires
    pub(crate) fn reset_no_face(&mut self) {
        self.consecutive_no_face = 0;
    }

    /// Reset the looking-away counter after a debounced event fires
    pub(crate) fn reset_looking_away(&mut self) {
        self.consecutive_looking_away = 0;
    }
}

/// Gaze-deviation proxy from eye landmarks.
///
/// Degenerate input (no landmarks, or either eye set empty) is treated as
/// attentive.
fn is_looking_away(landmarks: Option<&FaceLandmarks>) -> bool {
    let Some(landmarks) = landmarks else {
        return false;
    };
    let (Some(left), Some(right)) = (
        average_point(&landmarks.left_eye),
        average_point(&landmarks.right_eye),
    ) else {
        return false;
    };

    let eye_distance = (left.x - right.x).abs();
    let vertical_skew = (left.y - right.y).abs();
    vertical_skew > eye_distance * GAZE_SKEW_RATIO
}

fn average_point(points: &[Point2D]) -> Option<Point2D> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let x = points.iter().map(|p| p.x).sum::<f64>() / n;
    let y = points.iter().map(|p| p.y).sum::<f64>() / n;
    Some(Point2D::new(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(sec: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 14, 0, sec).unwrap()
    }

    fn level_landmarks() -> FaceLandmarks {
        FaceLandmarks {
            left_eye: vec![Point2D::new(100.0, 200.0), Point2D::new(110.0, 200.0)],
            right_eye: vec![Point2D::new(160.0, 200.0), Point2D::new(170.0, 200.0)],
            nose: vec![Point2D::new(135.0, 230.0)],
        }
    }

    fn tilted_landmarks() -> FaceLandmarks {
        // Eye distance 60, vertical skew 30 > 0.3 * 60
        FaceLandmarks {
            left_eye: vec![Point2D::new(100.0, 200.0)],
            right_eye: vec![Point2D::new(160.0, 230.0)],
            nose: vec![Point2D::new(130.0, 250.0)],
        }
    }

    #[test]
    fn test_no_face_increments_counter_only() {
        let mut monitor = AttentionMonitor::new();

        for i in 0..3 {
            let signal = monitor.observe(&FaceObservation::absent(), at(i));
            assert_eq!(signal, AttentionSignal::NoFace);
        }

        assert_eq!(monitor.consecutive_no_face(), 3);
        assert_eq!(monitor.consecutive_looking_away(), 0);
        assert!(monitor.last_face_at().is_none());
    }

    #[test]
    fn test_no_face_does_not_touch_looking_away_counter() {
        let mut monitor = AttentionMonitor::new();

        let obs = FaceObservation {
            count: 1,
            landmarks: Some(tilted_landmarks()),
        };
        monitor.observe(&obs, at(0));
        monitor.observe(&obs, at(1));
        assert_eq!(monitor.consecutive_looking_away(), 2);

        monitor.observe(&FaceObservation::absent(), at(2));
        assert_eq!(monitor.consecutive_looking_away(), 2);
        assert_eq!(monitor.consecutive_no_face(), 1);
    }

    #[test]
    fn test_attentive_face_resets_counters() {
        let mut monitor = AttentionMonitor::new();

        monitor.observe(&FaceObservation::absent(), at(0));
        let obs = FaceObservation {
            count: 1,
            landmarks: Some(level_landmarks()),
        };
        let signal = monitor.observe(&obs, at(1));

        assert_eq!(signal, AttentionSignal::SingleAttentive);
        assert_eq!(monitor.consecutive_no_face(), 0);
        assert_eq!(monitor.consecutive_looking_away(), 0);
        assert_eq!(monitor.last_face_at(), Some(at(1)));
        assert_eq!(monitor.last_attentive_at(), Some(at(1)));
    }

    #[test]
    fn test_tilted_face_signals_inattentive() {
        let mut monitor = AttentionMonitor::new();

        let obs = FaceObservation {
            count: 1,
            landmarks: Some(tilted_landmarks()),
        };
        let signal = monitor.observe(&obs, at(0));

        assert_eq!(signal, AttentionSignal::SingleInattentive);
        assert_eq!(monitor.consecutive_looking_away(), 1);
        assert_eq!(monitor.last_face_at(), Some(at(0)));
        assert!(monitor.last_attentive_at().is_none());
    }

    #[test]
    fn test_missing_landmarks_treated_as_attentive() {
        let mut monitor = AttentionMonitor::new();

        let obs = FaceObservation {
            count: 1,
            landmarks: Some(tilted_landmarks()),
        };
        monitor.observe(&obs, at(0));
        assert_eq!(monitor.consecutive_looking_away(), 1);

        let signal = monitor.observe(&FaceObservation::faces(1), at(1));
        assert_eq!(signal, AttentionSignal::SingleAttentive);
        assert_eq!(monitor.consecutive_looking_away(), 0);
    }

    #[test]
    fn test_empty_eye_set_treated_as_attentive() {
        let mut monitor = AttentionMonitor::new();

        let obs = FaceObservation {
            count: 1,
            landmarks: Some(FaceLandmarks {
                left_eye: vec![Point2D::new(100.0, 200.0)],
                right_eye: Vec::new(),
                nose: Vec::new(),
            }),
        };
        let signal = monitor.observe(&obs, at(0));
        assert_eq!(signal, AttentionSignal::SingleAttentive);
    }

    #[test]
    fn test_multi_face_resets_no_face_but_not_looking_away() {
        let mut monitor = AttentionMonitor::new();

        let tilted = FaceObservation {
            count: 1,
            landmarks: Some(tilted_landmarks()),
        };
        monitor.observe(&tilted, at(0));
        monitor.observe(&FaceObservation::absent(), at(1));

        let signal = monitor.observe(&FaceObservation::faces(3), at(2));
        assert_eq!(signal, AttentionSignal::MultiFace { count: 3 });
        assert_eq!(monitor.consecutive_no_face(), 0);
        assert_eq!(monitor.consecutive_looking_away(), 1);
    }
}
