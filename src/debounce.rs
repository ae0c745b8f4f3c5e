//! Violation debouncing
//!
//! Applies per-violation-kind temporal thresholds to the attention counters
//! and object observations, emitting discrete [`ViolationEvent`]s only when a
//! threshold is crossed. Events are edge-triggered: the counter that fired is
//! reset and must climb back to the threshold before the next event, so `k`
//! consecutive qualifying ticks produce exactly `floor(k / threshold_ticks)`
//! events.
//!
//! Multi-face and suspicious-object detections are intentionally not
//! debounced: multiplicity is rare and unambiguous, and object ticks are far
//! enough apart that each sighting is independently informative.

use crate::attention::AttentionMonitor;
use crate::config::EngineConfig;
use crate::types::{AttentionSignal, ObjectObservation, ViolationEvent, ViolationKind};
use chrono::{DateTime, Utc};

/// Edge-triggered violation detector for one session
#[derive(Debug)]
pub struct ViolationDebouncer {
    no_face_threshold_ticks: u32,
    focus_loss_threshold_ticks: u32,
    confidence_threshold: f64,
    /// Lowercased suspicious labels for case-insensitive matching
    suspicious_labels: Vec<String>,
    session_id: String,
}

impl ViolationDebouncer {
    pub fn new(config: &EngineConfig, session_id: String) -> Self {
        Self {
            no_face_threshold_ticks: config.no_face_threshold_ticks(),
            focus_loss_threshold_ticks: config.focus_loss_threshold_ticks(),
            confidence_threshold: config.confidence_threshold,
            suspicious_labels: config
                .suspicious_labels
                .iter()
                .map(|label| label.to_lowercase())
                .collect(),
            session_id,
        }
    }

    /// Threshold the attention counters for one face tick.
    ///
    /// At most one event per tick. On fire the corresponding counter is reset
    /// through the monitor so the event does not re-fire every subsequent
    /// tick.
    pub fn on_face_signal(
        &self,
        signal: AttentionSignal,
        monitor: &mut AttentionMonitor,
        now: DateTime<Utc>,
    ) -> Option<ViolationEvent> {
        match signal {
            AttentionSignal::NoFace => {
                if monitor.consecutive_no_face() >= self.no_face_threshold_ticks {
                    monitor.reset_no_face();
                    return Some(self.event(
                        ViolationKind::NoFace,
                        "No face detected for extended period".to_string(),
                        now,
                    ));
                }
                None
            }
            AttentionSignal::SingleInattentive => {
                if monitor.consecutive_looking_away() >= self.focus_loss_threshold_ticks {
                    monitor.reset_looking_away();
                    return Some(self.event(
                        ViolationKind::LookingAway,
                        "Looking away from camera for extended period".to_string(),
                        now,
                    ));
                }
                None
            }
            // Multiplicity is reported immediately, no debounce.
            AttentionSignal::MultiFace { count } => Some(self.event(
                ViolationKind::MultipleFaces,
                format!("{count} faces detected simultaneously"),
                now,
            )),
            AttentionSignal::SingleAttentive => None,
        }
    }

    /// Screen one object tick's observations.
    ///
    /// One event per object above the confidence cutoff whose label
    /// fuzzy-matches the suspicious set.
    pub fn on_objects(
        &self,
        objects: &[ObjectObservation],
        now: DateTime<Utc>,
    ) -> Vec<ViolationEvent> {
        objects
            .iter()
            .filter(|obj| obj.confidence > self.confidence_threshold)
            .filter(|obj| self.is_suspicious(&obj.label))
            .map(|obj| {
                let pct = (obj.confidence * 100.0).round() as u32;
                self.event(
                    ViolationKind::SuspiciousObject,
                    format!("{} detected ({pct}% confidence)", obj.label.to_lowercase()),
                    now,
                )
            })
            .collect()
    }

    /// Case-insensitive substring match in either direction
    fn is_suspicious(&self, label: &str) -> bool {
        let label = label.to_lowercase();
        self.suspicious_labels
            .iter()
            .any(|entry| label.contains(entry.as_str()) || entry.contains(label.as_str()))
    }

    fn event(&self, kind: ViolationKind, detail: String, now: DateTime<Utc>) -> ViolationEvent {
        ViolationEvent {
            timestamp: now,
            kind,
            detail,
            session_id: self.session_id.clone(),
        }
    }
}
