//! Engine configuration
//!
//! All knobs are externally supplied: detector poll intervals, debounce
//! thresholds, the object-confidence cutoff, and the suspicious-label set.
//! Validation fails fast at session construction; the engine never silently
//! clamps a threshold to zero.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};

/// Default face-detection poll interval (ms)
pub const DEFAULT_FACE_INTERVAL_MS: u64 = 500;
/// Default object-detection poll interval (ms)
pub const DEFAULT_OBJECT_INTERVAL_MS: u64 = 2_000;
/// Default statistics/duration tick interval (ms)
pub const DEFAULT_STATS_INTERVAL_MS: u64 = 1_000;
/// Default sustained looking-away threshold (ms)
pub const DEFAULT_FOCUS_LOSS_THRESHOLD_MS: u64 = 5_000;
/// Default sustained no-face threshold (ms)
pub const DEFAULT_NO_FACE_THRESHOLD_MS: u64 = 10_000;
/// Default object-detection confidence cutoff
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.6;

fn default_suspicious_labels() -> Vec<String> {
    ["phone", "book", "laptop", "person", "cup"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Face-detection poll interval (ms)
    pub face_interval_ms: u64,
    /// Object-detection poll interval (ms)
    pub object_interval_ms: u64,
    /// Statistics/duration tick interval (ms)
    pub stats_interval_ms: u64,
    /// Wall-clock threshold for a sustained looking-away violation (ms)
    pub focus_loss_threshold_ms: u64,
    /// Wall-clock threshold for a sustained no-face violation (ms)
    pub no_face_threshold_ms: u64,
    /// Minimum object confidence for a suspicious-object violation (0-1)
    pub confidence_threshold: f64,
    /// Labels that count as suspicious, matched case-insensitively as
    /// substrings in either direction
    pub suspicious_labels: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            face_interval_ms: DEFAULT_FACE_INTERVAL_MS,
            object_interval_ms: DEFAULT_OBJECT_INTERVAL_MS,
            stats_interval_ms: DEFAULT_STATS_INTERVAL_MS,
            focus_loss_threshold_ms: DEFAULT_FOCUS_LOSS_THRESHOLD_MS,
            no_face_threshold_ms: DEFAULT_NO_FACE_THRESHOLD_MS,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            suspicious_labels: default_suspicious_labels(),
        }
    }
}

impl EngineConfig {
    /// Validate the configuration.
    ///
    /// Rejects non-positive intervals, thresholds shorter than one face tick
    /// (which would fire on every tick), an out-of-range confidence cutoff,
    /// and an empty suspicious-label set.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.face_interval_ms == 0 {
            return Err(EngineError::InvalidConfig(
                "face_interval_ms must be positive".to_string(),
            ));
        }
        if self.object_interval_ms == 0 {
            return Err(EngineError::InvalidConfig(
                "object_interval_ms must be positive".to_string(),
            ));
        }
        if self.stats_interval_ms == 0 {
            return Err(EngineError::InvalidConfig(
                "stats_interval_ms must be positive".to_string(),
            ));
        }
        if self.no_face_threshold_ms < self.face_interval_ms {
            return Err(EngineError::InvalidConfig(format!(
                "no_face_threshold_ms ({}) is shorter than one face tick ({}ms)",
                self.no_face_threshold_ms, self.face_interval_ms
            )));
        }
        if self.focus_loss_threshold_ms < self.face_interval_ms {
            return Err(EngineError::InvalidConfig(format!(
                "focus_loss_threshold_ms ({}) is shorter than one face tick ({}ms)",
                self.focus_loss_threshold_ms, self.face_interval_ms
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(EngineError::InvalidConfig(format!(
                "confidence_threshold must be within [0, 1], got {}",
                self.confidence_threshold
            )));
        }
        if self.suspicious_labels.is_empty() {
            return Err(EngineError::InvalidConfig(
                "suspicious_labels must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// No-face threshold expressed in face ticks.
    ///
    /// `ceil(threshold_ms / interval_ms)`, so debounce behavior is invariant
    /// to polling-frequency changes.
    pub fn no_face_threshold_ticks(&self) -> u32 {
        Self::ticks(self.no_face_threshold_ms, self.face_interval_ms)
    }

    /// Looking-away threshold expressed in face ticks
    pub fn focus_loss_threshold_ticks(&self) -> u32 {
        Self::ticks(self.focus_loss_threshold_ms, self.face_interval_ms)
    }

    fn ticks(threshold_ms: u64, interval_ms: u64) -> u32 {
        threshold_ms.div_ceil(interval_ms) as u32
    }
}
