//! Integrity scoring
//!
//! A pure function from aggregated session statistics to a 0-100 score, plus
//! the interpretation bands used in reports. Deterministic and idempotent
//! given identical stats; recomputed from the counters on every read so there
//! is no incremental drift.

use crate::stats::SessionStats;
use serde::{Deserialize, Serialize};

/// Points deducted per focus-loss event
const FOCUS_LOSS_PENALTY: i64 = 5;
/// Points deducted per suspicious item
const SUSPICIOUS_ITEM_PENALTY: i64 = 10;
/// Points deducted per multiple-face event
const MULTIPLE_FACE_PENALTY: i64 = 15;
/// Points deducted per no-face event
const NO_FACE_PENALTY: i64 = 8;
/// Extra deduction when the violation rate is high
const HIGH_RATE_PENALTY: i64 = 10;
/// Violations per minute above which the rate penalty applies
const HIGH_RATE_PER_MINUTE: f64 = 2.0;

/// Compute the integrity score from aggregated statistics.
///
/// Clamped to [0, 100]. Monotonically non-increasing in every violation
/// counter.
pub fn integrity_score(stats: &SessionStats) -> u32 {
    let mut score: i64 = 100;

    score -= i64::from(stats.focus_loss_events) * FOCUS_LOSS_PENALTY;
    score -= i64::from(stats.suspicious_items) * SUSPICIOUS_ITEM_PENALTY;
    score -= i64::from(stats.multiple_face_events) * MULTIPLE_FACE_PENALTY;
    score -= i64::from(stats.no_face_events) * NO_FACE_PENALTY;

    let duration_minutes = stats.duration_seconds.div_ceil(60);
    if duration_minutes > 0 {
        let violation_rate = f64::from(stats.focus_loss_events + stats.suspicious_items)
            / duration_minutes as f64;
        if violation_rate > HIGH_RATE_PER_MINUTE {
            score -= HIGH_RATE_PENALTY;
        }
    }

    score.clamp(0, 100) as u32
}

/// Interpretation band for an integrity score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
}

impl ScoreBand {
    pub fn from_score(score: u32) -> Self {
        match score {
            90..=u32::MAX => ScoreBand::Excellent,
            80..=89 => ScoreBand::Good,
            70..=79 => ScoreBand::Fair,
            60..=69 => ScoreBand::Poor,
            _ => ScoreBand::Critical,
        }
    }

    pub fn interpretation(&self) -> &'static str {
        match self {
            ScoreBand::Excellent => "Excellent - No major concerns",
            ScoreBand::Good => "Good - Minor issues detected",
            ScoreBand::Fair => "Fair - Some concerns present",
            ScoreBand::Poor => "Poor - Multiple violations detected",
            ScoreBand::Critical => "Critical - Major integrity concerns",
        }
    }
}
