//! Report assembly
//!
//! Builds the serializable summary document for a session: header, final
//! score with interpretation band, per-kind counts, chronological timeline,
//! and rule-based recommendations. Building has no side effects on session
//! state and is fully reconstructible from `{stats, event log, session id,
//! start time}` alone; timeline entries carry elapsed time since session
//! start rather than wall-clock, so reports are portable.

use crate::score::ScoreBand;
use crate::stats::SessionStats;
use crate::types::{ViolationEvent, ViolationKind};
use crate::{ENGINE_VERSION, PRODUCER_NAME};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity class attached to timeline entries and recommendations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Good,
    Info,
    Warning,
    Danger,
}

impl ViolationKind {
    fn severity(&self) -> Severity {
        match self {
            ViolationKind::NoFace
            | ViolationKind::MultipleFaces
            | ViolationKind::SuspiciousObject => Severity::Danger,
            ViolationKind::LookingAway => Severity::Warning,
            ViolationKind::SessionControl => Severity::Info,
        }
    }
}

/// Engine identification embedded in every report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
}

/// One rendered event in the report timeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// Elapsed time since session start, `HH:MM:SS`
    pub elapsed: String,
    pub kind: ViolationKind,
    pub severity: Severity,
    pub detail: String,
}

/// One rule-based recommendation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub severity: Severity,
    pub message: String,
}

/// Session summary report, suitable for JSON or downstream HTML rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub producer: ReportProducer,
    pub session_id: String,
    pub candidate_id: String,
    pub started_at: DateTime<Utc>,
    pub generated_at: DateTime<Utc>,
    pub duration_seconds: u64,
    pub integrity_score: u32,
    pub band: ScoreBand,
    pub interpretation: String,
    pub stats: SessionStats,
    pub timeline: Vec<TimelineEntry>,
    pub recommendations: Vec<Recommendation>,
}

impl Report {
    /// Assemble a report from session state.
    ///
    /// `generated_at` is caller-supplied so replayed sessions produce
    /// deterministic output; it is the only field that varies between two
    /// builds over unchanged state.
    pub fn build(
        session_id: &str,
        candidate_id: &str,
        started_at: DateTime<Utc>,
        stats: &SessionStats,
        events: &[ViolationEvent],
        generated_at: DateTime<Utc>,
    ) -> Self {
        let band = ScoreBand::from_score(stats.integrity_score);

        let timeline = events
            .iter()
            .map(|event| TimelineEntry {
                elapsed: format_elapsed(started_at, event.timestamp),
                kind: event.kind,
                severity: event.kind.severity(),
                detail: event.detail.clone(),
            })
            .collect();

        Self {
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: ENGINE_VERSION.to_string(),
            },
            session_id: session_id.to_string(),
            candidate_id: candidate_id.to_string(),
            started_at,
            generated_at,
            duration_seconds: stats.duration_seconds,
            integrity_score: stats.integrity_score,
            band,
            interpretation: band.interpretation().to_string(),
            stats: stats.clone(),
            timeline,
            recommendations: recommendations(stats),
        }
    }

    /// Serialize to compact JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Render as plain text for terminal output
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        out.push_str("Proctoring Session Report\n");
        out.push_str("=========================\n");
        out.push_str(&format!("Session:   {}\n", self.session_id));
        out.push_str(&format!("Candidate: {}\n", self.candidate_id));
        out.push_str(&format!("Generated: {}\n", self.generated_at.to_rfc3339()));
        out.push_str(&format!(
            "Duration:  {}\n",
            format_duration(self.duration_seconds)
        ));
        out.push('\n');
        out.push_str(&format!(
            "Integrity score: {} ({})\n",
            self.integrity_score, self.interpretation
        ));
        out.push('\n');
        out.push_str("Violations:\n");
        out.push_str(&format!(
            "  Focus loss events:    {}\n",
            self.stats.focus_loss_events
        ));
        out.push_str(&format!(
            "  Suspicious items:     {}\n",
            self.stats.suspicious_items
        ));
        out.push_str(&format!(
            "  Multiple face events: {}\n",
            self.stats.multiple_face_events
        ));
        out.push_str(&format!(
            "  No face events:       {}\n",
            self.stats.no_face_events
        ));

        if !self.timeline.is_empty() {
            out.push('\n');
            out.push_str("Timeline:\n");
            for entry in &self.timeline {
                out.push_str(&format!(
                    "  {}  {:<18} {}\n",
                    entry.elapsed,
                    entry.kind.as_str(),
                    entry.detail
                ));
            }
        }

        out.push('\n');
        out.push_str("Recommendations:\n");
        for rec in &self.recommendations {
            out.push_str(&format!("  - {}\n", rec.message));
        }

        out
    }
}

/// Rule-based recommendations from the aggregated statistics
fn recommendations(stats: &SessionStats) -> Vec<Recommendation> {
    if stats.integrity_score >= 90 {
        return vec![Recommendation {
            severity: Severity::Good,
            message: "Excellent proctoring results. No major concerns detected.".to_string(),
        }];
    }

    let mut recs = Vec::new();
    if stats.focus_loss_events > 3 {
        recs.push(Recommendation {
            severity: Severity::Warning,
            message: "Multiple focus loss events detected. Consider reviewing attention monitoring protocols.".to_string(),
        });
    }
    if stats.suspicious_items > 0 {
        recs.push(Recommendation {
            severity: Severity::Danger,
            message: "Suspicious items detected. Manual review recommended.".to_string(),
        });
    }
    if stats.multiple_face_events > 0 {
        recs.push(Recommendation {
            severity: Severity::Danger,
            message: "Multiple faces detected. Verify candidate identity and environment."
                .to_string(),
        });
    }
    if stats.integrity_score < 70 {
        recs.push(Recommendation {
            severity: Severity::Danger,
            message: "Low integrity score. Consider additional verification or re-examination."
                .to_string(),
        });
    }
    recs
}

/// `HH:MM:SS` elapsed time between session start and an event timestamp
fn format_elapsed(started_at: DateTime<Utc>, timestamp: DateTime<Utc>) -> String {
    let elapsed = (timestamp - started_at).num_seconds().max(0);
    let hours = elapsed / 3600;
    let minutes = (elapsed % 3600) / 60;
    let seconds = elapsed % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// `XhYmZs` duration used in the text rendering
fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{hours}h {minutes}m {secs}s")
}
