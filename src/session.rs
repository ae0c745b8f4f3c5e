//! Session aggregate
//!
//! A [`Session`] owns everything for one monitored interview: the attention
//! state machine, the violation debouncer, the statistics aggregator, and the
//! append-only event log. All mutation happens through the tick entry points
//! and the control surface below, on a single logical thread of control; a
//! fresh session is a fresh value with no shared globals, so any number of
//! isolated sessions can run in parallel.
//!
//! The tick entry points are synchronous and take explicit timestamps, which
//! makes a session deterministically replayable from a scripted observation
//! sequence — no real clock involved.

use crate::attention::AttentionMonitor;
use crate::config::EngineConfig;
use crate::debounce::ViolationDebouncer;
use crate::error::EngineError;
use crate::report::Report;
use crate::stats::SessionStats;
use crate::types::{
    FaceObservation, ObjectObservation, SessionState, ViolationEvent, ViolationKind,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// One proctored session from start to stop
#[derive(Debug)]
pub struct Session {
    session_id: String,
    candidate_id: String,
    start_time: DateTime<Utc>,
    state: SessionState,
    config: EngineConfig,
    attention: AttentionMonitor,
    debouncer: ViolationDebouncer,
    stats: SessionStats,
    /// Append-only; never evicted while the session lives
    events: Vec<ViolationEvent>,
    /// Latest accepted tick timestamp, for monotonic tolerance
    last_tick_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Create and start a session.
    ///
    /// Validates the configuration up front; an invalid configuration never
    /// produces a half-working session.
    pub fn start(
        candidate_id: impl Into<String>,
        config: EngineConfig,
        now: DateTime<Utc>,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        let candidate_id = candidate_id.into();
        let session_id = Uuid::new_v4().to_string();
        let debouncer = ViolationDebouncer::new(&config, session_id.clone());

        let mut session = Self {
            session_id,
            candidate_id: candidate_id.clone(),
            start_time: now,
            state: SessionState::Running,
            config,
            attention: AttentionMonitor::new(),
            debouncer,
            stats: SessionStats::new(),
            events: Vec::new(),
            last_tick_at: None,
        };
        session.push_control(format!("Session started for candidate: {candidate_id}"), now);
        Ok(session)
    }

    /// Process one face-detection tick.
    ///
    /// Returns the events this tick emitted (already appended to the log and
    /// folded into the statistics). No-op while paused or stopped, or when
    /// `now` regresses.
    pub fn face_tick(&mut self, face: &FaceObservation, now: DateTime<Utc>) -> &[ViolationEvent] {
        let mark = self.events.len();
        if !self.accept_tick(now) {
            return &self.events[mark..];
        }

        let signal = self.attention.observe(face, now);
        if let Some(event) = self
            .debouncer
            .on_face_signal(signal, &mut self.attention, now)
        {
            self.stats.apply(&event);
            self.events.push(event);
        }
        &self.events[mark..]
    }

    /// Process one object-detection tick.
    ///
    /// May emit several events, one per qualifying object.
    pub fn object_tick(
        &mut self,
        objects: &[ObjectObservation],
        now: DateTime<Utc>,
    ) -> &[ViolationEvent] {
        let mark = self.events.len();
        if !self.accept_tick(now) {
            return &self.events[mark..];
        }

        for event in self.debouncer.on_objects(objects, now) {
            self.stats.apply(&event);
            self.events.push(event);
        }
        &self.events[mark..]
    }

    /// Recompute the session duration. No-op while paused or stopped.
    pub fn stats_tick(&mut self, now: DateTime<Utc>) {
        if !self.accept_tick(now) {
            return;
        }
        self.stats.set_duration(self.elapsed_seconds(now));
    }

    /// Pause the session; subsequent ticks are no-ops until resume
    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<(), EngineError> {
        if self.state != SessionState::Running {
            return Err(EngineError::InvalidTransition(format!(
                "cannot pause a {:?} session",
                self.state
            )));
        }
        self.state = SessionState::Paused;
        self.push_control("Session paused".to_string(), now);
        Ok(())
    }

    /// Resume a paused session
    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<(), EngineError> {
        if self.state != SessionState::Paused {
            return Err(EngineError::InvalidTransition(format!(
                "cannot resume a {:?} session",
                self.state
            )));
        }
        self.state = SessionState::Running;
        self.push_control("Session resumed".to_string(), now);
        Ok(())
    }

    /// Stop the session: freeze the duration, compute the final score, and
    /// return the final report. Further ticks are no-ops.
    pub fn stop(&mut self, now: DateTime<Utc>) -> Result<Report, EngineError> {
        if self.state == SessionState::Stopped {
            return Err(EngineError::InvalidTransition(
                "session already stopped".to_string(),
            ));
        }
        self.stats.set_duration(self.elapsed_seconds(now));
        self.push_control("Session stopped".to_string(), now);
        self.state = SessionState::Stopped;
        Ok(self.build_report(now))
    }

    /// Partial report over the current state; no side effects
    pub fn snapshot(&self, now: DateTime<Utc>) -> Report {
        self.build_report(now)
    }

    pub fn id(&self) -> &str {
        &self.session_id
    }

    pub fn candidate_id(&self) -> &str {
        &self.candidate_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Timestamp of the last attentive face tick, if any
    pub fn last_attentive_at(&self) -> Option<DateTime<Utc>> {
        self.attention.last_attentive_at()
    }

    /// The full chronological event log
    pub fn events(&self) -> &[ViolationEvent] {
        &self.events
    }

    /// Gate every tick: the session must be running and `now` must not
    /// regress below the latest accepted tick (clock skew and system sleep
    /// degrade to an under-counted tick, never a negative duration).
    fn accept_tick(&mut self, now: DateTime<Utc>) -> bool {
        if self.state != SessionState::Running {
            return false;
        }
        if let Some(last) = self.last_tick_at {
            if now < last {
                return false;
            }
        }
        self.last_tick_at = Some(now);
        true
    }

    fn elapsed_seconds(&self, now: DateTime<Utc>) -> u64 {
        (now - self.start_time).num_seconds().max(0) as u64
    }

    fn push_control(&mut self, detail: String, now: DateTime<Utc>) {
        let event = ViolationEvent {
            timestamp: now,
            kind: ViolationKind::SessionControl,
            detail,
            session_id: self.session_id.clone(),
        };
        self.stats.apply(&event);
        self.events.push(event);
    }

    fn build_report(&self, generated_at: DateTime<Utc>) -> Report {
        Report::build(
            &self.session_id,
            &self.candidate_id,
            self.start_time,
            &self.stats,
            &self.events,
            generated_at,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::ScoreBand;
    use crate::types::BoundingBox;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn start_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 14, 0, 0).unwrap()
    }

    fn tick_time(i: u32, interval_ms: u64) -> DateTime<Utc> {
        start_at() + Duration::milliseconds((i as i64 + 1) * interval_ms as i64)
    }

    fn session() -> Session {
        Session::start("alice", EngineConfig::default(), start_at()).unwrap()
    }

    fn object(label: &str, confidence: f64) -> ObjectObservation {
        ObjectObservation {
            label: label.to_string(),
            confidence,
            bbox: BoundingBox::default(),
        }
    }

    fn violation_events(session: &Session) -> Vec<&ViolationEvent> {
        session
            .events()
            .iter()
            .filter(|e| e.kind != ViolationKind::SessionControl)
            .collect()
    }

    #[test]
    fn test_start_validates_config() {
        let config = EngineConfig {
            face_interval_ms: 0,
            ..Default::default()
        };
        assert!(Session::start("alice", config, start_at()).is_err());
    }

    #[test]
    fn test_start_logs_control_event() {
        let session = session();
        assert_eq!(session.events().len(), 1);
        assert_eq!(session.events()[0].kind, ViolationKind::SessionControl);
        assert_eq!(
            session.events()[0].detail,
            "Session started for candidate: alice"
        );
        assert_eq!(session.stats().integrity_score, 100);
    }

    #[test]
    fn test_scenario_21_no_face_ticks() {
        // 21 consecutive no-face ticks at 500ms; threshold 10s = 20 ticks
        let mut session = session();
        for i in 0..21 {
            session.face_tick(&FaceObservation::absent(), tick_time(i, 500));
        }
        let report = session.stop(tick_time(21, 500)).unwrap();

        assert_eq!(violation_events(&session).len(), 1);
        assert_eq!(report.stats.no_face_events, 1);
        assert_eq!(report.stats.focus_loss_events, 1);
        assert_eq!(report.integrity_score, 87);
    }

    #[test]
    fn test_scenario_suspicious_cell_phone() {
        let mut session = session();
        session.object_tick(&[object("Cell Phone", 0.92)], tick_time(0, 2000));
        let report = session.stop(tick_time(1, 2000)).unwrap();

        assert_eq!(report.stats.suspicious_items, 1);
        assert_eq!(report.integrity_score, 90);
        let events = violation_events(&session);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].detail, "cell phone detected (92% confidence)");
    }

    #[test]
    fn test_scenario_three_faces_immediate() {
        let mut session = session();
        let emitted = session
            .face_tick(&FaceObservation::faces(3), tick_time(0, 500))
            .to_vec();

        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].kind, ViolationKind::MultipleFaces);

        let report = session.stop(tick_time(1, 500)).unwrap();
        assert_eq!(report.stats.multiple_face_events, 1);
        assert_eq!(report.integrity_score, 85);
    }

    #[test]
    fn test_scenario_empty_session() {
        let mut session = session();
        let report = session.stop(start_at()).unwrap();

        assert_eq!(report.duration_seconds, 0);
        assert_eq!(report.stats.focus_loss_events, 0);
        assert_eq!(report.stats.suspicious_items, 0);
        assert_eq!(report.stats.multiple_face_events, 0);
        assert_eq!(report.stats.no_face_events, 0);
        assert_eq!(report.integrity_score, 100);
        assert_eq!(report.band, ScoreBand::Excellent);
        assert_eq!(report.recommendations.len(), 1);
    }

    #[test]
    fn test_paused_ticks_are_noops() {
        let mut session = session();
        session.pause(tick_time(0, 500)).unwrap();

        for i in 1..40 {
            session.face_tick(&FaceObservation::absent(), tick_time(i, 500));
            session.object_tick(&[object("phone", 0.9)], tick_time(i, 500));
        }
        session.stats_tick(tick_time(40, 500));

        assert!(violation_events(&session).is_empty());
        assert_eq!(session.stats().duration_seconds, 0);

        session.resume(tick_time(41, 500)).unwrap();
        session.object_tick(&[object("phone", 0.9)], tick_time(42, 500));
        assert_eq!(violation_events(&session).len(), 1);
    }

    #[test]
    fn test_pause_resets_nothing_but_gates_counters() {
        // Debounce counters survive a pause; they are only advanced by ticks.
        let config = EngineConfig::default();
        let threshold = config.no_face_threshold_ticks();
        let mut session = Session::start("alice", config, start_at()).unwrap();

        for i in 0..threshold - 1 {
            session.face_tick(&FaceObservation::absent(), tick_time(i, 500));
        }
        session.pause(tick_time(threshold, 500)).unwrap();
        session.resume(tick_time(threshold + 1, 500)).unwrap();

        let emitted = session
            .face_tick(&FaceObservation::absent(), tick_time(threshold + 2, 500))
            .to_vec();
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].kind, ViolationKind::NoFace);
    }

    #[test]
    fn test_invalid_transitions() {
        let mut session = session();
        assert!(session.resume(start_at()).is_err());

        session.pause(start_at()).unwrap();
        assert!(session.pause(start_at()).is_err());

        session.resume(start_at()).unwrap();
        session.stop(start_at()).unwrap();
        assert!(session.stop(start_at()).is_err());
        assert!(session.pause(start_at()).is_err());
    }

    #[test]
    fn test_ticks_after_stop_are_noops() {
        let mut session = session();
        session.stop(tick_time(0, 500)).unwrap();

        session.face_tick(&FaceObservation::faces(4), tick_time(1, 500));
        session.object_tick(&[object("phone", 0.99)], tick_time(2, 500));
        session.stats_tick(tick_time(100, 500));

        assert!(violation_events(&session).is_empty());
        assert_eq!(session.stats().duration_seconds, 0);
    }

    #[test]
    fn test_regressed_timestamp_is_noop() {
        let mut session = session();
        session.face_tick(&FaceObservation::faces(3), tick_time(10, 500));
        assert_eq!(violation_events(&session).len(), 1);

        // Clock jumps backwards: tick must not mutate anything
        let emitted = session
            .face_tick(&FaceObservation::faces(3), tick_time(2, 500))
            .to_vec();
        assert!(emitted.is_empty());
        assert_eq!(violation_events(&session).len(), 1);
    }

    #[test]
    fn test_log_timestamps_non_decreasing_across_interleavings() {
        let mut session = session();

        for i in 0..30 {
            session.face_tick(&FaceObservation::faces(2), tick_time(i * 2, 250));
            if i % 4 == 0 {
                session.object_tick(&[object("book", 0.8)], tick_time(i * 2 + 1, 250));
            }
        }
        session.stop(tick_time(100, 250)).unwrap();

        let timestamps: Vec<_> = session.events().iter().map(|e| e.timestamp).collect();
        assert!(timestamps.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn test_duration_includes_pause_gap_after_resume() {
        let mut session = session();
        session.stats_tick(start_at() + Duration::seconds(10));
        assert_eq!(session.stats().duration_seconds, 10);

        session.pause(start_at() + Duration::seconds(11)).unwrap();
        session.resume(start_at() + Duration::seconds(60)).unwrap();
        session.stats_tick(start_at() + Duration::seconds(61));
        assert_eq!(session.stats().duration_seconds, 61);
    }

    #[test]
    fn test_snapshot_has_no_side_effects() {
        let mut session = session();
        session.face_tick(&FaceObservation::faces(3), tick_time(0, 500));

        let at = tick_time(5, 500);
        let first = session.snapshot(at);
        let second = session.snapshot(at);
        assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
        assert_eq!(session.state(), SessionState::Running);

        // Snapshot and final report agree on everything already observed
        let final_report = session.stop(at).unwrap();
        assert_eq!(final_report.stats.multiple_face_events, 1);
    }

    #[test]
    fn test_sessions_are_isolated() {
        let mut a = session();
        let mut b = Session::start("bob", EngineConfig::default(), start_at()).unwrap();

        a.face_tick(&FaceObservation::faces(2), tick_time(0, 500));
        assert_eq!(a.stats().multiple_face_events, 1);
        assert_eq!(b.stats().multiple_face_events, 0);
        assert_ne!(a.id(), b.id());

        b.object_tick(&[object("laptop", 0.9)], tick_time(0, 2000));
        assert_eq!(a.stats().suspicious_items, 0);
        assert_eq!(b.stats().suspicious_items, 1);
    }

    #[test]
    fn test_report_reconstructible_from_parts() {
        let mut session = session();
        session.face_tick(&FaceObservation::faces(2), tick_time(0, 500));
        let at = tick_time(1, 500);

        let rebuilt = Report::build(
            session.id(),
            session.candidate_id(),
            session.started_at(),
            session.stats(),
            session.events(),
            at,
        );
        assert_eq!(rebuilt, session.snapshot(at));
    }
}
