//! Async session runtime
//!
//! Drives a [`Session`] from a live [`Detector`]: three independent periodic
//! tasks (face tick, object tick, stats tick) run off tokio intervals and are
//! cancelled together through one [`CancellationToken`]. Every mutation
//! funnels through a single `Arc<Mutex<Session>>`, so shared state has one
//! logical writer ordered by tick completion.
//!
//! Pausing is observed at the start of a tick; a detector result that lands
//! after the session left the running state is discarded rather than applied,
//! so stale observations never corrupt the debounce counters. Detector
//! failures and timeouts degrade to a skipped tick with a diagnostic log
//! line — they are never recorded as violations.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use log::{info, warn};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::error::EngineError;
use crate::report::Report;
use crate::session::Session;
use crate::types::{FaceObservation, ObjectObservation, SessionState};

/// Upper bound on a single detector call; a slower call skips the tick
const DETECTOR_TIMEOUT: Duration = Duration::from_secs(10);

/// Seconds without an attentive face before a diagnostic warning is logged
const ATTENTION_ALERT_SECS: i64 = 30;

/// The perception boundary: face and object detectors consumed as black
/// boxes at the engine's chosen cadence.
pub trait Detector: Send + Sync {
    /// Detect faces in the current frame
    fn detect_face(
        &self,
    ) -> impl Future<Output = Result<FaceObservation, EngineError>> + Send;

    /// Detect objects in the current frame
    fn detect_objects(
        &self,
    ) -> impl Future<Output = Result<Vec<ObjectObservation>, EngineError>> + Send;
}

/// Handle over a running session and its periodic detection tasks
pub struct SessionRunner {
    session: Arc<Mutex<Session>>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl SessionRunner {
    /// Spawn the periodic tasks for an already started session.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<D: Detector + 'static>(session: Session, detector: Arc<D>) -> Self {
        let config = session.config().clone();
        let session = Arc::new(Mutex::new(session));
        let cancel = CancellationToken::new();

        let tasks = vec![
            tokio::spawn(face_loop(
                session.clone(),
                detector.clone(),
                cancel.clone(),
                config.face_interval_ms,
            )),
            tokio::spawn(object_loop(
                session.clone(),
                detector,
                cancel.clone(),
                config.object_interval_ms,
            )),
            tokio::spawn(stats_loop(
                session.clone(),
                cancel.clone(),
                config.stats_interval_ms,
            )),
        ];

        Self {
            session,
            cancel,
            tasks,
        }
    }

    /// Pause the session; periodic tasks keep running but observe the paused
    /// state at the start of each tick and skip it.
    pub async fn pause(&self) -> Result<(), EngineError> {
        self.session.lock().await.pause(Utc::now())
    }

    /// Resume a paused session
    pub async fn resume(&self) -> Result<(), EngineError> {
        self.session.lock().await.resume(Utc::now())
    }

    /// Partial report over the current state
    pub async fn snapshot(&self) -> Report {
        self.session.lock().await.snapshot(Utc::now())
    }

    /// Stop the session: halt all periodic tasks first, then finalize the
    /// duration and score. Ordering matters — a task still running could
    /// otherwise append a post-stop event with a stale duration.
    pub async fn stop(self) -> Result<Report, EngineError> {
        self.cancel.cancel();
        for task in self.tasks {
            let _ = task.await;
        }
        self.session.lock().await.stop(Utc::now())
    }
}

async fn face_loop<D: Detector>(
    session: Arc<Mutex<Session>>,
    detector: Arc<D>,
    cancel: CancellationToken,
    interval_ms: u64,
) {
    let mut ticker = interval(Duration::from_millis(interval_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if session.lock().await.state() != SessionState::Running {
                    continue;
                }

                match timeout(DETECTOR_TIMEOUT, detector.detect_face()).await {
                    Ok(Ok(observation)) => {
                        let mut guard = session.lock().await;
                        if guard.state() != SessionState::Running {
                            // The session paused or stopped while the call was
                            // in flight: discard the stale observation.
                            continue;
                        }
                        for event in guard.face_tick(&observation, Utc::now()) {
                            info!("{}: {}", event.kind.as_str(), event.detail);
                        }
                    }
                    Ok(Err(err)) => warn!("face detection failed, skipping tick: {err}"),
                    Err(_) => warn!(
                        "face detection timed out (> {}s), skipping tick",
                        DETECTOR_TIMEOUT.as_secs()
                    ),
                }
            }
            _ = cancel.cancelled() => break,
        }
    }
}

async fn object_loop<D: Detector>(
    session: Arc<Mutex<Session>>,
    detector: Arc<D>,
    cancel: CancellationToken,
    interval_ms: u64,
) {
    let mut ticker = interval(Duration::from_millis(interval_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if session.lock().await.state() != SessionState::Running {
                    continue;
                }

                match timeout(DETECTOR_TIMEOUT, detector.detect_objects()).await {
                    Ok(Ok(observations)) => {
                        let mut guard = session.lock().await;
                        if guard.state() != SessionState::Running {
                            continue;
                        }
                        for event in guard.object_tick(&observations, Utc::now()) {
                            info!("{}: {}", event.kind.as_str(), event.detail);
                        }
                    }
                    Ok(Err(err)) => warn!("object detection failed, skipping tick: {err}"),
                    Err(_) => warn!(
                        "object detection timed out (> {}s), skipping tick",
                        DETECTOR_TIMEOUT.as_secs()
                    ),
                }
            }
            _ = cancel.cancelled() => break,
        }
    }
}

async fn stats_loop(
    session: Arc<Mutex<Session>>,
    cancel: CancellationToken,
    interval_ms: u64,
) {
    let mut ticker = interval(Duration::from_millis(interval_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let mut guard = session.lock().await;
                let now = Utc::now();
                guard.stats_tick(now);

                // Diagnostic only; sustained inattention becomes a violation
                // through the debounced face path, never from here.
                if guard.state() == SessionState::Running {
                    let last = guard.last_attentive_at().unwrap_or(guard.started_at());
                    let stale_secs = (now - last).num_seconds();
                    if stale_secs > ATTENTION_ALERT_SECS {
                        warn!("no attentive face observed for {stale_secs}s");
                    }
                }
            }
            _ = cancel.cancelled() => break,
        }
    }
}
