//! Core types for the Vigil engine
//!
//! This module defines the data structures that flow through each stage of the
//! engine: detector observations, attention signals, violation events, and
//! session lifecycle state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A 2D point in detector image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Facial landmark sets for the primary detected face.
///
/// Each set holds the raw landmark points reported by the face detector.
/// Sets may be empty when the detector could not resolve that region.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FaceLandmarks {
    /// Left eye landmark points
    #[serde(default)]
    pub left_eye: Vec<Point2D>,
    /// Right eye landmark points
    #[serde(default)]
    pub right_eye: Vec<Point2D>,
    /// Nose landmark points
    #[serde(default)]
    pub nose: Vec<Point2D>,
}

/// One face-detection tick's output from the detector adapter.
///
/// Ephemeral: consumed by the tick that receives it, never retained past the
/// derived counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceObservation {
    /// Number of faces in the frame
    pub count: u32,
    /// Landmarks for the primary face, when the detector provides them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmarks: Option<FaceLandmarks>,
}

impl FaceObservation {
    /// Observation with no faces in frame
    pub fn absent() -> Self {
        Self {
            count: 0,
            landmarks: None,
        }
    }

    /// Observation with `count` faces and no landmark data
    pub fn faces(count: u32) -> Self {
        Self {
            count,
            landmarks: None,
        }
    }
}

/// Axis-aligned bounding box in detector image coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One detected object from an object-detection tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectObservation {
    /// Free-text class label from the detector
    pub label: String,
    /// Detector confidence (0-1)
    pub confidence: f64,
    /// Location of the object in the frame
    #[serde(default)]
    pub bbox: BoundingBox,
}

/// Per-tick attentiveness classification of a face observation.
///
/// Exactly one variant holds per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttentionSignal {
    /// No face in frame
    NoFace,
    /// Single face, gaze within tolerance
    SingleAttentive,
    /// Single face, gaze deviation above tolerance
    SingleInattentive,
    /// More than one face in frame
    MultiFace { count: u32 },
}

/// Violation event categories.
///
/// Tags match the event-type vocabulary used in rendered reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationKind {
    NoFace,
    LookingAway,
    MultipleFaces,
    SuspiciousObject,
    /// Session lifecycle marker (start/pause/resume/stop); updates no counters
    SessionControl,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::NoFace => "NO_FACE",
            ViolationKind::LookingAway => "LOOKING_AWAY",
            ViolationKind::MultipleFaces => "MULTIPLE_FACES",
            ViolationKind::SuspiciousObject => "SUSPICIOUS_OBJECT",
            ViolationKind::SessionControl => "SESSION_CONTROL",
        }
    }
}

/// A discrete, debounced violation event.
///
/// Immutable after creation: appended to the session event log exactly once
/// and never mutated or deleted for the session lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViolationEvent {
    /// Timestamp of the tick that produced the event
    pub timestamp: DateTime<Utc>,
    /// Event category
    pub kind: ViolationKind,
    /// Human-readable description
    pub detail: String,
    /// Owning session
    pub session_id: String,
}

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Running,
    Paused,
    Stopped,
}
