//! Vigil - Temporal violation detection and integrity scoring for proctored sessions
//!
//! Vigil turns noisy, high-frequency perception signals (face presence, a
//! gaze-angle proxy, object-class detections) into a trustworthy record of
//! integrity violations and a single composite score, through a deterministic
//! pipeline: attention classification → violation debouncing → statistics
//! aggregation → integrity scoring → report assembly.
//!
//! ## Modules
//!
//! - **Session core**: deterministic, replayable tick processing over one
//!   [`session::Session`]
//! - **Runtime**: tokio-based periodic scheduler driving a session from a
//!   live [`runtime::Detector`]

pub mod attention;
pub mod config;
pub mod debounce;
pub mod error;
pub mod report;
pub mod runtime;
pub mod score;
pub mod session;
pub mod stats;
pub mod types;

pub use config::EngineConfig;
pub use error::EngineError;
pub use report::Report;
pub use runtime::{Detector, SessionRunner};
pub use score::ScoreBand;
pub use session::Session;
pub use stats::SessionStats;
pub use types::{
    AttentionSignal, FaceObservation, ObjectObservation, ViolationEvent, ViolationKind,
};

/// Engine version embedded in all reports
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for report provenance
pub const PRODUCER_NAME: &str = "vigil";
