//! Skydive telemetry pipeline for FlySight-style GNSS logs.
//!
//! Raw `$GNSS` lines are parsed into samples, enriched with kinematics
//! relative to the previous sample, labeled with a flight phase and
//! collected into a [`Track`]. The freefall boundaries can be corrected
//! afterwards with a [`TrimAdjuster`].

pub mod config;
pub mod datasource;
pub mod detector;
pub mod error;
pub mod kinematics;
pub mod parser;
pub mod service;
pub mod track;
pub mod trim;
pub mod types;

#[cfg(test)]
mod fixtures;

pub use config::{Config, DetectionThresholds, TrimSettings};
pub use datasource::{Metric, TrackExport};
pub use detector::{PhaseDetector, Transition};
pub use error::{TrackError, TrackResult};
pub use service::{load_track, TrackService};
pub use track::{DetectedEvents, Track, TrackSummary};
pub use trim::{TrimAdjuster, TrimEdge, TrimOutcome};
pub use types::{FlightEvent, FlightPhase, GnssFix, Sample};
