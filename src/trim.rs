//! Manual correction of the freefall boundaries
//!
//! A trim moves the start or the end of the freefall segment by a signed
//! number of seconds. Growing pulls samples of the adjacent phase into
//! freefall, shrinking pushes freefall samples out to it. Only phase
//! labels change; kinematics keep the references they were computed with.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::config::TrimSettings;
use crate::error::{TrackError, TrackResult};
use crate::track::Track;
use crate::types::FlightPhase;

/// Which freefall boundary to move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrimEdge {
    /// Exit side; the neighbour phase is Aircraft
    Start,
    /// Pitch side; the neighbour phase is Canopy
    End,
}

impl TrimEdge {
    fn neighbour(&self) -> FlightPhase {
        match self {
            TrimEdge::Start => FlightPhase::Aircraft,
            TrimEdge::End => FlightPhase::Canopy,
        }
    }

    /// Positive delta moves the boundary later in time
    fn shrinks(&self, delta_seconds: f64) -> bool {
        match self {
            TrimEdge::Start => delta_seconds > 0.0,
            TrimEdge::End => delta_seconds < 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrimOutcome {
    pub relabeled: usize,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
}

pub struct TrimAdjuster {
    min_freefall_seconds: f64,
}

impl TrimAdjuster {
    pub fn new(settings: &TrimSettings) -> Self {
        Self {
            min_freefall_seconds: settings.min_freefall_seconds,
        }
    }

    /// Move one freefall boundary by `delta_seconds`.
    ///
    /// Refuses with `NoFreefall` when the track has no freefall sample and
    /// with `GuardRefused` when shrinking a freefall already shorter than the
    /// configured minimum or when the moved boundary falls outside the
    /// representable time range. The track is untouched on error.
    pub fn adjust(
        &self,
        track: &mut Track,
        edge: TrimEdge,
        delta_seconds: f64,
    ) -> TrackResult<TrimOutcome> {
        if !delta_seconds.is_finite() {
            return Err(TrackError::GuardRefused(format!(
                "trim delta must be finite, got {}",
                delta_seconds
            )));
        }

        let Some((first, last)) = track.freefall_bounds() else {
            log::warn!("Cannot trim {:?}: track has no freefall samples", edge);
            return Err(TrackError::NoFreefall);
        };

        let reference = match edge {
            TrimEdge::Start => track.samples()[first].time(),
            TrimEdge::End => track.samples()[last].time(),
        };
        let Some((window_start, window_end)) = trim_window(reference, delta_seconds) else {
            log::warn!(
                "Refusing to trim freefall {:?} by {}s: window out of range",
                edge,
                delta_seconds
            );
            return Err(TrackError::GuardRefused(format!(
                "trim delta {}s moves the boundary out of range",
                delta_seconds
            )));
        };

        let shrinking = edge.shrinks(delta_seconds);
        let duration = track.freefall_duration();
        if shrinking && duration < self.min_freefall_seconds {
            log::warn!(
                "Refusing to shrink freefall {:?} by {:.1}s: only {:.1}s left (minimum {:.1}s)",
                edge,
                delta_seconds,
                duration,
                self.min_freefall_seconds
            );
            return Err(TrackError::GuardRefused(format!(
                "freefall is {:.1}s, shorter than the {:.1}s minimum",
                duration, self.min_freefall_seconds
            )));
        }

        // Shrinking moves freefall samples to the neighbour phase, growing
        // moves neighbour samples into freefall
        let (source, target) = if shrinking {
            (FlightPhase::Freefall, edge.neighbour())
        } else {
            (edge.neighbour(), FlightPhase::Freefall)
        };

        let in_window: Vec<usize> = track
            .samples()
            .iter()
            .enumerate()
            .filter(|(_, s)| s.time() >= window_start && s.time() <= window_end)
            .filter(|(_, s)| s.phase() == source)
            .map(|(i, _)| i)
            .collect();

        let mut relabeled = 0;
        for index in in_window {
            if track.set_phase(index, target) {
                relabeled += 1;
            }
        }

        log::info!(
            "Trimmed freefall {:?} by {:+.1}s: {} samples -> {} ({} .. {})",
            edge,
            delta_seconds,
            relabeled,
            target,
            window_start.to_rfc3339(),
            window_end.to_rfc3339()
        );

        Ok(TrimOutcome {
            relabeled,
            window_start,
            window_end,
        })
    }
}

/// Inclusive window between `reference` and `reference + delta_seconds`,
/// `None` when the moved boundary is not representable
fn trim_window(
    reference: DateTime<Utc>,
    delta_seconds: f64,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let micros = (delta_seconds * 1e6).round();
    if micros.abs() >= i64::MAX as f64 {
        return None;
    }
    let moved = reference.checked_add_signed(Duration::microseconds(micros as i64))?;
    if delta_seconds >= 0.0 {
        Some((reference, moved))
    } else {
        Some((moved, reference))
    }
}

impl Default for TrimAdjuster {
    fn default() -> Self {
        Self::new(&TrimSettings::default())
    }
}
