//! Track loading session
//!
//! Owns one [`Track`] and the [`PhaseDetector`] that builds it. Lines are
//! processed strictly in order: parse, compute kinematics against the
//! previous sample, classify, append.

use crate::config::DetectionThresholds;
use crate::detector::PhaseDetector;
use crate::error::TrackResult;
use crate::kinematics;
use crate::parser;
use crate::track::Track;
use crate::types::{FlightPhase, Sample};

pub struct TrackService {
    track: Track,
    detector: PhaseDetector,
    skipped_lines: u64,
}

impl TrackService {
    pub fn new(thresholds: DetectionThresholds) -> Self {
        Self {
            track: Track::new(),
            detector: PhaseDetector::new(thresholds),
            skipped_lines: 0,
        }
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn track_mut(&mut self) -> &mut Track {
        &mut self.track
    }

    pub fn into_track(self) -> Track {
        self.track
    }

    pub fn detector(&self) -> &PhaseDetector {
        &self.detector
    }

    pub fn skipped_lines(&self) -> u64 {
        self.skipped_lines
    }

    /// Drop the current track and detection state
    pub fn reset(&mut self) {
        self.track = Track::new();
        self.detector.reset();
        self.skipped_lines = 0;
    }

    /// Process one raw line. Returns the appended sample, or `None` when the
    /// line is not a `$GNSS` record.
    pub fn append_line(&mut self, line: &str) -> TrackResult<Option<&Sample>> {
        let Some(mut sample) = parser::parse_line(line)? else {
            self.skipped_lines += 1;
            return Ok(None);
        };

        if let Some(previous) = self.track.last() {
            kinematics::compute_relative(
                &mut sample,
                previous,
                self.track.ground_altitude(),
                self.track.exit_time(),
            );
        }

        if let Some(transition) = self.detector.classify(&mut sample) {
            self.track.record(&transition);
        }

        self.track.push(sample);
        Ok(self.track.last())
    }

    /// Post-load validation: when no sample was classified as freefall the
    /// whole track is treated as freefall so analysis still has data.
    pub fn finish(&mut self) {
        if self.track.apply_freefall_fallback() {
            log::warn!(
                "No freefall detected in {} samples, treating the whole track as freefall",
                self.track.len()
            );
        }
    }

    /// Load a whole log, replacing any previous track.
    ///
    /// A malformed `$GNSS` record aborts the load and leaves the service
    /// reset; nothing of the partial track survives.
    pub fn load_from_str(&mut self, content: &str) -> TrackResult<&Track> {
        self.load_lines(content.lines())
    }

    pub fn load_lines<I, S>(&mut self, lines: I) -> TrackResult<&Track>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.reset();
        for line in lines {
            let appended = self.append_line(line.as_ref()).map(|_| ());
            if let Err(e) = appended {
                log::error!("{}", e);
                self.reset();
                return Err(e);
            }
        }
        self.finish();

        let counts = self.track.phase_counts();
        log::info!(
            "Loaded {} samples ({} other lines skipped), freefall {} samples / {:.1}s",
            self.track.len(),
            self.skipped_lines,
            counts.get(&FlightPhase::Freefall).copied().unwrap_or(0),
            self.track.freefall_duration()
        );
        Ok(&self.track)
    }
}

impl Default for TrackService {
    fn default() -> Self {
        Self::new(DetectionThresholds::default())
    }
}

/// Load a complete log into a fresh track
pub fn load_track(content: &str, thresholds: &DetectionThresholds) -> TrackResult<Track> {
    let mut service = TrackService::new(thresholds.clone());
    service.load_from_str(content)?;
    Ok(service.into_track())
}
