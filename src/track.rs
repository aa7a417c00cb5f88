use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::detector::Transition;
use crate::kinematics::seconds_between;
use crate::types::{FlightEvent, FlightPhase, Sample};

/// Events as the detector saw them while loading. Trims do not move these.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectedEvents {
    pub takeoff: Option<FlightEvent>,
    pub exit: Option<FlightEvent>,
    pub pitch: Option<FlightEvent>,
    pub landing: Option<FlightEvent>,
}

/// One loaded log: samples in arrival order plus calibration and events
#[derive(Clone, Debug, Default, Serialize)]
pub struct Track {
    samples: Vec<Sample>,
    ground_altitude: Option<f64>,
    events: DetectedEvents,
}

/// Summary statistics over the freefall part of a track
#[derive(Clone, Debug, Serialize)]
pub struct TrackSummary {
    pub sample_count: usize,
    pub phase_counts: BTreeMap<FlightPhase, usize>,
    pub ground_altitude: Option<f64>,
    pub takeoff_time: Option<DateTime<Utc>>,
    pub landing_time: Option<DateTime<Utc>>,
    pub exit: Option<FlightEvent>,
    pub exit_height: Option<f64>,
    pub pitch: Option<FlightEvent>,
    pub pitch_height: Option<f64>,
    pub freefall_duration_s: f64,
    pub max_vertical_speed_kmh: Option<f64>,
    pub max_ground_speed_kmh: Option<f64>,
    pub max_total_speed_kmh: Option<f64>,
    pub horizontal_distance_m: f64,
    pub max_glide_ratio: Option<f64>,
}

impl Track {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    /// Calibrated drop zone altitude, `None` until takeoff is detected
    pub fn ground_altitude(&self) -> Option<f64> {
        self.ground_altitude
    }

    pub fn events(&self) -> &DetectedEvents {
        &self.events
    }

    /// Exit time used as the flight clock origin
    pub fn exit_time(&self) -> Option<DateTime<Utc>> {
        self.events.exit.map(|e| e.time)
    }

    pub(crate) fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    pub(crate) fn record(&mut self, transition: &Transition) {
        match *transition {
            Transition::TakeOff {
                event,
                ground_altitude,
            } => {
                self.events.takeoff = Some(event);
                self.ground_altitude = Some(ground_altitude);
            }
            Transition::Exit(event) => self.events.exit = Some(event),
            Transition::Pitch(event) => self.events.pitch = Some(event),
            Transition::Landing(event) => self.events.landing = Some(event),
        }
    }

    pub(crate) fn set_phase(&mut self, index: usize, phase: FlightPhase) -> bool {
        match self.samples.get_mut(index) {
            Some(sample) if sample.phase != phase => {
                sample.phase = phase;
                true
            }
            _ => false,
        }
    }

    /// Relabel everything as freefall when detection found none.
    /// Returns `true` if the fallback was applied.
    pub(crate) fn apply_freefall_fallback(&mut self) -> bool {
        if self.samples.is_empty() || self.has_phase(FlightPhase::Freefall) {
            return false;
        }
        for sample in &mut self.samples {
            sample.phase = FlightPhase::Freefall;
        }
        true
    }

    pub fn has_phase(&self, phase: FlightPhase) -> bool {
        self.samples.iter().any(|s| s.phase == phase)
    }

    pub fn samples_in(&self, phase: FlightPhase) -> impl Iterator<Item = &Sample> + '_ {
        self.samples.iter().filter(move |s| s.phase == phase)
    }

    pub fn freefall_samples(&self) -> impl Iterator<Item = &Sample> + '_ {
        self.samples_in(FlightPhase::Freefall)
    }

    /// Indices of the first and last freefall samples
    pub fn freefall_bounds(&self) -> Option<(usize, usize)> {
        let first = self
            .samples
            .iter()
            .position(|s| s.phase == FlightPhase::Freefall)?;
        let last = self
            .samples
            .iter()
            .rposition(|s| s.phase == FlightPhase::Freefall)?;
        Some((first, last))
    }

    /// First freefall sample
    pub fn exit(&self) -> Option<FlightEvent> {
        self.freefall_bounds()
            .map(|(first, _)| FlightEvent::at(&self.samples[first]))
    }

    /// Last freefall sample
    pub fn pitch(&self) -> Option<FlightEvent> {
        self.freefall_bounds()
            .map(|(_, last)| FlightEvent::at(&self.samples[last]))
    }

    pub fn exit_height(&self) -> Option<f64> {
        Some(self.exit()?.altitude - self.ground_altitude?)
    }

    pub fn pitch_height(&self) -> Option<f64> {
        Some(self.pitch()?.altitude - self.ground_altitude?)
    }

    /// Seconds between the first and last freefall samples
    pub fn freefall_duration(&self) -> f64 {
        self.freefall_bounds()
            .map(|(first, last)| {
                seconds_between(self.samples[first].fix.time, self.samples[last].fix.time)
            })
            .unwrap_or(0.0)
    }

    /// Resolve a chart cursor: index 0 is the first freefall sample
    pub fn sample_at_cursor(&self, index: usize) -> Option<&Sample> {
        self.freefall_samples().nth(index)
    }

    pub fn max_vertical_speed_kmh(&self) -> Option<f64> {
        max_finite(self.freefall_samples().map(Sample::velocity_down_kmh))
    }

    pub fn max_ground_speed_kmh(&self) -> Option<f64> {
        max_finite(self.freefall_samples().map(Sample::velocity_ground_kmh))
    }

    pub fn max_total_speed_kmh(&self) -> Option<f64> {
        max_finite(self.freefall_samples().map(Sample::velocity_total_kmh))
    }

    /// Horizontal distance covered in freefall (meters)
    pub fn horizontal_distance(&self) -> f64 {
        self.freefall_samples()
            .map(|s| s.horizontal_distance)
            .filter(|d| d.is_finite())
            .sum()
    }

    /// Best glide ratio in freefall; level-flight samples (non-finite) are skipped
    pub fn max_glide_ratio(&self) -> Option<f64> {
        max_finite(self.freefall_samples().map(|s| s.glide_ratio))
    }

    pub fn phase_counts(&self) -> BTreeMap<FlightPhase, usize> {
        let mut counts = BTreeMap::new();
        for sample in &self.samples {
            *counts.entry(sample.phase).or_insert(0) += 1;
        }
        counts
    }

    pub fn summary(&self) -> TrackSummary {
        TrackSummary {
            sample_count: self.samples.len(),
            phase_counts: self.phase_counts(),
            ground_altitude: self.ground_altitude,
            takeoff_time: self.events.takeoff.map(|e| e.time),
            landing_time: self.events.landing.map(|e| e.time),
            exit: self.exit(),
            exit_height: self.exit_height(),
            pitch: self.pitch(),
            pitch_height: self.pitch_height(),
            freefall_duration_s: self.freefall_duration(),
            max_vertical_speed_kmh: self.max_vertical_speed_kmh(),
            max_ground_speed_kmh: self.max_ground_speed_kmh(),
            max_total_speed_kmh: self.max_total_speed_kmh(),
            horizontal_distance_m: self.horizontal_distance(),
            max_glide_ratio: self.max_glide_ratio(),
        }
    }
}

fn max_finite(values: impl Iterator<Item = f64>) -> Option<f64> {
    values
        .filter(|v| v.is_finite())
        .fold(None, |max, v| match max {
            Some(m) if m >= v => Some(m),
            _ => Some(v),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::service::load_track;

    #[test]
    fn test_empty_track() {
        let track = Track::new();
        assert!(track.is_empty());
        assert_eq!(track.freefall_bounds(), None);
        assert_eq!(track.freefall_duration(), 0.0);
        assert_eq!(track.max_glide_ratio(), None);
        assert_eq!(track.horizontal_distance(), 0.0);
        assert!(track.sample_at_cursor(0).is_none());
    }

    #[test]
    fn test_summary_over_freefall() {
        let track = load_track(&fixtures::jump_log(25), &Default::default()).unwrap();
        let summary = track.summary();

        assert_eq!(summary.sample_count, fixtures::jump_sample_count(25));
        assert_eq!(summary.ground_altitude, Some(fixtures::GROUND_ALTITUDE));
        assert_eq!(summary.phase_counts[&FlightPhase::Freefall], 26);

        let exit = summary.exit.expect("exit");
        assert_eq!(exit.time, fixtures::time_at(fixtures::FIRST_FREEFALL));
        let exit_height = summary.exit_height.expect("exit height");
        assert!((exit_height - (exit.altitude - fixtures::GROUND_ALTITUDE)).abs() < 1e-9);

        let pitch = summary.pitch.expect("pitch");
        assert_eq!(pitch.time, fixtures::time_at(fixtures::pitch_index(25)));
        assert!((summary.freefall_duration_s - 25.0).abs() < 1e-9);

        // Terminal 50 m/s straight down, 10 m/s north
        assert!((summary.max_vertical_speed_kmh.unwrap() - 180.0).abs() < 1e-9);
        assert!((summary.max_ground_speed_kmh.unwrap() - 36.0).abs() < 1e-9);
        let total = (50.0f64 * 50.0 + 10.0 * 10.0).sqrt() * 3.6;
        assert!((summary.max_total_speed_kmh.unwrap() - total).abs() < 1e-9);

        assert!(summary.horizontal_distance_m > 0.0);
        assert!(summary.max_glide_ratio.unwrap().is_finite());
    }

    #[test]
    fn test_detected_events_recorded() {
        let track = load_track(&fixtures::jump_log(25), &Default::default()).unwrap();
        let events = track.events();
        assert_eq!(events.takeoff.unwrap().time, fixtures::time_at(fixtures::TAKEOFF));
        assert_eq!(events.exit.unwrap().time, fixtures::time_at(fixtures::EXIT));
        assert_eq!(events.pitch.unwrap().time, fixtures::time_at(fixtures::pitch_index(25)));
        assert_eq!(
            events.landing.unwrap().time,
            fixtures::time_at(fixtures::landing_index(25))
        );
        assert_eq!(track.exit_time(), Some(fixtures::time_at(fixtures::EXIT)));
    }

    #[test]
    fn test_cursor_starts_at_first_freefall() {
        let track = load_track(&fixtures::jump_log(25), &Default::default()).unwrap();
        let first = track.sample_at_cursor(0).expect("cursor 0");
        assert_eq!(first.time(), fixtures::time_at(fixtures::FIRST_FREEFALL));
        assert_eq!(first.phase(), FlightPhase::Freefall);

        let third = track.sample_at_cursor(2).expect("cursor 2");
        assert_eq!(third.time(), fixtures::time_at(fixtures::FIRST_FREEFALL + 2));
        assert!(track.sample_at_cursor(26).is_none());
    }

    #[test]
    fn test_max_glide_ratio_skips_non_finite() {
        // Level flight: every sample after the first has an infinite glide
        // ratio, and the fallback makes them all freefall
        let track = load_track(&fixtures::level_log(10), &Default::default()).unwrap();
        assert_eq!(track.freefall_samples().count(), 10);
        assert!(track.samples()[1..].iter().all(|s| s.glide_ratio.is_infinite()));
        // Only the first sample (no predecessor) is finite
        assert_eq!(track.max_glide_ratio(), Some(0.0));
    }

    #[test]
    fn test_max_finite() {
        let values = [1.5, f64::INFINITY, 2.0, f64::NAN, 1.8, f64::NEG_INFINITY];
        assert_eq!(max_finite(values.into_iter()), Some(2.0));
        assert_eq!(max_finite(std::iter::empty()), None);
    }

    #[test]
    fn test_heights_need_calibration() {
        // Never took off: freefall fallback but no ground reference
        let track = load_track(&fixtures::descending_log(20), &Default::default()).unwrap();
        assert!(track.exit().is_some());
        assert_eq!(track.ground_altitude(), None);
        assert_eq!(track.exit_height(), None);
        assert_eq!(track.pitch_height(), None);
    }
}
