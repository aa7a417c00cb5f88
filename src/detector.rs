//! Flight phase state machine
//!
//! ```text
//! Boarding --takeoff--> Aircraft --exit--> Freefall --pitch--> Canopy --landing--> Landed
//! ```
//!
//! A sample is labeled with the phase active when it arrives; the sample
//! that trips a transition keeps the old label and the new phase applies
//! from the next sample on. Each transition fires at most once and at most
//! one transition fires per sample.

use serde::Serialize;

use crate::config::DetectionThresholds;
use crate::types::{FlightEvent, FlightPhase, Sample};

/// A transition fired by the detector, with the data the track records
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum Transition {
    TakeOff {
        event: FlightEvent,
        ground_altitude: f64,
    },
    Exit(FlightEvent),
    Pitch(FlightEvent),
    Landing(FlightEvent),
}

impl Transition {
    /// Phase that applies to samples after this transition
    pub fn next_phase(&self) -> FlightPhase {
        match self {
            Transition::TakeOff { .. } => FlightPhase::Aircraft,
            Transition::Exit(_) => FlightPhase::Freefall,
            Transition::Pitch(_) => FlightPhase::Canopy,
            Transition::Landing(_) => FlightPhase::Landed,
        }
    }

    pub fn event(&self) -> FlightEvent {
        match self {
            Transition::TakeOff { event, .. }
            | Transition::Exit(event)
            | Transition::Pitch(event)
            | Transition::Landing(event) => *event,
        }
    }
}

/// Per-load detection state. Reset between files.
///
/// The current phase is implied by which transitions have fired.
#[derive(Clone, Debug)]
pub struct PhaseDetector {
    thresholds: DetectionThresholds,

    has_taken_off: bool,
    has_exited: bool,
    has_pitched: bool,
    has_landed: bool,

    // Ground altitude calibration, frozen at takeoff
    ground_altitude_sum: f64,
    ground_altitude_count: u64,
}

impl PhaseDetector {
    pub fn new(thresholds: DetectionThresholds) -> Self {
        Self {
            thresholds,
            has_taken_off: false,
            has_exited: false,
            has_pitched: false,
            has_landed: false,
            ground_altitude_sum: 0.0,
            ground_altitude_count: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.thresholds.clone());
    }

    pub fn phase(&self) -> FlightPhase {
        if self.has_landed {
            FlightPhase::Landed
        } else if self.has_pitched {
            FlightPhase::Canopy
        } else if self.has_exited {
            FlightPhase::Freefall
        } else if self.has_taken_off {
            FlightPhase::Aircraft
        } else {
            FlightPhase::Boarding
        }
    }

    pub fn thresholds(&self) -> &DetectionThresholds {
        &self.thresholds
    }

    /// Running mean of the calibration altitudes so far
    pub fn ground_altitude_estimate(&self) -> Option<f64> {
        if self.ground_altitude_count == 0 {
            None
        } else {
            Some(self.ground_altitude_sum / self.ground_altitude_count as f64)
        }
    }

    /// Label `sample` with the current phase, then check the one transition
    /// reachable from it. Kinematics must already be computed.
    pub fn classify(&mut self, sample: &mut Sample) -> Option<Transition> {
        let current = self.phase();
        sample.phase = current;

        let th = &self.thresholds;
        let transition = match current {
            FlightPhase::Boarding => {
                if sample.fix.accuracy_vertical < th.ground_calibration_max_accuracy_v {
                    self.ground_altitude_sum += sample.fix.altitude;
                    self.ground_altitude_count += 1;
                }
                if sample.fix.accuracy_vertical < th.takeoff_max_accuracy_v
                    && sample.fix.velocity_down < th.takeoff_max_velocity_down
                {
                    let ground_altitude = match self.ground_altitude_estimate() {
                        Some(altitude) => altitude,
                        None => {
                            log::warn!(
                                "No calibration samples before takeoff, using takeoff altitude {:.1} m as ground",
                                sample.fix.altitude
                            );
                            sample.fix.altitude
                        }
                    };
                    self.has_taken_off = true;
                    Some(Transition::TakeOff {
                        event: FlightEvent::at(sample),
                        ground_altitude,
                    })
                } else {
                    None
                }
            }
            FlightPhase::Aircraft => {
                if sample.fix.velocity_down > th.exit_min_velocity_down
                    && sample.acceleration_down > th.exit_min_acceleration_down
                {
                    self.has_exited = true;
                    Some(Transition::Exit(FlightEvent::at(sample)))
                } else {
                    None
                }
            }
            FlightPhase::Freefall => {
                let decelerating = sample.velocity_total < th.pitch_max_velocity_total
                    && sample.acceleration_down < th.pitch_max_acceleration_down;
                let slowed = sample.fix.velocity_down < th.pitch_max_velocity_down
                    || sample.acceleration_total < th.pitch_max_acceleration_total;
                if decelerating && slowed {
                    self.has_pitched = true;
                    Some(Transition::Pitch(FlightEvent::at(sample)))
                } else {
                    None
                }
            }
            FlightPhase::Canopy => {
                if sample.fix.velocity_down < th.landing_max_velocity_down {
                    self.has_landed = true;
                    Some(Transition::Landing(FlightEvent::at(sample)))
                } else {
                    None
                }
            }
            FlightPhase::Landed => None,
        };

        if let Some(t) = &transition {
            log::info!(
                "{} -> {} at {} ({:.1} m, vD {:.1} m/s, aD {:.1} m/s²)",
                current,
                t.next_phase(),
                sample.fix.time.to_rfc3339(),
                sample.fix.altitude,
                sample.fix.velocity_down,
                sample.acceleration_down
            );
        }

        transition
    }
}

impl Default for PhaseDetector {
    fn default() -> Self {
        Self::new(DetectionThresholds::default())
    }
}
