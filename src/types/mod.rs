pub mod linalg;

pub use linalg::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Conversion factor from m/s to km/h
pub const MS_TO_KMH: f64 = 3.6;

/// Flight phase of a single sample.
///
/// Variants are ordered: detection only ever moves forward through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlightPhase {
    #[default]
    Boarding,
    Aircraft,
    Freefall,
    Canopy,
    Landed,
}

impl FlightPhase {
    pub const ALL: [FlightPhase; 5] = [
        FlightPhase::Boarding,
        FlightPhase::Aircraft,
        FlightPhase::Freefall,
        FlightPhase::Canopy,
        FlightPhase::Landed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FlightPhase::Boarding => "boarding",
            FlightPhase::Aircraft => "aircraft",
            FlightPhase::Freefall => "freefall",
            FlightPhase::Canopy => "canopy",
            FlightPhase::Landed => "landed",
        }
    }
}

impl std::fmt::Display for FlightPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FlightPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FlightPhase::ALL
            .iter()
            .copied()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown flight phase '{}'", s))
    }
}

/// Raw GNSS fix, one per `$GNSS` record
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GnssFix {
    pub time: DateTime<Utc>,
    pub latitude: f64,            // degrees
    pub longitude: f64,           // degrees
    pub altitude: f64,            // m AMSL
    pub velocity_north: f64,      // m/s
    pub velocity_east: f64,       // m/s
    pub velocity_down: f64,       // m/s, positive when descending
    pub accuracy_horizontal: f64, // m
    pub accuracy_vertical: f64,   // m
    pub accuracy_speed: f64,      // m/s
    pub satellites: u32,
}

impl GnssFix {
    pub fn velocity(&self) -> NedVec {
        ned(self.velocity_north, self.velocity_east, self.velocity_down)
    }
}

/// A fix plus everything derived from it.
///
/// History-dependent fields (accelerations, distance, glide ratio, height,
/// flight time) stay at zero until [`crate::kinematics::compute_relative`]
/// fills them against the previous sample.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Sample {
    #[serde(flatten)]
    pub fix: GnssFix,

    pub velocity_total: f64,      // m/s
    pub velocity_ground: f64,     // m/s
    pub acceleration_north: f64,  // m/s²
    pub acceleration_east: f64,   // m/s²
    pub acceleration_down: f64,   // m/s²
    pub acceleration_total: f64,  // m/s², signed
    pub acceleration_ground: f64, // m/s², signed
    pub height: f64,              // m AGL
    pub flight_time: f64,         // s since exit
    pub horizontal_distance: f64, // m from previous sample
    pub glide_ratio: f64,         // may be non-finite

    pub(crate) phase: FlightPhase,
}

impl Sample {
    pub fn new(fix: GnssFix) -> Self {
        let velocity = fix.velocity();
        Self {
            velocity_total: velocity.norm(),
            velocity_ground: ground_plane(&velocity).norm(),
            fix,
            acceleration_north: 0.0,
            acceleration_east: 0.0,
            acceleration_down: 0.0,
            acceleration_total: 0.0,
            acceleration_ground: 0.0,
            height: 0.0,
            flight_time: 0.0,
            horizontal_distance: 0.0,
            glide_ratio: 0.0,
            phase: FlightPhase::Boarding,
        }
    }

    pub fn time(&self) -> DateTime<Utc> {
        self.fix.time
    }

    pub fn phase(&self) -> FlightPhase {
        self.phase
    }

    pub fn acceleration(&self) -> NedVec {
        ned(
            self.acceleration_north,
            self.acceleration_east,
            self.acceleration_down,
        )
    }

    pub fn velocity_down_kmh(&self) -> f64 {
        self.fix.velocity_down * MS_TO_KMH
    }

    pub fn velocity_ground_kmh(&self) -> f64 {
        self.velocity_ground * MS_TO_KMH
    }

    pub fn velocity_total_kmh(&self) -> f64 {
        self.velocity_total * MS_TO_KMH
    }
}

/// A detected flight event: where and when a transition fired
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlightEvent {
    pub time: DateTime<Utc>,
    pub altitude: f64,
}

impl FlightEvent {
    pub fn at(sample: &Sample) -> Self {
        Self {
            time: sample.fix.time,
            altitude: sample.fix.altitude,
        }
    }
}
