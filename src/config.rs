//! Tunable detection thresholds
//!
//! The defaults are one canonical set reconciled from several field-tested
//! variants. They should be re-validated against real flight logs before
//! being changed.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{TrackError, TrackResult};

pub const GROUND_CALIBRATION_MAX_ACCURACY_V: f64 = 5.0; // m
pub const TAKEOFF_MAX_ACCURACY_V: f64 = 10.0; // m
pub const TAKEOFF_MAX_VELOCITY_DOWN: f64 = -2.5; // m/s (~ -10 km/h)
pub const EXIT_MIN_VELOCITY_DOWN: f64 = 10.0; // m/s (36 km/h)
pub const EXIT_MIN_ACCELERATION_DOWN: f64 = 3.0; // m/s²
pub const PITCH_MAX_VELOCITY_TOTAL: f64 = 80.0; // m/s
pub const PITCH_MAX_ACCELERATION_DOWN: f64 = -5.0; // m/s²
pub const PITCH_MAX_VELOCITY_DOWN: f64 = 80.0; // m/s
pub const PITCH_MAX_ACCELERATION_TOTAL: f64 = -5.0; // m/s²
pub const LANDING_MAX_VELOCITY_DOWN: f64 = 1.0; // m/s (3.6 km/h)
pub const TRIM_MIN_FREEFALL_SECONDS: f64 = 10.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionThresholds {
    pub ground_calibration_max_accuracy_v: f64,
    pub takeoff_max_accuracy_v: f64,
    pub takeoff_max_velocity_down: f64,
    pub exit_min_velocity_down: f64,
    pub exit_min_acceleration_down: f64,
    pub pitch_max_velocity_total: f64,
    pub pitch_max_acceleration_down: f64,
    pub pitch_max_velocity_down: f64,
    pub pitch_max_acceleration_total: f64,
    pub landing_max_velocity_down: f64,
}

impl Default for DetectionThresholds {
    fn default() -> Self {
        Self {
            ground_calibration_max_accuracy_v: GROUND_CALIBRATION_MAX_ACCURACY_V,
            takeoff_max_accuracy_v: TAKEOFF_MAX_ACCURACY_V,
            takeoff_max_velocity_down: TAKEOFF_MAX_VELOCITY_DOWN,
            exit_min_velocity_down: EXIT_MIN_VELOCITY_DOWN,
            exit_min_acceleration_down: EXIT_MIN_ACCELERATION_DOWN,
            pitch_max_velocity_total: PITCH_MAX_VELOCITY_TOTAL,
            pitch_max_acceleration_down: PITCH_MAX_ACCELERATION_DOWN,
            pitch_max_velocity_down: PITCH_MAX_VELOCITY_DOWN,
            pitch_max_acceleration_total: PITCH_MAX_ACCELERATION_TOTAL,
            landing_max_velocity_down: LANDING_MAX_VELOCITY_DOWN,
        }
    }
}

impl DetectionThresholds {
    /// Reject threshold sets whose signs would make a transition unreachable
    /// or fire on level flight.
    pub fn validate(&self) -> TrackResult<()> {
        let all = [
            self.ground_calibration_max_accuracy_v,
            self.takeoff_max_accuracy_v,
            self.takeoff_max_velocity_down,
            self.exit_min_velocity_down,
            self.exit_min_acceleration_down,
            self.pitch_max_velocity_total,
            self.pitch_max_acceleration_down,
            self.pitch_max_velocity_down,
            self.pitch_max_acceleration_total,
            self.landing_max_velocity_down,
        ];
        if all.iter().any(|v| !v.is_finite()) {
            return Err(TrackError::InvalidConfig(
                "thresholds must be finite".to_string(),
            ));
        }
        if self.ground_calibration_max_accuracy_v <= 0.0 || self.takeoff_max_accuracy_v <= 0.0 {
            return Err(TrackError::InvalidConfig(
                "accuracy bounds must be positive".to_string(),
            ));
        }
        if self.takeoff_max_velocity_down >= 0.0 {
            return Err(TrackError::InvalidConfig(
                "takeoff_max_velocity_down must be negative (climbing)".to_string(),
            ));
        }
        if self.exit_min_velocity_down <= 0.0 || self.exit_min_acceleration_down <= 0.0 {
            return Err(TrackError::InvalidConfig(
                "exit thresholds must be positive (falling, accelerating)".to_string(),
            ));
        }
        if self.pitch_max_acceleration_down >= 0.0 {
            return Err(TrackError::InvalidConfig(
                "pitch_max_acceleration_down must be negative (decelerating)".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrimSettings {
    /// Shrinking is refused once freefall is shorter than this (seconds)
    pub min_freefall_seconds: f64,
}

impl Default for TrimSettings {
    fn default() -> Self {
        Self {
            min_freefall_seconds: TRIM_MIN_FREEFALL_SECONDS,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub thresholds: DetectionThresholds,
    pub trim: TrimSettings,
}

impl Config {
    pub fn from_json(json: &str) -> TrackResult<Self> {
        let config: Config = serde_json::from_str(json)
            .map_err(|e| TrackError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> TrackResult<Self> {
        let json = fs::read_to_string(path)
            .map_err(|e| TrackError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> TrackResult<()> {
        self.thresholds.validate()?;
        let min = self.trim.min_freefall_seconds;
        if min.is_nan() || min < 0.0 {
            return Err(TrackError::InvalidConfig(
                "trim.min_freefall_seconds must be >= 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config =
            Config::from_json(r#"{ "thresholds": { "exit_min_velocity_down": 12.5 } }"#).unwrap();
        assert_eq!(config.thresholds.exit_min_velocity_down, 12.5);
        assert_eq!(
            config.thresholds.pitch_max_velocity_total,
            PITCH_MAX_VELOCITY_TOTAL
        );
        assert_eq!(config.trim.min_freefall_seconds, TRIM_MIN_FREEFALL_SECONDS);
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = Config::default();
        config.trim.min_freefall_seconds = 5.0;
        let json = serde_json::to_string_pretty(&config).unwrap();
        assert_eq!(Config::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_rejects_positive_takeoff_threshold() {
        let err = Config::from_json(r#"{ "thresholds": { "takeoff_max_velocity_down": 2.5 } }"#)
            .unwrap_err();
        assert!(matches!(err, TrackError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            Config::from_json("not json"),
            Err(TrackError::InvalidConfig(_))
        ));
    }
}
