//! Chart and map data derived from a track
//!
//! Charts plot one metric against flight time; the map shows the ground
//! path. Both are usually restricted to the freefall part of the jump.

use serde::Serialize;

use crate::track::{Track, TrackSummary};
use crate::types::{FlightPhase, Sample};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Height,
    GlideRatio,
    VelocityDown,
    VelocityGround,
    VelocityTotal,
    AccelerationDown,
    AccelerationGround,
    AccelerationTotal,
    HorizontalDistance,
}

impl Metric {
    pub const ALL: [Metric; 9] = [
        Metric::Height,
        Metric::GlideRatio,
        Metric::VelocityDown,
        Metric::VelocityGround,
        Metric::VelocityTotal,
        Metric::AccelerationDown,
        Metric::AccelerationGround,
        Metric::AccelerationTotal,
        Metric::HorizontalDistance,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Metric::Height => "Height (m)",
            Metric::GlideRatio => "Glide Ratio",
            Metric::VelocityDown => "Speed Vertical (km/h)",
            Metric::VelocityGround => "Speed Ground (km/h)",
            Metric::VelocityTotal => "Speed Total (km/h)",
            Metric::AccelerationDown => "Acceleration Down (m/s²)",
            Metric::AccelerationGround => "Acceleration Ground (m/s²)",
            Metric::AccelerationTotal => "Acceleration Total (m/s²)",
            Metric::HorizontalDistance => "Horizontal Distance (m)",
        }
    }

    pub fn value(&self, sample: &Sample) -> f64 {
        match self {
            Metric::Height => sample.height,
            Metric::GlideRatio => sample.glide_ratio,
            Metric::VelocityDown => sample.velocity_down_kmh(),
            Metric::VelocityGround => sample.velocity_ground_kmh(),
            Metric::VelocityTotal => sample.velocity_total_kmh(),
            Metric::AccelerationDown => sample.acceleration_down,
            Metric::AccelerationGround => sample.acceleration_ground,
            Metric::AccelerationTotal => sample.acceleration_total,
            Metric::HorizontalDistance => sample.horizontal_distance,
        }
    }
}

/// One chart line; `x` and `y` are parallel
#[derive(Debug, Clone, Serialize)]
pub struct Series {
    pub metric: Metric,
    pub label: &'static str,
    pub x: Vec<f64>, // s since exit
    pub y: Vec<f64>,
}

/// `phase == None` keeps every sample
fn selected<'a>(
    track: &'a Track,
    phase: Option<FlightPhase>,
) -> impl Iterator<Item = &'a Sample> + 'a {
    track
        .samples()
        .iter()
        .filter(move |s| phase.map_or(true, |p| s.phase() == p))
}

pub fn series(track: &Track, metric: Metric, phase: Option<FlightPhase>) -> Series {
    let (x, y) = selected(track, phase)
        .map(|s| (s.flight_time, metric.value(s)))
        .unzip();
    Series {
        metric,
        label: metric.label(),
        x,
        y,
    }
}

pub fn all_series(track: &Track, phase: Option<FlightPhase>) -> Vec<Series> {
    Metric::ALL
        .iter()
        .map(|m| series(track, *m, phase))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

pub fn map_path(track: &Track, phase: Option<FlightPhase>) -> Vec<LatLng> {
    selected(track, phase)
        .map(|s| LatLng {
            lat: s.fix.latitude,
            lng: s.fix.longitude,
        })
        .collect()
}

/// Everything a chart/map front end needs, as one JSON document
#[derive(Debug, Clone, Serialize)]
pub struct TrackExport {
    pub phase: Option<FlightPhase>,
    pub summary: TrackSummary,
    pub series: Vec<Series>,
    pub path: Vec<LatLng>,
}

impl TrackExport {
    pub fn build(track: &Track, phase: Option<FlightPhase>) -> Self {
        Self {
            phase,
            summary: track.summary(),
            series: all_series(track, phase),
            path: map_path(track, phase),
        }
    }

    /// Non-finite values (level-flight glide ratios) serialize as `null`
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
