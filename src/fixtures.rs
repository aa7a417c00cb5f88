//! Synthetic FlySight-style logs for tests
//!
//! One `$GNSS` record per second; sample index == seconds since start.

use chrono::{DateTime, Duration, TimeZone, Utc};

pub const GROUND_ALTITUDE: f64 = 100.0;
pub const TAKEOFF: usize = 5;
pub const EXIT: usize = 15;
pub const FIRST_FREEFALL: usize = EXIT + 1;

const HEADER: &str = "$FLYS,1\n\
$VAR,FIRMWARE_VER,v2023.09.22.2\n\
$COL,GNSS,time,lat,lon,hMSL,velN,velE,velD,hAcc,vAcc,sAcc,numSV\n\
$UNIT,GNSS,,deg,deg,m,m/s,m/s,m/s,m,m,m/s,\n\
$DATA\n";

pub fn time_at(index: usize) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 10, 1, 12, 0, 0).unwrap() + Duration::seconds(index as i64)
}

/// Last freefall sample; the pitch transition fires here
pub fn pitch_index(freefall_seconds: usize) -> usize {
    FIRST_FREEFALL + freefall_seconds
}

pub fn landing_index(freefall_seconds: usize) -> usize {
    pitch_index(freefall_seconds) + 21
}

pub fn jump_sample_count(freefall_seconds: usize) -> usize {
    landing_index(freefall_seconds) + 5
}

pub fn gnss_line(index: usize, lat: f64, altitude: f64, vn: f64, vd: f64, accuracy_v: f64) -> String {
    format!(
        "$GNSS,{},{:.7},{:.7},{:.3},{:.2},{:.2},{:.2},{:.3},{:.3},{:.2},{}",
        time_at(index).format("%Y-%m-%dT%H:%M:%S%.3fZ"),
        lat,
        -117.0,
        altitude,
        vn,
        0.0,
        vd,
        2.5,
        accuracy_v,
        0.5,
        14
    )
}

fn imu_line(index: usize) -> String {
    format!("$IMU,{}.000,0.12,-0.40,0.05,0.01,0.02,-0.98,25.1", index)
}

/// Ground, climb, cruise, exit, `freefall_seconds` of freefall, canopy, landing.
/// Needs at least 4 s of freefall to reach terminal velocity before pitch.
pub fn jump_log(freefall_seconds: usize) -> String {
    assert!(freefall_seconds >= 4);
    let pitch = pitch_index(freefall_seconds);
    let landing = landing_index(freefall_seconds);

    let mut out = String::from(HEADER);
    let mut altitude = GROUND_ALTITUDE;
    for t in 0..jump_sample_count(freefall_seconds) {
        let (vn, vd) = match t {
            t if t < TAKEOFF => (0.0, 0.0),
            t if t < 10 => (30.0, -5.0),
            t if t < EXIT => (40.0, 0.0),
            EXIT => (40.0, 12.0),
            t if t < pitch => (10.0, (12.0 + 10.0 * (t - EXIT) as f64).min(50.0)),
            t if t == pitch => (10.0, 20.0),
            t if t < landing => (8.0, 5.0),
            t if t == landing => (1.0, 0.5),
            _ => (0.0, 0.0),
        };
        altitude = match t {
            t if t <= TAKEOFF => GROUND_ALTITUDE,
            t if t < 10 => GROUND_ALTITUDE + 5.0 * (t - TAKEOFF) as f64,
            t if t < EXIT => 3000.0,
            EXIT => 2995.0,
            _ => altitude - vd,
        };
        let lat = 34.0 + 0.0001 * t as f64;
        out.push_str(&gnss_line(t, lat, altitude, vn, vd, 3.0));
        out.push('\n');
        if t % 3 == 0 {
            out.push_str(&imu_line(t));
            out.push('\n');
        }
    }
    out
}

/// Slow steady descent with good accuracy: no transition ever qualifies
pub fn descending_log(samples: usize) -> String {
    let mut out = String::from(HEADER);
    for t in 0..samples {
        out.push_str(&gnss_line(t, 34.0, 1000.0 - 2.0 * t as f64, 0.0, 2.0, 3.0));
        out.push('\n');
    }
    out
}

/// Horizontal motion at constant altitude
pub fn level_log(samples: usize) -> String {
    let mut out = String::from(HEADER);
    for t in 0..samples {
        out.push_str(&gnss_line(t, 34.0 + 0.0002 * t as f64, 500.0, 20.0, 0.0, 3.0));
        out.push('\n');
    }
    out
}
