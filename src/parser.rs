//! `$GNSS` record parser
//!
//! One line in, at most one [`Sample`] out. Lines carrying any other record
//! type (`$IMU`, `$TIME`, `$COL`, headers, blank lines) are skipped.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::{TrackError, TrackResult};
use crate::types::{GnssFix, Sample};

pub const GNSS_SENTINEL: &str = "$GNSS";

/// Sentinel plus the 11 positional fields
pub const GNSS_MIN_FIELDS: usize = 12;

/// Parse one raw log line.
///
/// Returns `Ok(None)` for lines that are not `$GNSS` records and
/// `Err(MalformedRecord)` for `$GNSS` records that cannot be decoded.
pub fn parse_line(line: &str) -> TrackResult<Option<Sample>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields[0] != GNSS_SENTINEL {
        log::debug!("Skipping non-GNSS record: '{}'", line);
        return Ok(None);
    }

    parse_fix(line, &fields).map(|fix| Some(Sample::new(fix)))
}

fn parse_fix(line: &str, fields: &[&str]) -> TrackResult<GnssFix> {
    if fields.len() < GNSS_MIN_FIELDS {
        return Err(TrackError::malformed(
            line,
            format!(
                "expected at least {} fields, found {}",
                GNSS_MIN_FIELDS,
                fields.len()
            ),
        ));
    }

    let number = |index: usize, name: &str| -> TrackResult<f64> {
        fields[index]
            .parse::<f64>()
            .map_err(|e| TrackError::malformed(line, format!("{} '{}': {}", name, fields[index], e)))
    };

    Ok(GnssFix {
        time: parse_timestamp(fields[1]).map_err(|reason| TrackError::malformed(line, reason))?,
        latitude: number(2, "latitude")?,
        longitude: number(3, "longitude")?,
        altitude: number(4, "altitude")?,
        velocity_north: number(5, "velocity north")?,
        velocity_east: number(6, "velocity east")?,
        velocity_down: number(7, "velocity down")?,
        accuracy_horizontal: number(8, "horizontal accuracy")?,
        accuracy_vertical: number(9, "vertical accuracy")?,
        accuracy_speed: number(10, "speed accuracy")?,
        satellites: fields[11].parse::<u32>().map_err(|e| {
            TrackError::malformed(line, format!("satellites '{}': {}", fields[11], e))
        })?,
    })
}

/// ISO-8601 timestamp; a missing zone designator is read as UTC
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("timestamp '{}': {}", raw, e))
}
