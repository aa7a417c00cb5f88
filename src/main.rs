use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use flate2::read::GzDecoder;
use skydive_tracker_rs::{Config, FlightPhase, Track, TrackExport, TrackService, TrimAdjuster, TrimEdge};

#[derive(Parser, Debug)]
#[command(about = "Analyze a FlySight GNSS log: flight phases, freefall stats, chart export")]
struct Args {
    /// Path to a FlySight track log (.csv / .txt, optionally .gz)
    log: PathBuf,

    /// JSON file overriding detection thresholds and the trim guard
    #[arg(long)]
    config: Option<PathBuf>,

    /// Move the freefall start by this many seconds (positive shrinks)
    #[arg(long, allow_hyphen_values = true)]
    trim_start: Option<f64>,

    /// Move the freefall end by this many seconds (negative shrinks)
    #[arg(long, allow_hyphen_values = true)]
    trim_end: Option<f64>,

    /// Write chart series, map path and summary to this JSON file
    #[arg(long)]
    export: Option<PathBuf>,

    /// Phase the export is restricted to ("all" keeps every sample)
    #[arg(long, default_value = "freefall")]
    phase: String,
}

fn load_log(path: &Path) -> anyhow::Result<String> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut content = String::new();
    if path.extension().map(|e| e == "gz").unwrap_or(false) {
        BufReader::new(GzDecoder::new(file))
            .read_to_string(&mut content)
            .with_context(|| format!("decompressing {}", path.display()))?;
    } else {
        BufReader::new(file)
            .read_to_string(&mut content)
            .with_context(|| format!("reading {}", path.display()))?;
    }
    Ok(content)
}

fn parse_phase(value: &str) -> anyhow::Result<Option<FlightPhase>> {
    if value.eq_ignore_ascii_case("all") {
        return Ok(None);
    }
    match value.parse::<FlightPhase>() {
        Ok(phase) => Ok(Some(phase)),
        Err(e) => bail!("{}", e),
    }
}

fn fmt_opt(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{:.1} {}", v, unit),
        None => "-".to_string(),
    }
}

fn print_summary(track: &Track) {
    let summary = track.summary();
    println!("Samples:             {}", summary.sample_count);
    for (phase, count) in &summary.phase_counts {
        println!("  {:<18} {}", phase.to_string(), count);
    }
    println!("Ground altitude:     {}", fmt_opt(summary.ground_altitude, "m"));
    if let Some(exit) = summary.exit {
        println!(
            "Exit:                {} at {}",
            exit.time.to_rfc3339(),
            fmt_opt(summary.exit_height, "m AGL")
        );
    }
    if let Some(pitch) = summary.pitch {
        println!(
            "Pitch:               {} at {}",
            pitch.time.to_rfc3339(),
            fmt_opt(summary.pitch_height, "m AGL")
        );
    }
    println!("Freefall time:       {:.1} s", summary.freefall_duration_s);
    println!("Max vertical speed:  {}", fmt_opt(summary.max_vertical_speed_kmh, "km/h"));
    println!("Max ground speed:    {}", fmt_opt(summary.max_ground_speed_kmh, "km/h"));
    println!("Max total speed:     {}", fmt_opt(summary.max_total_speed_kmh, "km/h"));
    println!("Horizontal distance: {:.0} m", summary.horizontal_distance_m);
    println!("Max glide ratio:     {}", fmt_opt(summary.max_glide_ratio, ""));
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let export_phase = parse_phase(&args.phase)?;

    let content = load_log(&args.log)?;
    let mut service = TrackService::new(config.thresholds.clone());
    service
        .load_from_str(&content)
        .with_context(|| format!("loading {}", args.log.display()))?;

    let adjuster = TrimAdjuster::new(&config.trim);
    for (edge, delta) in [(TrimEdge::Start, args.trim_start), (TrimEdge::End, args.trim_end)] {
        let Some(delta) = delta else { continue };
        if let Err(e) = adjuster.adjust(service.track_mut(), edge, delta) {
            log::warn!("Trim {:?} {:+.1}s not applied: {}", edge, delta, e);
        }
    }

    print_summary(service.track());

    if let Some(path) = &args.export {
        let json = TrackExport::build(service.track(), export_phase).to_json()?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        log::info!("Exported chart data to {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    const LOG: &str = "$GNSS,2023-10-01T12:00:00Z,34.0000,-117.0000,1000,0,0,0,5,5,0.5,10\n\
                       $GNSS,2023-10-01T12:00:01Z,34.0001,-117.0001,1005,0,0,0,5,5,0.5,10\n";

    #[test]
    fn test_load_log_plain_and_gzip() {
        let dir = std::env::temp_dir();
        let plain = dir.join(format!("skydive_tracker_{}.csv", std::process::id()));
        let gz = dir.join(format!("skydive_tracker_{}.csv.gz", std::process::id()));

        fs::write(&plain, LOG).unwrap();
        let mut encoder = GzEncoder::new(File::create(&gz).unwrap(), Compression::default());
        encoder.write_all(LOG.as_bytes()).unwrap();
        encoder.finish().unwrap();

        assert_eq!(load_log(&plain).unwrap(), LOG);
        assert_eq!(load_log(&gz).unwrap(), LOG);

        fs::remove_file(&plain).ok();
        fs::remove_file(&gz).ok();
    }

    #[test]
    fn test_load_log_missing_file() {
        let err = load_log(Path::new("/nonexistent/track.csv")).unwrap_err();
        assert!(err.to_string().contains("opening"));
    }

    #[test]
    fn test_parse_phase() {
        assert_eq!(parse_phase("all").unwrap(), None);
        assert_eq!(parse_phase("Canopy").unwrap(), Some(FlightPhase::Canopy));
        assert!(parse_phase("swoop").is_err());
    }
}
