mod catalog;
mod config;
mod predict;
mod sky;
mod tracker;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::catalog::{CatalogManager, ConfiguredFeed, FeedSource};
use crate::config::{parse_duration, Config, ConfigError, DEFAULT_CONFIG_PATH};
use crate::sky::{EphemerisTable, SkyEngine};
use crate::tracker::Tracker;

#[derive(Parser)]
#[command(name = "skywatch")]
#[command(about = "Satellite visibility, pass prediction and sky conditions")]
struct Cli {
    /// Configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the orbital element catalog
    Refresh {
        /// Fetch even if the cached catalog is still fresh
        #[arg(long)]
        force: bool,
    },
    /// List objects above the horizon
    Visible {
        /// RFC3339 instant, defaults to now
        #[arg(long, value_parser = parse_instant)]
        at: Option<DateTime<Utc>>,
        /// Overrides visibility.min_elevation_deg
        #[arg(long, allow_negative_numbers = true)]
        min_elevation: Option<f64>,
    },
    /// Predict the next pass of one object
    NextPass {
        norad_id: u32,
        #[arg(long, value_parser = parse_instant)]
        at: Option<DateTime<Utc>>,
        /// Overrides passes.horizon_hours
        #[arg(long)]
        hours: Option<f64>,
    },
    /// Sky darkness, sidereal time and visible constellations
    Sky {
        #[arg(long, value_parser = parse_instant)]
        at: Option<DateTime<Utc>>,
    },
    /// Summary centred on the focus object
    Status {
        /// Overrides passes.focus_norad_id
        #[arg(long)]
        focus: Option<u32>,
        #[arg(long, value_parser = parse_instant)]
        at: Option<DateTime<Utc>>,
    },
    /// Write a sun/moon table sampled from the built-in series
    Ephemeris {
        #[arg(long)]
        out: PathBuf,
        #[arg(long, value_parser = parse_instant)]
        start: DateTime<Utc>,
        #[arg(long, default_value_t = 30)]
        days: u32,
        #[arg(long, default_value = "1h", value_parser = parse_duration)]
        step: Duration,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Ephemeris {
            out,
            start,
            days,
            step,
        } => write_ephemeris(&out, start, days, step),
        command => run(&cli.config, command).await,
    }
}

async fn run(config_path: &Path, command: Commands) -> ExitCode {
    let config = match Config::from_file(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading {}: {}", config_path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let tracker = match build_tracker(&config) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match command {
        Commands::Refresh { force } => match tracker.refresh_catalog(force).await {
            Ok(outcome) => print_json(&outcome.report()),
            Err(e) => {
                eprintln!("Catalog refresh failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Visible { at, min_elevation } => {
            if let Err(code) = load_catalog(&tracker).await {
                return code;
            }
            let min_elevation = min_elevation.unwrap_or(config.visibility.min_elevation_deg);
            let visible = tracker
                .visible_objects(at.unwrap_or_else(Utc::now), min_elevation)
                .await;
            print_json(&visible)
        }
        Commands::NextPass {
            norad_id,
            at,
            hours,
        } => {
            if let Err(code) = load_catalog(&tracker).await {
                return code;
            }
            match tracker.next_pass(norad_id, at.unwrap_or_else(Utc::now), hours) {
                Ok(pass) => print_json(&pass),
                Err(e) => {
                    eprintln!("Pass prediction failed: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Sky { at } => match tracker.sky_snapshot(at.unwrap_or_else(Utc::now)).await {
            Ok(snapshot) => print_json(&snapshot),
            Err(e) => {
                eprintln!("Sky snapshot failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Status { focus, at } => {
            if let Err(code) = load_catalog(&tracker).await {
                return code;
            }
            let summary = tracker
                .satellite_summary(
                    focus.unwrap_or(config.passes.focus_norad_id),
                    at.unwrap_or_else(Utc::now),
                    config.visibility.min_elevation_deg,
                )
                .await;
            print_json(&summary)
        }
        Commands::Ephemeris { .. } => unreachable!("handled before loading configuration"),
    }
}

fn build_tracker(config: &Config) -> Result<Tracker<ConfiguredFeed>, ConfigError> {
    let observer = config.observer()?;
    let passes = config.pass_search()?;
    let feed = config.feed();
    log::debug!(
        "Station {} at {:.4}, {:.4}, catalog feed {}",
        config.station.name.as_deref().unwrap_or("(unnamed)"),
        observer.latitude_deg,
        observer.longitude_deg,
        feed.describe()
    );

    Ok(Tracker::new(
        observer,
        CatalogManager::new(feed, config.catalog.cache_lifetime),
        passes,
        SkyEngine::new(config.ephemeris_source()),
        config.passes.horizon_hours,
    ))
}

async fn load_catalog(tracker: &Tracker<ConfiguredFeed>) -> Result<(), ExitCode> {
    match tracker.refresh_catalog(false).await {
        Ok(_) => Ok(()),
        Err(e) => {
            eprintln!("No catalog available: {}", e);
            Err(ExitCode::FAILURE)
        }
    }
}

fn write_ephemeris(out: &Path, start: DateTime<Utc>, days: u32, step: Duration) -> ExitCode {
    let step_seconds = match u32::try_from(step.num_seconds()) {
        Ok(s) if s > 0 => s,
        _ => {
            eprintln!("Step must be between 1s and {}s", u32::MAX);
            return ExitCode::FAILURE;
        }
    };
    let count = (u64::from(days) * 86_400).div_ceil(u64::from(step_seconds)) + 1;
    let Ok(count) = u32::try_from(count) else {
        eprintln!("Too many samples: {}", count);
        return ExitCode::FAILURE;
    };

    let table = match EphemerisTable::from_builtin(start, step_seconds, count) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error building table: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = table.write(out) {
        eprintln!("Error writing {}: {}", out.display(), e);
        return ExitCode::FAILURE;
    }
    println!(
        "Wrote {} samples from {} to {} into {}",
        table.len(),
        table.start(),
        table.end(),
        out.display()
    );
    ExitCode::SUCCESS
}

fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error encoding output: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn parse_instant(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn instants_are_rfc3339() {
        assert_eq!(
            parse_instant("2024-01-01T12:00:00+02:00").unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
        );
        assert!(parse_instant("tomorrow").is_err());
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "skywatch",
            "--config",
            "station.yaml",
            "visible",
            "--min-elevation",
            "-5",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("station.yaml"));
        assert!(matches!(
            cli.command,
            Commands::Visible {
                at: None,
                min_elevation: Some(m)
            } if m == -5.0
        ));

        let cli = Cli::try_parse_from(["skywatch", "next-pass", "25544", "--hours", "12"]).unwrap();
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));
        assert!(matches!(
            cli.command,
            Commands::NextPass {
                norad_id: 25544,
                hours: Some(h),
                ..
            } if h == 12.0
        ));
    }

    #[test]
    fn ephemeris_command_writes_a_loadable_table() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("sky.eph");
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let code = write_ephemeris(&out, start, 2, Duration::hours(1));
        assert_eq!(code, ExitCode::SUCCESS);
        let table = EphemerisTable::read(&out).unwrap();
        assert_eq!(table.len(), 49);
        assert_eq!(table.end(), start + Duration::days(2));

        let code = write_ephemeris(&out, start, 2, Duration::zero());
        assert_eq!(code, ExitCode::FAILURE);
    }
}
