use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::catalog::{
    ConfiguredFeed, FileFeed, HttpFeed, CELESTRAK_STATIONS_URL, DEFAULT_CACHE_LIFETIME,
};
use crate::predict::{horizon_from_hours, Observer, PassSearch};
use crate::sky::EphemerisSource;

pub const DEFAULT_CONFIG_PATH: &str = "skywatch.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub station: StationConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub passes: PassesConfig,
    #[serde(default)]
    pub visibility: VisibilityConfig,
    #[serde(default)]
    pub sky: SkyConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StationConfig {
    pub name: Option<String>,
    pub coordinates: String,
    #[serde(default)]
    pub altitude_m: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    pub url: Option<String>,
    /// Takes precedence over `url`.
    pub file: Option<PathBuf>,
    #[serde(
        default = "default_cache_lifetime",
        deserialize_with = "deserialize_duration"
    )]
    pub cache_lifetime: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            url: None,
            file: None,
            cache_lifetime: default_cache_lifetime(),
        }
    }
}

fn default_cache_lifetime() -> Duration {
    DEFAULT_CACHE_LIFETIME
}

#[derive(Debug, Clone, Deserialize)]
pub struct PassesConfig {
    #[serde(default = "default_coarse_step", deserialize_with = "deserialize_duration")]
    pub coarse_step: Duration,
    #[serde(default = "default_fine_step", deserialize_with = "deserialize_duration")]
    pub fine_step: Duration,
    #[serde(default = "default_resolution", deserialize_with = "deserialize_duration")]
    pub resolution: Duration,
    #[serde(default = "default_horizon_hours")]
    pub horizon_hours: f64,
    #[serde(default = "default_focus_norad_id")]
    pub focus_norad_id: u32,
}

impl Default for PassesConfig {
    fn default() -> Self {
        Self {
            coarse_step: default_coarse_step(),
            fine_step: default_fine_step(),
            resolution: default_resolution(),
            horizon_hours: default_horizon_hours(),
            focus_norad_id: default_focus_norad_id(),
        }
    }
}

fn default_coarse_step() -> Duration {
    Duration::minutes(6)
}

fn default_fine_step() -> Duration {
    Duration::minutes(1)
}

fn default_resolution() -> Duration {
    Duration::seconds(1)
}

fn default_horizon_hours() -> f64 {
    24.0
}

fn default_focus_norad_id() -> u32 {
    25544
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VisibilityConfig {
    #[serde(default)]
    pub min_elevation_deg: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SkyConfig {
    pub ephemeris: Option<PathBuf>,
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.observer()?;
        self.pass_search()?;
        horizon_from_hours(self.passes.horizon_hours)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.catalog.cache_lifetime <= Duration::zero() {
            return Err(ConfigError::Invalid(
                "catalog.cache_lifetime must be positive".into(),
            ));
        }
        if !(-90.0..=90.0).contains(&self.visibility.min_elevation_deg) {
            return Err(ConfigError::Invalid(format!(
                "visibility.min_elevation_deg {} is not an elevation",
                self.visibility.min_elevation_deg
            )));
        }
        Ok(())
    }

    pub fn observer(&self) -> Result<Observer, ConfigError> {
        Observer::from_coordinates(&self.station.coordinates, Some(self.station.altitude_m))
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "station.coordinates {:?} is not \"lat, lon\"",
                    self.station.coordinates
                ))
            })
    }

    pub fn pass_search(&self) -> Result<PassSearch, ConfigError> {
        PassSearch::new(
            self.passes.coarse_step,
            self.passes.fine_step,
            self.passes.resolution,
        )
        .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn feed(&self) -> ConfiguredFeed {
        match (&self.catalog.file, &self.catalog.url) {
            (Some(path), _) => ConfiguredFeed::File(FileFeed::new(path.clone())),
            (None, Some(url)) => ConfiguredFeed::Http(HttpFeed::new(url.clone())),
            (None, None) => ConfiguredFeed::Http(HttpFeed::new(CELESTRAK_STATIONS_URL)),
        }
    }

    pub fn ephemeris_source(&self) -> EphemerisSource {
        match &self.sky.ephemeris {
            Some(path) => EphemerisSource::Table(path.clone()),
            None => EphemerisSource::Builtin,
        }
    }
}

pub fn parse_duration(s: &str) -> Result<Duration, String> {
    humantime::parse_duration(s.trim())
        .map_err(|e| e.to_string())
        .and_then(|d| Duration::from_std(d).map_err(|e| e.to_string()))
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_duration(&raw).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FeedSource;

    const MINIMAL: &str = "station:\n  coordinates: \"52.0, 4.5\"\n";

    #[test]
    fn minimal_config_takes_defaults() {
        let config = Config::from_str(MINIMAL).unwrap();
        assert_eq!(config.station.altitude_m, 0.0);
        assert_eq!(config.catalog.cache_lifetime, Duration::hours(24));
        assert_eq!(config.passes.coarse_step, Duration::minutes(6));
        assert_eq!(config.passes.fine_step, Duration::minutes(1));
        assert_eq!(config.passes.horizon_hours, 24.0);
        assert_eq!(config.passes.focus_norad_id, 25544);
        assert_eq!(config.visibility.min_elevation_deg, 0.0);
        assert_eq!(config.ephemeris_source(), EphemerisSource::Builtin);
        assert_eq!(config.feed().describe(), CELESTRAK_STATIONS_URL);
        assert_eq!(config.pass_search().unwrap(), PassSearch::default());
    }

    #[test]
    fn full_config() {
        let yaml = r#"
station:
  name: Rooftop
  coordinates: "40.0, -75.0"
  altitude_m: 120
catalog:
  file: /var/lib/skywatch/stations.txt
  cache_lifetime: 6h
passes:
  coarse_step: 3m
  fine_step: 30s
  resolution: 500ms
  horizon_hours: 48
  focus_norad_id: 20580
visibility:
  min_elevation_deg: 10
sky:
  ephemeris: /var/lib/skywatch/sky.eph
"#;
        let config = Config::from_str(yaml).unwrap();
        assert_eq!(config.station.name.as_deref(), Some("Rooftop"));
        let observer = config.observer().unwrap();
        assert_eq!(observer.latitude_deg, 40.0);
        assert_eq!(observer.altitude_m, 120.0);
        assert_eq!(config.catalog.cache_lifetime, Duration::hours(6));
        assert_eq!(config.passes.resolution, Duration::milliseconds(500));
        assert_eq!(config.passes.focus_norad_id, 20580);
        assert_eq!(config.feed().describe(), "/var/lib/skywatch/stations.txt");
        assert_eq!(
            config.ephemeris_source(),
            EphemerisSource::Table(PathBuf::from("/var/lib/skywatch/sky.eph"))
        );
    }

    #[test]
    fn custom_url_is_used() {
        let yaml = format!("{}catalog:\n  url: https://example.org/tle.txt\n", MINIMAL);
        let config = Config::from_str(&yaml).unwrap();
        assert_eq!(config.feed().describe(), "https://example.org/tle.txt");
    }

    #[test]
    fn invalid_values_are_rejected() {
        let bad_coordinates = "station:\n  coordinates: \"north\"\n";
        assert!(matches!(
            Config::from_str(bad_coordinates),
            Err(ConfigError::Invalid(_))
        ));

        let bad_duration = format!("{}passes:\n  coarse_step: soon\n", MINIMAL);
        assert!(matches!(
            Config::from_str(&bad_duration),
            Err(ConfigError::Yaml(_))
        ));

        let zero_step = format!("{}passes:\n  fine_step: 0s\n", MINIMAL);
        assert!(matches!(
            Config::from_str(&zero_step),
            Err(ConfigError::Invalid(_))
        ));

        let bad_horizon = format!("{}passes:\n  horizon_hours: -1\n", MINIMAL);
        assert!(matches!(
            Config::from_str(&bad_horizon),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            Config::from_file("/nonexistent/skywatch.yaml"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn durations_parse_like_humantime() {
        assert_eq!(parse_duration("90m").unwrap(), Duration::minutes(90));
        assert_eq!(parse_duration(" 1h 30m ").unwrap(), Duration::minutes(90));
        assert!(parse_duration("later").is_err());
    }
}
