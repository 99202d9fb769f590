use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveDate;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    alert::Thresholds,
    archive::openmeteo::ArchiveSettings,
    model::{ArchiveRequest, HourlyVariable},
    notify::NotifierKind,
};

/// Run configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// latitude = 49.2497
/// longitude = -123.1193
/// start_date = "2024-06-21"
/// end_date = "2024-07-07"
/// timezone = "America/Los_Angeles"
///
/// [archive]
/// cache = true
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub latitude: f64,
    pub longitude: f64,
    pub start_date: NaiveDate,
    /// Inclusive last day of the range.
    pub end_date: NaiveDate,
    /// IANA timezone name, or "auto" to let the archive resolve it.
    pub timezone: String,
    /// Rain alert fires above this many millimetres.
    pub rain_threshold: f64,
    /// Temperature alert fires above this many degrees Celsius.
    pub temperature_threshold: f64,
    /// Where the hourly CSV table is written.
    pub output: PathBuf,
    pub notifier: NotifierKind,
    /// Requested variables, in column order.
    pub hourly: Vec<HourlyVariable>,
    pub archive: ArchiveSettings,
}

impl Default for Config {
    fn default() -> Self {
        let thresholds = Thresholds::default();
        Self {
            latitude: 49.2497,
            longitude: -123.1193,
            start_date: NaiveDate::from_ymd_opt(2024, 6, 21).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2024, 7, 7).unwrap_or_default(),
            timezone: "America/Los_Angeles".to_string(),
            rain_threshold: thresholds.rain,
            temperature_threshold: thresholds.temperature,
            output: PathBuf::from("Weather_Hourly.csv"),
            notifier: NotifierKind::default(),
            hourly: HourlyVariable::all().to_vec(),
            archive: ArchiveSettings::default(),
        }
    }
}

impl Config {
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            rain: self.rain_threshold,
            temperature: self.temperature_threshold,
        }
    }

    pub fn archive_request(&self) -> ArchiveRequest {
        ArchiveRequest {
            latitude: self.latitude,
            longitude: self.longitude,
            start_date: self.start_date,
            end_date: self.end_date,
            hourly: self.hourly.clone(),
            timezone: self.timezone.clone(),
        }
    }

    /// Check the values a run depends on before any I/O happens.
    pub fn validate(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            bail!("Latitude {} is out of range (-90 to 90)", self.latitude);
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            bail!("Longitude {} is out of range (-180 to 180)", self.longitude);
        }
        if self.start_date > self.end_date {
            bail!(
                "Start date {} is after end date {}",
                self.start_date,
                self.end_date
            );
        }
        if self.timezone != "auto" {
            self.timezone
                .parse::<chrono_tz::Tz>()
                .map_err(|_| anyhow!("Unknown timezone '{}'", self.timezone))?;
        }
        if !self.rain_threshold.is_finite() || !self.temperature_threshold.is_finite() {
            bail!("Alert thresholds must be finite numbers");
        }
        if self.hourly.is_empty() {
            bail!("At least one hourly variable must be requested");
        }
        for (i, variable) in self.hourly.iter().enumerate() {
            if self.hourly[..i].contains(variable) {
                bail!("Hourly variable '{variable}' is listed more than once");
            }
        }
        for required in [HourlyVariable::Temperature2m, HourlyVariable::Rain] {
            if !self.hourly.contains(&required) {
                bail!("Hourly variables must include '{required}', which alerts are evaluated on");
            }
        }
        Ok(())
    }

    /// Load config from the platform config file.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    /// Load config from `path`, or defaults if it doesn't exist yet.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, use the built-in defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to the platform config file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml = self.to_toml()?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }
}

/// Platform cache directory for archive responses.
pub fn default_cache_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.cache_dir().join("archive"))
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "weather-alert", "weather-alert")
        .ok_or_else(|| anyhow!("Could not determine platform config directory"))
}
