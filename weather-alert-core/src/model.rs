use anyhow::{Result, anyhow};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt};

/// Hourly variables understood by the archive client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HourlyVariable {
    Temperature2m,
    RelativeHumidity2m,
    Precipitation,
    Rain,
    Snowfall,
    WeatherCode,
    WindSpeed10m,
}

impl HourlyVariable {
    pub fn as_str(&self) -> &'static str {
        match self {
            HourlyVariable::Temperature2m => "temperature_2m",
            HourlyVariable::RelativeHumidity2m => "relative_humidity_2m",
            HourlyVariable::Precipitation => "precipitation",
            HourlyVariable::Rain => "rain",
            HourlyVariable::Snowfall => "snowfall",
            HourlyVariable::WeatherCode => "weather_code",
            HourlyVariable::WindSpeed10m => "wind_speed_10m",
        }
    }

    /// All variables, in the order the archive is queried by default.
    pub const fn all() -> &'static [HourlyVariable] {
        &[
            HourlyVariable::Temperature2m,
            HourlyVariable::RelativeHumidity2m,
            HourlyVariable::Precipitation,
            HourlyVariable::Rain,
            HourlyVariable::Snowfall,
            HourlyVariable::WeatherCode,
            HourlyVariable::WindSpeed10m,
        ]
    }
}

impl fmt::Display for HourlyVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for HourlyVariable {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.trim().to_lowercase();

        HourlyVariable::all()
            .iter()
            .copied()
            .find(|v| v.as_str() == lower)
            .ok_or_else(|| {
                let supported: Vec<&str> =
                    HourlyVariable::all().iter().map(|v| v.as_str()).collect();
                anyhow!(
                    "Unknown hourly variable '{value}'. Supported variables: {}.",
                    supported.join(", ")
                )
            })
    }
}

impl TryFrom<String> for HourlyVariable {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        HourlyVariable::try_from(value.as_str())
    }
}

impl From<HourlyVariable> for String {
    fn from(value: HourlyVariable) -> Self {
        value.as_str().to_string()
    }
}

/// Parameters of one archive query.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub start_date: NaiveDate,
    /// Inclusive; the served range ends at `end_date` 24:00.
    pub end_date: NaiveDate,
    pub hourly: Vec<HourlyVariable>,
    pub timezone: String,
}

impl ArchiveRequest {
    /// Number of whole days covered by the request.
    pub fn days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    /// Number of hourly records a complete response contains.
    pub fn expected_hours(&self) -> i64 {
        self.days().max(0) * 24
    }
}

/// Grid cell metadata reported by the archive.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationInfo {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
    pub timezone: String,
    pub timezone_abbreviation: String,
    pub utc_offset_seconds: i32,
}

/// Values of one variable, aligned to the series time axis.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableSeries {
    pub variable: HourlyVariable,
    pub values: Vec<Option<f64>>,
}

/// Columnar hourly data on a regular time grid.
///
/// The axis runs from `start_time` (inclusive) to `end_time` (exclusive)
/// in steps of `interval_seconds`, all as unix seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlySeries {
    pub start_time: i64,
    pub end_time: i64,
    pub interval_seconds: i64,
    pub variables: Vec<VariableSeries>,
}

impl HourlySeries {
    /// Rebuild the time axis described by start, end and interval.
    pub fn timestamps(&self) -> Result<Vec<DateTime<Utc>>> {
        if self.interval_seconds <= 0 {
            return Err(anyhow!(
                "Invalid series interval of {} seconds",
                self.interval_seconds
            ));
        }
        if self.end_time < self.start_time {
            return Err(anyhow!(
                "Series ends ({}) before it starts ({})",
                self.end_time,
                self.start_time
            ));
        }

        (self.start_time..self.end_time)
            .step_by(self.interval_seconds as usize)
            .map(|ts| {
                DateTime::<Utc>::from_timestamp(ts, 0)
                    .ok_or_else(|| anyhow!("Timestamp {ts} is out of range"))
            })
            .collect()
    }

    pub fn variable(&self, variable: HourlyVariable) -> Option<&VariableSeries> {
        self.variables.iter().find(|s| s.variable == variable)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveResponse {
    pub location: LocationInfo,
    pub hourly: HourlySeries,
}

/// One row of the hourly table. `None` marks a missing reading.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HourlyRecord {
    pub timestamp: DateTime<Utc>,
    pub temperature_2m: Option<f64>,
    pub relative_humidity_2m: Option<f64>,
    pub precipitation: Option<f64>,
    pub rain: Option<f64>,
    pub snowfall: Option<f64>,
    pub weather_code: Option<f64>,
    pub wind_speed_10m: Option<f64>,
}

impl HourlyRecord {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            ..Default::default()
        }
    }

    pub fn value(&self, variable: HourlyVariable) -> Option<f64> {
        match variable {
            HourlyVariable::Temperature2m => self.temperature_2m,
            HourlyVariable::RelativeHumidity2m => self.relative_humidity_2m,
            HourlyVariable::Precipitation => self.precipitation,
            HourlyVariable::Rain => self.rain,
            HourlyVariable::Snowfall => self.snowfall,
            HourlyVariable::WeatherCode => self.weather_code,
            HourlyVariable::WindSpeed10m => self.wind_speed_10m,
        }
    }

    pub fn set_value(&mut self, variable: HourlyVariable, value: Option<f64>) {
        let slot = match variable {
            HourlyVariable::Temperature2m => &mut self.temperature_2m,
            HourlyVariable::RelativeHumidity2m => &mut self.relative_humidity_2m,
            HourlyVariable::Precipitation => &mut self.precipitation,
            HourlyVariable::Rain => &mut self.rain,
            HourlyVariable::Snowfall => &mut self.snowfall,
            HourlyVariable::WeatherCode => &mut self.weather_code,
            HourlyVariable::WindSpeed10m => &mut self.wind_speed_10m,
        };
        *slot = value;
    }
}

/// Render a timestamp the way it appears in the table and alert messages.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%:z").to_string()
}

/// Render a measurement the way it appears in the table and alert messages.
///
/// Whole numbers keep one decimal place (`25.0`, not `25`).
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}
