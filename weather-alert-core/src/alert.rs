//! Threshold alerts over hourly records.
//!
//! Each record is checked on its own: no state is carried between hours,
//! so five rainy hours in a row produce five rain alerts.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::model::{HourlyRecord, format_number, format_timestamp};
use crate::notify::Notification;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertKind {
    RainDetected,
    HighTemperature,
}

impl AlertKind {
    pub fn subject(&self) -> &'static str {
        match self {
            AlertKind::RainDetected => "Weather Alert: Rain Detected",
            AlertKind::HighTemperature => "Weather Alert: High Temperature",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertKind::RainDetected => f.write_str("rain"),
            AlertKind::HighTemperature => f.write_str("high-temperature"),
        }
    }
}

/// A single threshold breach at a single hour.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertEvent {
    pub kind: AlertKind,
    pub timestamp: DateTime<Utc>,
    /// Reading that crossed the threshold (mm of rain or °C).
    pub value: f64,
    pub message: String,
}

impl AlertEvent {
    fn rain(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self {
            kind: AlertKind::RainDetected,
            timestamp,
            value,
            message: format!("Rain was detected on {}.", format_timestamp(&timestamp)),
        }
    }

    fn high_temperature(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self {
            kind: AlertKind::HighTemperature,
            timestamp,
            value,
            message: format!(
                "High temperature of {}°C detected on {}.",
                format_number(value),
                format_timestamp(&timestamp)
            ),
        }
    }

    pub fn notification(&self) -> Notification {
        Notification {
            subject: self.kind.subject().to_string(),
            body: self.message.clone(),
        }
    }
}

/// Alert thresholds. Both comparisons are strict.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Millimetres of rain that must be exceeded.
    pub rain: f64,
    /// Degrees Celsius that must be exceeded.
    pub temperature: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            rain: 0.0,
            temperature: 24.0,
        }
    }
}

impl Thresholds {
    /// Events for one record, rain first. Missing or NaN readings never fire.
    pub fn check(&self, record: &HourlyRecord) -> impl Iterator<Item = AlertEvent> + use<> {
        let rain = present(record.rain)
            .filter(|v| *v > self.rain)
            .map(|v| AlertEvent::rain(record.timestamp, v));
        let temperature = present(record.temperature_2m)
            .filter(|v| *v > self.temperature)
            .map(|v| AlertEvent::high_temperature(record.timestamp, v));

        [rain, temperature].into_iter().flatten()
    }
}

fn present(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}

/// Lazily evaluate `records` in order, yielding every threshold breach.
pub fn evaluate<'a, I>(records: I, thresholds: Thresholds) -> impl Iterator<Item = AlertEvent> + 'a
where
    I: IntoIterator<Item = &'a HourlyRecord>,
    I::IntoIter: 'a,
{
    records
        .into_iter()
        .flat_map(move |record| thresholds.check(record))
}
