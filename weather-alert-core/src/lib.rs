//! Core library for the `weather-alert` CLI.
//!
//! This crate defines:
//! - Run configuration
//! - The historical archive client (HTTP, on-disk cache, bounded retry)
//! - The hourly table and its CSV form
//! - Rain / high-temperature alert evaluation and notification sinks
//!
//! It is used by `weather-alert-cli`, but the pipeline takes its fetcher and
//! notifier as arguments so other binaries or tests can supply their own.

pub mod alert;
pub mod archive;
pub mod config;
pub mod model;
pub mod notify;
pub mod pipeline;
pub mod table;

pub use alert::{AlertEvent, AlertKind, Thresholds, evaluate};
pub use archive::{ArchiveFetcher, FetchError, OpenMeteoArchive, openmeteo::ArchiveSettings};
pub use config::Config;
pub use model::{
    ArchiveRequest, ArchiveResponse, HourlyRecord, HourlySeries, HourlyVariable, LocationInfo,
    VariableSeries, format_number, format_timestamp,
};
pub use notify::{ConsoleNotifier, LogNotifier, Notification, Notifier, NotifierKind};
pub use pipeline::{RunReport, run};
pub use table::HourlyTable;
