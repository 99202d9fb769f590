use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::{
    alert::{AlertEvent, evaluate},
    archive::ArchiveFetcher,
    config::Config,
    model::LocationInfo,
    notify::Notifier,
    table::HourlyTable,
};

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub location: LocationInfo,
    pub table: HourlyTable,
    pub alerts: Vec<AlertEvent>,
    pub output: PathBuf,
}

/// Fetch, persist, evaluate, notify.
///
/// The table is written before any alert is evaluated; if the fetch or
/// the write fails, no alerts are produced.
pub async fn run(
    config: &Config,
    fetcher: &dyn ArchiveFetcher,
    notifier: &dyn Notifier,
) -> Result<RunReport> {
    config.validate().context("Invalid configuration")?;

    let request = config.archive_request();
    info!(
        start = %request.start_date,
        end = %request.end_date,
        timezone = %request.timezone,
        "Fetching hourly archive data"
    );

    let response = fetcher.fetch_hourly(&request).await?;
    let table = HourlyTable::from_response(&response)?;

    let expected = request.expected_hours();
    if table.len() as i64 != expected {
        warn!(
            rows = table.len(),
            expected, "Archive returned an unexpected number of hourly records"
        );
    }

    table.write_csv(&config.output).await?;

    let mut alerts = Vec::new();
    for event in evaluate(&table.records, config.thresholds()) {
        notifier
            .send(&event.notification())
            .await
            .with_context(|| format!("Failed to deliver {} alert", event.kind))?;
        alerts.push(event);
    }

    info!(rows = table.len(), alerts = alerts.len(), "Run complete");

    Ok(RunReport {
        location: response.location,
        table,
        alerts,
        output: config.output.clone(),
    })
}
