//! Row-oriented view of an archive response and its CSV form.

use anyhow::{Context, Result, anyhow};
use std::{io::Write, path::Path};
use tokio::fs;
use tracing::info;

use crate::model::{
    ArchiveResponse, HourlyRecord, HourlyVariable, format_number, format_timestamp,
};

/// Hourly records in chronological order, plus the column order they
/// were requested in.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HourlyTable {
    pub columns: Vec<HourlyVariable>,
    pub records: Vec<HourlyRecord>,
}

impl HourlyTable {
    pub fn from_response(response: &ArchiveResponse) -> Result<Self> {
        let timestamps = response.hourly.timestamps()?;
        let mut records: Vec<HourlyRecord> =
            timestamps.into_iter().map(HourlyRecord::new).collect();

        let mut columns = Vec::with_capacity(response.hourly.variables.len());
        for series in &response.hourly.variables {
            if series.values.len() != records.len() {
                return Err(anyhow!(
                    "Column '{}' has {} values but the time axis has {} entries",
                    series.variable,
                    series.values.len(),
                    records.len()
                ));
            }
            for (record, value) in records.iter_mut().zip(&series.values) {
                record.set_value(series.variable, *value);
            }
            columns.push(series.variable);
        }

        Ok(Self { columns, records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn header(&self) -> Vec<&'static str> {
        std::iter::once("date")
            .chain(self.columns.iter().map(|c| c.as_str()))
            .collect()
    }

    /// Cells of one row as they are written to CSV; missing values are empty.
    pub fn row_cells(&self, record: &HourlyRecord) -> Vec<String> {
        std::iter::once(format_timestamp(&record.timestamp))
            .chain(self.columns.iter().map(|c| format_value(record.value(*c))))
            .collect()
    }

    pub fn write_csv_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(self.header())
            .context("Failed to write CSV header")?;
        for record in &self.records {
            csv.write_record(self.row_cells(record))
                .context("Failed to write CSV row")?;
        }
        csv.flush().context("Failed to flush CSV output")?;
        Ok(())
    }

    /// Write the table to `path`, creating parent directories as needed.
    pub async fn write_csv(&self, path: &Path) -> Result<()> {
        let mut buf = Vec::new();
        self.write_csv_to(&mut buf)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.with_context(|| {
                    format!("Failed to create output directory: {}", parent.display())
                })?;
            }
        }

        fs::write(path, buf)
            .await
            .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;

        info!(path = %path.display(), rows = self.len(), "Wrote hourly table");
        Ok(())
    }
}

fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) if !v.is_nan() => format_number(v),
        _ => String::new(),
    }
}
