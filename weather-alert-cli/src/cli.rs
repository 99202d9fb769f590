use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use inquire::{CustomType, Select, Text};
use std::path::PathBuf;
use weather_alert_core::{Config, NotifierKind, OpenMeteoArchive};

use crate::output;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-alert", version, about = "Historical weather alerts")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct ConfigArg {
    /// Config file to use instead of the platform default.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl ConfigArg {
    fn path(&self) -> anyhow::Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => Config::config_file_path(),
        }
    }

    fn load(&self) -> anyhow::Result<Config> {
        match &self.config {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Loading configuration");
                Config::load_from(path)
            }
            None => Config::load(),
        }
    }

    fn save(&self, cfg: &Config) -> anyhow::Result<()> {
        match &self.config {
            Some(path) => cfg.save_to(path),
            None => cfg.save(),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch hourly data, write the CSV table and emit alerts.
    Run {
        #[command(flatten)]
        config: ConfigArg,

        /// First day of the range (YYYY-MM-DD).
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Last day of the range, inclusive (YYYY-MM-DD).
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Where to write the hourly CSV table.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Always query the archive, ignoring cached responses.
        #[arg(long)]
        no_cache: bool,
    },

    /// Interactively edit and save the configuration.
    Configure {
        #[command(flatten)]
        config: ConfigArg,
    },

    /// Print the effective configuration.
    ShowConfig {
        #[command(flatten)]
        config: ConfigArg,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Run {
                config,
                start,
                end,
                output: out,
                no_cache,
            } => {
                let mut cfg = config.load()?;
                if let Some(start) = start {
                    cfg.start_date = start;
                }
                if let Some(end) = end {
                    cfg.end_date = end;
                }
                if let Some(out) = out {
                    cfg.output = out;
                }
                if no_cache {
                    cfg.archive.cache = false;
                }

                let fetcher = OpenMeteoArchive::new(&cfg.archive)?;
                match fetcher.cache() {
                    Some(cache) => {
                        tracing::debug!(dir = %cache.dir().display(), "Archive cache enabled")
                    }
                    None => tracing::debug!("Archive cache disabled"),
                }
                let notifier = cfg.notifier.build();

                let report = weather_alert_core::run(&cfg, &fetcher, notifier.as_ref()).await?;
                output::print_report(&report);
            }
            Command::Configure { config } => {
                let path = config.path()?;
                let updated = prompt_config(config.load()?)?;
                updated.validate()?;
                config.save(&updated)?;
                println!("Configuration saved to {}", path.display());
            }
            Command::ShowConfig { config } => {
                let path = config.path()?;
                let cfg = config.load()?;
                println!("# {}", path.display());
                print!("{}", cfg.to_toml()?);
            }
        }

        Ok(())
    }
}

fn prompt_config(mut cfg: Config) -> anyhow::Result<Config> {
    cfg.latitude = CustomType::<f64>::new("Latitude:")
        .with_default(cfg.latitude)
        .prompt()
        .context("Latitude prompt failed")?;
    cfg.longitude = CustomType::<f64>::new("Longitude:")
        .with_default(cfg.longitude)
        .prompt()
        .context("Longitude prompt failed")?;
    cfg.timezone = Text::new("Timezone (IANA name or \"auto\"):")
        .with_default(&cfg.timezone)
        .prompt()
        .context("Timezone prompt failed")?;
    cfg.start_date = CustomType::<NaiveDate>::new("Start date (YYYY-MM-DD):")
        .with_default(cfg.start_date)
        .prompt()
        .context("Start date prompt failed")?;
    cfg.end_date = CustomType::<NaiveDate>::new("End date (YYYY-MM-DD, inclusive):")
        .with_default(cfg.end_date)
        .prompt()
        .context("End date prompt failed")?;
    cfg.rain_threshold = CustomType::<f64>::new("Rain threshold (mm):")
        .with_default(cfg.rain_threshold)
        .prompt()
        .context("Rain threshold prompt failed")?;
    cfg.temperature_threshold = CustomType::<f64>::new("Temperature threshold (°C):")
        .with_default(cfg.temperature_threshold)
        .prompt()
        .context("Temperature threshold prompt failed")?;

    let start = NotifierKind::all()
        .iter()
        .position(|k| *k == cfg.notifier)
        .unwrap_or(0);
    cfg.notifier = Select::new("Notify via:", NotifierKind::all().to_vec())
        .with_starting_cursor(start)
        .prompt()
        .context("Notifier prompt failed")?;

    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_accepts_overrides() {
        let cli = Cli::try_parse_from([
            "weather-alert",
            "run",
            "--start",
            "2024-06-01",
            "--end",
            "2024-06-02",
            "--output",
            "out.csv",
            "--no-cache",
        ])
        .unwrap();

        match cli.command {
            Command::Run {
                start,
                end,
                output,
                no_cache,
                ..
            } => {
                assert_eq!(start, NaiveDate::from_ymd_opt(2024, 6, 1));
                assert_eq!(end, NaiveDate::from_ymd_opt(2024, 6, 2));
                assert_eq!(output, Some(PathBuf::from("out.csv")));
                assert!(no_cache);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn bad_date_is_rejected() {
        assert!(Cli::try_parse_from(["weather-alert", "run", "--start", "21/06/2024"]).is_err());
    }
}
