use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::PathBuf, time::Duration};
use tracing::{debug, instrument, warn};

use crate::{
    config,
    model::{ArchiveRequest, ArchiveResponse, HourlySeries, LocationInfo, VariableSeries},
};

use super::{ArchiveFetcher, FetchError, ResponseCache, RetryPolicy};

/// Connection, cache and retry settings of the Open-Meteo archive client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveSettings {
    /// API base URL; the client appends `/archive`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Whether raw responses are cached on disk.
    #[serde(default = "default_cache")]
    pub cache: bool,

    /// Cache location; the platform cache directory when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
}

fn default_base_url() -> String {
    "https://archive-api.open-meteo.com/v1".to_string()
}

const fn default_timeout() -> u64 {
    30
}

const fn default_cache() -> bool {
    true
}

fn default_max_retries() -> u32 {
    RetryPolicy::default().max_retries
}

fn default_backoff_factor() -> f64 {
    RetryPolicy::default().backoff_factor
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            cache: default_cache(),
            cache_dir: None,
            max_retries: default_max_retries(),
            backoff_factor: default_backoff_factor(),
        }
    }
}

impl ArchiveSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            backoff_factor: self.backoff_factor,
        }
    }
}

/// Client for the Open-Meteo historical weather archive.
#[derive(Debug, Clone)]
pub struct OpenMeteoArchive {
    http: Client,
    base_url: String,
    retry: RetryPolicy,
    cache: Option<ResponseCache>,
}

impl OpenMeteoArchive {
    pub fn new(settings: &ArchiveSettings) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        let cache = if settings.cache {
            let dir = match &settings.cache_dir {
                Some(dir) => dir.clone(),
                None => config::default_cache_dir()?,
            };
            Some(ResponseCache::new(dir))
        } else {
            None
        };

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            retry: settings.retry_policy(),
            cache,
        })
    }

    pub fn with_cache(mut self, cache: Option<ResponseCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> Option<&ResponseCache> {
        self.cache.as_ref()
    }

    fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), FetchError> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(FetchError::InvalidCoordinates {
                latitude,
                longitude,
            });
        }
        Ok(())
    }

    fn build_url(&self, request: &ArchiveRequest) -> Result<Url> {
        let endpoint = format!("{}/archive", self.base_url);
        let hourly: Vec<&str> = request.hourly.iter().map(|v| v.as_str()).collect();

        Url::parse_with_params(
            &endpoint,
            &[
                ("latitude", request.latitude.to_string()),
                ("longitude", request.longitude.to_string()),
                ("start_date", request.start_date.format("%Y-%m-%d").to_string()),
                ("end_date", request.end_date.format("%Y-%m-%d").to_string()),
                ("hourly", hourly.join(",")),
                ("timezone", request.timezone.clone()),
                ("timeformat", "unixtime".to_string()),
            ],
        )
        .with_context(|| format!("Invalid archive endpoint: {endpoint}"))
    }

    async fn send_once(&self, url: &Url) -> Result<String, FetchError> {
        debug!(url = %url, "Requesting archive data");

        let res = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;

        if !status.is_success() {
            if let Ok(err) = serde_json::from_str::<OmError>(&body) {
                if err.error {
                    return Err(FetchError::Api { reason: err.reason });
                }
            }
            return Err(FetchError::Status {
                status,
                body: truncate_body(&body),
            });
        }

        Ok(body)
    }

    fn parse_body(body: &str, request: &ArchiveRequest) -> Result<ArchiveResponse, FetchError> {
        if let Ok(err) = serde_json::from_str::<OmError>(body) {
            if err.error {
                return Err(FetchError::Api { reason: err.reason });
            }
        }

        let parsed: OmResponse = serde_json::from_str(body)
            .map_err(|e| FetchError::Malformed(format!("invalid JSON: {e}")))?;

        let hourly = parsed
            .hourly
            .ok_or_else(|| FetchError::Malformed("no hourly block".to_string()))?;

        let (first, last) = match (hourly.time.first(), hourly.time.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Err(FetchError::Malformed("no hourly timestamps".to_string())),
        };

        let out_of_range = || FetchError::Malformed("time axis out of range".to_string());

        let interval_seconds = match hourly.time.get(1) {
            Some(second) => second.checked_sub(first).ok_or_else(out_of_range)?,
            None => 3600,
        };
        if interval_seconds <= 0 {
            return Err(FetchError::Malformed(format!(
                "non-increasing time axis (interval {interval_seconds}s)"
            )));
        }
        for pair in hourly.time.windows(2) {
            if pair[1].checked_sub(pair[0]).ok_or_else(out_of_range)? != interval_seconds {
                return Err(FetchError::Malformed("irregular time axis".to_string()));
            }
        }
        let end_time = last.checked_add(interval_seconds).ok_or_else(out_of_range)?;

        let rows = hourly.time.len();
        let mut variables = Vec::with_capacity(request.hourly.len());
        for variable in &request.hourly {
            let values = hourly.values.get(variable.as_str()).cloned().ok_or_else(|| {
                FetchError::Malformed(format!("missing hourly variable '{variable}'"))
            })?;
            if values.len() != rows {
                return Err(FetchError::Malformed(format!(
                    "variable '{variable}' has {} values for {rows} timestamps",
                    values.len()
                )));
            }
            variables.push(VariableSeries {
                variable: *variable,
                values,
            });
        }

        Ok(ArchiveResponse {
            location: LocationInfo {
                latitude: parsed.latitude,
                longitude: parsed.longitude,
                elevation: parsed.elevation,
                timezone: parsed.timezone,
                timezone_abbreviation: parsed.timezone_abbreviation,
                utc_offset_seconds: parsed.utc_offset_seconds,
            },
            hourly: HourlySeries {
                start_time: first,
                end_time,
                interval_seconds,
                variables,
            },
        })
    }
}

#[derive(Debug, Deserialize)]
struct OmError {
    #[serde(default)]
    error: bool,
    #[serde(default)]
    reason: String,
}

#[derive(Debug, Deserialize)]
struct OmHourly {
    time: Vec<i64>,
    #[serde(flatten)]
    values: HashMap<String, Vec<Option<f64>>>,
}

#[derive(Debug, Deserialize)]
struct OmResponse {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    elevation: f64,
    #[serde(default)]
    utc_offset_seconds: i32,
    #[serde(default)]
    timezone: String,
    #[serde(default)]
    timezone_abbreviation: String,
    hourly: Option<OmHourly>,
}

#[async_trait]
impl ArchiveFetcher for OpenMeteoArchive {
    #[instrument(skip(self, request), fields(lat = %request.latitude, lon = %request.longitude))]
    async fn fetch_hourly(&self, request: &ArchiveRequest) -> Result<ArchiveResponse> {
        Self::validate_coordinates(request.latitude, request.longitude)?;

        let url = self.build_url(request)?;
        let key = url.as_str();

        if let Some(cache) = &self.cache {
            if let Some(body) = cache.get(key).await {
                match Self::parse_body(&body, request) {
                    Ok(response) => return Ok(response),
                    Err(e) => {
                        warn!(error = %e, "Discarding unreadable cache entry");
                        if let Err(e) = cache.remove(key).await {
                            warn!(error = %e, "Failed to remove unreadable cache entry");
                        }
                    }
                }
            }
        }

        let body = self
            .retry
            .run(|| self.send_once(&url))
            .await
            .context("Failed to fetch hourly data from the Open-Meteo archive")?;

        let response = Self::parse_body(&body, request)
            .context("Failed to parse Open-Meteo archive response")?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(key, &body).await {
                warn!(error = %e, "Failed to cache archive response");
            }
        }

        Ok(response)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
