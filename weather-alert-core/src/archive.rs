use crate::model::{ArchiveRequest, ArchiveResponse};
use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

pub mod cache;
pub mod openmeteo;
pub mod retry;

pub use cache::ResponseCache;
pub use openmeteo::OpenMeteoArchive;
pub use retry::{RetryPolicy, Retryable};

/// Source of historical hourly data.
#[async_trait]
pub trait ArchiveFetcher: Send + Sync + Debug {
    async fn fetch_hourly(&self, request: &ArchiveRequest) -> anyhow::Result<ArchiveResponse>;
}

/// Failures of a single archive round trip.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid coordinates ({latitude}, {longitude}): latitude must be -90 to 90, longitude -180 to 180")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    #[error("Request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Archive request failed with status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Archive rejected the request: {reason}")]
    Api { reason: String },

    #[error("Malformed archive response: {0}")]
    Malformed(String),
}

impl Retryable for FetchError {
    fn is_retryable(&self) -> bool {
        match self {
            FetchError::Request { source, .. } => {
                source.is_connect() || source.is_timeout() || source.is_request()
            }
            FetchError::Status { status, .. } => matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504),
            FetchError::InvalidCoordinates { .. } | FetchError::Api { .. } | FetchError::Malformed(_) => {
                false
            }
        }
    }
}
