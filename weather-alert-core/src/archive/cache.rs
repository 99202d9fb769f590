use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// On-disk store of raw archive response bodies, keyed by request URL.
///
/// Entries never expire; historical data does not change once served.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
}

impl ResponseCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let hash = blake3::hash(key.as_bytes());
        self.dir.join(format!("{}.json", hash.to_hex()))
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let path = self.entry_path(key);
        match fs::read_to_string(&path).await {
            Ok(body) => {
                info!(path = %path.display(), "Archive cache hit");
                Some(body)
            }
            Err(_) => {
                debug!(path = %path.display(), "Archive cache miss");
                None
            }
        }
    }

    pub async fn put(&self, key: &str, body: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create cache directory: {}", self.dir.display()))?;

        let path = self.entry_path(key);
        fs::write(&path, body)
            .await
            .with_context(|| format!("Failed to write cache entry: {}", path.display()))?;

        info!(path = %path.display(), "Cached archive response");
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        let path = self.entry_path(key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to delete cache entry: {}", path.display())),
        }
    }
}
