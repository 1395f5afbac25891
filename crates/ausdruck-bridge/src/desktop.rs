// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Desktop capability implementations: HTTP asset fetching with `reqwest` and
// save-to-directory delivery.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CACHE_CONTROL;
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

use ausdruck_core::error::{ExportError, Result};

use crate::traits::{AssetFetcher, FileSaver};

/// Fetches assets over HTTP(S).
///
/// Requests carry no cookies or credentials and bypass caches, matching a
/// fresh anonymous cross-origin image load.
#[derive(Debug, Clone)]
pub struct HttpAssetFetcher {
    client: reqwest::Client,
}

impl HttpAssetFetcher {
    /// Build a fetcher whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExportError::Config(format!("HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl AssetFetcher for HttpAssetFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let fail = |reason: String| ExportError::AssetFetch {
            src: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| fail(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fail(format!("HTTP {status}")));
        }

        let bytes = response.bytes().await.map_err(|e| fail(e.to_string()))?;
        debug!(len = bytes.len(), "asset fetched");
        Ok(bytes.to_vec())
    }
}

/// Saves artifacts into a download directory.
///
/// Bytes go to a temporary file next to the target and are renamed into
/// place once complete, so the final name never holds a partial artifact.
#[derive(Debug, Clone)]
pub struct DirectorySaver {
    dir: PathBuf,
}

impl DirectorySaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FileSaver for DirectorySaver {
    #[instrument(skip(self, bytes), fields(dir = %self.dir.display(), len = bytes.len()))]
    fn save_file(&self, filename: &str, bytes: &[u8], mime_type: &str) -> Result<Option<String>> {
        if filename.is_empty() || filename.contains(['/', '\\']) || filename.starts_with('.') {
            return Err(ExportError::Delivery(format!(
                "refusing to save under unsafe name '{filename}'"
            )));
        }

        std::fs::create_dir_all(&self.dir)
            .map_err(|e| ExportError::Delivery(format!("create {}: {e}", self.dir.display())))?;

        let path = self.dir.join(filename);
        let write_err = |e: std::io::Error| ExportError::Delivery(format!("write {}: {e}", path.display()));

        let mut staged = NamedTempFile::new_in(&self.dir).map_err(write_err)?;
        staged.write_all(bytes).map_err(write_err)?;
        staged.as_file().sync_all().map_err(write_err)?;
        staged.persist(&path).map_err(|e| write_err(e.error))?;

        info!(path = %path.display(), mime_type, "artifact saved");
        Ok(Some(path.display().to_string()))
    }
}
