//! Download Orchestrator: per-request work directory + offloaded fetch.

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use tempfile::TempDir;

use crate::Result;

/// Port for the external media-download tool.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Fetch the single resource at `url` into `work_dir`.
    ///
    /// The fetcher names the output file itself; it must not write outside
    /// `work_dir`. Dropping the returned future must stop the fetch.
    async fn fetch(&self, url: &str, work_dir: &Path) -> Result<()>;
}

/// One inbound download: the URL plus its exclusively-owned work directory.
///
/// The directory is removed by [`DownloadRequest::cleanup`] or, on any other
/// exit path, when the request is dropped.
#[derive(Debug)]
pub struct DownloadRequest {
    url: String,
    work_dir: TempDir,
}

impl DownloadRequest {
    /// Create a fresh work directory under `temp_root` (system temp dir if `None`).
    pub fn new(url: impl Into<String>, temp_root: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("vdl-");
        let work_dir = match temp_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        Ok(Self {
            url: url.into(),
            work_dir,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn work_dir(&self) -> &Path {
        self.work_dir.path()
    }

    /// Remove the work directory and everything in it.
    pub fn cleanup(self) {
        let path = self.work_dir.path().to_path_buf();
        if let Err(e) = self.work_dir.close() {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove work dir");
        }
    }
}

/// Outcome of a single fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DownloadResult {
    Success { file_path: PathBuf },
    /// `diagnostic` is for logs; users only ever see a generic notice.
    Failure { diagnostic: String },
}

impl DownloadResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

#[derive(Clone)]
pub struct DownloadOrchestrator {
    fetcher: Arc<dyn MediaFetcher>,
    timeout: Duration,
}

impl DownloadOrchestrator {
    pub fn new(fetcher: Arc<dyn MediaFetcher>, timeout: Duration) -> Self {
        Self { fetcher, timeout }
    }

    /// Fetch `url` into `work_dir` on a worker task and pick the produced file.
    ///
    /// Never fails: every error (including the timeout) becomes a `Failure`.
    /// A failed attempt is not retried.
    pub async fn download(&self, url: &str, work_dir: &Path) -> DownloadResult {
        tracing::info!(%url, "downloading");

        let fetcher = self.fetcher.clone();
        let task_url = url.to_string();
        let task_dir = work_dir.to_path_buf();
        let mut worker =
            tokio::spawn(async move { fetcher.fetch(&task_url, &task_dir).await });

        let outcome = tokio::time::timeout(self.timeout, &mut worker).await;
        let diagnostic = match outcome {
            Ok(Ok(Ok(()))) => return pick_downloaded_file(url, work_dir).await,
            Ok(Ok(Err(e))) => e.to_string(),
            Ok(Err(join_err)) => format!("download worker failed: {join_err}"),
            Err(_) => {
                // Dropping the fetch future stops the underlying tool; wait for
                // that so nothing writes into the work dir once we return.
                worker.abort();
                let _ = worker.await;
                format!("download timed out after {}s", self.timeout.as_secs())
            }
        };

        tracing::error!(%url, %diagnostic, "download failed");
        DownloadResult::Failure { diagnostic }
    }
}

async fn pick_downloaded_file(url: &str, work_dir: &Path) -> DownloadResult {
    let dir = work_dir.to_path_buf();
    let listed = tokio::task::spawn_blocking(move || list_entries(&dir)).await;

    let entries = match listed {
        Ok(Ok(entries)) => entries,
        Ok(Err(e)) => {
            return failure(url, format!("failed to list work dir: {e}"));
        }
        Err(join_err) => {
            return failure(url, format!("work dir listing failed: {join_err}"));
        }
    };

    if entries.len() > 1 {
        // Known limitation: the fetch is expected to leave exactly one file.
        tracing::warn!(
            %url,
            count = entries.len(),
            "work dir holds more than one file; sending the first entry"
        );
    }

    match entries.into_iter().next() {
        Some(file_path) => DownloadResult::Success { file_path },
        None => failure(url, "fetch reported success but produced no file".to_string()),
    }
}

fn failure(url: &str, diagnostic: String) -> DownloadResult {
    tracing::error!(%url, %diagnostic, "download failed");
    DownloadResult::Failure { diagnostic }
}

/// Directory entries in `read_dir` order (unspecified by the OS).
fn list_entries(dir: &Path) -> io::Result<Vec<PathBuf>> {
    fs::read_dir(dir)?
        .map(|ent| ent.map(|e| e.path()))
        .collect()
}
