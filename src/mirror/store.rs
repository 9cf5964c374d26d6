//! Fetch-and-store of a single static asset.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use axum::http::Uri;
use percent_encoding::percent_decode_str;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::http::origin::Origin;
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("refusing to mirror path outside the mirror root: {0}")]
    UnsafePath(String),
    #[error("failed to create directory {path}: {source}")]
    CreateDir { path: PathBuf, source: std::io::Error },
    #[error("failed to fetch {url}: {source}")]
    Fetch { url: String, source: reqwest::Error },
    #[error("failed to create file {path}: {source}")]
    CreateFile { path: PathBuf, source: std::io::Error },
    #[error("failed to write file {path}: {source}")]
    Write { path: PathBuf, source: std::io::Error },
}

impl MirrorError {
    fn outcome(&self) -> &'static str {
        match self {
            MirrorError::UnsafePath(_) => "unsafe_path",
            MirrorError::CreateDir { .. } | MirrorError::CreateFile { .. } => "create_failed",
            MirrorError::Fetch { .. } => "fetch_failed",
            MirrorError::Write { .. } => "write_failed",
        }
    }
}

/// Mirrors static assets from the origin into a local directory.
#[derive(Clone)]
pub struct StaticMirror {
    origin: Arc<Origin>,
    root: PathBuf,
    client: reqwest::Client,
}

impl StaticMirror {
    pub fn new(origin: Arc<Origin>, root: impl Into<PathBuf>) -> Self {
        Self {
            origin,
            root: root.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Local file a request path is stored at: the mirror root followed by
    /// the percent-decoded request path. The query never takes part.
    pub fn local_path(&self, request_path: &str) -> Result<PathBuf, MirrorError> {
        let decoded = percent_decode_str(request_path)
            .decode_utf8()
            .map_err(|_| MirrorError::UnsafePath(request_path.to_string()))?;
        let relative = Path::new(decoded.trim_start_matches('/'));
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !safe || relative.as_os_str().is_empty() {
            return Err(MirrorError::UnsafePath(request_path.to_string()));
        }
        Ok(self.root.join(relative))
    }

    /// Fetch `uri` from the origin and write its body to the mirror,
    /// replacing any earlier copy. Returns the written path.
    pub async fn mirror(&self, uri: &Uri) -> Result<PathBuf, MirrorError> {
        let started = Instant::now();
        let result = self.fetch_and_store(uri).await;

        match &result {
            Ok(path) => {
                tracing::debug!(
                    path = %path.display(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Static file saved"
                );
                metrics::record_mirror("saved");
            }
            Err(e) => metrics::record_mirror(e.outcome()),
        }
        result
    }

    async fn fetch_and_store(&self, uri: &Uri) -> Result<PathBuf, MirrorError> {
        let path = self.local_path(uri.path())?;

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .await
                .map_err(|source| MirrorError::CreateDir {
                    path: dir.to_path_buf(),
                    source,
                })?;
        }

        let url = self.origin.resource_url(uri);
        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| MirrorError::Fetch {
                url: url.to_string(),
                source,
            })?;

        // Error pages are stored too; the latest fetch always wins.
        if !response.status().is_success() {
            tracing::debug!(url = %url, status = %response.status(), "Mirroring non-success response");
        }

        let mut file = fs::File::create(&path)
            .await
            .map_err(|source| MirrorError::CreateFile {
                path: path.clone(),
                source,
            })?;

        while let Some(chunk) = response.chunk().await.map_err(|source| MirrorError::Fetch {
            url: url.to_string(),
            source,
        })? {
            file.write_all(&chunk)
                .await
                .map_err(|source| MirrorError::Write {
                    path: path.clone(),
                    source,
                })?;
        }

        file.flush().await.map_err(|source| MirrorError::Write {
            path: path.clone(),
            source,
        })?;

        Ok(path)
    }
}
