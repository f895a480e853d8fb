//! Materializes the catalog payload when the local data file is missing or
//! only holds a pointer to content kept in remote storage.
//!
//! Whether a file is "real" is decided by a [`PlaceholderPolicy`]. The
//! default [`PointerHeuristic`] looks at size and a few marker strings, which
//! is approximate: a legitimate payload below `max_bytes` that happens to be
//! very short will be fetched again.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tracing::{debug, info, warn};

use crate::config::CatalogSettings;
use crate::error::FetchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    Missing,
    Placeholder,
    Payload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    AlreadyPresent,
    Downloaded { bytes: u64 },
}

// ------------- Placeholder detection -------------
pub trait PlaceholderPolicy: Send + Sync {
    /// Number of leading bytes handed to [`PlaceholderPolicy::is_placeholder`].
    fn head_len(&self) -> usize {
        1024
    }
    /// `head` holds at most `head_len()` leading bytes of a file of `size` bytes.
    fn is_placeholder(&self, size: u64, head: &[u8]) -> bool;
}

#[derive(Debug, Clone)]
pub struct PointerHeuristic {
    max_bytes: u64,
    min_payload_bytes: u64,
    markers: Vec<String>,
}

impl PointerHeuristic {
    pub fn new(max_bytes: u64, min_payload_bytes: u64, markers: Vec<String>) -> Self {
        Self {
            max_bytes,
            min_payload_bytes,
            markers,
        }
    }
}

impl PlaceholderPolicy for PointerHeuristic {
    fn head_len(&self) -> usize {
        self.max_bytes as usize
    }
    fn is_placeholder(&self, size: u64, head: &[u8]) -> bool {
        if size >= self.max_bytes {
            return false;
        }
        if size < self.min_payload_bytes {
            return true;
        }
        let text = String::from_utf8_lossy(head);
        self.markers.iter().any(|marker| text.contains(marker.as_str()))
    }
}

// ------------- RemoteFetcher -------------
pub struct RemoteFetcher {
    client: reqwest::Client,
    remote_url: Option<String>,
    chunk_size: usize,
    policy: Arc<dyn PlaceholderPolicy>,
}

impl RemoteFetcher {
    pub fn new(settings: &CatalogSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("bookshelf/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(settings.fetch_timeout_secs.min(30)))
            .timeout(settings.fetch_timeout())
            .build()?;
        let placeholder = &settings.placeholder;
        Ok(Self {
            client,
            remote_url: settings.remote_url.clone(),
            chunk_size: settings.chunk_size.max(1),
            policy: Arc::new(PointerHeuristic::new(
                placeholder.max_bytes,
                placeholder.min_payload_bytes,
                placeholder.markers.clone(),
            )),
        })
    }

    /// Swaps the placeholder predicate, e.g. for a payload format the
    /// default heuristic misjudges.
    pub fn with_policy(mut self, policy: Arc<dyn PlaceholderPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn remote_url(&self) -> Option<&str> {
        self.remote_url.as_deref()
    }

    pub async fn inspect(&self, path: &Path) -> std::io::Result<FileState> {
        let size = match tokio::fs::metadata(path).await {
            Ok(metadata) => metadata.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(FileState::Missing),
            Err(e) => return Err(e),
        };
        let mut head = Vec::new();
        tokio::fs::File::open(path)
            .await?
            .take(self.policy.head_len() as u64)
            .read_to_end(&mut head)
            .await?;
        if self.policy.is_placeholder(size, &head) {
            warn!(path = %path.display(), size, "placeholder detected instead of catalog payload");
            Ok(FileState::Placeholder)
        } else {
            Ok(FileState::Payload)
        }
    }

    /// Makes sure `path` holds a plausible payload, downloading it if not.
    /// Calling this again once the payload is present does no network I/O.
    pub async fn ensure(&self, path: &Path) -> Result<FetchOutcome, FetchError> {
        match self.inspect(path).await? {
            FileState::Payload => {
                debug!(path = %path.display(), "catalog payload already present");
                Ok(FetchOutcome::AlreadyPresent)
            }
            FileState::Missing | FileState::Placeholder => {
                let bytes = self.download(path).await?;
                Ok(FetchOutcome::Downloaded { bytes })
            }
        }
    }

    /// Streams the remote body into `path`, overwriting whatever is there.
    /// A failed transfer may leave a partial file behind.
    pub async fn download(&self, path: &Path) -> Result<u64, FetchError> {
        let url = self.remote_url.as_deref().ok_or_else(|| FetchError::NoRemote {
            path: path.to_path_buf(),
        })?;
        info!(url, path = %path.display(), "downloading catalog payload");
        let mut response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status {
                status: response.status().as_u16(),
                url: url.to_owned(),
            });
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = tokio::fs::File::create(path).await?;
        let mut writer = BufWriter::with_capacity(self.chunk_size, file);
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        writer.flush().await?;
        info!(url, path = %path.display(), bytes = written, "catalog payload downloaded");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heuristic() -> PointerHeuristic {
        PointerHeuristic::new(1024, 64, vec!["version https://git-lfs.github.com/spec/".into()])
    }

    #[test]
    fn pointer_files_are_placeholders() {
        let pointer = b"version https://git-lfs.github.com/spec/v1\noid sha256:4d7a2146\nsize 52428800\n";
        assert!(heuristic().is_placeholder(pointer.len() as u64, pointer));
    }

    #[test]
    fn short_files_are_placeholders() {
        assert!(heuristic().is_placeholder(0, b""));
        assert!(heuristic().is_placeholder(10, b"[1, {}]\n"));
    }

    #[test]
    fn large_files_are_payload_even_with_marker() {
        let head = b"version https://git-lfs.github.com/spec/v1";
        assert!(!heuristic().is_placeholder(4096, head));
    }

    #[test]
    fn small_plausible_files_are_payload() {
        let line = br#"["Q1", {"name": "Dune", "author": "Frank Herbert", "language": "English"}]"#;
        assert!(!heuristic().is_placeholder(line.len() as u64, line));
    }
}
