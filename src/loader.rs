use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::config::CatalogSettings;
use crate::error::{DecodeError, LoadError};
use crate::fetch::{FileState, RemoteFetcher};
use crate::record::{BookRecord, decode_line};
use crate::store::{Catalog, CatalogStore};

// individual bad lines are logged up to this many, after that only the total
const LOGGED_DECODE_ERRORS: usize = 10;

/// What a successful load did.
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub path: PathBuf,
    pub lines_read: usize,
    pub lines_errored: usize,
    pub records_loaded: usize,
    pub fetches: u32,
    pub loaded_at: DateTime<Utc>,
    pub elapsed: Duration,
}

struct Parsed {
    records: Vec<BookRecord>,
    lines_read: usize,
    lines_errored: usize,
}

pub struct CatalogLoader {
    data_file: PathBuf,
    max_fetch_attempts: u32,
    load_timeout: Duration,
    fetcher: RemoteFetcher,
    store: Arc<CatalogStore>,
    // one load at a time, so two reloads never download into the same file
    exclusive: Mutex<()>,
}

impl CatalogLoader {
    pub fn new(settings: &CatalogSettings, fetcher: RemoteFetcher, store: Arc<CatalogStore>) -> Self {
        Self {
            data_file: settings.data_file.clone(),
            max_fetch_attempts: settings.max_fetch_attempts,
            load_timeout: settings.load_timeout(),
            fetcher,
            store,
            exclusive: Mutex::new(()),
        }
    }

    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    pub fn store(&self) -> &Arc<CatalogStore> {
        &self.store
    }

    /// Builds a new catalog from the data file and swaps it in. On any
    /// failure the live catalog is left exactly as it was.
    pub async fn load(&self) -> Result<LoadOutcome, LoadError> {
        let _guard = self.exclusive.lock().await;
        let result = match tokio::time::timeout(self.load_timeout, self.load_inner()).await {
            Ok(result) => result,
            Err(_) => Err(LoadError::TimedOut(self.load_timeout)),
        };
        if let Err(e) = &result {
            error!(path = %self.data_file.display(), error = %e, "catalog load failed");
        }
        result
    }

    async fn load_inner(&self) -> Result<LoadOutcome, LoadError> {
        let started = Instant::now();
        info!(path = %self.data_file.display(), "loading catalog");
        let fetches = self.materialize().await?;

        let path = self.data_file.clone();
        let parsed = tokio::task::spawn_blocking(move || read_records(&path))
            .await
            .map_err(|e| LoadError::Join(e.to_string()))??;

        if parsed.records.is_empty() {
            return Err(LoadError::Empty {
                lines_read: parsed.lines_read,
                lines_errored: parsed.lines_errored,
            });
        }
        let records_loaded = parsed.records.len();
        let catalog = Catalog::new(parsed.records, &self.data_file);
        let loaded_at = catalog.loaded_at().unwrap_or_else(Utc::now);
        self.store.replace(catalog);

        let outcome = LoadOutcome {
            path: self.data_file.clone(),
            lines_read: parsed.lines_read,
            lines_errored: parsed.lines_errored,
            records_loaded,
            fetches,
            loaded_at,
            elapsed: started.elapsed(),
        };
        info!(
            path = %outcome.path.display(),
            lines_read = outcome.lines_read,
            lines_errored = outcome.lines_errored,
            records_loaded = outcome.records_loaded,
            fetches = outcome.fetches,
            elapsed_ms = outcome.elapsed.as_secs_f64() * 1000.0,
            "catalog loaded"
        );
        Ok(outcome)
    }

    /// Fetches until the data file holds a payload, at most
    /// `max_fetch_attempts` times. Returns the number of fetches made.
    async fn materialize(&self) -> Result<u32, LoadError> {
        let path = self.data_file.as_path();
        let mut fetches = 0;
        loop {
            let state = self.fetcher.inspect(path).await.map_err(|source| LoadError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            match state {
                FileState::Payload => return Ok(fetches),
                _ if fetches < self.max_fetch_attempts => {
                    fetches += 1;
                    self.fetcher.download(path).await?;
                }
                FileState::Missing => {
                    return Err(LoadError::Io {
                        path: path.to_path_buf(),
                        source: std::io::Error::new(std::io::ErrorKind::NotFound, "data file is missing"),
                    });
                }
                FileState::Placeholder => {
                    return Err(LoadError::PlaceholderPersisted {
                        path: path.to_path_buf(),
                        attempts: fetches,
                    });
                }
            }
        }
    }
}

fn read_records(path: &Path) -> Result<Parsed, LoadError> {
    let io_error = |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = std::fs::File::open(path).map_err(io_error)?;
    let mut reader = std::io::BufReader::new(file);
    let mut parsed = Parsed {
        records: Vec::new(),
        lines_read: 0,
        lines_errored: 0,
    };
    let mut buffer = Vec::new();
    loop {
        buffer.clear();
        if reader.read_until(b'\n', &mut buffer).map_err(io_error)? == 0 {
            break;
        }
        parsed.lines_read += 1;
        match decode_bytes(&buffer) {
            Some(Ok(record)) => parsed.records.push(record),
            Some(Err(e)) => {
                parsed.lines_errored += 1;
                if parsed.lines_errored <= LOGGED_DECODE_ERRORS {
                    warn!(line = parsed.lines_read, error = %e, "skipping undecodable line");
                }
            }
            None => (),
        }
    }
    if parsed.lines_errored > LOGGED_DECODE_ERRORS {
        warn!(
            lines_errored = parsed.lines_errored,
            "further undecodable lines were skipped without logging"
        );
    }
    Ok(parsed)
}

// None for blank lines, which are neither records nor errors
fn decode_bytes(bytes: &[u8]) -> Option<Result<BookRecord, DecodeError>> {
    let line = match std::str::from_utf8(bytes) {
        Ok(line) => line.trim(),
        Err(e) => return Some(Err(e.into())),
    };
    if line.is_empty() {
        None
    } else {
        Some(decode_line(line))
    }
}
