//! Layered settings: built-in defaults, an optional `bookshelf.{toml,json,yaml}`
//! file, `BOOKSHELF_*` environment variables (`__` separates sections), and
//! finally the `PORT` / `DATA_FILE` variables older deployments rely on.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::Result;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub catalog: CatalogSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    pub data_file: PathBuf,
    pub remote_url: Option<String>,
    /// Upper bound on remote fetches during a single load. Zero never fetches.
    pub max_fetch_attempts: u32,
    pub chunk_size: usize,
    pub fetch_timeout_secs: u64,
    pub load_timeout_secs: u64,
    pub require_on_startup: bool,
    pub placeholder: PlaceholderSettings,
}

impl CatalogSettings {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
    pub fn load_timeout(&self) -> Duration {
        Duration::from_secs(self.load_timeout_secs)
    }
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("data/found_books_filtered.ndjson"),
            remote_url: None,
            max_fetch_attempts: 1,
            chunk_size: 8192,
            fetch_timeout_secs: 60,
            load_timeout_secs: 300,
            require_on_startup: false,
            placeholder: PlaceholderSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaceholderSettings {
    pub max_bytes: u64,
    pub min_payload_bytes: u64,
    pub markers: Vec<String>,
}

impl Default for PlaceholderSettings {
    fn default() -> Self {
        Self {
            max_bytes: 1024,
            min_payload_bytes: 64,
            markers: vec![
                "version https://git-lfs.github.com/spec/".into(),
                "oid sha256:".into(),
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub filter: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: "info".into(),
        }
    }
}

impl Settings {
    /// Reads settings from `file` when given (it must exist), otherwise from an
    /// optional `bookshelf.*` file in the working directory.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let source = match file {
            Some(path) => File::from(path).required(true),
            None => File::with_name("bookshelf").required(false),
        };
        let settings = Config::builder()
            .add_source(source)
            .add_source(
                Environment::with_prefix("BOOKSHELF")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("catalog.placeholder.markers"),
            )
            .set_override_option("server.port", std::env::var("PORT").ok())?
            .set_override_option("catalog.data_file", std::env::var("DATA_FILE").ok())?
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}
