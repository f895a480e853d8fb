#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Router;
use axum::routing::get;
use bookshelf::config::CatalogSettings;
use bookshelf::interface::CatalogInterface;
use bookshelf::record::BookRecord;

pub const LFS_POINTER: &str = "version https://git-lfs.github.com/spec/v1\n\
oid sha256:4d7a214614ab2935c943f9e0ff69d22eadbb8f32b1258daaa5e2ca24d17e2393\n\
size 52428800\n";

pub fn book(name: &str, author: &str, language: &str) -> BookRecord {
    BookRecord {
        name: name.to_owned(),
        author: author.to_owned(),
        language: language.to_owned(),
        ..Default::default()
    }
}

/// Renders records the way the harvested dataset stores them.
pub fn ndjson(records: &[BookRecord]) -> String {
    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let data = serde_json::to_value(record).unwrap();
            format!("{}\n", serde_json::json!([format!("Q{}", i + 1), data]))
        })
        .collect()
}

pub fn numbered(n: usize) -> Vec<BookRecord> {
    (1..=n)
        .map(|i| book(&format!("Book number {i}"), "Anonymous", "English"))
        .collect()
}

pub fn settings(data_file: &Path, remote_url: Option<String>) -> CatalogSettings {
    CatalogSettings {
        data_file: data_file.to_path_buf(),
        remote_url,
        fetch_timeout_secs: 5,
        load_timeout_secs: 10,
        ..Default::default()
    }
}

pub fn write_data(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("books.ndjson");
    std::fs::write(&path, contents).unwrap();
    path
}

/// An interface whose catalog has been loaded with `records`.
pub async fn loaded(records: &[BookRecord]) -> (tempfile::TempDir, CatalogInterface) {
    let dir = tempfile::tempdir().unwrap();
    let path = write_data(dir.path(), &ndjson(records));
    let iface = CatalogInterface::new(&settings(&path, None)).unwrap();
    assert!(iface.load_catalog().await, "fixture catalog should load");
    (dir, iface)
}

// ------------- Remote stub -------------
/// A local HTTP server standing in for remote storage. Counts every request.
pub struct RemoteStub {
    addr: std::net::SocketAddr,
    hits: Arc<AtomicUsize>,
}

impl RemoteStub {
    pub async fn serving(body: &str) -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let body = body.to_owned();
        let app = Router::new().route(
            "/books.ndjson",
            get(move || {
                let counter = Arc::clone(&counter);
                let body = body.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    body
                }
            }),
        );
        Self::spawn(app, hits).await
    }

    /// Accepts requests but never answers within `delay`.
    pub async fn stalling(delay: std::time::Duration) -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let app = Router::new().route(
            "/books.ndjson",
            get(move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(delay).await;
                    String::new()
                }
            }),
        );
        Self::spawn(app, hits).await
    }

    async fn spawn(app: Router, hits: Arc<AtomicUsize>) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { addr, hits }
    }

    pub fn url(&self) -> String {
        format!("http://{}/books.ndjson", self.addr)
    }

    pub fn missing_url(&self) -> String {
        format!("http://{}/gone.ndjson", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}
