//! Bookshelf – serves a fixed catalog of book metadata harvested from Wikipedia.
//!
//! The catalog arrives as a line-delimited file where every line looks like
//! `["<identifier>", {"name": ..., "author": ..., ...}]`. Bookshelf reads it
//! once at startup (and again on request), keeps the records in memory in
//! file order, and answers paginated listings and substring searches.
//!
//! ## Modules
//! * [`record`] – [`record::BookRecord`], its fixed field vocabulary and the line decoder.
//! * [`fetch`] – Downloads the real payload when the local file is missing or
//!   only a pointer (e.g. a Git LFS stub) to remote storage.
//! * [`loader`] – Turns the data file into a catalog, tolerating bad lines.
//! * [`store`] – Holds the live catalog; replacing it is a single pointer swap.
//! * [`query`] – Pagination and case-insensitive multi-field filtering.
//! * [`interface`] – The entry points used by the HTTP layer and startup code.
//! * [`server`] – The `axum` router exposing `/all`, `/search`, `/health` and `/reload`.
//! * [`config`] – Layered settings.
//!
//! ## Quick Start
//! ```no_run
//! use bookshelf::config::Settings;
//! use bookshelf::interface::CatalogInterface;
//! # async fn run() -> bookshelf::error::Result<()> {
//! let settings = Settings::load(None)?;
//! let catalog = CatalogInterface::new(&settings.catalog)?;
//! if catalog.load_catalog().await {
//!     let hits = catalog.search(&[("name", "harry")])?;
//!     println!("{} matching books", hits.total);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod fetch;
pub mod interface;
pub mod loader;
pub mod query;
pub mod record;
pub mod server;
pub mod store;

pub use error::{BookshelfError, Result};
