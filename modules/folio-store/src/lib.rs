//! File-backed folio storage.
//!
//! A folio is a named, append-ordered list of notes persisted as one CSV file
//! (`<name>.csv`) inside a data directory. [`FolioStore`] owns the registry of
//! live folios; each [`Folio`] owns its own read/write lock, so work on
//! different folios never contends.

pub mod codec;
pub mod error;
pub mod folio;
pub mod note;
pub mod store;

pub use error::{FolioError, Result};
pub use folio::Folio;
pub use note::Note;
pub use store::FolioStore;

/// Extension of every folio's backing file.
pub const FOLIO_EXTENSION: &str = "csv";
