//! Session store: a durable map from upload identifier to [`UploadRecord`].
//!
//! The on-disk format is a single JSON object keyed by identifier. Every
//! write reloads the whole document, replaces one entry and rewrites it.
//!
//! # Single writer
//!
//! Nothing coordinates separate processes. Two processes writing the same
//! store file can lose each other's updates; callers must ensure only one
//! uploader runs against a store at a time.

mod file;
mod record;

pub use file::{FileStore, STORE_FILENAME};
pub use record::{UploadRecord, UploadStatus};

/// Errors produced by the store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot save record with an empty name")]
    EmptyName,

    #[error("could not open store folder {path}: {source}")]
    Folder {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Access pattern every store backend provides.
pub trait Datastore: Send + Sync {
    /// Returns the record for `key`, or an empty record if there is none.
    fn get(&self, key: &str) -> Result<UploadRecord, StoreError>;

    /// Inserts or replaces the record keyed by `record.name`.
    fn put(&self, record: &UploadRecord) -> Result<(), StoreError>;
}
