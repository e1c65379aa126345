//! JSON-file backed [`Datastore`].

use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use crate::{Datastore, StoreError, UploadRecord};

/// Name of the store document inside the store folder.
pub const STORE_FILENAME: &str = "uploads.json";

type Document = HashMap<String, UploadRecord>;

/// Upload records persisted as one JSON document.
///
/// The read-modify-write cycle is serialized within this process only.
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Opens the store inside `folder`, which must already exist.
    ///
    /// The document itself is created on the first [`put`](Datastore::put).
    pub fn open(folder: &Path) -> Result<Self, StoreError> {
        std::fs::read_dir(folder).map_err(|source| StoreError::Folder {
            path: folder.display().to_string(),
            source,
        })?;

        Ok(Self {
            path: folder.join(STORE_FILENAME),
            write_lock: Mutex::new(()),
        })
    }

    /// Path of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Datastore for FileStore {
    fn get(&self, key: &str) -> Result<UploadRecord, StoreError> {
        let mut doc = load_document(&self.path)?;
        Ok(doc.remove(key).unwrap_or_default())
    }

    fn put(&self, record: &UploadRecord) -> Result<(), StoreError> {
        if record.is_empty() {
            return Err(StoreError::EmptyName);
        }

        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut doc = load_document(&self.path)?;
        doc.insert(record.name.clone(), record.clone());
        write_document(&self.path, &doc)?;

        debug!(name = %record.name, status = ?record.status, "persisted upload record");
        Ok(())
    }
}

/// Reads the whole document. A missing file is an empty document.
///
/// Entries written without a `name` take their key as the name.
fn load_document(path: &Path) -> Result<Document, StoreError> {
    if !path.exists() {
        return Ok(Document::new());
    }

    let data = std::fs::read(path)?;
    if data.iter().all(u8::is_ascii_whitespace) {
        return Ok(Document::new());
    }

    let mut doc: Document = serde_json::from_slice(&data)?;
    for (key, record) in doc.iter_mut() {
        if record.name.is_empty() {
            record.name = key.clone();
        }
    }
    Ok(doc)
}

/// Rewrites the whole document via a sibling temp file and a rename.
///
/// The temp file is flushed to disk before the rename, so the store file is
/// always either the old document or the complete new one.
fn write_document(path: &Path, doc: &Document) -> Result<(), StoreError> {
    let json = serde_json::to_vec_pretty(doc)?;
    let tmp = path.with_extension("json.tmp");

    let mut file = File::create(&tmp)?;
    file.write_all(&json)?;
    file.sync_all()?;
    drop(file);

    std::fs::rename(&tmp, path)?;

    // Persist the rename itself.
    #[cfg(unix)]
    {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            File::open(dir)?.sync_all()?;
        }
    }
    Ok(())
}
