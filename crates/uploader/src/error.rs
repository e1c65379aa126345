//! Upload error types.

use videoup_store::StoreError;
use videoup_transfer::TransferError;

use crate::transport::Operation;

/// Errors produced while uploading one file.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("{operation} still rate limited after {attempts} attempts")]
    RateLimited { operation: Operation, attempts: u32 },

    #[error("{operation} failed with status {status}: {body}")]
    Remote {
        operation: Operation,
        status: u16,
        body: String,
    },

    #[error("could not determine upload offset after {attempts} attempts")]
    OffsetUndeterminable { attempts: u32 },

    #[error("upload stalled at byte {offset} after {attempts} attempts")]
    Stalled { offset: u64, attempts: u32 },

    #[error("remote kept moving the offset ({resyncs} conflicts without progress, last at byte {offset})")]
    ConflictLoop { offset: u64, resyncs: u32 },

    #[error("remote reported offset {offset} beyond file size {size}")]
    OffsetOutOfRange { offset: u64, size: u64 },

    #[error("malformed {operation} response: {detail}")]
    MalformedResponse { operation: Operation, detail: String },

    #[error(
        "remote session for {name} was created (session {session_uri}, video {resource_uri}) but could not be recorded: {source}"
    )]
    OrphanedSession {
        name: String,
        session_uri: String,
        resource_uri: String,
        #[source]
        source: StoreError,
    },

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// A per-file failure reported to the caller.
#[derive(Debug, thiserror::Error)]
#[error("upload of {identifier} failed: {cause}")]
pub struct FileFailure {
    pub identifier: String,
    #[source]
    pub cause: UploadError,
}
