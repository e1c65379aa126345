//! Resumable upload engine.
//!
//! This crate implements the **per-file state machine** for pushing a large
//! video to a tus-style remote. It has no HTTP dependency: `videoup-vimeo`
//! provides an [`UploadTransport`] implementation that performs the actual
//! requests.
//!
//! # Pipeline
//!
//! 1. **Lookup**: read the file's record from the session store
//! 2. **Initiate**: open a remote session if there is no usable record
//! 3. **Reconcile**: ask the remote how many bytes it already holds
//! 4. **Transfer**: append the remaining bytes chunk by chunk
//! 5. **Complete**: mark the record complete
//!
//! Interrupting the process at any point is safe: the record stays
//! `IN_PROGRESS` and the next run resumes from the reconciled offset.

pub mod coordinator;
pub mod engine;
pub mod error;
pub mod initiator;
pub mod reconciler;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

// Re-export primary types for convenience.
pub use coordinator::UploadCoordinator;
pub use engine::{ChunkedTransfer, MAX_RESYNCS};
pub use error::{FileFailure, UploadError};
pub use initiator::{RemoteSession, open_session};
pub use reconciler::reconcile_offset;
pub use transport::{Operation, RemoteResponse, TransportFuture, UploadTransport};
pub use types::{RetryPolicy, UploadDisposition, UploadEvent, UploadOutcome, UploadRequest};
