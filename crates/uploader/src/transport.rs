//! Transport seam between the upload engine and the remote.
//!
//! `videoup-vimeo` implements `UploadTransport` over HTTP; the unit tests
//! in this crate drive the state machine with scripted responses.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use videoup_protocol::CreateSessionRequest;
use videoup_protocol::constants::{STATUS_CONFLICT, STATUS_RATE_LIMITED, is_success};

use crate::error::UploadError;

/// Remote operation, used to label retries and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateSession,
    QueryOffset,
    AppendChunk,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::CreateSession => "session creation",
            Operation::QueryOffset => "offset query",
            Operation::AppendChunk => "chunk append",
        })
    }
}

/// Status, offset header and body of a remote response.
///
/// Non-success statuses are returned as values, not errors; the engine
/// decides which ones are retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteResponse {
    pub status: u16,
    /// Parsed `Upload-Offset` header, if present.
    pub upload_offset: Option<u64>,
    pub body: String,
}

impl RemoteResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            upload_offset: None,
            body: String::new(),
        }
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.upload_offset = Some(offset);
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn is_success(&self) -> bool {
        is_success(self.status)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status == STATUS_RATE_LIMITED
    }

    pub fn is_conflict(&self) -> bool {
        self.status == STATUS_CONFLICT
    }
}

/// Boxed future returned by transport calls.
pub type TransportFuture<'a> =
    Pin<Box<dyn Future<Output = Result<RemoteResponse, UploadError>> + Send + 'a>>;

/// Abstract connection to the upload remote.
///
/// `create_session` and `query_offset` are short metadata calls;
/// `append_chunk` carries a whole chunk and may run for minutes.
/// Implementations should give the two kinds separate timeouts.
pub trait UploadTransport: Send + Sync {
    /// Opens a new upload session. The body of a success is the session JSON.
    fn create_session(&self, request: &CreateSessionRequest) -> TransportFuture<'_>;

    /// Asks the chunk-append endpoint how many bytes it holds.
    fn query_offset(&self, session_uri: &str) -> TransportFuture<'_>;

    /// Appends `data` at `offset`.
    fn append_chunk(&self, session_uri: &str, offset: u64, data: Vec<u8>) -> TransportFuture<'_>;
}
