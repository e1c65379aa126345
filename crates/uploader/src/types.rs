//! Data types for the upload flow.

use std::path::PathBuf;
use std::time::Duration;

use videoup_protocol::UploadSettings;

/// Default cooldown after a "too many requests" response.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60);

/// Default number of attempts per remote operation.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// Bounded retry policy shared by every remote operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Fixed sleep after a rate-limited response.
    pub cooldown: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            cooldown: DEFAULT_COOLDOWN,
        }
    }
}

impl RetryPolicy {
    /// Policy without cooldown, for tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            cooldown: Duration::ZERO,
        }
    }
}

/// A fully resolved request to upload one file.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Store key for this file.
    pub identifier: String,
    /// Title given to the video.
    pub calculated_name: String,
    pub description: String,
    pub local_path: PathBuf,
    pub total_size: u64,
    pub chunk_size: u64,
    /// Password protecting the video.
    pub access_secret: String,
    pub settings: UploadSettings,
}

/// How a successful upload came about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadDisposition {
    /// A new session was opened during this call.
    Created,
    /// An existing session was reconciled and finished.
    Resumed,
    /// The record was already complete; nothing was sent.
    AlreadyComplete,
}

/// Successful result of uploading one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub identifier: String,
    pub resource_uri: String,
    /// Password the remote was given. Only known when this call opened the
    /// session; a resumed or skipped upload keeps the earlier password.
    pub access_secret: Option<String>,
    pub disposition: UploadDisposition,
}

/// Progress event emitted during an upload.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    /// A remote session was opened.
    Started { name: String, session_uri: String },
    /// An existing session is being continued from `offset`.
    Resumed { name: String, offset: u64, total: u64 },
    /// The remote acknowledged bytes up to `offset`.
    Progress {
        name: String,
        offset: u64,
        total: u64,
        percentage: f64,
    },
    /// The upload finished.
    Completed { name: String, resource_uri: String },
    /// The upload failed.
    Failed { name: String, error: String },
}
