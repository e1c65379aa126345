//! Wire protocol types for the Vimeo resumable (tus) upload API.
//!
//! Session creation is a JSON `POST`; offset queries and chunk appends are
//! plain tus 1.0.0 `HEAD`/`PATCH` requests whose state travels in headers.

pub mod constants;
pub mod types;

// Re-export primary types for convenience.
pub use types::{
    CreateSessionRequest, CreateSessionResponse, Privacy, UploadApproach,
    UploadDescriptor, UploadParams, UploadSettings,
};
