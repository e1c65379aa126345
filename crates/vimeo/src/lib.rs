//! Vimeo API client.
//!
//! Implements [`videoup_uploader::UploadTransport`]: session creation goes
//! through the REST API, chunk appends and offset queries through the tus
//! upload link the API hands back.

pub mod client;

pub use client::{Client, Error, Timeouts, public_link};
