//! Byte-range file access and progress accounting for chunked uploads.

mod chunked;
mod progress;

pub use chunked::{Chunk, ChunkReader, chunk_len};
pub use progress::{SpeedCalculator, format_bytes, percentage};

/// One decimal megabyte. Chunk sizes in configuration are expressed in these.
pub const MEGABYTE: u64 = 1_000_000;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("range {offset}+{len} is outside the {file_size}-byte source file")]
    OutOfRange { offset: u64, len: u64, file_size: u64 },
}
