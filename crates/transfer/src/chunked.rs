use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::TransferError;

/// A contiguous byte range of the source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Byte offset within the file.
    pub offset: u64,
    /// Raw chunk data.
    pub data: Vec<u8>,
}

/// Length of the chunk starting at `offset` in a transfer of `total` bytes.
///
/// Zero once `offset` has reached `total`.
pub fn chunk_len(offset: u64, total: u64, chunk_size: u64) -> u64 {
    chunk_size.min(total.saturating_sub(offset))
}

/// Random-access reader over a read-only source file.
///
/// Every read names its own offset, so a transfer can resume or jump to a
/// corrected position without re-reading earlier bytes.
pub struct ChunkReader {
    file: File,
    file_size: u64,
}

impl ChunkReader {
    /// Opens `path` read-only.
    pub fn open(path: &Path) -> Result<Self, TransferError> {
        let file = File::open(path)?;
        let file_size = file.metadata()?.len();
        Ok(Self { file, file_size })
    }

    /// Reads exactly `len` bytes starting at `offset`.
    pub fn read_at(&mut self, offset: u64, len: u64) -> Result<Chunk, TransferError> {
        let end = offset.checked_add(len).ok_or(TransferError::OutOfRange {
            offset,
            len,
            file_size: self.file_size,
        })?;
        if end > self.file_size {
            return Err(TransferError::OutOfRange {
                offset,
                len,
                file_size: self.file_size,
            });
        }

        let mut data = vec![0u8; len as usize];
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(&mut data)?;
        Ok(Chunk { offset, data })
    }

    /// Size of the file when it was opened.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }
}
