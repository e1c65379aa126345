//! Chunked transfer with offset self-healing.
//!
//! Streams the bytes between a known starting offset and the end of the
//! file in bounded chunks. Each chunk is read at an explicit offset, so the
//! loop can jump to whatever position the remote reports.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use videoup_transfer::{
    ChunkReader, SpeedCalculator, TransferError, chunk_len, format_bytes, percentage,
};

use crate::error::UploadError;
use crate::transport::{Operation, UploadTransport};
use crate::types::{RetryPolicy, UploadEvent, UploadRequest};

/// Conflict resyncs allowed between two acknowledged chunks.
pub const MAX_RESYNCS: u32 = 8;

/// Appends the remaining bytes of one file to a remote session.
pub struct ChunkedTransfer<'a> {
    transport: &'a dyn UploadTransport,
    policy: RetryPolicy,
    events: Option<&'a mpsc::Sender<UploadEvent>>,
}

impl<'a> ChunkedTransfer<'a> {
    pub fn new(transport: &'a dyn UploadTransport, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            events: None,
        }
    }

    /// Emits [`UploadEvent::Progress`] after every acknowledged chunk.
    pub fn with_events(mut self, events: Option<&'a mpsc::Sender<UploadEvent>>) -> Self {
        self.events = events;
        self
    }

    /// Transfers `[start, total_size)` of `request.local_path` and returns
    /// the final remote offset.
    ///
    /// - 429: sleep the cooldown and resend the same chunk.
    /// - 409: move to the offset the remote reports. A conflict naming the
    ///   current offset counts as a failed attempt, and more than
    ///   [`MAX_RESYNCS`] resyncs without an acknowledged chunk is fatal.
    /// - 2xx: advance to the reported offset. A response that does not move
    ///   the offset forward is retried; when the budget is spent the
    ///   transfer fails as stalled.
    /// - anything else: abort with the response body.
    ///
    /// Rate-limit and stall retries share one budget per position; it
    /// resets whenever the offset moves.
    pub async fn run(
        &self,
        request: &UploadRequest,
        session_uri: &str,
        start: u64,
    ) -> Result<u64, UploadError> {
        let name = request.identifier.as_str();
        let total = request.total_size;
        if request.chunk_size == 0 {
            return Err(UploadError::InvalidRequest("chunk size must be positive".into()));
        }
        if start > total {
            return Err(UploadError::OffsetOutOfRange {
                offset: start,
                size: total,
            });
        }

        let path = request.local_path.clone();
        let mut reader = tokio::task::spawn_blocking(move || ChunkReader::open(&path)).await??;
        if reader.file_size() < total {
            return Err(TransferError::OutOfRange {
                offset: 0,
                len: total,
                file_size: reader.file_size(),
            }
            .into());
        }

        let mut speed = SpeedCalculator::default();
        speed.add_sample(0);

        let mut offset = start;
        let mut attempts: u32 = 0;
        let mut resyncs: u32 = 0;

        while offset < total {
            let len = chunk_len(offset, total, request.chunk_size);

            let (r, chunk) = tokio::task::spawn_blocking(move || {
                let chunk = reader.read_at(offset, len);
                (reader, chunk)
            })
            .await?;
            reader = r;
            let chunk = chunk?;

            attempts += 1;
            debug!(name, offset, len, attempt = attempts, "appending chunk");
            let resp = self
                .transport
                .append_chunk(session_uri, offset, chunk.data)
                .await?;

            if resp.is_rate_limited() {
                if attempts >= self.policy.max_attempts {
                    return Err(UploadError::RateLimited {
                        operation: Operation::AppendChunk,
                        attempts,
                    });
                }
                warn!(
                    name,
                    offset,
                    cooldown_secs = self.policy.cooldown.as_secs(),
                    "chunk append rate limited, cooling down"
                );
                tokio::time::sleep(self.policy.cooldown).await;
                continue;
            }

            if resp.is_conflict() {
                let corrected = resp.upload_offset.ok_or_else(|| UploadError::MalformedResponse {
                    operation: Operation::AppendChunk,
                    detail: "conflict without Upload-Offset".into(),
                })?;
                check_range(corrected, total)?;
                if corrected == offset {
                    if attempts >= self.policy.max_attempts {
                        return Err(UploadError::Stalled { offset, attempts });
                    }
                    warn!(name, offset, "conflict at the current offset, retrying chunk");
                    continue;
                }
                resyncs += 1;
                if resyncs > MAX_RESYNCS {
                    return Err(UploadError::ConflictLoop { offset, resyncs });
                }
                info!(name, local = offset, remote = corrected, "offset conflict, resyncing");
                offset = corrected;
                attempts = 0;
                continue;
            }

            if !resp.is_success() {
                return Err(UploadError::Remote {
                    operation: Operation::AppendChunk,
                    status: resp.status,
                    body: resp.body,
                });
            }

            match resp.upload_offset {
                Some(reported) if reported > offset => {
                    check_range(reported, total)?;
                    speed.add_sample(reported - offset);
                    offset = reported;
                    attempts = 0;
                    resyncs = 0;
                    self.report_progress(name, offset, total, &speed);
                }
                reported => {
                    if attempts >= self.policy.max_attempts {
                        return Err(UploadError::Stalled { offset, attempts });
                    }
                    warn!(name, offset, ?reported, "remote did not advance offset, retrying chunk");
                }
            }
        }

        Ok(offset)
    }

    fn report_progress(&self, name: &str, offset: u64, total: u64, speed: &SpeedCalculator) {
        let pct = percentage(offset, total);
        let rate = speed.bytes_per_second() as u64;
        let eta_secs = speed.eta(total - offset).map(|d| d.as_secs());
        info!(
            name,
            offset,
            total,
            eta_secs = ?eta_secs,
            "uploaded {pct:.1}% ({} of {}, {}/s)",
            format_bytes(offset),
            format_bytes(total),
            format_bytes(rate),
        );

        if let Some(tx) = self.events {
            // Progress is informational; a full or closed channel is not an error.
            let _ = tx.try_send(UploadEvent::Progress {
                name: name.to_string(),
                offset,
                total,
                percentage: pct,
            });
        }
    }
}

fn check_range(offset: u64, total: u64) -> Result<(), UploadError> {
    if offset > total {
        return Err(UploadError::OffsetOutOfRange {
            offset,
            size: total,
        });
    }
    Ok(())
}
