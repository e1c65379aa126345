//! Learns how many bytes the remote already holds for a session.

use tracing::{debug, warn};

use crate::error::UploadError;
use crate::transport::{Operation, UploadTransport};
use crate::types::RetryPolicy;

/// Queries the chunk-append endpoint for its current offset.
///
/// Has no side effects on the remote. Rate-limited responses and success
/// responses without an offset both consume an attempt; once the budget is
/// spent the error reflects whichever happened last.
pub async fn reconcile_offset(
    transport: &dyn UploadTransport,
    session_uri: &str,
    policy: &RetryPolicy,
) -> Result<u64, UploadError> {
    let operation = Operation::QueryOffset;
    let mut rate_limited = false;

    for attempt in 1..=policy.max_attempts {
        let resp = transport.query_offset(session_uri).await?;

        if resp.is_success() {
            if let Some(offset) = resp.upload_offset {
                debug!(session = %session_uri, offset, "reconciled remote offset");
                return Ok(offset);
            }
            rate_limited = false;
            warn!(session = %session_uri, attempt, "offset query returned no offset");
        } else if resp.is_rate_limited() {
            rate_limited = true;
            warn!(session = %session_uri, attempt, "offset query rate limited");
        } else {
            return Err(UploadError::Remote {
                operation,
                status: resp.status,
                body: resp.body,
            });
        }

        if attempt < policy.max_attempts {
            tokio::time::sleep(policy.cooldown).await;
        }
    }

    if rate_limited {
        Err(UploadError::RateLimited {
            operation,
            attempts: policy.max_attempts,
        })
    } else {
        Err(UploadError::OffsetUndeterminable {
            attempts: policy.max_attempts,
        })
    }
}
