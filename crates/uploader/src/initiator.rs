//! Opens new remote upload sessions.

use tracing::{debug, warn};
use videoup_protocol::{CreateSessionRequest, CreateSessionResponse};

use crate::error::UploadError;
use crate::transport::{Operation, UploadTransport};
use crate::types::RetryPolicy;

/// Identifiers of a freshly opened remote session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSession {
    /// tus chunk-append endpoint.
    pub session_uri: String,
    /// Final resource location of the video.
    pub resource_uri: String,
    /// Public page URL, when the remote returns one.
    pub link: String,
}

/// Sends the session-creation call.
///
/// A rate-limited response is retried after the policy's cooldown until
/// `max_attempts` is spent. Any other non-success status fails at once with
/// the response body attached.
pub async fn open_session(
    transport: &dyn UploadTransport,
    request: &CreateSessionRequest,
    policy: &RetryPolicy,
) -> Result<RemoteSession, UploadError> {
    let operation = Operation::CreateSession;

    for attempt in 1..=policy.max_attempts {
        let resp = transport.create_session(request).await?;

        if resp.is_success() {
            return parse_session(&resp.body);
        }

        if !resp.is_rate_limited() {
            return Err(UploadError::Remote {
                operation,
                status: resp.status,
                body: resp.body,
            });
        }

        if attempt < policy.max_attempts {
            warn!(
                name = %request.name,
                attempt,
                cooldown_secs = policy.cooldown.as_secs(),
                "session creation rate limited, cooling down"
            );
            tokio::time::sleep(policy.cooldown).await;
        }
    }

    Err(UploadError::RateLimited {
        operation,
        attempts: policy.max_attempts,
    })
}

fn parse_session(body: &str) -> Result<RemoteSession, UploadError> {
    let operation = Operation::CreateSession;
    let resp: CreateSessionResponse =
        serde_json::from_str(body).map_err(|e| UploadError::MalformedResponse {
            operation,
            detail: e.to_string(),
        })?;

    if resp.upload.upload_link.is_empty() {
        return Err(UploadError::MalformedResponse {
            operation,
            detail: "missing upload link".into(),
        });
    }

    debug!(resource = %resp.uri, session = %resp.upload.upload_link, "remote session opened");

    Ok(RemoteSession {
        session_uri: resp.upload.upload_link,
        resource_uri: resp.uri,
        link: resp.link,
    })
}
