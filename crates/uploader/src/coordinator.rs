//! Per-file upload state machine.
//!
//! Composes the session store, the initiator, the reconciler and the
//! chunked transfer engine. This is the only entry point a caller needs.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, warn};
use videoup_protocol::CreateSessionRequest;
use videoup_store::{Datastore, UploadRecord};

use crate::engine::ChunkedTransfer;
use crate::error::{FileFailure, UploadError};
use crate::initiator::open_session;
use crate::reconciler::reconcile_offset;
use crate::transport::UploadTransport;
use crate::types::{RetryPolicy, UploadDisposition, UploadEvent, UploadOutcome, UploadRequest};

/// Drives uploads one file at a time.
pub struct UploadCoordinator {
    store: Arc<dyn Datastore>,
    transport: Arc<dyn UploadTransport>,
    policy: RetryPolicy,
    events: Option<mpsc::Sender<UploadEvent>>,
}

impl UploadCoordinator {
    pub fn new(store: Arc<dyn Datastore>, transport: Arc<dyn UploadTransport>) -> Self {
        Self {
            store,
            transport,
            policy: RetryPolicy::default(),
            events: None,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sends [`UploadEvent`]s to `events`. Events are dropped when the
    /// channel is full.
    pub fn with_events(mut self, events: mpsc::Sender<UploadEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Uploads one file, resuming any earlier attempt.
    ///
    /// - Complete record: returns at once without touching the remote.
    /// - No record: opens a session, records it, transfers from byte 0.
    /// - Unfinished record: reconciles the remote offset and transfers the
    ///   rest, or just marks it complete if the remote already has it all.
    ///
    /// On failure the stored record is left `IN_PROGRESS` so a later run
    /// picks up where this one stopped.
    pub async fn upload(&self, request: &UploadRequest) -> Result<UploadOutcome, FileFailure> {
        match self.run(request).await {
            Ok(outcome) => Ok(outcome),
            Err(cause) => {
                error!(name = %request.identifier, error = %cause, "upload failed");
                self.emit(UploadEvent::Failed {
                    name: request.identifier.clone(),
                    error: cause.to_string(),
                });
                Err(FileFailure {
                    identifier: request.identifier.clone(),
                    cause,
                })
            }
        }
    }

    async fn run(&self, request: &UploadRequest) -> Result<UploadOutcome, UploadError> {
        if request.identifier.is_empty() {
            return Err(UploadError::InvalidRequest("identifier is empty".into()));
        }

        let existing = self.store.get(&request.identifier)?;

        if existing.is_complete() && !existing.is_empty() {
            info!(name = %request.identifier, "already uploaded, skipping");
            return Ok(self.outcome(request, &existing, UploadDisposition::AlreadyComplete));
        }

        let (mut record, start, disposition) =
            if existing.is_empty() || existing.session_uri.is_empty() {
                let record = self.initiate(request).await?;
                (record, 0, UploadDisposition::Created)
            } else {
                let offset =
                    reconcile_offset(self.transport.as_ref(), &existing.session_uri, &self.policy)
                        .await?;
                if offset > request.total_size {
                    return Err(UploadError::OffsetOutOfRange {
                        offset,
                        size: request.total_size,
                    });
                }
                info!(
                    name = %request.identifier,
                    offset,
                    total = request.total_size,
                    "resuming upload"
                );
                self.emit(UploadEvent::Resumed {
                    name: request.identifier.clone(),
                    offset,
                    total: request.total_size,
                });
                (existing, offset, UploadDisposition::Resumed)
            };

        if start < request.total_size {
            ChunkedTransfer::new(self.transport.as_ref(), self.policy)
                .with_events(self.events.as_ref())
                .run(request, &record.session_uri, start)
                .await?;
        } else {
            info!(name = %request.identifier, "remote already holds every byte");
        }

        record.mark_complete();
        if let Err(e) = self.store.put(&record) {
            // The remote has the file; only local bookkeeping is behind.
            warn!(name = %record.name, error = %e, "upload finished but could not be recorded");
        }

        info!(name = %record.name, resource = %record.resource_uri, "upload complete");
        self.emit(UploadEvent::Completed {
            name: record.name.clone(),
            resource_uri: record.resource_uri.clone(),
        });

        Ok(self.outcome(request, &record, disposition))
    }

    /// Opens a remote session and records it before any byte is sent.
    async fn initiate(&self, request: &UploadRequest) -> Result<UploadRecord, UploadError> {
        let create = CreateSessionRequest::new(
            &request.calculated_name,
            &request.description,
            &request.access_secret,
            request.total_size,
            &request.settings,
        );
        let session = open_session(self.transport.as_ref(), &create, &self.policy).await?;

        let record = UploadRecord::in_progress(
            &request.identifier,
            &request.calculated_name,
            &session.session_uri,
            &session.resource_uri,
        );
        self.store
            .put(&record)
            .map_err(|source| UploadError::OrphanedSession {
                name: request.identifier.clone(),
                session_uri: session.session_uri.clone(),
                resource_uri: session.resource_uri.clone(),
                source,
            })?;

        info!(
            name = %request.identifier,
            resource = %session.resource_uri,
            "opened upload session"
        );
        self.emit(UploadEvent::Started {
            name: request.identifier.clone(),
            session_uri: session.session_uri,
        });
        Ok(record)
    }

    fn outcome(
        &self,
        request: &UploadRequest,
        record: &UploadRecord,
        disposition: UploadDisposition,
    ) -> UploadOutcome {
        UploadOutcome {
            identifier: request.identifier.clone(),
            resource_uri: record.resource_uri.clone(),
            access_secret: (disposition == UploadDisposition::Created)
                .then(|| request.access_secret.clone()),
            disposition,
        }
    }

    fn emit(&self, event: UploadEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.try_send(event);
        }
    }
}
