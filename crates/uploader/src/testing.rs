//! Scripted transport used by the unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use videoup_protocol::CreateSessionRequest;

use crate::error::UploadError;
use crate::transport::{RemoteResponse, TransportFuture, UploadTransport};

/// A call observed by [`ScriptedTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create { name: String, size: String },
    Query { session_uri: String },
    Append { offset: u64, len: u64 },
}

type Script = Mutex<VecDeque<Result<RemoteResponse, UploadError>>>;

/// Replays queued responses per operation and records every call.
///
/// When the append script runs dry it behaves like a well-behaved server
/// and acknowledges the whole chunk.
#[derive(Default)]
pub struct ScriptedTransport {
    create: Script,
    query: Script,
    append: Script,
    calls: Mutex<Vec<Call>>,
}

pub const SESSION_URI: &str = "https://files.tus.example.com/files/abc";
pub const RESOURCE_URI: &str = "/videos/1234";

/// A well-formed session-creation success.
pub fn created() -> RemoteResponse {
    RemoteResponse::new(201).with_body(format!(
        r#"{{"uri":"{RESOURCE_URI}","link":"https://vimeo.com/1234","upload":{{"upload_link":"{SESSION_URI}","approach":"tus"}}}}"#
    ))
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_create(self, resp: RemoteResponse) -> Self {
        self.create.lock().unwrap().push_back(Ok(resp));
        self
    }

    pub fn on_query(self, resp: RemoteResponse) -> Self {
        self.query.lock().unwrap().push_back(Ok(resp));
        self
    }

    pub fn on_append(self, resp: RemoteResponse) -> Self {
        self.append.lock().unwrap().push_back(Ok(resp));
        self
    }

    pub fn on_append_err(self, err: UploadError) -> Self {
        self.append.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn appends(&self) -> Vec<(u64, u64)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Append { offset, len } => Some((offset, len)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    fn next(script: &Script) -> Result<RemoteResponse, UploadError> {
        script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(UploadError::Transport("no scripted response".into())))
    }
}

impl UploadTransport for ScriptedTransport {
    fn create_session(&self, request: &CreateSessionRequest) -> TransportFuture<'_> {
        self.calls.lock().unwrap().push(Call::Create {
            name: request.name.clone(),
            size: request.upload.size.clone(),
        });
        Box::pin(async move { Self::next(&self.create) })
    }

    fn query_offset(&self, session_uri: &str) -> TransportFuture<'_> {
        self.calls.lock().unwrap().push(Call::Query {
            session_uri: session_uri.to_string(),
        });
        Box::pin(async move { Self::next(&self.query) })
    }

    fn append_chunk(&self, _session_uri: &str, offset: u64, data: Vec<u8>) -> TransportFuture<'_> {
        let len = data.len() as u64;
        self.calls.lock().unwrap().push(Call::Append { offset, len });
        Box::pin(async move {
            let scripted = self.append.lock().unwrap().pop_front();
            scripted.unwrap_or_else(|| Ok(RemoteResponse::new(204).with_offset(offset + len)))
        })
    }
}

/// Writes a sparse file of `size` bytes and returns its path.
pub fn sparse_file(dir: &std::path::Path, name: &str, size: u64) -> std::path::PathBuf {
    let path = dir.join(name);
    let f = std::fs::File::create(&path).unwrap();
    f.set_len(size).unwrap();
    path
}
