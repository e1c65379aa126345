//! Vimeo HTTP transport.
//!
//! Async HTTP client using `reqwest`. API calls carry a bearer token and the
//! versioned `Accept` header; tus calls go to the per-session upload link.

use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::debug;
use videoup_protocol::CreateSessionRequest;
use videoup_protocol::constants::{
    API_ACCEPT, CREATE_SESSION_PATH, DEFAULT_API_BASE, OFFSET_OCTET_STREAM, TUS_RESUMABLE_HEADER,
    TUS_VERSION, UPLOAD_OFFSET_HEADER,
};
use videoup_uploader::{RemoteResponse, TransportFuture, UploadError, UploadTransport};

/// Errors from building the client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid access token")]
    InvalidToken,
}

/// Request timeouts for the two kinds of traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Session creation and offset queries.
    pub metadata: Duration,
    /// A single chunk append. Must cover a whole chunk on a slow link.
    pub transfer: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            metadata: Duration::from_secs(30),
            transfer: Duration::from_secs(900),
        }
    }
}

/// Vimeo API client.
pub struct Client {
    metadata: reqwest::Client,
    bulk: reqwest::Client,
    base_url: String,
}

impl Client {
    /// Creates a client authenticated with a personal access token.
    pub fn new(token: &str, timeouts: Timeouts) -> Result<Self, Error> {
        if token.trim().is_empty() {
            return Err(Error::InvalidToken);
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("bearer {token}")).map_err(|_| Error::InvalidToken)?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static(API_ACCEPT));

        let metadata = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeouts.metadata)
            .build()?;
        let bulk = reqwest::Client::builder()
            .timeout(timeouts.transfer)
            .build()?;

        Ok(Self {
            metadata,
            bulk,
            base_url: DEFAULT_API_BASE.to_string(),
        })
    }

    /// Sets the API root.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl UploadTransport for Client {
    fn create_session(&self, request: &CreateSessionRequest) -> TransportFuture<'_> {
        let url = format!("{}{}", self.base_url, CREATE_SESSION_PATH);
        debug!(url = %url, name = %request.name, "creating upload session");
        let builder = self.metadata.post(url).json(request);
        Box::pin(async move { send(builder).await })
    }

    fn query_offset(&self, session_uri: &str) -> TransportFuture<'_> {
        let builder = self
            .metadata
            .head(session_uri)
            .header(TUS_RESUMABLE_HEADER, TUS_VERSION);
        Box::pin(async move { send(builder).await })
    }

    fn append_chunk(&self, session_uri: &str, offset: u64, data: Vec<u8>) -> TransportFuture<'_> {
        let builder = self
            .bulk
            .patch(session_uri)
            .header(TUS_RESUMABLE_HEADER, TUS_VERSION)
            .header(UPLOAD_OFFSET_HEADER, offset.to_string())
            .header(CONTENT_TYPE, OFFSET_OCTET_STREAM)
            .body(data);
        Box::pin(async move { send(builder).await })
    }
}

/// Sends a request and flattens the response into a [`RemoteResponse`].
///
/// Only network failures become errors, including a body cut off mid-read.
async fn send(builder: reqwest::RequestBuilder) -> Result<RemoteResponse, UploadError> {
    let resp = builder
        .send()
        .await
        .map_err(|e| UploadError::Transport(e.to_string()))?;

    let status = resp.status().as_u16();
    let upload_offset = resp
        .headers()
        .get(UPLOAD_OFFSET_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    let body = resp
        .text()
        .await
        .map_err(|e| UploadError::Transport(format!("reading {status} response body: {e}")))?;

    Ok(RemoteResponse {
        status,
        upload_offset,
        body,
    })
}

/// Public page for a resource URI such as `/videos/1234`.
pub fn public_link(resource_uri: &str) -> String {
    let id = resource_uri
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();
    format!("https://vimeo.com/{id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;
    use videoup_protocol::UploadSettings;

    /// Starts a one-shot mock HTTP server.
    ///
    /// Answers with `status`, `extra_headers` and `body`, and hands back the
    /// raw request it received.
    async fn mock_server(
        status: u16,
        extra_headers: &str,
        body: &str,
    ) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let url = format!("http://127.0.0.1:{port}");
        let extra_headers = extra_headers.to_string();
        let body = body.to_string();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            if let Ok((mut stream, _)) = listener.accept().await {
                let request = read_request(&mut stream).await;
                let _ = tx.send(request);

                let resp = format!(
                    "HTTP/1.1 {status} Mock\r\n{extra_headers}Content-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = stream.write_all(resp.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        (url, rx)
    }

    /// Reads headers plus a `Content-Length` body.
    async fn read_request(stream: &mut tokio::net::TcpStream) -> String {
        let mut raw = Vec::new();
        let mut buf = [0u8; 8192];
        loop {
            let n = stream.read(&mut buf).await.unwrap_or(0);
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&buf[..n]);

            let text = String::from_utf8_lossy(&raw).to_string();
            if let Some(end) = text.find("\r\n\r\n") {
                let content_length = text[..end]
                    .lines()
                    .find_map(|l| {
                        let (k, v) = l.split_once(':')?;
                        k.eq_ignore_ascii_case("content-length")
                            .then(|| v.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if raw.len() >= end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&raw).to_string()
    }

    fn client(url: &str) -> Client {
        Client::new("secret-token", Timeouts::default())
            .unwrap()
            .with_base_url(url)
    }

    #[tokio::test]
    async fn create_session_posts_json() {
        let json = r#"{"uri":"/videos/42","link":"https://vimeo.com/42","upload":{"upload_link":"https://files.example/abc","approach":"tus"}}"#;
        let (url, rx) = mock_server(201, "", json).await;

        let request = CreateSessionRequest::new(
            "Lecture 01",
            "",
            "maple_orbit_lantern_fjord",
            250_000_000,
            &UploadSettings::default(),
        );
        let resp = client(&url).create_session(&request).await.unwrap();

        assert_eq!(resp.status, 201);
        assert_eq!(resp.body, json);

        let raw = rx.await.unwrap();
        let lower = raw.to_ascii_lowercase();
        assert!(raw.starts_with("POST /me/videos "));
        assert!(lower.contains("authorization: bearer secret-token"));
        assert!(lower.contains(&format!("accept: {}", API_ACCEPT.to_ascii_lowercase())));

        let body = &raw[raw.find("\r\n\r\n").unwrap() + 4..];
        let sent: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(sent["name"], "Lecture 01");
        assert_eq!(sent["password"], "maple_orbit_lantern_fjord");
        assert_eq!(sent["upload"]["approach"], "tus");
        assert_eq!(sent["upload"]["size"], "250000000");
    }

    #[tokio::test]
    async fn query_offset_reads_header() {
        let (url, rx) = mock_server(200, "Upload-Offset: 4096\r\n", "").await;
        let session_uri = format!("{url}/files/abc");

        let resp = client("http://unused.invalid")
            .query_offset(&session_uri)
            .await
            .unwrap();

        assert_eq!(resp.status, 200);
        assert_eq!(resp.upload_offset, Some(4096));

        let raw = rx.await.unwrap();
        assert!(raw.starts_with("HEAD /files/abc "));
        assert!(raw.to_ascii_lowercase().contains("tus-resumable: 1.0.0"));
    }

    #[tokio::test]
    async fn append_chunk_sends_offset_and_body() {
        let (url, rx) = mock_server(204, "Upload-Offset: 110\r\n", "").await;
        let session_uri = format!("{url}/files/abc");

        let resp = client("http://unused.invalid")
            .append_chunk(&session_uri, 100, b"0123456789".to_vec())
            .await
            .unwrap();

        assert_eq!(resp.status, 204);
        assert_eq!(resp.upload_offset, Some(110));

        let raw = rx.await.unwrap();
        let lower = raw.to_ascii_lowercase();
        assert!(raw.starts_with("PATCH /files/abc "));
        assert!(lower.contains("upload-offset: 100"));
        assert!(lower.contains("content-type: application/offset+octet-stream"));
        assert!(lower.contains("tus-resumable: 1.0.0"));
        assert!(raw.ends_with("\r\n\r\n0123456789"));
    }

    #[tokio::test]
    async fn error_status_is_returned_as_value() {
        let (url, _rx) = mock_server(429, "", r#"{"error":"slow down"}"#).await;

        let resp = client("http://unused.invalid")
            .append_chunk(&format!("{url}/files/abc"), 0, vec![1, 2, 3])
            .await
            .unwrap();

        assert!(resp.is_rate_limited());
        assert_eq!(resp.upload_offset, None);
        assert!(resp.body.contains("slow down"));
    }

    #[tokio::test]
    async fn conflict_carries_server_offset() {
        let (url, _rx) = mock_server(409, "Upload-Offset: 77\r\n", "").await;

        let resp = client("http://unused.invalid")
            .append_chunk(&format!("{url}/files/abc"), 100, vec![0; 16])
            .await
            .unwrap();

        assert!(resp.is_conflict());
        assert_eq!(resp.upload_offset, Some(77));
    }

    #[tokio::test]
    async fn truncated_body_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            if let Ok((mut stream, _)) = listener.accept().await {
                let _ = read_request(&mut stream).await;
                let resp = "HTTP/1.1 201 Created\r\nContent-Type: application/json\r\nContent-Length: 100\r\nConnection: close\r\n\r\n{\"uri\"";
                let _ = stream.write_all(resp.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        let request =
            CreateSessionRequest::new("clip", "", "pw", 10, &UploadSettings::default());
        let err = client(&format!("http://127.0.0.1:{port}"))
            .create_session(&request)
            .await
            .unwrap_err();

        match err {
            UploadError::Transport(msg) => assert!(msg.contains("201")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn unreachable_server_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = client("http://unused.invalid")
            .query_offset(&format!("http://127.0.0.1:{port}/files/abc"))
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Transport(_)));
    }

    #[test]
    fn empty_token_is_rejected() {
        assert!(matches!(
            Client::new("  ", Timeouts::default()),
            Err(Error::InvalidToken)
        ));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let c = Client::new("t", Timeouts::default())
            .unwrap()
            .with_base_url("http://localhost:9000/");
        assert_eq!(c.base_url(), "http://localhost:9000");
    }

    #[test]
    fn public_link_uses_video_id() {
        assert_eq!(public_link("/videos/1234"), "https://vimeo.com/1234");
        assert_eq!(public_link("/videos/1234/"), "https://vimeo.com/1234");
    }
}
