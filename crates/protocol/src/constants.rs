//! Header names, media types and status codes used by the upload protocol.

/// Default API root.
pub const DEFAULT_API_BASE: &str = "https://api.vimeo.com";

/// Endpoint (relative to the API root) that opens a new upload session.
pub const CREATE_SESSION_PATH: &str = "/me/videos";

/// Versioned media type requested on every API call.
pub const API_ACCEPT: &str = "application/vnd.vimeo.*+json;version=3.4";

/// tus protocol version spoken on the chunk-append endpoint.
pub const TUS_VERSION: &str = "1.0.0";

/// Header carrying the tus protocol version.
pub const TUS_RESUMABLE_HEADER: &str = "Tus-Resumable";

/// Header carrying the byte offset, both on requests and responses.
pub const UPLOAD_OFFSET_HEADER: &str = "Upload-Offset";

/// Content type of a chunk-append body.
pub const OFFSET_OCTET_STREAM: &str = "application/offset+octet-stream";

/// "Too many requests": the caller should pause and retry.
pub const STATUS_RATE_LIMITED: u16 = 429;

/// The caller's offset disagrees with the server; the response carries the right one.
pub const STATUS_CONFLICT: u16 = 409;

/// Returns `true` for any 2xx status.
pub fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}
