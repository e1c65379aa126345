use serde::{Deserialize, Serialize};

/// Who can see and interact with an uploaded video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Privacy {
    #[serde(default = "default_comments")]
    pub comments: String,
    #[serde(default = "default_embed")]
    pub embed: String,
    #[serde(default = "default_view")]
    pub view: String,
    #[serde(default)]
    pub download: bool,
}

fn default_comments() -> String {
    "nobody".into()
}

fn default_embed() -> String {
    "private".into()
}

fn default_view() -> String {
    "password".into()
}

impl Default for Privacy {
    fn default() -> Self {
        Self {
            comments: default_comments(),
            embed: default_embed(),
            view: default_view(),
            download: false,
        }
    }
}

/// Visibility and content-rating policy applied to every new upload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UploadSettings {
    #[serde(default)]
    pub content_rating: Vec<String>,
    #[serde(default)]
    pub privacy: Privacy,
}

/// Upload mechanism requested at session creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UploadApproach {
    #[default]
    #[serde(rename = "tus")]
    Tus,
}

/// `upload` object of the session-creation body.
///
/// The API expects `size` as a decimal string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadParams {
    pub approach: UploadApproach,
    pub size: String,
}

impl UploadParams {
    /// Resumable upload of `size` bytes.
    pub fn tus(size: u64) -> Self {
        Self {
            approach: UploadApproach::Tus,
            size: size.to_string(),
        }
    }
}

/// Body of the session-creation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub password: String,
    pub privacy: Privacy,
    #[serde(default)]
    pub content_rating: Vec<String>,
    pub upload: UploadParams,
}

impl CreateSessionRequest {
    /// Builds a tus session request for a file of `size` bytes.
    pub fn new(
        name: &str,
        description: &str,
        password: &str,
        size: u64,
        settings: &UploadSettings,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            password: password.to_string(),
            privacy: settings.privacy.clone(),
            content_rating: settings.content_rating.clone(),
            upload: UploadParams::tus(size),
        }
    }
}

/// Nested upload descriptor returned by session creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadDescriptor {
    /// tus chunk-append endpoint.
    #[serde(default)]
    pub upload_link: String,
    #[serde(default)]
    pub approach: String,
}

/// Successful session-creation response (only the fields we use).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    /// Resource URI of the new video, e.g. `/videos/12345`.
    pub uri: String,
    /// Public page URL.
    #[serde(default)]
    pub link: String,
    pub upload: UploadDescriptor,
}
