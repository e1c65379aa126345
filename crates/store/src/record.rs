use serde::{Deserialize, Serialize};

/// Persisted state of an upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadStatus {
    #[serde(rename = "COMPLETE")]
    Complete,
    #[default]
    #[serde(rename = "IN_PROGRESS")]
    InProgress,
    #[serde(rename = "ERROR")]
    Error,
}

/// Information about one file's upload attempt.
///
/// If an upload stopped part-way but `session_uri` is populated, it can be
/// resumed. A record whose `name` is empty means "no record".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub calculated_name: String,
    /// tus chunk-append endpoint.
    #[serde(default)]
    pub session_uri: String,
    /// Final resource location of the video.
    #[serde(default)]
    pub resource_uri: String,
    #[serde(default)]
    pub status: UploadStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
}

impl UploadRecord {
    /// A freshly opened session.
    pub fn in_progress(
        name: &str,
        calculated_name: &str,
        session_uri: &str,
        resource_uri: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            calculated_name: calculated_name.to_string(),
            session_uri: session_uri.to_string(),
            resource_uri: resource_uri.to_string(),
            status: UploadStatus::InProgress,
            error_details: None,
        }
    }

    /// Returns `true` if this is the "absent" record.
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.status == UploadStatus::Complete
    }

    /// Marks the record complete and clears any stale error.
    pub fn mark_complete(&mut self) {
        self.status = UploadStatus::Complete;
        self.error_details = None;
    }

    /// Marks the record permanently failed.
    pub fn mark_error(&mut self, details: impl Into<String>) {
        self.status = UploadStatus::Error;
        self.error_details = Some(details.into());
    }
}
