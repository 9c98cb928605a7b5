//! Photo descriptors and upload outcomes

use serde::{Deserialize, Serialize};

use crate::types::ErrorInfo;

/// Already-encoded image payload (base64 text plus its mime type)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub mime: String,
    pub base64: String,
}

impl EncodedImage {
    pub fn jpeg(base64: impl Into<String>) -> Self {
        Self {
            mime: "image/jpeg".to_string(),
            base64: base64.into(),
        }
    }

    /// `data:<mime>;base64,<payload>` as the upload endpoint expects
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.base64.trim())
    }
}

/// One entry in the local photo collection.
///
/// "Main" is positional (index 0), so there is no stored flag here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhotoDescriptor {
    pub id: String,
    pub uri: String,
    /// Captured locally, not yet confirmed by the server
    pub is_new: bool,
    /// Payload to upload; only present on new photos
    #[serde(skip)]
    pub payload: Option<EncodedImage>,
}

impl PhotoDescriptor {
    /// A server-confirmed photo
    pub fn persisted(id: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            uri: uri.into(),
            is_new: false,
            payload: None,
        }
    }

    /// A locally captured photo awaiting upload
    pub fn local(id: impl Into<String>, uri: impl Into<String>, payload: EncodedImage) -> Self {
        Self {
            id: id.into(),
            uri: uri.into(),
            is_new: true,
            payload: Some(payload),
        }
    }
}

impl From<RemotePhoto> for PhotoDescriptor {
    fn from(photo: RemotePhoto) -> Self {
        PhotoDescriptor::persisted(photo.id, photo.url)
    }
}

/// Photo record as the server reports it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePhoto {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub is_main: bool,
}

/// Per-photo result of an upload
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    Uploaded(RemotePhoto),
    Failed(ErrorInfo),
}

impl UploadOutcome {
    pub fn is_uploaded(&self) -> bool {
        matches!(self, UploadOutcome::Uploaded(_))
    }
}

/// A photo whose upload failed, keyed by its local id
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedUpload {
    pub local_id: String,
    pub error: ErrorInfo,
}

/// Result of committing new photos
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CommitReport {
    pub uploaded_count: usize,
    pub failed_count: usize,
    pub failed_items: Vec<FailedUpload>,
    /// Set when the reconciling reload after the batch failed
    pub reload_error: Option<ErrorInfo>,
}

impl CommitReport {
    pub fn total(&self) -> usize {
        self.uploaded_count + self.failed_count
    }

    pub fn is_clean(&self) -> bool {
        self.failed_count == 0 && self.reload_error.is_none()
    }
}
