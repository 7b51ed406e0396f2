//! Captured image model

use crate::services::preview_store::PreviewHandle;

/// The locally selected file plus its displayable preview handle
///
/// Owned exclusively by the workflow for its lifetime: at most one
/// `CapturedImage` is live per workflow instance, and the preview handle is
/// released on reset or on successful registration.
#[derive(Debug)]
pub struct CapturedImage {
    /// Name of the file as selected by the user
    pub file_name: String,
    /// Sniffed MIME type (always `image/*`)
    pub content_type: String,
    /// Raw file bytes, uploaded verbatim to the analysis service
    pub bytes: Vec<u8>,
    /// Locally-addressable preview of the file
    pub preview: PreviewHandle,
}

impl CapturedImage {
    /// Size of the captured file in bytes
    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }
}
