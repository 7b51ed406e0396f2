//! Image MIME acceptance
//!
//! The capture stage only accepts image files; anything else is rejected
//! before a preview is created or any network activity happens. Detection
//! is by magic bytes (via `infer`), falling back to the declared MIME type
//! when the buffer is too short or the format is unknown to the sniffer.

use crate::error::WorkflowError;

/// Determine the canonical image MIME type of a selected file
///
/// Magic bytes are authoritative: a file detected as a known non-image
/// format is rejected regardless of its declared type. Undetectable
/// content is accepted only if the declared type is `image/*`.
pub fn sniff_image(declared_type: &str, bytes: &[u8]) -> Result<String, WorkflowError> {
    if let Some(kind) = infer::get(bytes) {
        if kind.matcher_type() == infer::MatcherType::Image {
            return Ok(kind.mime_type().to_string());
        }
        return Err(WorkflowError::InvalidFile(format!(
            "not an image (detected {})",
            kind.mime_type()
        )));
    }

    let declared = declared_type.trim().to_ascii_lowercase();
    if declared.starts_with("image/") {
        return Ok(declared);
    }

    Err(WorkflowError::InvalidFile(format!(
        "not an image (declared {})",
        if declared.is_empty() {
            "nothing"
        } else {
            declared.as_str()
        }
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Magic-byte prefixes; the sniffer only needs the header
    const JPEG_HEADER: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46];
    const PNG_HEADER: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    const PDF_HEADER: &[u8] = b"%PDF-1.7\n";

    #[test]
    fn test_jpeg_magic_accepted() {
        let mime = sniff_image("image/jpeg", JPEG_HEADER).unwrap();
        assert_eq!(mime, "image/jpeg");
    }

    #[test]
    fn test_png_magic_accepted_despite_wrong_declared_type() {
        let mime = sniff_image("application/octet-stream", PNG_HEADER).unwrap();
        assert_eq!(mime, "image/png");
    }

    #[test]
    fn test_pdf_magic_rejected() {
        let err = sniff_image("image/png", PDF_HEADER).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidFile(_)));
    }

    #[test]
    fn test_undetectable_bytes_fall_back_to_declared_type() {
        let mime = sniff_image("image/x-custom", &[0x00, 0x01]).unwrap();
        assert_eq!(mime, "image/x-custom");
    }

    #[test]
    fn test_undetectable_bytes_with_non_image_declared_type_rejected() {
        let err = sniff_image("text/plain", b"hello, not an image").unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidFile(_)));
    }
}
