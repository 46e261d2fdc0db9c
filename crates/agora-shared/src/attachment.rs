//! Transient attachment drafts.
//!
//! An [`AttachmentDraft`] lives only between file selection and a successful
//! send; it is never persisted. The payload travels inline with the send
//! mutation as a base64 `data:` URL, so there is no separate upload step.

use base64::Engine as _;
use bytes::Bytes;

/// A file the user has picked for the current compose, held until the send
/// succeeds or the draft is discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentDraft {
    /// Raw source bytes, kept around so a failed send can be retried
    /// without re-selecting the file.
    pub bytes: Bytes,
    /// Original file name.
    pub file_name: String,
    /// MIME type reported for the source file.
    pub mime_type: String,
}

impl AttachmentDraft {
    pub fn new(bytes: impl Into<Bytes>, file_name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            file_name: file_name.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Source size in bytes, checked against the attachment cap before a
    /// send is allowed to proceed.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Encode the payload as a `data:` URL suitable for the `attachmentUrl`
    /// field of the send mutation.
    pub fn to_data_url(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.bytes);
        format!("data:{};base64,{}", self.mime_type, encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_url_round_trip() {
        let draft = AttachmentDraft::new(&b"hello"[..], "hello.txt", "text/plain");
        let url = draft.to_data_url();
        assert!(url.starts_with("data:text/plain;base64,"));

        let encoded = url.rsplit(',').next().unwrap();
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .unwrap();
        assert_eq!(decoded, b"hello");
    }

    #[test]
    fn size_reports_source_bytes() {
        let draft = AttachmentDraft::new(vec![0u8; 1024], "blob.bin", "application/octet-stream");
        assert_eq!(draft.size(), 1024);
    }
}
