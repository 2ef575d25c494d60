// ── Attachment checks ──
//
// Each file is validated on its own. Invalid files are rejected one by
// one and the valid ones still go out with the request.

use servdesk_api::Attachment;
use thiserror::Error;

/// Default per-file size limit: 10 MiB.
pub const DEFAULT_MAX_BYTES: usize = 10 * 1024 * 1024;

/// MIME types accepted when no explicit allow-list is configured.
pub const DEFAULT_ALLOWED_MIME: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];

/// Why a single file was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttachmentError {
    #[error("{file_name} is {size} bytes, larger than the {max} byte limit")]
    TooLarge {
        file_name: String,
        size: usize,
        max: usize,
    },

    #[error("{file_name} has unsupported type {mime}")]
    UnsupportedType { file_name: String, mime: String },

    #[error("{file_name} is empty")]
    Empty { file_name: String },
}

/// Size and type limits for uploaded files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_bytes: usize,
    pub allowed_mime: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            allowed_mime: DEFAULT_ALLOWED_MIME.iter().map(|m| (*m).to_owned()).collect(),
        }
    }
}

impl UploadPolicy {
    /// Check one file.
    pub fn check(&self, file: &Attachment) -> Result<(), AttachmentError> {
        if file.size() == 0 {
            return Err(AttachmentError::Empty {
                file_name: file.file_name.clone(),
            });
        }
        if file.size() > self.max_bytes {
            return Err(AttachmentError::TooLarge {
                file_name: file.file_name.clone(),
                size: file.size(),
                max: self.max_bytes,
            });
        }
        let mime = file.mime.to_ascii_lowercase();
        if !self.allowed_mime.iter().any(|m| m.eq_ignore_ascii_case(&mime)) {
            return Err(AttachmentError::UnsupportedType {
                file_name: file.file_name.clone(),
                mime: file.mime.clone(),
            });
        }
        Ok(())
    }

    /// Split `files` into those that pass and one rejection per failure.
    /// Input order is preserved in both halves.
    pub fn partition(&self, files: Vec<Attachment>) -> (Vec<Attachment>, Vec<AttachmentError>) {
        let mut accepted = Vec::with_capacity(files.len());
        let mut rejected = Vec::new();
        for file in files {
            match self.check(&file) {
                Ok(()) => accepted.push(file),
                Err(e) => rejected.push(e),
            }
        }
        (accepted, rejected)
    }
}
