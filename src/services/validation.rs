//! Upload policy checks applied before any I/O

use crate::{config::MAX_UPLOAD_BYTES, error::ValidationError, types::RawFile};

/// Checks declared file metadata against the type/size policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileValidator {
    max_bytes: u64,
}

impl Default for FileValidator {
    fn default() -> Self {
        Self::new(MAX_UPLOAD_BYTES)
    }
}

impl FileValidator {
    #[must_use]
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    #[must_use]
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Validate a file's declared MIME type and size
    ///
    /// Only the declared values are inspected; the content is never read.
    ///
    /// # Errors
    /// - `UnsupportedType` if the MIME type does not start with `image/`
    /// - `TooLarge` if the size exceeds the limit
    pub fn validate(&self, file: &RawFile) -> Result<(), ValidationError> {
        if !file.mime.starts_with("image/") {
            return Err(ValidationError::UnsupportedType {
                mime: file.mime.clone(),
            });
        }

        if file.size > self.max_bytes {
            return Err(ValidationError::TooLarge {
                size: file.size,
                limit: self.max_bytes,
            });
        }

        Ok(())
    }
}
