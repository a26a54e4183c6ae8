//! Reads raw files into self-contained image representations

use crate::{
    error::DecodeError,
    types::{FileContent, ImageRepresentation, RawFile},
};
use tracing::{debug, warn};

/// Turns a [`RawFile`] into an [`ImageRepresentation`]
///
/// The output owns its bytes, so nothing downstream needs the original file.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageDecoder;

impl ImageDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Read the file's full content
    ///
    /// Read failures are surfaced as-is, never retried.
    ///
    /// # Errors
    /// - `DecodeError` if the file cannot be read
    pub async fn decode(&self, file: &RawFile) -> Result<ImageRepresentation, DecodeError> {
        let data = match &file.content {
            FileContent::Path(path) => tokio::fs::read(path)
                .await
                .map(bytes::Bytes::from)
                .map_err(|e| DecodeError::new(&file.name, e))?,
            FileContent::Memory(bytes) => bytes.clone(),
        };

        if data.len() as u64 != file.size {
            warn!(
                file = %file.name,
                declared = file.size,
                actual = data.len(),
                "File size changed between selection and read"
            );
        }

        match image::guess_format(&data) {
            Ok(format) if format.to_mime_type() != file.mime => debug!(
                file = %file.name,
                declared = %file.mime,
                detected = %format.to_mime_type(),
                "Declared MIME type differs from content"
            ),
            Ok(_) => {},
            Err(e) => debug!(file = %file.name, error = %e, "Could not detect image format"),
        }

        debug!(file = %file.name, bytes = data.len(), "Decoded upload");
        Ok(ImageRepresentation::new(file.mime.clone(), data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_decode_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.png");
        std::fs::write(&path, b"\x89PNG\r\n\x1a\nrest-of-file").unwrap();

        let file = RawFile::from_path(&path).await.unwrap();
        assert_eq!(file.mime, "image/png");

        let image = ImageDecoder::new().decode(&file).await.unwrap();
        assert_eq!(image.mime(), "image/png");
        assert_eq!(image.len() as u64, file.size);
        assert_eq!(&image.bytes()[..4], b"\x89PNG");
    }

    #[tokio::test]
    async fn test_decode_from_memory_keeps_declared_mime() {
        let file = RawFile::from_bytes("clip", "image/jpeg", b"not really a jpeg".to_vec());
        let image = ImageDecoder::new().decode(&file).await.unwrap();
        assert_eq!(image.mime(), "image/jpeg");
        assert_eq!(image.bytes().as_ref(), b"not really a jpeg");
    }

    #[tokio::test]
    async fn test_unreadable_file_fails() {
        let file = RawFile::new(
            "missing.jpg",
            "image/jpeg",
            42,
            FileContent::Path(PathBuf::from("/definitely/not/here/missing.jpg")),
        );

        let err = ImageDecoder::new().decode(&file).await.unwrap_err();
        assert_eq!(err.name, "missing.jpg");
        assert_eq!(err.source.kind(), std::io::ErrorKind::NotFound);
    }
}
