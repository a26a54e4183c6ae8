//! Core data types shared by the upload pipeline

use crate::error::{CutoutError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use image::ImageFormat;
use std::path::{Path, PathBuf};

/// MIME type declared for files whose type cannot be inferred
pub const UNKNOWN_MIME: &str = "application/octet-stream";

/// Where the bytes of a [`RawFile`] live
#[derive(Debug, Clone)]
pub enum FileContent {
    /// Read lazily from disk by the decoder
    Path(PathBuf),
    /// Already in memory (stdin, network upload, tests)
    Memory(Bytes),
}

/// An incoming file: declared MIME type, declared size and readable content
///
/// The declared values are what validation looks at; the content is only
/// touched by the decoder.
#[derive(Debug, Clone)]
pub struct RawFile {
    /// Display name (file name or a label such as `stdin`)
    pub name: String,
    /// Declared MIME type
    pub mime: String,
    /// Declared size in bytes
    pub size: u64,
    /// Byte source
    pub content: FileContent,
}

impl RawFile {
    /// Create a file with an explicit declared size
    pub fn new<N: Into<String>, M: Into<String>>(
        name: N,
        mime: M,
        size: u64,
        content: FileContent,
    ) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            size,
            content,
        }
    }

    /// Create an in-memory file; the declared size is the buffer length
    pub fn from_bytes<N: Into<String>, M: Into<String>>(
        name: N,
        mime: M,
        bytes: impl Into<Bytes>,
    ) -> Self {
        let bytes = bytes.into();
        Self::new(name, mime, bytes.len() as u64, FileContent::Memory(bytes))
    }

    /// Describe a file on disk without reading it
    ///
    /// The declared MIME type comes from the file extension, the size from
    /// file metadata.
    pub async fn from_path<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());

        Ok(Self::new(
            name,
            mime_from_path(path),
            metadata.len(),
            FileContent::Path(path.to_path_buf()),
        ))
    }

    /// File name without extension, used for output naming
    #[must_use]
    pub fn stem(&self) -> &str {
        Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.name)
    }
}

/// Guess a MIME type from a path's extension
#[must_use]
pub fn mime_from_path(path: &Path) -> String {
    ImageFormat::from_path(path)
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|_| UNKNOWN_MIME.to_string())
}

/// A self-describing encoded image: MIME type plus the encoded bytes
///
/// Cheap to clone; the payload is reference counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRepresentation {
    mime: String,
    data: Bytes,
}

impl ImageRepresentation {
    pub fn new<M: Into<String>>(mime: M, data: impl Into<Bytes>) -> Self {
        Self {
            mime: mime.into(),
            data: data.into(),
        }
    }

    #[must_use]
    pub fn mime(&self) -> &str {
        &self.mime
    }

    #[must_use]
    pub fn bytes(&self) -> &Bytes {
        &self.data
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Image format matching the MIME type, if the `image` crate knows it
    #[must_use]
    pub fn format(&self) -> Option<ImageFormat> {
        ImageFormat::from_mime_type(&self.mime)
    }

    /// Preferred file extension for this representation
    #[must_use]
    pub fn extension(&self) -> &'static str {
        self.format()
            .and_then(|f| f.extensions_str().first().copied())
            .unwrap_or("bin")
    }

    /// Encode as `data:<mime>;base64,<payload>`
    #[must_use]
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.data))
    }

    /// Parse a base64 data URI back into a representation
    pub fn from_data_uri(uri: &str) -> Result<Self> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| CutoutError::invalid_image("data URI must start with 'data:'"))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| CutoutError::invalid_image("data URI has no payload separator"))?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or_else(|| CutoutError::invalid_image("only base64 data URIs are supported"))?;
        if mime.is_empty() {
            return Err(CutoutError::invalid_image("data URI has no MIME type"));
        }

        let data = STANDARD
            .decode(payload)
            .map_err(|e| CutoutError::invalid_image(format!("invalid base64 payload: {e}")))?;

        Ok(Self::new(mime, data))
    }

    /// Length of [`Self::to_data_uri`] without building it
    #[must_use]
    pub fn data_uri_len(&self) -> usize {
        "data:".len() + self.mime.len() + ";base64,".len() + self.data.len().div_ceil(3) * 4
    }
}

/// Lifecycle of a single upload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ProcessingState {
    #[default]
    Idle,
    Uploading,
    Processing,
    Done,
    Failed(String),
}

impl ProcessingState {
    /// Whether an upload currently owns the pipeline
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Uploading | Self::Processing)
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed(_))
    }
}

impl std::fmt::Display for ProcessingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Uploading => write!(f, "uploading"),
            Self::Processing => write!(f, "processing"),
            Self::Done => write!(f, "done"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}
