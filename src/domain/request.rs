//! Rewrite request and image attachments.
//!
//! A `RewriteRequest` is validated once at construction and never mutated
//! afterwards; every version loop of a job reads the same instance.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

/// Reasons a request cannot be built
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Original text must not be empty")]
    EmptyText,

    #[error("Unsupported attachment type '{mime_type}': only image/* is accepted")]
    UnsupportedImageType { mime_type: String },

    #[error("Cannot infer image type from file name: {}", .path.display())]
    UnknownImageExtension { path: PathBuf },

    #[error("Failed to read image {}: {source}", .path.display())]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A reference image sent to the model alongside the prompt.
///
/// Bytes sit behind an `Arc` so concurrent version loops share one buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    mime_type: String,
    bytes: Arc<[u8]>,
}

impl ImageAttachment {
    /// Create an attachment; the MIME type must be `image/*`
    pub fn new(mime_type: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Result<Self, RequestError> {
        let mime_type = mime_type.into();
        if !mime_type.starts_with("image/") {
            return Err(RequestError::UnsupportedImageType { mime_type });
        }
        Ok(Self {
            mime_type,
            bytes: bytes.into(),
        })
    }

    /// Load an image file, inferring its MIME type from the extension
    pub fn from_path(path: &Path) -> Result<Self, RequestError> {
        let mime_type = mime_for_extension(path).ok_or_else(|| RequestError::UnknownImageExtension {
            path: path.to_path_buf(),
        })?;
        let bytes = std::fs::read(path).map_err(|source| RequestError::ImageRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(mime_type, bytes)
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Standard base64 encoding of the bytes, as the Messages API expects
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}

fn mime_for_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Source text plus the constraints every version must honour
#[derive(Debug, Clone)]
pub struct RewriteRequest {
    original_text: String,
    keywords: Vec<String>,
    required_content: String,
    additional_instructions: Option<String>,
    images: Vec<ImageAttachment>,
}

impl RewriteRequest {
    /// Create a request with no constraints
    pub fn new(original_text: impl Into<String>) -> Result<Self, RequestError> {
        let original_text = original_text.into();
        if original_text.trim().is_empty() {
            return Err(RequestError::EmptyText);
        }
        Ok(Self {
            original_text,
            keywords: Vec::new(),
            required_content: String::new(),
            additional_instructions: None,
            images: Vec::new(),
        })
    }

    /// Set the required keywords. Entries are trimmed and blank ones dropped.
    pub fn with_keywords<I, K>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        self.keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        self
    }

    pub fn with_required_content(mut self, content: impl Into<String>) -> Self {
        self.required_content = content.into();
        self
    }

    /// Blank instructions are treated as absent
    pub fn with_additional_instructions(mut self, instructions: impl Into<String>) -> Self {
        let instructions = instructions.into();
        self.additional_instructions = if instructions.trim().is_empty() {
            None
        } else {
            Some(instructions)
        };
        self
    }

    pub fn with_images(mut self, images: Vec<ImageAttachment>) -> Self {
        self.images = images;
        self
    }

    pub fn original_text(&self) -> &str {
        &self.original_text
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn required_content(&self) -> &str {
        &self.required_content
    }

    pub fn additional_instructions(&self) -> Option<&str> {
        self.additional_instructions.as_deref()
    }

    pub fn images(&self) -> &[ImageAttachment] {
        &self.images
    }
}
