//! Input image types
//!
//! Defines the accepted image formats and the in-memory upload record that
//! the pipeline consumes.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Supported raster formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Bmp,
}

impl ImageFormat {
    /// All formats accepted by the pipeline
    pub const ALL: [ImageFormat; 3] = [Self::Jpeg, Self::Png, Self::Bmp];

    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "bmp" => Some(Self::Bmp),
            _ => None,
        }
    }

    /// Detect format from MIME type
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.to_lowercase().as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/bmp" | "image/x-bmp" | "image/x-ms-bmp" => Some(Self::Bmp),
            _ => None,
        }
    }

    /// Resolve a declared format, given either as an extension or a MIME type
    pub fn from_declared(declared: &str) -> Option<Self> {
        let declared = declared.trim();
        if declared.contains('/') {
            Self::from_mime(declared)
        } else {
            Self::from_extension(declared)
        }
    }

    /// Detect format from magic bytes
    pub fn from_magic_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }
        if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }
        // BMP header is 14 bytes, "BM" alone matches too much text
        if bytes.len() >= 14 && bytes.starts_with(b"BM") {
            return Some(Self::Bmp);
        }
        None
    }

    /// Canonical MIME type
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Bmp => "image/bmp",
        }
    }

    /// Canonical file extension
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Bmp => "bmp",
        }
    }

    /// Matching decoder format in the `image` crate
    pub fn to_image_format(self) -> image::ImageFormat {
        match self {
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Png => image::ImageFormat::Png,
            Self::Bmp => image::ImageFormat::Bmp,
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// One uploaded image
///
/// The declared format is kept as given by the uploader (extension or MIME
/// type) so that an unsupported declaration can be reported verbatim.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Name shown in the exported document (usually the original filename)
    pub display_name: String,
    /// Raw encoded image bytes
    pub data: Vec<u8>,
    /// Format as declared by the uploader
    pub declared_format: String,
}

impl ImageInput {
    pub fn new(
        display_name: impl Into<String>,
        data: Vec<u8>,
        declared_format: impl Into<String>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            data,
            declared_format: declared_format.into(),
        }
    }

    /// Create an input whose declared format comes from the filename
    ///
    /// A name without an extension falls back to sniffing the bytes, so an
    /// extensionless scan still declares a MIME type.
    pub fn from_file_name(file_name: impl Into<String>, data: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let declared = declared_format_for(&file_name)
            .or_else(|| ImageFormat::from_magic_bytes(&data).map(|f| f.mime_type().to_string()))
            .unwrap_or_default();
        Self::new(file_name, data, declared)
    }

    /// Read an image from disk, using the file name as display name
    pub async fn from_path<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::from_file_name(file_name, data))
    }

    /// Resolved format, if the declaration is one we accept
    pub fn format(&self) -> Option<ImageFormat> {
        ImageFormat::from_declared(&self.declared_format)
    }

    /// Payload size in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// MIME type guessed from the file name, falling back to the raw extension
fn declared_format_for(file_name: &str) -> Option<String> {
    if let Some(mime) = mime_guess::from_path(file_name).first() {
        return Some(mime.essence_str().to_string());
    }
    Path::new(file_name)
        .extension()
        .map(|ext| ext.to_string_lossy().into_owned())
}
