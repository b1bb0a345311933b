/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the picker, the request client and the UI layer.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::ImageFormat;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Fallback media type when neither the content nor the extension is recognised
const UNKNOWN_MIME_TYPE: &str = "application/octet-stream";

/// A local image chosen by the user
///
/// The bytes are shared so the file can be handed to background
/// tasks (preview decoding, the edit request) without copying.
#[derive(Clone, PartialEq)]
pub struct SelectedFile {
    /// Filename only (e.g., "dog.jpg")
    pub name: String,
    /// Media type detected from the content or extension
    pub mime_type: String,
    /// Raw file content
    pub bytes: Arc<[u8]>,
}

impl SelectedFile {
    /// Wrap raw bytes, detecting the media type
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let mime_type = detect_mime_type(&name, &bytes);
        Self {
            name,
            mime_type,
            bytes: bytes.into(),
        }
    }

    /// Load a file from disk (used for files dropped onto the window)
    pub async fn from_path(path: PathBuf) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(&path).await?;
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        Ok(Self::new(name, bytes))
    }

    /// Size of the file in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Base64 encoding of the content, as the image API expects it
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}

// The byte buffer is far too large to print
impl std::fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Image returned by the editing service
///
/// Kept exactly as received: media type plus base64 data.
#[derive(Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub mime_type: String,
    /// Base64-encoded image bytes
    pub data: String,
}

impl GeneratedImage {
    /// Decode the payload into raw image bytes
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(self.data.as_bytes())
    }
}

impl std::fmt::Debug for GeneratedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedImage")
            .field("mime_type", &self.mime_type)
            .field("data_len", &self.data.len())
            .finish()
    }
}

/// Detect the media type of an image
///
/// Sniffs the content first, then falls back to the file extension.
/// Nothing is rejected here: unknown files get a generic binary type.
pub fn detect_mime_type(name: &str, bytes: &[u8]) -> String {
    if let Ok(format) = image::guess_format(bytes) {
        return format.to_mime_type().to_string();
    }

    if let Ok(format) = ImageFormat::from_path(name) {
        return format.to_mime_type().to_string();
    }

    // HEIC/HEIF are common phone formats the image crate can't identify
    let extension = Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase());
    match extension.as_deref() {
        Some("heic") => "image/heic".to_string(),
        Some("heif") => "image/heif".to_string(),
        _ => UNKNOWN_MIME_TYPE.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Cursor;

    /// Encode a small solid-colour PNG for tests
    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 120, 40, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_detects_png_from_content() {
        // Content wins over a misleading extension
        let file = SelectedFile::new("dog.jpg", png_bytes(2, 2));
        assert_eq!(file.mime_type, "image/png");
    }

    #[test]
    fn test_falls_back_to_extension() {
        assert_eq!(detect_mime_type("dog.jpeg", b"not really a jpeg"), "image/jpeg");
        assert_eq!(detect_mime_type("cat.HEIC", b"\0\0\0"), "image/heic");
    }

    #[test]
    fn test_unknown_file_is_not_rejected() {
        let file = SelectedFile::new("notes.txt", b"hello".to_vec());
        assert_eq!(file.mime_type, "application/octet-stream");
        assert_eq!(file.len(), 5);
    }

    #[test]
    fn test_base64_matches_generated_image_decode() {
        let file = SelectedFile::new("dog.png", png_bytes(1, 1));
        let image = GeneratedImage {
            mime_type: file.mime_type.clone(),
            data: file.to_base64(),
        };
        assert_eq!(image.decode().unwrap(), file.bytes.to_vec());
    }

    #[test]
    fn test_debug_omits_bytes() {
        let file = SelectedFile::new("dog.png", vec![1u8; 4096]);
        let printed = format!("{:?}", file);
        assert!(printed.contains("len: 4096"));
        assert!(printed.len() < 200);
    }

    #[tokio::test]
    async fn test_from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("buddy.png");
        std::fs::write(&path, png_bytes(3, 3)).unwrap();

        let file = SelectedFile::from_path(path).await.unwrap();
        assert_eq!(file.name, "buddy.png");
        assert_eq!(file.mime_type, "image/png");
    }

    #[tokio::test]
    async fn test_from_path_missing_file() {
        let result = SelectedFile::from_path(PathBuf::from("/nonexistent/dog.jpg")).await;
        assert!(result.is_err());
    }
}
