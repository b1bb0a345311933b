/// Saving the edited image to disk
///
/// The result already lives in memory; this only decodes it and writes
/// the bytes wherever the user chooses.

use rfd::AsyncFileDialog;
use std::path::{Path, PathBuf};

use crate::state::data::GeneratedImage;

/// Ask where to save, then write the image
///
/// Returns `Ok(None)` when the user cancels the dialog.
pub async fn save_image(image: GeneratedImage, file_name: String) -> Result<Option<PathBuf>, String> {
    let Some(handle) = AsyncFileDialog::new()
        .set_title("Save styled photo")
        .set_file_name(file_name.as_str())
        .save_file()
        .await
    else {
        return Ok(None);
    };

    let path = handle.path().to_path_buf();
    write_image(&path, &image).await?;
    Ok(Some(path))
}

/// Decode the base64 payload and write it to `path`
pub async fn write_image(path: &Path, image: &GeneratedImage) -> Result<(), String> {
    let bytes = image
        .decode()
        .map_err(|e| format!("Result is not valid base64: {}", e))?;

    tokio::fs::write(path, &bytes)
        .await
        .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;

    tracing::info!(path = %path.display(), bytes = bytes.len(), "💾 Saved styled photo");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_image_writes_decoded_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pet-glamour-style.png");
        let image = GeneratedImage {
            mime_type: "image/png".to_string(),
            data: "UElOSw==".to_string(),
        };

        write_image(&path, &image).await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"PINK");
    }

    #[tokio::test]
    async fn test_write_image_rejects_bad_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let image = GeneratedImage {
            mime_type: "image/png".to_string(),
            data: "not base64!!".to_string(),
        };

        assert!(write_image(&path, &image).await.is_err());
        assert!(!path.exists());
    }
}
