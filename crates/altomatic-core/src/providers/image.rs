//! Image loading for providers that accept inline bytes.

use crate::error::ProviderError;
use crate::types::ImageLocator;
use base64::Engine;
use std::path::Path;

/// Base64-encoded image ready to send to a provider API.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Base64-encoded image bytes
    pub data: String,
    /// MIME type (e.g., "image/jpeg", "image/png")
    pub media_type: String,
}

impl ImageInput {
    /// Create an `ImageInput` from raw bytes and a format/extension string.
    pub fn from_bytes(bytes: &[u8], format: &str) -> Self {
        Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            media_type: media_type_for(format).to_string(),
        }
    }

    /// Read and encode a local file.
    pub async fn load(path: &Path) -> Result<Self, ProviderError> {
        let bytes = read_local(path).await?;
        let format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        Ok(Self::from_bytes(&bytes, &format))
    }

    /// Return a data URL suitable for OpenAI-style APIs.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

/// MIME type for a file extension; unknown formats default to JPEG.
pub fn media_type_for(format: &str) -> &'static str {
    match format {
        "jpeg" | "jpg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "svg" => "image/svg+xml",
        other => {
            tracing::debug!("Unknown image format '{other}', defaulting to image/jpeg");
            "image/jpeg"
        }
    }
}

/// Raw bytes behind a locator: local files are read, URLs are downloaded.
pub async fn read_bytes(
    client: &reqwest::Client,
    locator: &ImageLocator,
) -> Result<Vec<u8>, ProviderError> {
    match locator {
        ImageLocator::Path(path) => read_local(path).await,
        ImageLocator::Url(url) => {
            let image_read = |message: String| ProviderError::ImageRead {
                locator: url.clone(),
                message,
            };
            let resp = client
                .get(url)
                .send()
                .await
                .map_err(|e| image_read(e.to_string()))?;
            let status = resp.status();
            if !status.is_success() {
                return Err(image_read(format!("HTTP {status}")));
            }
            let bytes = resp.bytes().await.map_err(|e| image_read(e.to_string()))?;
            Ok(bytes.to_vec())
        }
    }
}

async fn read_local(path: &Path) -> Result<Vec<u8>, ProviderError> {
    tokio::fs::read(path)
        .await
        .map_err(|e| ProviderError::ImageRead {
            locator: path.display().to_string(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_input_from_bytes_jpeg() {
        let input = ImageInput::from_bytes(&[0xFF, 0xD8, 0xFF], "jpeg");
        assert_eq!(input.media_type, "image/jpeg");
        assert_eq!(input.data, "/9j/");
    }

    #[test]
    fn test_image_input_data_url() {
        let input = ImageInput::from_bytes(&[1, 2, 3], "png");
        assert_eq!(input.data_url(), "data:image/png;base64,AQID");
    }

    #[tokio::test]
    async fn test_load_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pixel.webp");
        std::fs::write(&path, b"hello").unwrap();

        let input = ImageInput::load(&path).await.unwrap();
        assert_eq!(input.media_type, "image/webp");
        assert_eq!(input.data, "aGVsbG8=");
    }

    #[tokio::test]
    async fn test_load_missing_file_is_image_read_error() {
        let err = ImageInput::load(Path::new("/nonexistent/ghost.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::ImageRead { .. }));
    }

    #[tokio::test]
    async fn test_read_bytes_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.jpg");
        std::fs::write(&path, [9u8, 8, 7]).unwrap();

        let client = reqwest::Client::new();
        let bytes = read_bytes(&client, &ImageLocator::Path(path)).await.unwrap();
        assert_eq!(bytes, vec![9, 8, 7]);
    }
}
