use std::fmt;
use std::io::Cursor;
use std::path::Path;

use image::ImageReader;

use crate::models::schemas::Part;
use crate::utils::{GenAiError, Result};

/// An image recognized from raw bytes, ready to be sent inline.
#[derive(Clone, PartialEq, Eq)]
pub struct InlineImage {
    mime_type: String,
    data: Vec<u8>,
}

impl InlineImage {
    /// Identify the image format from its magic bytes and decode the payload.
    ///
    /// Fails with [`GenAiError::ImageLoad`] for empty payloads, anything that
    /// is not a recognizable image, and images whose content cannot be decoded.
    pub fn decode(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let data = bytes.into();
        if data.is_empty() {
            return Err(GenAiError::ImageLoad("image payload is empty".to_string()));
        }

        let kind = infer::get(&data)
            .ok_or_else(|| GenAiError::ImageLoad("unrecognized image format".to_string()))?;

        if kind.matcher_type() != infer::MatcherType::Image {
            return Err(GenAiError::ImageLoad(format!(
                "payload is {}, not an image",
                kind.mime_type()
            )));
        }

        ImageReader::new(Cursor::new(data.as_slice()))
            .with_guessed_format()
            .map_err(|e| GenAiError::ImageLoad(format!("cannot read image: {}", e)))?
            .decode()
            .map_err(|e| {
                GenAiError::ImageLoad(format!("cannot decode {}: {}", kind.mime_type(), e))
            })?;

        Ok(Self {
            mime_type: kind.mime_type().to_string(),
            data,
        })
    }

    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| GenAiError::ImageLoad(format!("cannot read {}: {}", path.display(), e)))?;
        Self::decode(bytes)
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn to_part(&self) -> Part {
        Part::inline_data(self.mime_type.clone(), &self.data)
    }
}

impl fmt::Debug for InlineImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InlineImage")
            .field("mime_type", &self.mime_type)
            .field("len", &self.data.len())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;

    /// A 1x1 red RGB PNG.
    pub(crate) const PNG_BYTES: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D,
        0x49, 0x48, 0x44, 0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01,
        0x08, 0x02, 0x00, 0x00, 0x00, 0x90, 0x77, 0x53, 0xDE, 0x00, 0x00, 0x00,
        0x0C, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0xF8, 0xCF, 0xC0, 0x00,
        0x00, 0x03, 0x01, 0x01, 0x00, 0xC9, 0xFE, 0x92, 0xEF, 0x00, 0x00, 0x00,
        0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ];

    /// A 1x1 two-color GIF.
    const GIF_BYTES: &[u8] = b"GIF89a\x01\x00\x01\x00\x80\x00\x00\xff\xff\xff\x00\x00\x00\
        !\xf9\x04\x01\x00\x00\x00\x00,\x00\x00\x00\x00\x01\x00\x01\x00\x00\x02\x02D\x01\x00;";

    #[test]
    fn test_decode_png() {
        let image = InlineImage::decode(PNG_BYTES).unwrap();
        assert_eq!(image.mime_type(), "image/png");
        assert_eq!(image.len(), PNG_BYTES.len());
    }

    #[test]
    fn test_decode_gif() {
        let image = InlineImage::decode(GIF_BYTES).unwrap();
        assert_eq!(image.mime_type(), "image/gif");
    }

    #[test]
    fn test_reject_png_signature_with_garbage_body() {
        let mut bytes = PNG_BYTES[..8].to_vec();
        bytes.extend_from_slice(b"garbage-not-a-real-png");

        let err = InlineImage::decode(bytes).unwrap_err();
        assert!(matches!(err, GenAiError::ImageLoad(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_reject_truncated_png() {
        let err = InlineImage::decode(&PNG_BYTES[..33]).unwrap_err();
        assert!(matches!(err, GenAiError::ImageLoad(_)));
    }

    #[test]
    fn test_reject_jpeg_header_only() {
        let err = InlineImage::decode(vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46])
            .unwrap_err();
        assert!(err.to_string().contains("image/jpeg"));
    }

    #[test]
    fn test_reject_empty() {
        assert!(matches!(InlineImage::decode(Vec::new()), Err(GenAiError::ImageLoad(_))));
    }

    #[test]
    fn test_reject_garbage() {
        let err = InlineImage::decode(b"definitely not an image".to_vec()).unwrap_err();
        assert!(matches!(err, GenAiError::ImageLoad(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_reject_non_image_format() {
        let err = InlineImage::decode(b"%PDF-1.7\n%\xE2\xE3\xCF\xD3".to_vec()).unwrap_err();
        assert!(err.to_string().contains("application/pdf"));
    }

    #[test]
    fn test_to_part() {
        let part = InlineImage::decode(PNG_BYTES).unwrap().to_part();
        let blob = part.inline_data.unwrap();
        assert_eq!(blob.mime_type, "image/png");
        assert!(blob.data.starts_with("iVBORw0KGgo"));
    }

    #[tokio::test]
    async fn test_from_path() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("page.png");
        std::fs::write(&file, PNG_BYTES).unwrap();

        let image = InlineImage::from_path(&file).await.unwrap();
        assert_eq!(image.mime_type(), "image/png");

        let missing = InlineImage::from_path(&temp_dir.path().join("missing.png")).await;
        assert!(matches!(missing, Err(GenAiError::ImageLoad(_))));
    }
}
