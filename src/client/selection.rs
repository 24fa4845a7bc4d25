//! Local checks on the file picked by the user, before anything is sent.

use super::error::ClientError;
use image::ImageFormat;
use std::path::Path;
use std::sync::Arc;

/// MIME types the client accepts for selection
pub const ACCEPTED_MIME_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

/// Client-side selection limit (10 MiB)
pub const MAX_SELECTION_SIZE: usize = 10 * 1024 * 1024;

const UNKNOWN_MIME_TYPE: &str = "application/octet-stream";

/// An image chosen for upload.
///
/// Bytes are shared so the session can hand a copy to the uploader without
/// holding its lock.
#[derive(Debug, Clone)]
pub struct SelectedImage {
    file_name: String,
    mime_type: String,
    data: Arc<[u8]>,
}

impl SelectedImage {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Read a file and detect its MIME type from content, then extension
    pub fn from_path(path: &Path) -> Result<Self, ClientError> {
        let data = std::fs::read(path).map_err(|source| ClientError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let mime_type = detect_mime_type(path, &data);
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        Ok(Self::new(file_name, mime_type, data))
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn size_mb(&self) -> f64 {
        self.size() as f64 / (1024.0 * 1024.0)
    }

    /// Type first, then size; the size limit is inclusive
    pub fn validate(&self) -> Result<(), ClientError> {
        if !ACCEPTED_MIME_TYPES.contains(&self.mime_type.as_str()) {
            return Err(ClientError::InvalidFileType {
                mime_type: self.mime_type.clone(),
            });
        }
        if self.size() > MAX_SELECTION_SIZE {
            return Err(ClientError::FileTooLarge { size: self.size() });
        }
        Ok(())
    }
}

fn detect_mime_type(path: &Path, data: &[u8]) -> String {
    image::guess_format(data)
        .or_else(|_| ImageFormat::from_path(path))
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|_| UNKNOWN_MIME_TYPE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_accepts_whitelisted_types() {
        for mime in ACCEPTED_MIME_TYPES {
            let image = SelectedImage::new("a", mime, vec![0; 16]);
            assert!(image.validate().is_ok(), "{mime} should be accepted");
        }
    }

    #[test]
    fn test_rejects_other_types_even_if_image() {
        let image = SelectedImage::new("a.bmp", "image/bmp", vec![0; 16]);
        let err = image.validate().unwrap_err();
        assert!(matches!(err, ClientError::InvalidFileType { .. }));
        assert_eq!(
            err.to_string(),
            "Please select a valid image file (JPG, PNG, GIF, WEBP)"
        );
    }

    #[test]
    fn test_size_limit_is_inclusive() {
        let at_limit = SelectedImage::new("a.png", "image/png", vec![0; MAX_SELECTION_SIZE]);
        assert!(at_limit.validate().is_ok());

        let over = SelectedImage::new("a.png", "image/png", vec![0; MAX_SELECTION_SIZE + 1]);
        let err = over.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "File size too large. Please select an image under 10MB."
        );
    }

    #[test]
    fn test_type_checked_before_size() {
        let image = SelectedImage::new("a.pdf", "application/pdf", vec![0; MAX_SELECTION_SIZE * 2]);
        assert!(matches!(
            image.validate(),
            Err(ClientError::InvalidFileType { .. })
        ));
    }

    #[test]
    fn test_from_path_sniffs_png_content() {
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_pixel(8, 8, Rgb([255, 255, 255]));
        let mut encoded = std::io::Cursor::new(Vec::new());
        img.write_to(&mut encoded, ImageFormat::Png).unwrap();

        // No extension: detection must come from the bytes
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(encoded.get_ref()).unwrap();

        let image = SelectedImage::from_path(file.path()).unwrap();
        assert_eq!(image.mime_type(), "image/png");
        assert_eq!(image.size(), encoded.get_ref().len());
        assert!(image.validate().is_ok());
    }

    #[test]
    fn test_from_path_falls_back_to_extension_then_unknown() {
        let mut jpg = tempfile::Builder::new().suffix(".jpg").tempfile().unwrap();
        jpg.write_all(b"not really a jpeg").unwrap();
        assert_eq!(
            SelectedImage::from_path(jpg.path()).unwrap().mime_type(),
            "image/jpeg"
        );

        let mut txt = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        txt.write_all(b"hello").unwrap();
        let image = SelectedImage::from_path(txt.path()).unwrap();
        assert_eq!(image.mime_type(), UNKNOWN_MIME_TYPE);
        assert!(image.validate().is_err());
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = SelectedImage::from_path(Path::new("/nonexistent/photo.png")).unwrap_err();
        assert!(matches!(err, ClientError::Read { .. }));
    }
}
