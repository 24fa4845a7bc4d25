//! Uploaded image held for the duration of a single request.

use crate::config::OversizeStatus;
use crate::error::ApiError;
use axum::body::Bytes;

/// MIME prefix every accepted upload must carry
pub const IMAGE_MIME_PREFIX: &str = "image/";

/// Content type assumed when the multipart field declares none
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Raw upload bytes plus the MIME type the client declared for them.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    data: Bytes,
    mime_type: String,
}

impl UploadedImage {
    pub fn new(data: Bytes, mime_type: impl Into<String>) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Limits applied to every upload before the oracle is consulted
#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub max_file_size: usize,
    pub oversize_status: OversizeStatus,
}

impl UploadLimits {
    /// Type check first, then size.
    pub fn validate(&self, image: &UploadedImage) -> Result<(), ApiError> {
        if !image.mime_type().starts_with(IMAGE_MIME_PREFIX) {
            return Err(ApiError::NotAnImage {
                mime_type: image.mime_type().to_string(),
            });
        }

        if image.size() > self.max_file_size {
            return Err(self.too_large(image.size()));
        }

        Ok(())
    }

    /// Size fault in the configured status class
    pub fn too_large(&self, size: usize) -> ApiError {
        ApiError::ImageTooLarge {
            size,
            max: self.max_file_size,
            client_fault: self.oversize_status == OversizeStatus::ClientError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMITS: UploadLimits = UploadLimits {
        max_file_size: 10 * 1024 * 1024,
        oversize_status: OversizeStatus::ServerError,
    };

    #[test]
    fn test_accepts_any_image_subtype() {
        for mime in ["image/png", "image/jpeg", "image/tiff", "image/svg+xml"] {
            let image = UploadedImage::new(Bytes::from_static(b"abc"), mime);
            assert!(LIMITS.validate(&image).is_ok(), "{mime} should be accepted");
        }
    }

    #[test]
    fn test_rejects_non_image_types() {
        for mime in ["application/pdf", "text/plain", FALLBACK_MIME_TYPE, "IMAGE/PNG"] {
            let image = UploadedImage::new(Bytes::from_static(b"abc"), mime);
            assert!(matches!(
                LIMITS.validate(&image),
                Err(ApiError::NotAnImage { .. })
            ));
        }
    }

    #[test]
    fn test_size_limit_is_inclusive() {
        let exact = UploadedImage::new(Bytes::from(vec![0u8; LIMITS.max_file_size]), "image/png");
        assert!(LIMITS.validate(&exact).is_ok());

        let over = UploadedImage::new(
            Bytes::from(vec![0u8; LIMITS.max_file_size + 1]),
            "image/png",
        );
        match LIMITS.validate(&over) {
            Err(ApiError::ImageTooLarge {
                size, client_fault, ..
            }) => {
                assert_eq!(size, LIMITS.max_file_size + 1);
                assert!(!client_fault);
            }
            other => panic!("expected ImageTooLarge, got {:?}", other),
        }
    }

    #[test]
    fn test_type_checked_before_size() {
        let image = UploadedImage::new(Bytes::from(vec![0u8; LIMITS.max_file_size + 1]), "text/plain");
        assert!(matches!(
            LIMITS.validate(&image),
            Err(ApiError::NotAnImage { .. })
        ));
    }
}
