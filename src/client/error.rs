use thiserror::Error;

/// Errors surfaced to the user by the upload client
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Please select a valid image file (JPG, PNG, GIF, WEBP)")]
    InvalidFileType { mime_type: String },

    #[error("File size too large. Please select an image under 10MB.")]
    FileTooLarge { size: usize },

    #[error("Please select an image file first")]
    NothingSelected,

    #[error("Could not read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Non-2xx answer; the message is the server's `error` field when present
    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Error processing image. Please try again. ({0})")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),
}
