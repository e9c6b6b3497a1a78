//! # Error Module
//!
//! Error taxonomy for the near-duplicate detection engine.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - offending URLs, item ids, what went wrong
//! - **Fatal scans fail whole** - no partial results; the first failed
//!   download or undecodable image aborts the scan

use thiserror::Error;

/// Top-level engine error surfaced at the scan boundary
#[derive(Error, Debug)]
pub enum ScanEngineError {
    #[error("Download error: {0}")]
    Download(#[from] DownloadError),

    #[error("Hashing error: {0}")]
    Hash(#[from] HashError),

    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors raised while validating or fetching photo content
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Download URL rejected ({url}): {reason}")]
    BadUrl { url: String, reason: String },

    #[error("Photo item {id} has no download URL")]
    MissingUrl { id: String },

    #[error("Fetch failed for {url}: {reason}")]
    FetchFailed { url: String, reason: String },
}

/// Errors raised while hashing photo content
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Failed to decode image bytes for {id}: {reason}")]
    ImageDecodeFailed { id: String, reason: String },
}

/// Errors raised while normalizing the inbound request
#[derive(Error, Debug)]
pub enum InputError {
    #[error("photoItems or pickerPayload is required")]
    MissingPayload,

    #[error("No usable photo items after normalization")]
    EmptyInput,
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, ScanEngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_url_error_includes_url_and_reason() {
        let error = DownloadError::BadUrl {
            url: "http://photos.google.com/x".to_string(),
            reason: "scheme must be https".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("http://photos.google.com/x"));
        assert!(message.contains("scheme must be https"));
    }

    #[test]
    fn missing_url_error_includes_item_id() {
        let error = DownloadError::MissingUrl {
            id: "photo-42".to_string(),
        };
        assert!(error.to_string().contains("photo-42"));
    }

    #[test]
    fn decode_error_includes_item_id() {
        let error = HashError::ImageDecodeFailed {
            id: "photo-7".to_string(),
            reason: "not a PNG".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("photo-7"));
        assert!(message.contains("not a PNG"));
    }

    #[test]
    fn engine_error_wraps_subsystem_errors() {
        let error: ScanEngineError = InputError::EmptyInput.into();
        assert!(matches!(error, ScanEngineError::Input(InputError::EmptyInput)));
    }
}
