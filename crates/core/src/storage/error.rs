//! Storage error types.

use thiserror::Error;

use folio_shared::AppError;

/// Errors reported by an object store client.
#[derive(Debug, Error)]
pub enum ObjectStoreError {
    /// Endpoint unreachable, timed out, or refused our credentials.
    #[error("object store unavailable: {0}")]
    Unavailable(String),

    /// Bucket creation lost to an existing bucket.
    #[error("bucket already exists: {0}")]
    BucketAlreadyExists(String),

    /// The store answered but refused the request.
    #[error("object store rejected request: {0}")]
    Rejected(String),
}

/// Storage gateway errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Upload is not an image.
    #[error("MIME type '{mime_type}' is not an image")]
    InvalidMimeType {
        /// The rejected MIME type.
        mime_type: String,
    },

    /// File size exceeds maximum allowed.
    #[error("file size {size} bytes exceeds maximum allowed {max} bytes")]
    FileTooLarge {
        /// Actual file size.
        size: u64,
        /// Maximum allowed size.
        max: u64,
    },

    /// Upload carried no bytes.
    #[error("file is empty")]
    EmptyPayload,

    /// Storage configuration is unusable.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// Object store could not be reached during provisioning.
    #[error("object store unavailable: {0}")]
    Unavailable(String),

    /// Anonymous-read policy could not be attached.
    #[error("failed to attach bucket policy: {0}")]
    PolicyAttachment(String),

    /// Object write failed after the bucket was confirmed reachable.
    #[error("failed to write object: {0}")]
    Write(String),
}

impl StorageError {
    /// Create a file too large error.
    #[must_use]
    pub fn file_too_large(size: u64, max: u64) -> Self {
        Self::FileTooLarge { size, max }
    }

    /// Create an invalid MIME type error.
    #[must_use]
    pub fn invalid_mime_type(mime_type: impl Into<String>) -> Self {
        Self::InvalidMimeType {
            mime_type: mime_type.into(),
        }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an unavailable error.
    #[must_use]
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// True for errors caused by the uploaded file itself.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidMimeType { .. } | Self::FileTooLarge { .. } | Self::EmptyPayload
        )
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidMimeType { .. } => Self::Validation("File must be an image".into()),
            StorageError::FileTooLarge { .. } => {
                Self::Validation("Image size must be less than 5MB".into())
            }
            StorageError::EmptyPayload => Self::Validation("File buffer is empty".into()),
            StorageError::Configuration(msg) => Self::Misconfigured(msg),
            StorageError::Unavailable(msg)
            | StorageError::PolicyAttachment(msg)
            | StorageError::Write(msg) => Self::Storage(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_classification() {
        assert!(StorageError::invalid_mime_type("text/plain").is_validation());
        assert!(StorageError::file_too_large(2, 1).is_validation());
        assert!(StorageError::EmptyPayload.is_validation());
        assert!(!StorageError::configuration("x").is_validation());
        assert!(!StorageError::Write("x".into()).is_validation());
    }

    #[test]
    fn test_app_error_mapping() {
        let err: AppError = StorageError::invalid_mime_type("text/plain").into();
        assert_eq!(err.status_code(), 400);

        let err: AppError = StorageError::configuration("bucket").into();
        assert_eq!(err.error_code(), "storage_misconfigured");
        assert_eq!(err.status_code(), 500);

        let err: AppError = StorageError::Write("denied".into()).into();
        assert_eq!(err.error_code(), "storage_error");
    }
}
