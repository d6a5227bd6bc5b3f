use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Corruption detected: {0}")]
    Corruption(String),

    #[error("Checksum mismatch")]
    ChecksumMismatch,

    #[error("Paste not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns a stable error code for this error variant.
    /// These codes are stable and can be used by clients for error classification.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Io(_) => "IO_ERROR",
            Error::Corruption(_) => "CORRUPTION",
            Error::ChecksumMismatch => "CHECKSUM_MISMATCH",
            Error::NotFound(_) => "NOT_FOUND",
            Error::AlreadyExists(_) => "ALREADY_EXISTS",
            Error::InvalidArgument(_) => "INVALID_ARGUMENT",
            Error::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true if this error is potentially retryable.
    ///
    /// Transient IO failures are retryable; logical errors like
    /// InvalidArgument or AlreadyExists are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Io(_) => true,

            Error::Corruption(_) => false,
            Error::ChecksumMismatch => false,
            Error::NotFound(_) => false,
            Error::AlreadyExists(_) => false,
            Error::InvalidArgument(_) => false,
            Error::Internal(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(Error::ChecksumMismatch.code(), "CHECKSUM_MISMATCH");
        assert_eq!(Error::NotFound("x".into()).code(), "NOT_FOUND");
        assert_eq!(
            Error::Io(io::Error::new(io::ErrorKind::TimedOut, "timeout")).code(),
            "IO_ERROR"
        );
    }

    #[test]
    fn test_only_io_errors_are_retryable() {
        assert!(Error::Io(io::Error::new(io::ErrorKind::TimedOut, "timeout")).is_retryable());
        assert!(!Error::AlreadyExists("id".into()).is_retryable());
        assert!(!Error::Corruption("bad frame".into()).is_retryable());
        assert!(!Error::ChecksumMismatch.is_retryable());
    }

    #[test]
    fn test_display_includes_detail() {
        let err = Error::NotFound("abc-123".into());
        assert_eq!(err.to_string(), "Paste not found: abc-123");
    }
}
