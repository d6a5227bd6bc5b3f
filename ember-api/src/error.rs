use crate::create::ValidationError;
use thiserror::Error;

/// Failure modes of paste creation.
///
/// Validation failures carry field-level detail and must never be retried;
/// storage failures may be transient and carry the store's classification.
#[derive(Debug, Error)]
pub enum CreateError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] ember_core::Error),
}

impl CreateError {
    pub fn is_retryable(&self) -> bool {
        match self {
            CreateError::Validation(_) => false,
            CreateError::Storage(e) => e.is_retryable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create::FieldError;

    #[test]
    fn test_validation_errors_are_never_retryable() {
        let err = CreateError::Validation(ValidationError {
            errors: vec![FieldError {
                field: "content",
                message: "must not be empty".into(),
            }],
        });
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_storage_retryability_passes_through() {
        let transient = CreateError::Storage(ember_core::Error::Io(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "timeout",
        )));
        assert!(transient.is_retryable());

        let logical = CreateError::Storage(ember_core::Error::AlreadyExists("id".into()));
        assert!(!logical.is_retryable());
    }
}
