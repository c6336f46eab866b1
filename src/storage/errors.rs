//! Errors raised by resource stores.
//!
//! These describe what went wrong at the persistence boundary. The operation
//! handler translates them into protocol errors through
//! `From<StorageError> for ScimError`.

use crate::error::ValidationError;
use std::fmt;

/// Errors that can occur during store operations.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageError {
    /// No record with this id exists for the caller's tenant.
    NotFound { resource_type: String, id: String },

    /// A store rule rejected the attributes.
    Validation(ValidationError),

    /// The resource type has no lifecycle operation with this name.
    UnknownOperation { operation: String },

    /// A lifecycle operation received an argument it cannot use.
    InvalidArgument { operation: String, message: String },

    /// Generic internal storage error.
    Internal { message: String },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::NotFound { resource_type, id } => {
                write!(f, "Resource not found: {}/{}", resource_type, id)
            }
            StorageError::Validation(error) => write!(f, "Validation failed: {}", error),
            StorageError::UnknownOperation { operation } => {
                write!(f, "Unknown operation: {}", operation)
            }
            StorageError::InvalidArgument { operation, message } => {
                write!(f, "Invalid argument for {}: {}", operation, message)
            }
            StorageError::Internal { message } => {
                write!(f, "Internal storage error: {}", message)
            }
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Validation(error) => Some(error),
            _ => None,
        }
    }
}

impl From<ValidationError> for StorageError {
    fn from(error: ValidationError) -> Self {
        Self::Validation(error)
    }
}

impl StorageError {
    /// Create a new NotFound error.
    pub fn not_found(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    /// Create a new UnknownOperation error.
    pub fn unknown_operation(operation: impl Into<String>) -> Self {
        Self::UnknownOperation {
            operation: operation.into(),
        }
    }

    /// Create a new InvalidArgument error.
    pub fn invalid_argument(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a new Internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether the error means the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            StorageError::not_found("User", "42").to_string(),
            "Resource not found: User/42"
        );
        assert_eq!(
            StorageError::unknown_operation("archive").to_string(),
            "Unknown operation: archive"
        );
    }

    #[test]
    fn test_validation_source() {
        use std::error::Error;
        let error = StorageError::from(ValidationError::missing_required("email"));
        assert!(error.source().is_some());
        assert!(!error.is_not_found());
    }
}
