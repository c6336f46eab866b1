//! Error types for SCIM mapping operations.
//!
//! Protocol-level failures (`InvalidQuery`, `UnsupportedPatchRequest`,
//! `ResourceNotFound`, `Validation`) are recovered at the operation handler
//! boundary and rendered as SCIM Error envelopes. Configuration faults are
//! reported separately through [`BuildError`] when the immutable
//! configuration is assembled.

use crate::storage::StorageError;

/// Main error type for SCIM mapping operations.
#[derive(Debug, thiserror::Error)]
pub enum ScimError {
    /// Filter expression could not be parsed or names an unknown attribute
    #[error("Invalid query: {message}")]
    InvalidQuery { message: String },

    /// PATCH body has a shape this server does not interpret
    #[error("Unsupported PATCH request: {message}")]
    UnsupportedPatchRequest { message: String },

    /// Resource not found errors (also used for out-of-scope resources)
    #[error("Resource not found: {resource_type} with ID {id}")]
    ResourceNotFound { resource_type: String, id: String },

    /// Validation errors raised by the store or by status parsing
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Accessor or lifecycle operation unknown to the entity
    #[error("Method '{0}' not found")]
    MethodNotFound(String),

    /// Resource type has no configuration
    #[error("Unsupported resource type: {0}")]
    UnsupportedResourceType(String),

    /// Invalid request format or parameters
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Store failures that have no protocol meaning
    #[error("Storage error: {0}")]
    Storage(StorageError),

    /// Internal server errors
    #[error("Internal server error: {message}")]
    Internal { message: String },
}

/// Validation errors surfaced as unprocessable-entity responses.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Required attribute is missing
    #[error("Required attribute '{attribute}' is missing")]
    MissingRequiredAttribute { attribute: String },

    /// Attribute value violates uniqueness constraint
    #[error("Attribute '{attribute}' violates uniqueness constraint with value '{value}'")]
    UniquenessViolation { attribute: String, value: String },

    /// The `active` flag is neither true-like nor false-like
    #[error("Attribute 'active' has invalid value: {value}")]
    InvalidActiveValue { value: String },

    /// General validation error with custom message
    #[error("Validation failed: {message}")]
    Custom { message: String },
}

/// Errors that can occur while building the mapping configuration.
///
/// These are programming errors in the embedding application and should be
/// caught at startup rather than per request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildError {
    /// A resource type was configured without a wire schema
    #[error("Resource type '{resource_type}' has no schema")]
    MissingSchema { resource_type: String },

    /// The same accessor is referenced more than once in a schema
    #[error("Accessor '{accessor}' is referenced more than once in the {resource_type} schema")]
    DuplicateReference {
        resource_type: String,
        accessor: String,
    },

    /// A configured accessor does not occur in the schema it must resolve in
    #[error("Accessor '{accessor}' does not occur in the {resource_type} schema")]
    UnresolvableAttribute {
        resource_type: String,
        accessor: String,
    },

    /// Invalid configuration provided
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },
}

impl ScimError {
    /// Create an invalid query error
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    /// Create an unsupported patch request error
    pub fn unsupported_patch(message: impl Into<String>) -> Self {
        Self::UnsupportedPatchRequest {
            message: message.into(),
        }
    }

    /// Create a resource not found error
    pub fn resource_not_found(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::ResourceNotFound {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    /// Create an internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// HTTP status code this error is reported with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidQuery { .. } | Self::InvalidRequest { .. } | Self::Json(_) => 400,
            Self::ResourceNotFound { .. } | Self::UnsupportedResourceType(_) => 404,
            Self::UnsupportedPatchRequest { .. } | Self::Validation(_) => 422,
            Self::MethodNotFound(_) | Self::Storage(_) | Self::Internal { .. } => 500,
        }
    }

    /// SCIM `scimType` detail keyword (RFC 7644 §3.12), where one applies.
    pub fn scim_type(&self) -> Option<&'static str> {
        match self {
            Self::InvalidQuery { .. } => Some("invalidFilter"),
            Self::InvalidRequest { .. } | Self::Json(_) => Some("invalidSyntax"),
            Self::UnsupportedPatchRequest { .. } => Some("invalidValue"),
            Self::Validation(ValidationError::UniquenessViolation { .. }) => Some("uniqueness"),
            _ => None,
        }
    }
}

impl From<StorageError> for ScimError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::NotFound { resource_type, id } => {
                Self::ResourceNotFound { resource_type, id }
            }
            StorageError::Validation(validation) => Self::Validation(validation),
            StorageError::UnknownOperation { operation } => Self::MethodNotFound(operation),
            StorageError::InvalidArgument { operation, message } => Self::Validation(
                ValidationError::custom(format!("{}: {}", operation, message)),
            ),
            other => Self::Storage(other),
        }
    }
}

impl ValidationError {
    /// Create a missing required attribute error
    pub fn missing_required(attribute: impl Into<String>) -> Self {
        Self::MissingRequiredAttribute {
            attribute: attribute.into(),
        }
    }

    /// Create a custom validation error
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom {
            message: message.into(),
        }
    }
}

// Result type aliases for convenience
pub type ScimResult<T> = Result<T, ScimError>;
pub type BuildResult<T> = Result<T, BuildError>;
