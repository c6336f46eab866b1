//! Error handling utilities for operation handlers
//!
//! This module turns a failed operation into the SCIM Error envelope the
//! transport should return.

use crate::{
    ScimError,
    operation_handler::{
        core::{OperationMetadata, ScimOperationResponse},
        response::ErrorResponse,
    },
};

/// Create an error response from a ScimError.
pub fn create_error_response(error: ScimError, request_id: String) -> ScimOperationResponse {
    let envelope = ErrorResponse::from(&error);
    let body = serde_json::to_value(&envelope).ok();

    ScimOperationResponse::new(
        error.status_code(),
        body,
        OperationMetadata {
            request_id,
            ..OperationMetadata::default()
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use serde_json::json;

    #[test]
    fn test_not_found_envelope() {
        let response =
            create_error_response(ScimError::resource_not_found("Group", "9"), "req".into());
        assert_eq!(response.status, 404);
        assert_eq!(
            response.body,
            Some(json!({
                "schemas": ["urn:ietf:params:scim:api:messages:2.0:Error"],
                "status": "404"
            }))
        );
        assert_eq!(response.metadata.request_id, "req");
    }

    #[test]
    fn test_validation_envelope() {
        let response = create_error_response(
            ValidationError::missing_required("email").into(),
            "req".into(),
        );
        assert_eq!(response.status, 422);
        let body = response.body.unwrap();
        assert_eq!(body["status"], "422");
        assert!(body["detail"].as_str().unwrap().contains("email"));
    }
}
