//! SCIM wire envelopes (RFC 7644 §3.4.2 and §3.12).

use crate::error::ScimError;
use crate::query::PageWindow;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const LIST_RESPONSE_SCHEMA: &str = "urn:ietf:params:scim:api:messages:2.0:ListResponse";
pub const ERROR_SCHEMA: &str = "urn:ietf:params:scim:api:messages:2.0:Error";

/// Envelope for one page of list results.
///
/// `totalResults` counts every match while `itemsPerPage` is the page size
/// that was applied, so the two may differ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub schemas: Vec<String>,
    pub total_results: usize,
    pub start_index: usize,
    pub items_per_page: usize,
    #[serde(rename = "Resources")]
    pub resources: Vec<Value>,
}

impl ListResponse {
    pub fn new(window: &PageWindow, resources: Vec<Value>) -> Self {
        Self {
            schemas: vec![LIST_RESPONSE_SCHEMA.to_string()],
            total_results: window.total,
            start_index: window.start_index,
            items_per_page: window.limit,
            resources,
        }
    }
}

/// Error envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub schemas: Vec<String>,
    /// HTTP status as a string, per RFC 7644
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scim_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorResponse {
    pub fn new(status: u16) -> Self {
        Self {
            schemas: vec![ERROR_SCHEMA.to_string()],
            status: status.to_string(),
            scim_type: None,
            detail: None,
        }
    }

    /// The bare not-found envelope.
    ///
    /// It carries no detail, so a record outside the caller's tenant reads
    /// exactly like a record that never existed.
    pub fn not_found() -> Self {
        Self::new(404)
    }
}

impl From<&ScimError> for ErrorResponse {
    fn from(error: &ScimError) -> Self {
        let status = error.status_code();
        if status == 404 {
            return Self::not_found();
        }
        Self {
            scim_type: error.scim_type().map(str::to_string),
            detail: Some(error.to_string()),
            ..Self::new(status)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_response_shape() {
        let window = PageWindow::compute(Some(2), Some(1), 3);
        let envelope = ListResponse::new(&window, vec![json!({"id": 2})]);
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({
                "schemas": [LIST_RESPONSE_SCHEMA],
                "totalResults": 3,
                "startIndex": 2,
                "itemsPerPage": 1,
                "Resources": [{"id": 2}]
            })
        );
    }

    #[test]
    fn test_not_found_has_no_detail() {
        let envelope = ErrorResponse::from(&ScimError::resource_not_found("User", "1"));
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"schemas": [ERROR_SCHEMA], "status": "404"})
        );
    }

    #[test]
    fn test_error_carries_scim_type() {
        let envelope = ErrorResponse::from(&ScimError::invalid_query("bad"));
        assert_eq!(envelope.status, "400");
        assert_eq!(envelope.scim_type.as_deref(), Some("invalidFilter"));
        assert!(envelope.detail.unwrap().contains("bad"));
    }
}
