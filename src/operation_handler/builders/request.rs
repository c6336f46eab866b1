//! Request builder utilities for ScimOperationRequest
//!
//! This module provides convenient builder methods for constructing
//! ScimOperationRequest instances for different operation types.

use crate::{
    operation_handler::core::{ScimOperationRequest, ScimOperationType},
    resource::ListQuery,
};
use serde_json::Value;

impl ScimOperationRequest {
    fn new(
        operation: ScimOperationType,
        resource_type: impl Into<String>,
        resource_id: Option<String>,
        data: Option<Value>,
    ) -> Self {
        Self {
            operation,
            resource_type: resource_type.into(),
            resource_id,
            data,
            query: ListQuery::default(),
            tenant_id: None,
            request_id: None,
        }
    }

    /// Create a new list operation request.
    pub fn list(resource_type: impl Into<String>) -> Self {
        Self::new(ScimOperationType::List, resource_type, None, None)
    }

    /// Create a new get operation request.
    pub fn get(resource_type: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self::new(
            ScimOperationType::Get,
            resource_type,
            Some(resource_id.into()),
            None,
        )
    }

    /// Create a new create operation request.
    pub fn create(resource_type: impl Into<String>, data: Value) -> Self {
        Self::new(ScimOperationType::Create, resource_type, None, Some(data))
    }

    /// Create a new replace (PUT) operation request.
    pub fn replace(
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
        data: Value,
    ) -> Self {
        Self::new(
            ScimOperationType::Replace,
            resource_type,
            Some(resource_id.into()),
            Some(data),
        )
    }

    /// Create a new patch operation request.
    pub fn patch(
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
        data: Value,
    ) -> Self {
        Self::new(
            ScimOperationType::Patch,
            resource_type,
            Some(resource_id.into()),
            Some(data),
        )
    }

    /// Create a new delete operation request.
    pub fn delete(resource_type: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self::new(
            ScimOperationType::Delete,
            resource_type,
            Some(resource_id.into()),
            None,
        )
    }

    /// Scope the request to a tenant.
    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Add request ID to the request.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Add query parameters to the request.
    pub fn with_query(mut self, query: ListQuery) -> Self {
        self.query = query;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_constructors() {
        let request = ScimOperationRequest::patch("Group", "7", json!({"Operations": []}))
            .with_tenant("acme")
            .with_request_id("req-1");
        assert_eq!(request.operation, ScimOperationType::Patch);
        assert_eq!(request.resource_id.as_deref(), Some("7"));
        assert_eq!(request.tenant_id.as_deref(), Some("acme"));
        assert_eq!(request.request_id.as_deref(), Some("req-1"));

        let request = ScimOperationRequest::list("User")
            .with_query(ListQuery::new().with_filter("userName eq a@b.c"));
        assert_eq!(request.query.filter(), Some("userName eq a@b.c"));
        assert!(request.data.is_none());
    }
}
