//! Core operation handler infrastructure
//!
//! This module contains the foundational types and main dispatcher logic for SCIM operations.
//! It provides the central handler struct and operation dispatch functionality that other
//! operation handler modules depend on.

use crate::{
    ScimError,
    config::{ResourceConfig, ScimConfig},
    error::ScimResult,
    resource::{ListQuery, Record, RequestContext},
    storage::{ResourceStore, StorageKey, StoragePrefix},
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Translate a store's error into the protocol error it stands for.
pub(super) fn store_error<E: Into<ScimError>>(error: E) -> ScimError {
    error.into()
}

/// Content type of every SCIM response body.
pub const SCIM_CONTENT_TYPE: &str = "application/scim+json";

/// Framework-agnostic operation handler for SCIM operations
///
/// This handler provides a structured interface for performing SCIM operations
/// without being tied to any specific transport layer. It never fails: every
/// error is rendered as a SCIM Error envelope with the matching status.
pub struct ScimOperationHandler<S: ResourceStore> {
    pub(super) config: Arc<ScimConfig>,
    pub(super) store: S,
}

/// Structured request for SCIM operations
///
/// This type encapsulates all the information needed to perform a SCIM operation
/// in a transport-agnostic way.
#[derive(Debug, Clone, PartialEq)]
pub struct ScimOperationRequest {
    /// The type of operation to perform
    pub operation: ScimOperationType,
    /// The resource type (e.g., "User", "Group")
    pub resource_type: String,
    /// Resource ID for operations that target a specific resource
    pub resource_id: Option<String>,
    /// Body for create/replace/patch operations
    pub data: Option<Value>,
    /// Query string parameters
    pub query: ListQuery,
    /// Tenant the caller was authenticated for
    pub tenant_id: Option<String>,
    /// Request ID for tracing and correlation
    pub request_id: Option<String>,
}

/// Types of SCIM operations supported by the handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScimOperationType {
    /// List resources with optional pagination and filtering
    List,
    /// Get a specific resource by ID
    Get,
    /// Create (or find) a resource by its key attribute
    Create,
    /// Replace the mutable attributes of a resource (PUT)
    Replace,
    /// Partially update a resource (PATCH)
    Patch,
    /// Delete a resource
    Delete,
}

/// Structured response from SCIM operations
#[derive(Debug, Clone, PartialEq)]
pub struct ScimOperationResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body; `None` for 204 No Content
    pub body: Option<Value>,
    /// Additional metadata about the operation
    pub metadata: OperationMetadata,
}

impl ScimOperationResponse {
    pub(crate) fn new(status: u16, body: Option<Value>, metadata: OperationMetadata) -> Self {
        Self {
            status,
            body,
            metadata,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn content_type(&self) -> &'static str {
        SCIM_CONTENT_TYPE
    }
}

/// Metadata about a SCIM operation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OperationMetadata {
    /// Resource type involved in the operation
    pub resource_type: Option<String>,
    /// Resource ID if applicable
    pub resource_id: Option<String>,
    /// Number of resources returned (for list operations)
    pub resource_count: Option<usize>,
    /// Total number of resources available (for pagination)
    pub total_results: Option<usize>,
    /// Request ID for tracing
    pub request_id: String,
    /// Tenant ID if applicable
    pub tenant_id: Option<String>,
}

impl OperationMetadata {
    pub(crate) fn for_request(
        context: &RequestContext,
        resource_type: &str,
        resource_id: Option<String>,
    ) -> Self {
        Self {
            resource_type: Some(resource_type.to_string()),
            resource_id,
            request_id: context.request_id.clone(),
            tenant_id: Some(context.tenant_id.clone()),
            ..Self::default()
        }
    }
}

impl<S: ResourceStore> ScimOperationHandler<S> {
    /// Create a new operation handler over a store.
    pub fn new(config: Arc<ScimConfig>, store: S) -> Self {
        Self { config, store }
    }

    /// Handle a structured SCIM operation request.
    ///
    /// This is the main entry point that dispatches to specific operation handlers
    /// based on the operation type.
    pub async fn handle_operation(&self, request: ScimOperationRequest) -> ScimOperationResponse {
        let request_id = request
            .request_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        info!(
            "SCIM operation handler processing {:?} for {} (request: '{}')",
            request.operation, request.resource_type, request_id
        );

        let result = match self.create_request_context(&request, &request_id) {
            Ok(context) => self.dispatch(request, &context).await,
            Err(e) => Err(e),
        };

        match &result {
            Ok(response) => {
                debug!(
                    "SCIM operation handler completed with status {} (request: '{}')",
                    response.status, request_id
                );
            }
            Err(e) => {
                warn!(
                    "SCIM operation handler failed: {} (request: '{}')",
                    e, request_id
                );
            }
        }

        result.unwrap_or_else(|e| super::errors::create_error_response(e, request_id))
    }

    async fn dispatch(
        &self,
        request: ScimOperationRequest,
        context: &RequestContext,
    ) -> ScimResult<ScimOperationResponse> {
        match request.operation {
            ScimOperationType::List => {
                super::handlers::query::handle_list(self, request, context).await
            }
            ScimOperationType::Get => {
                super::handlers::crud::handle_get(self, request, context).await
            }
            ScimOperationType::Create => {
                super::handlers::crud::handle_create(self, request, context).await
            }
            ScimOperationType::Replace => {
                super::handlers::crud::handle_replace(self, request, context).await
            }
            ScimOperationType::Patch => {
                super::handlers::patch::handle_patch(self, request, context).await
            }
            ScimOperationType::Delete => {
                super::handlers::crud::handle_delete(self, request, context).await
            }
        }
    }

    /// Create a RequestContext from the operation request.
    pub(super) fn create_request_context(
        &self,
        request: &ScimOperationRequest,
        request_id: &str,
    ) -> ScimResult<RequestContext> {
        match request.tenant_id.as_deref().map(str::trim) {
            Some(tenant_id) if !tenant_id.is_empty() => {
                Ok(RequestContext::new(request_id, tenant_id))
            }
            _ => Err(ScimError::invalid_request("request is not scoped to a tenant")),
        }
    }

    /// Configuration of the request's resource type.
    pub(super) fn resource_config(&self, resource_type: &str) -> ScimResult<&ResourceConfig> {
        self.config.resource(resource_type)
    }

    pub(super) fn config(&self) -> &ScimConfig {
        &self.config
    }

    pub(super) fn store(&self) -> &S {
        &self.store
    }

    pub(super) fn prefix(&self, context: &RequestContext, resource_type: &str) -> StoragePrefix {
        StorageKey::prefix(context.tenant_id(), resource_type)
    }

    /// Look up the addressed record, failing with not-found when absent.
    pub(super) async fn find_existing(
        &self,
        request: &ScimOperationRequest,
        context: &RequestContext,
    ) -> ScimResult<(StorageKey, Record)> {
        let resource_id = request.resource_id.as_deref().ok_or_else(|| {
            ScimError::invalid_request(format!(
                "Missing resource_id for {:?} operation",
                request.operation
            ))
        })?;
        let key = self
            .prefix(context, &request.resource_type)
            .key(resource_id);
        let record = self
            .store
            .find(key.clone())
            .await
            .map_err(store_error)?
            .ok_or_else(|| ScimError::resource_not_found(&request.resource_type, resource_id))?;
        Ok((key, record))
    }
}
