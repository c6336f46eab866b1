//! Framework-agnostic SCIM operation handler.
//!
//! This module provides structured request/response handling for SCIM
//! operations. A transport decodes its request into a
//! [`ScimOperationRequest`], hands it to [`ScimOperationHandler`], and writes
//! the returned status and body back out.
//!
//! # Key Types
//!
//! - [`ScimOperationHandler`] - Main handler for processing SCIM operations
//! - [`ScimOperationRequest`] - Structured request wrapper
//! - [`ScimOperationResponse`] - Status, body and metadata
//!
//! # Examples
//!
//! ```rust,no_run
//! use scim_mapper::config::{ResourceConfig, ScimConfig};
//! use scim_mapper::operation_handler::{ScimOperationHandler, ScimOperationRequest};
//! use scim_mapper::schema::SchemaNode;
//! use scim_mapper::storage::InMemoryStore;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ScimConfig::builder()
//!     .resource(
//!         ResourceConfig::builder("Group")
//!             .schema(SchemaNode::from(json!({"displayName": {"$ref": "display_name"}})))
//!             .mutable_attribute("display_name")
//!             .queryable("displayName", "display_name")
//!             .create_key("displayName"),
//!     )
//!     .build()?;
//! let handler = ScimOperationHandler::new(Arc::new(config), InMemoryStore::new());
//!
//! let request = ScimOperationRequest::create("Group", json!({"displayName": "Eng"}))
//!     .with_tenant("acme");
//! let response = handler.handle_operation(request).await;
//! assert_eq!(response.status, 201);
//! # Ok(())
//! # }
//! ```

mod builders;
mod core;
mod errors;
mod handlers;
pub mod response;

// Re-export all public types and functions
pub use core::{
    OperationMetadata, SCIM_CONTENT_TYPE, ScimOperationHandler, ScimOperationRequest,
    ScimOperationResponse, ScimOperationType,
};

pub use response::{ErrorResponse, ListResponse};

// Re-export error utilities for advanced usage
pub use errors::create_error_response;
