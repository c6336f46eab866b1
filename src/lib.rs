//! Schema-driven SCIM 2.0 mapping and mutation engine for Rust.
//!
//! Translates between SCIM wire payloads and application records using a
//! declarative schema per resource type, and applies list, create, replace,
//! PATCH and delete operations against a pluggable async store.
//!
//! # Core Components
//!
//! - [`ScimConfig`] - Immutable per-resource-type mapping configuration
//! - [`ResourceMapper`] - Serialize records and extract mutable attributes
//! - [`ScimOperationHandler`] - Transport-agnostic operation dispatch
//! - [`ResourceStore`] - Trait for implementing storage backends
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use scim_mapper::{ScimConfig, ScimOperationHandler, ScimOperationRequest};
//! use scim_mapper::config::ResourceConfig;
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
//! let response = handler
//!     .handle_operation(ScimOperationRequest::list("Group").with_tenant("acme"))
//!     .await;
//! assert_eq!(response.status, 200);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod operation_handler;
pub mod patch;
pub mod query;
pub mod resource;
pub mod schema;
pub mod storage;

// Re-export commonly used types for convenience
pub use config::{ResourceConfig, ScimConfig};
pub use error::{BuildError, ScimError, ScimResult, ValidationError};
pub use resource::{ListQuery, Record, RequestContext, ResourceEntity, ResourceMapper};
pub use schema::{AttributePath, SchemaNode};
pub use storage::{InMemoryStore, ResourceStore, StorageError, StorageKey};

pub use operation_handler::{
    OperationMetadata, ScimOperationHandler, ScimOperationRequest, ScimOperationResponse,
    ScimOperationType,
};
