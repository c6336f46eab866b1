//! Builder utilities for operation handler types
//!
//! Convenience constructors for [`ScimOperationRequest`](super::ScimOperationRequest),
//! one per operation type.

pub mod request;
