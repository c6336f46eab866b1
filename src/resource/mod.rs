//! Resource model and schema mapping.
//!
//! This module provides the seam between stored records and the SCIM wire
//! shape. Storage produces [`Record`]s (or any other [`ResourceEntity`]);
//! the [`ResourceMapper`] renders them through a resource type's schema and
//! extracts mutable attributes from inbound payloads.
//!
//! # Key Components
//!
//! * [`ResourceEntity`] - Attribute and relation access for serialization
//! * [`Record`] - The generic stored entity
//! * [`ResourceMapper`] - Schema-driven serialize/extract for one resource type
//! * [`RequestContext`] - Request tracking scoped to one tenant

pub mod context;
pub mod entity;
pub mod mapper;

pub use context::{ListQuery, RequestContext};
pub use entity::{Record, ResourceEntity};
pub use mapper::ResourceMapper;
