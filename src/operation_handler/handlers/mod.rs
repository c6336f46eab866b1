//! Operation handler modules
//!
//! - CRUD operations (get, create, replace, delete)
//! - Query operations (list)
//! - Patch operations (attribute replace, status, membership)

pub mod crud;
pub mod patch;
pub mod query;
