//! # SCIM Mapping Configuration Validator
//!
//! A command-line utility for validating mapping configuration files before
//! they are loaded by an application embedding the mapping engine.
//!
//! ## Overview
//!
//! The validator builds the configuration exactly as the library does at
//! startup, so every error it reports would also stop the application:
//! - JSON syntax and unknown fields
//! - Resource types without a schema, or configured twice
//! - Mutable attributes that do not resolve in the mutable schema
//! - Accessors referenced more than once where a path must be unique
//! - Create keys that are not queryable
//!
//! For a valid file it prints the resolved wire path of every mutable
//! attribute, which is what PATCH paths and PUT payloads are matched against.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin config-validator configs/scim-mapping.json
//! ```
//!
//! ## Output Example
//!
//! ```text
//! Validating mapping configuration: configs/scim-mapping.json
//! ✓ Configuration is valid!
//!   Page size: 100 (max 1000)
//!
//! Group
//!   Mutable attributes:
//!     display_name -> displayName
//!   Queryable attributes:
//!     displayName -> display_name
//!   List order: display_name Ascending
//!   Create key: displayName
//!   Membership: members (add_members / remove_members)
//! ```

use scim_mapper::config::{ResourceConfig, ScimConfig};
use std::env;
use std::fs;
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <mapping-config.json>", args[0]);
        eprintln!();
        eprintln!("Example:");
        eprintln!("  {} configs/scim-mapping.json", args[0]);
        process::exit(1);
    }

    let path = Path::new(&args[1]);
    if !path.is_file() {
        eprintln!("Error: '{}' is not a file", path.display());
        process::exit(1);
    }

    println!("Validating mapping configuration: {}", path.display());
    match load_config(path) {
        Ok(config) => {
            println!("✓ Configuration is valid!");
            println!(
                "  Page size: {} (max {})",
                config.default_page_size(),
                config
                    .max_page_size()
                    .map(|max| max.to_string())
                    .unwrap_or_else(|| "unbounded".to_string())
            );
            for resource in config.resources() {
                print_resource_summary(resource);
            }
        }
        Err(e) => {
            eprintln!("❌ Configuration validation failed: {}", e);
            process::exit(1);
        }
    }
}

fn load_config(path: &Path) -> Result<ScimConfig, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    Ok(ScimConfig::from_json(&content)?)
}

fn print_resource_summary(resource: &ResourceConfig) {
    println!("\n{}", resource.resource_type());

    println!("  Mutable attributes:");
    for (accessor, path) in resource.mutable_paths() {
        println!("    {} -> {}", accessor, path);
    }

    if !resource.queryable_attributes().is_empty() {
        println!("  Queryable attributes:");
        for (wire_name, attribute) in resource.queryable_attributes() {
            println!("    {} -> {}", wire_name, attribute);
        }
    }

    let order = resource.list_order();
    println!("  List order: {} {:?}", order.attribute, order.direction);

    if let Some(key) = resource.create_key() {
        println!("  Create key: {}", key);
    }
    if let Some(membership) = resource.membership() {
        println!(
            "  Membership: {} ({} / {})",
            membership.accessor, membership.add_operation, membership.remove_operation
        );
    }
    if let Some(status) = resource.status() {
        println!(
            "  Status: {} ({} / {})",
            status.accessor, status.reprovision_operation, status.deprovision_operation
        );
    }
}
