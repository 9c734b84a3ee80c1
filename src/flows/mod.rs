//! Flows module - End-to-end operations
//!
//! Provides:
//! - count: resolve a target, walk it, aggregate and render the report

pub mod count;
