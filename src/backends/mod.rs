//! Backends module - Filesystem and external tool integrations
//!
//! Provides:
//! - walker: Directory traversal with excluded directory pruning
//! - git: Target resolution and shallow clones via the git executable

pub mod git;
pub mod walker;
