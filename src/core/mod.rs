//! Core module - Data model, classification, counting and rendering
//!
//! This module provides:
//! - Result model (FileRecord, FileOutcome, CountReport)
//! - Extension to technology classification
//! - File reading with binary and size checks
//! - Token counting behind the Tokenizer trait
//! - Aggregation, context window comparison and table rendering
//! - Progress display on stderr

pub mod aggregate;
pub mod classifier;
pub mod file_reader;
pub mod model;
pub mod paths;
pub mod progress;
pub mod render;
pub mod report;
pub mod tokenizer;
