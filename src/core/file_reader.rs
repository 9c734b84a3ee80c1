//! File reading for token counting
//!
//! Provides consistent handling for:
//! - Oversized files (skipped before reading)
//! - Binary files (null byte in the sampled prefix)
//! - Non-UTF-8 files (skipped, never lossily converted, so counts stay honest)

use std::fs;
use std::io::Read;
use std::path::Path;

use crate::core::classifier::{is_binary_sample, DEFAULT_SAMPLE_SIZE};
use crate::core::model::SkipReason;

/// Default maximum file size in bytes (64 MB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 64 * 1024 * 1024;

/// Configuration for file reading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReadConfig {
    /// Maximum file size to process (bytes)
    pub max_file_size: u64,

    /// Prefix length inspected for null bytes
    pub sample_size: usize,
}

impl Default for FileReadConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }
}

/// Read a file as UTF-8 text, or say why it can't be counted.
///
/// The prefix sample is checked for binary content before the rest of the
/// file is read, so large binaries cost at most one sample read.
pub fn read_text(path: &Path, config: &FileReadConfig) -> Result<String, SkipReason> {
    let mut file = fs::File::open(path)?;
    let size = file.metadata()?.len();

    if size > config.max_file_size {
        return Err(SkipReason::TooLarge {
            size,
            limit: config.max_file_size,
        });
    }

    let mut buffer = Vec::with_capacity(size as usize);
    file.by_ref()
        .take(config.sample_size as u64)
        .read_to_end(&mut buffer)?;

    if is_binary_sample(&buffer) {
        return Err(SkipReason::Binary);
    }

    file.read_to_end(&mut buffer)?;

    String::from_utf8(buffer).map_err(|_| SkipReason::InvalidUtf8)
}
