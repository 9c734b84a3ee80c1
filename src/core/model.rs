//! Result model for a token count run
//!
//! Every file the walker visits ends up as exactly one [`FileOutcome`]:
//! either a counted [`FileRecord`] or a [`SkippedFile`] carrying the reason
//! it was left out of the totals.

use thiserror::Error;

use crate::core::report::WindowUsage;
use crate::core::tokenizer::TokenizerError;

/// Technology name used when no table entry matches
pub const UNKNOWN_TECHNOLOGY: &str = "Unknown";

/// A file that was classified, read, and tokenized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Path relative to the scan root, using '/' as separator
    pub path: String,
    /// Lowercase extension including the leading dot, or empty
    pub extension: String,
    /// Resolved technology name, or [`UNKNOWN_TECHNOLOGY`]
    pub technology: String,
    pub token_count: usize,
}

/// Running token/file totals for one grouping key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenStat {
    pub key: String,
    pub total_tokens: usize,
    pub file_count: usize,
}

/// Totals keyed by file extension
pub type ExtensionStat = TokenStat;

/// Totals keyed by technology name
pub type TechnologyStat = TokenStat;

/// Why a file was excluded from all totals
#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("cannot read file: {0}")]
    Unreadable(#[from] std::io::Error),

    #[error("binary content (null byte in sampled prefix)")]
    Binary,

    #[error("content is not valid UTF-8")]
    InvalidUtf8,

    #[error("file size {size} exceeds limit {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    #[error("tokenizer failed: {0}")]
    Tokenizer(#[from] TokenizerError),
}

impl SkipReason {
    /// Stable code for the reason
    pub fn code(&self) -> &'static str {
        match self {
            SkipReason::Unreadable(_) => "FILE_UNREADABLE",
            SkipReason::Binary => "BINARY_FILE",
            SkipReason::InvalidUtf8 => "FILE_SKIPPED_ENCODING",
            SkipReason::TooLarge { .. } => "FILE_SKIPPED_SIZE",
            SkipReason::Tokenizer(_) => "TOKENIZER_FAILED",
        }
    }

    /// Binary files are an expected part of any tree, not a problem worth a warning
    pub fn is_expected(&self) -> bool {
        matches!(self, SkipReason::Binary)
    }
}

/// A file left out of the totals
#[derive(Debug)]
pub struct SkippedFile {
    pub path: String,
    pub reason: SkipReason,
}

/// Per-file result of the walk
#[derive(Debug)]
pub enum FileOutcome {
    Counted(FileRecord),
    Skipped(SkippedFile),
}

impl FileOutcome {
    pub fn path(&self) -> &str {
        match self {
            FileOutcome::Counted(record) => &record.path,
            FileOutcome::Skipped(skipped) => &skipped.path,
        }
    }

    pub fn record(&self) -> Option<&FileRecord> {
        match self {
            FileOutcome::Counted(record) => Some(record),
            FileOutcome::Skipped(_) => None,
        }
    }
}

/// Sorted snapshot of the aggregated totals
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub total_tokens: usize,
    pub total_files: usize,
    /// Descending by tokens, ties by key
    pub extensions: Vec<ExtensionStat>,
    /// Descending by tokens, ties by key
    pub technologies: Vec<TechnologyStat>,
}

impl Summary {
    pub fn is_empty(&self) -> bool {
        self.total_files == 0
    }
}

/// Everything the renderer needs for one run
#[derive(Debug)]
pub struct CountReport {
    /// What was analyzed (local path or repository URL), for display
    pub source: String,
    pub summary: Summary,
    pub skipped: Vec<SkippedFile>,
    /// Context window usage in the table's declared order
    pub windows: Vec<WindowUsage>,
}

impl CountReport {
    /// Skipped files worth surfacing (everything except binary content)
    pub fn unexpected_skips(&self) -> impl Iterator<Item = &SkippedFile> {
        self.skipped.iter().filter(|s| !s.reason.is_expected())
    }
}
