//! Directory walker
//!
//! Uses the ignore crate's walker with its standard filters turned off: hidden
//! files count and .gitignore is not consulted. Excluded directories are
//! pruned in `filter_entry`, so their subtrees are never read.
//!
//! Symlinks to regular files are counted under the link's own path. Symlinks
//! to directories are never followed.

use ignore::WalkBuilder;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::core::classifier::TechnologyTable;
use crate::core::file_reader::{read_text, FileReadConfig};
use crate::core::model::{FileOutcome, FileRecord, SkippedFile};
use crate::core::paths::display_relative;
use crate::core::progress::Progress;
use crate::core::tokenizer::Tokenizer;

/// Directory names never descended into
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &[
    // version control
    ".git",
    ".hg",
    ".svn",
    // virtual environments
    "venv",
    ".venv",
    "env",
    ".tox",
    // dependency and bytecode caches
    "node_modules",
    "__pycache__",
    ".pytest_cache",
    ".mypy_cache",
    ".ruff_cache",
];

/// Walk configuration
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub excluded_dirs: BTreeSet<String>,
    pub read: FileReadConfig,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            excluded_dirs: DEFAULT_EXCLUDED_DIRS.iter().map(|s| s.to_string()).collect(),
            read: FileReadConfig::default(),
        }
    }
}

impl ScanOptions {
    pub fn is_excluded_dir(&self, name: &str) -> bool {
        self.excluded_dirs.contains(name)
    }
}

/// Walk `root` and produce one outcome per regular file.
///
/// Per-file failures become [`FileOutcome::Skipped`] and are logged; they
/// never abort the walk.
///
/// `progress` advances once per file.
pub fn walk(
    root: &Path,
    table: &TechnologyTable,
    tokenizer: &dyn Tokenizer,
    options: &ScanOptions,
    progress: &Progress,
) -> Vec<FileOutcome> {
    let candidates = collect_candidates(root, options);
    progress.start_files(candidates.len());

    let mut outcomes = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let outcome = if candidate.symlink {
            match resolve_symlink(&candidate.path, root) {
                Ok(true) => Some(process_file(&candidate.path, root, table, tokenizer, options)),
                Ok(false) => None,
                Err(skipped) => Some(FileOutcome::Skipped(skipped)),
            }
        } else {
            Some(process_file(&candidate.path, root, table, tokenizer, options))
        };
        progress.file_done(&display_relative(&candidate.path, root));

        let Some(outcome) = outcome else {
            continue;
        };
        match &outcome {
            FileOutcome::Skipped(skipped) => log_skip(skipped),
            FileOutcome::Counted(record) => {
                debug!(path = outcome.path(), tokens = record.token_count, "Counted file")
            }
        }
        outcomes.push(outcome);
    }

    outcomes
}

/// A non-directory entry found by the walk
struct Candidate {
    path: PathBuf,
    symlink: bool,
}

/// Enumerate regular files and symlinks in file name order, pruning excluded
/// directories
fn collect_candidates(root: &Path, options: &ScanOptions) -> Vec<Candidate> {
    let scan = Arc::new(options.clone());

    let mut builder = WalkBuilder::new(root);
    builder
        .standard_filters(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(move |entry| {
            let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
            let excluded_dir = is_dir
                && entry.depth() > 0
                && scan.is_excluded_dir(&entry.file_name().to_string_lossy());
            if excluded_dir {
                debug!(path = %entry.path().display(), "Pruning excluded directory");
            }
            !excluded_dir
        });

    let mut candidates = Vec::new();

    for entry in builder.build() {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                warn!(error = %err, "Skipping unreadable directory entry");
                continue;
            }
        };

        let Some(ft) = entry.file_type() else {
            continue;
        };
        if ft.is_file() || ft.is_symlink() {
            candidates.push(Candidate {
                path: entry.into_path(),
                symlink: ft.is_symlink(),
            });
        }
    }

    candidates
}

/// Whether a symlink points at a regular file.
///
/// Directory links are not followed. A dangling or unreadable link is a skip.
fn resolve_symlink(path: &Path, root: &Path) -> Result<bool, SkippedFile> {
    match fs::metadata(path) {
        Ok(metadata) if metadata.is_file() => Ok(true),
        Ok(_) => {
            debug!(path = %path.display(), "Not following symlink to a non-file");
            Ok(false)
        }
        Err(err) => Err(SkippedFile {
            path: display_relative(path, root),
            reason: err.into(),
        }),
    }
}

/// Classify, read and tokenize a single file
pub fn process_file(
    path: &Path,
    root: &Path,
    table: &TechnologyTable,
    tokenizer: &dyn Tokenizer,
    options: &ScanOptions,
) -> FileOutcome {
    let relative = display_relative(path, root);

    let content = match read_text(path, &options.read) {
        Ok(content) => content,
        Err(reason) => {
            return FileOutcome::Skipped(SkippedFile {
                path: relative,
                reason,
            })
        }
    };

    let token_count = match tokenizer.count_tokens(&content) {
        Ok(n) => n,
        Err(err) => {
            return FileOutcome::Skipped(SkippedFile {
                path: relative,
                reason: err.into(),
            })
        }
    };

    let classification = table.classify(path);
    if !classification.is_known() {
        debug!(
            path = %relative,
            extension = %classification.extension,
            "No technology for extension"
        );
    }
    FileOutcome::Counted(FileRecord {
        path: relative,
        extension: classification.extension,
        technology: classification.technology,
        token_count,
    })
}

fn log_skip(skipped: &SkippedFile) {
    let code = skipped.reason.code();
    if skipped.reason.is_expected() {
        debug!(path = %skipped.path, code, "Skipping file: {}", skipped.reason);
    } else {
        warn!(path = %skipped.path, code, "Skipping file: {}", skipped.reason);
    }
}
