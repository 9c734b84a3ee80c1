//! Count flow - walk a target, aggregate token counts, render the report
//!
//! Local directories are walked in place. Remote repositories are cloned into
//! a [`RemoteCheckout`] that lives until the report is built, so the clone is
//! removed on every exit path out of [`count_target`].

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::backends::git::{resolve_target, RemoteCheckout, Target};
use crate::backends::walker::{walk, ScanOptions};
use crate::core::aggregate::Aggregator;
use crate::core::classifier::TechnologyTable;
use crate::core::model::{CountReport, FileOutcome, SkippedFile};
use crate::core::progress::Progress;
use crate::core::render::Renderer;
use crate::core::report::{context_usage, CONTEXT_WINDOWS};
use crate::core::tokenizer::{Encoding, EncodingTokenizer, Tokenizer};

/// Everything a count run can be configured with
#[derive(Debug, Clone, Default)]
pub struct CountOptions {
    pub encoding: Encoding,
    /// Replaces the built-in technology table when set
    pub extension_map: Option<PathBuf>,
    pub scan: ScanOptions,
    /// Draw a progress bar on stderr when it is a terminal
    pub progress: bool,
}

/// Walk `root` and build a report.
///
/// `source` is only used for display.
pub fn count_path(
    root: &Path,
    source: &str,
    table: &TechnologyTable,
    tokenizer: &dyn Tokenizer,
    scan: &ScanOptions,
    progress: &Progress,
) -> Result<CountReport> {
    let outcomes = walk(root, table, tokenizer, scan, progress);
    progress.finish_and_clear();

    let mut aggregator = Aggregator::new();
    aggregator
        .extend(&outcomes)
        .context("Failed to aggregate token counts")?;

    let skipped: Vec<SkippedFile> = outcomes
        .into_iter()
        .filter_map(|outcome| match outcome {
            FileOutcome::Skipped(skipped) => Some(skipped),
            FileOutcome::Counted(_) => None,
        })
        .collect();

    debug!(
        files = aggregator.total_files(),
        tokens = aggregator.total_tokens(),
        skipped = skipped.len(),
        tokenizer = %tokenizer.name(),
        "Walk finished"
    );
    let summary = aggregator.summary();

    Ok(CountReport {
        source: source.to_string(),
        windows: context_usage(summary.total_tokens, CONTEXT_WINDOWS),
        summary,
        skipped,
    })
}

/// Count a resolved target, cloning it first when it is remote
pub fn count_target(target: &Target, options: &CountOptions) -> Result<CountReport> {
    let custom_table = options
        .extension_map
        .as_deref()
        .map(|path| {
            TechnologyTable::from_path(path)
                .with_context(|| format!("Failed to load extension map {}", path.display()))
        })
        .transpose()?;
    if let Some(custom) = &custom_table {
        debug!(entries = custom.len(), "Loaded custom extension map");
        if custom.is_empty() {
            warn!("Extension map has no entries; every file will be Unknown");
        }
    }
    let table = custom_table
        .as_ref()
        .unwrap_or(TechnologyTable::builtin());

    let tokenizer = EncodingTokenizer::new(options.encoding)
        .with_context(|| format!("Failed to initialize {} tokenizer", options.encoding))?;
    debug!(encoding = %tokenizer.encoding(), "Tokenizer ready");

    let progress = Progress::new(options.progress);
    match target {
        Target::Local(path) => {
            info!(path = %path.display(), "Analyzing local directory");
            count_path(
                path,
                &path.display().to_string(),
                table,
                &tokenizer,
                &options.scan,
                &progress,
            )
        }
        Target::Remote(url) => {
            info!(url = %url, "Cloning repository");
            progress.set_message(format!("Cloning {url}"));
            let checkout = RemoteCheckout::clone(url)
                .with_context(|| format!("Failed to clone {}", url))?;
            debug!(temp_dir = %checkout.temp_path().display(), "Clone ready");
            count_path(
                checkout.root(),
                url,
                table,
                &tokenizer,
                &options.scan,
                &progress,
            )
        }
    }
}

/// Resolve, count and print
pub fn run_count(raw_target: &str, options: &CountOptions, renderer: &Renderer) -> Result<()> {
    let target = resolve_target(raw_target).context("Invalid target")?;
    let report = count_target(&target, options)?;
    println!("{}", renderer.render(&report));
    Ok(())
}
