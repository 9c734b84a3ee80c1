//! Aggregation of per-file token counts
//!
//! An [`Aggregator`] is an explicit value, built fresh for every run. Each
//! [`FileRecord`] updates three accumulators: its extension, its technology,
//! and the grand total. Updates are all-or-nothing.

use std::collections::HashMap;
use thiserror::Error;

use crate::core::model::{FileOutcome, FileRecord, Summary, TokenStat};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AggregateError {
    #[error("token total overflow while adding {path}")]
    Overflow { path: String },
}

/// Accumulates token and file counts by extension and by technology
#[derive(Debug, Default)]
pub struct Aggregator {
    by_extension: HashMap<String, TokenStat>,
    by_technology: HashMap<String, TokenStat>,
    total_tokens: usize,
    total_files: usize,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one record into the totals.
    ///
    /// Every new value is computed before anything is written, so an overflow
    /// leaves all accumulators untouched.
    pub fn add(&mut self, record: &FileRecord) -> Result<(), AggregateError> {
        let overflow = || AggregateError::Overflow {
            path: record.path.clone(),
        };

        let extension = bumped(
            self.by_extension.get(&record.extension),
            &record.extension,
            record.token_count,
        )
        .ok_or_else(overflow)?;
        let technology = bumped(
            self.by_technology.get(&record.technology),
            &record.technology,
            record.token_count,
        )
        .ok_or_else(overflow)?;
        let total_tokens = self
            .total_tokens
            .checked_add(record.token_count)
            .ok_or_else(overflow)?;
        let total_files = self.total_files.checked_add(1).ok_or_else(overflow)?;

        self.by_extension.insert(record.extension.clone(), extension);
        self.by_technology.insert(record.technology.clone(), technology);
        self.total_tokens = total_tokens;
        self.total_files = total_files;
        Ok(())
    }

    /// Fold the counted outcomes; skipped ones don't touch the totals
    pub fn extend<'a, I>(&mut self, outcomes: I) -> Result<(), AggregateError>
    where
        I: IntoIterator<Item = &'a FileOutcome>,
    {
        for record in outcomes.into_iter().filter_map(FileOutcome::record) {
            self.add(record)?;
        }
        Ok(())
    }

    pub fn total_tokens(&self) -> usize {
        self.total_tokens
    }

    pub fn total_files(&self) -> usize {
        self.total_files
    }

    /// Stable snapshot, sorted by descending tokens then key
    pub fn summary(&self) -> Summary {
        Summary {
            total_tokens: self.total_tokens,
            total_files: self.total_files,
            extensions: sorted_stats(&self.by_extension),
            technologies: sorted_stats(&self.by_technology),
        }
    }
}

fn bumped(current: Option<&TokenStat>, key: &str, tokens: usize) -> Option<TokenStat> {
    match current {
        Some(stat) => Some(TokenStat {
            key: stat.key.clone(),
            total_tokens: stat.total_tokens.checked_add(tokens)?,
            file_count: stat.file_count.checked_add(1)?,
        }),
        None => Some(TokenStat {
            key: key.to_string(),
            total_tokens: tokens,
            file_count: 1,
        }),
    }
}

fn sorted_stats(stats: &HashMap<String, TokenStat>) -> Vec<TokenStat> {
    let mut sorted: Vec<TokenStat> = stats.values().cloned().collect();
    sorted.sort_by(|a, b| {
        b.total_tokens
            .cmp(&a.total_tokens)
            .then_with(|| a.key.cmp(&b.key))
    });
    sorted
}
