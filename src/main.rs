//! token-counter - count LLM tokens in a codebase
//!
//! token-counter provides:
//! - Token counts per file extension and per technology
//! - Shallow clones of remote Git repositories into a temporary directory
//! - Context window comparisons against common LLMs

use anyhow::Result;
use clap::Parser;

mod backends;
mod cli;
mod core;
mod flows;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_tracing(&cli);
    cli::run(cli)
}
