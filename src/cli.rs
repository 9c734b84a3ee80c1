//! CLI module - Command-line interface definitions and handlers

use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::backends::git::install_interrupt_cleanup;
use crate::backends::walker::ScanOptions;
use crate::core::file_reader::DEFAULT_MAX_FILE_SIZE;
use crate::core::render::{OutputFormat, Renderer};
use crate::core::tokenizer::Encoding;
use crate::flows::count::{run_count, CountOptions};

/// token-counter - count LLM tokens in a codebase, by extension and technology.
#[derive(Parser, Debug)]
#[command(name = "token-counter")]
#[command(
    author,
    version,
    about,
    long_about = r#"token-counter walks a local directory or a Git repository and counts the
tokens in every text file, grouped by file extension and by technology.

It then compares the grand total against the context windows of common LLMs.

Remote repositories are shallow-cloned into a temporary directory that is
removed when the run ends.

Examples:
    token-counter .
    token-counter ~/src/project --encoding cl100k
    token-counter https://github.com/owner/repo
    token-counter git@github.com:owner/repo.git --total
"#
)]
pub struct Cli {
    /// Local directory or Git repository URL to analyze.
    #[arg(
        value_name = "TARGET",
        long_help = "Local directory or Git repository URL to analyze.\n\n\
A target is treated as a repository when it starts with http://, https://,\n\
git://, ssh:// or file://, uses the scp-like user@host:path form, or ends in\n\
.git. An existing local directory always wins."
    )]
    pub target: String,

    /// Print only the total token count.
    #[arg(
        long,
        long_help = "Print only the grand total as a bare integer, with no tables.\n\n\
Progress logs and the progress bar are suppressed so the output can be\n\
captured by scripts."
    )]
    pub total: bool,

    /// Tokenizer encoding (gpt2/cl100k/o200k/heuristic).
    #[arg(
        long,
        env = "TOKEN_COUNTER_ENCODING",
        default_value = "gpt2",
        value_name = "NAME",
        long_help = "Tokenizer encoding used to count tokens.\n\n\
Supported values:\n\
- gpt2 (default, also r50k)\n\
- cl100k\n\
- o200k\n\
- heuristic (fast estimate, no vocabulary)"
    )]
    pub encoding: Encoding,

    /// JSON file replacing the built-in extension map.
    #[arg(
        long,
        env = "TOKEN_COUNTER_EXTENSION_MAP",
        value_name = "FILE",
        long_help = "Path to a JSON file replacing the built-in extension map.\n\n\
The file has up to three objects: \"extensions\" (\".py\": \"Python\"),\n\
\"compound\" (\".blade.php\": \"Laravel Blade\") and \"filenames\"\n\
(\"dockerfile\": \"Docker\")."
    )]
    pub extension_map: Option<PathBuf>,

    /// Skip files larger than this many bytes.
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_MAX_FILE_SIZE)]
    pub max_file_size: u64,

    /// Disable colored output.
    #[arg(
        long,
        long_help = "Disable colored output. Colors are also off when stdout is not a terminal."
    )]
    pub no_color: bool,

    /// Quiet mode (errors only on stderr, no progress bar).
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Verbose mode (debug logs on stderr).
    #[arg(
        short,
        long,
        long_help = "Enable debug logs on stderr, including every skipped binary file and\n\
every pruned directory. RUST_LOG overrides this when set."
    )]
    pub verbose: bool,
}

impl Cli {
    fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else if self.total {
            "warn"
        } else {
            "info"
        }
    }

    fn count_options(&self) -> CountOptions {
        let mut scan = ScanOptions::default();
        scan.read.max_file_size = self.max_file_size;
        CountOptions {
            encoding: self.encoding,
            extension_map: self.extension_map.clone(),
            scan,
            progress: !self.total && !self.quiet,
        }
    }

    fn renderer(&self) -> Renderer {
        let format = if self.total {
            OutputFormat::Total
        } else {
            OutputFormat::Table
        };
        let color = !self.no_color && std::io::stdout().is_terminal();
        Renderer::new(format).with_color(color)
    }
}

/// Install the stderr log subscriber; RUST_LOG wins over the CLI flags
pub fn init_tracing(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .init();
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    install_interrupt_cleanup().context("Failed to install interrupt handler")?;
    run_count(&cli.target, &cli.count_options(), &cli.renderer())
}
