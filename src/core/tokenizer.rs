//! Token counting - the tokenizer seam used by the walker
//!
//! [`EncodingTokenizer`] wraps the tiktoken BPE encodings, with a fast
//! heuristic fallback that needs no encoding data at all.
//!
//! Supported encodings:
//! - gpt2 / r50k_base (default)
//! - cl100k_base (GPT-4, GPT-3.5-turbo)
//! - o200k_base (GPT-4o)
//! - heuristic (character class estimate)
//!
//! Usage:
//! ```rust,ignore
//! let tokenizer = EncodingTokenizer::new(Encoding::default())?;
//! let tokens = tokenizer.count_tokens("Hello world")?;
//! ```

use once_cell::sync::Lazy;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tiktoken_rs::{cl100k_base, o200k_base, r50k_base, CoreBPE};

/// Tokenizer failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenizerError {
    #[error("failed to load {encoding} encoding: {message}")]
    Load {
        encoding: Encoding,
        message: String,
    },

    /// Only the test tokenizers fail per text; the BPE encoders are infallible
    #[cfg(test)]
    #[error("{0}")]
    Encode(String),
}

/// Maps text to a token count. Must be deterministic for identical input.
pub trait Tokenizer {
    fn count_tokens(&self, text: &str) -> Result<usize, TokenizerError>;

    /// Display name of the encoding in use
    fn name(&self) -> String;
}

/// Supported token encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// r50k_base, the GPT-2 vocabulary
    #[default]
    Gpt2,
    /// cl100k_base (GPT-4, GPT-3.5-turbo)
    Cl100k,
    /// o200k_base (GPT-4o)
    O200k,
    /// Fast heuristic estimation (no BPE encoding)
    Heuristic,
}

impl Encoding {
    /// List all accepted names
    pub fn available() -> &'static [&'static str] {
        &["gpt2", "cl100k", "o200k", "heuristic"]
    }

    fn bpe(&self) -> Result<Option<&'static CoreBPE>, TokenizerError> {
        let loaded = match self {
            Encoding::Gpt2 => &*R50K_BPE,
            Encoding::Cl100k => &*CL100K_BPE,
            Encoding::O200k => &*O200K_BPE,
            Encoding::Heuristic => return Ok(None),
        };
        loaded
            .as_ref()
            .map(Some)
            .map_err(|message| TokenizerError::Load {
                encoding: *self,
                message: message.clone(),
            })
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Encoding::Gpt2 => "gpt2",
            Encoding::Cl100k => "cl100k",
            Encoding::O200k => "o200k",
            Encoding::Heuristic => "heuristic",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gpt2" | "gpt-2" | "r50k" | "r50k_base" | "default" => Ok(Encoding::Gpt2),
            "cl100k" | "cl100k_base" | "gpt4" | "gpt-4" => Ok(Encoding::Cl100k),
            "o200k" | "o200k_base" | "gpt4o" | "gpt-4o" => Ok(Encoding::O200k),
            "heuristic" | "fast" | "estimate" => Ok(Encoding::Heuristic),
            _ => Err(format!(
                "Unknown encoding: {}. Available: {}",
                s,
                Encoding::available().join(", ")
            )),
        }
    }
}

// Loaded once on first use
static R50K_BPE: Lazy<Result<CoreBPE, String>> =
    Lazy::new(|| r50k_base().map_err(|e| format!("Failed to load r50k_base: {}", e)));

static CL100K_BPE: Lazy<Result<CoreBPE, String>> =
    Lazy::new(|| cl100k_base().map_err(|e| format!("Failed to load cl100k_base: {}", e)));

static O200K_BPE: Lazy<Result<CoreBPE, String>> =
    Lazy::new(|| o200k_base().map_err(|e| format!("Failed to load o200k_base: {}", e)));

/// Production tokenizer backed by a tiktoken encoding
#[derive(Clone, Copy)]
pub struct EncodingTokenizer {
    encoding: Encoding,
    bpe: Option<&'static CoreBPE>,
}

impl fmt::Debug for EncodingTokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodingTokenizer")
            .field("encoding", &self.encoding)
            .finish()
    }
}

impl EncodingTokenizer {
    /// Load the encoding up front so a broken encoding fails the run, not every file
    pub fn new(encoding: Encoding) -> Result<Self, TokenizerError> {
        let bpe = encoding.bpe()?;
        Ok(Self { encoding, bpe })
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }
}

impl Tokenizer for EncodingTokenizer {
    fn count_tokens(&self, text: &str) -> Result<usize, TokenizerError> {
        if text.is_empty() {
            return Ok(0);
        }

        Ok(match self.bpe {
            Some(bpe) => bpe.encode_with_special_tokens(text).len(),
            None => estimate_tokens_heuristic(text),
        })
    }

    fn name(&self) -> String {
        self.encoding.to_string()
    }
}

/// Estimate tokens using a fast heuristic (no BPE encoding)
///
/// - ASCII text: ~4 characters per token
/// - Code symbols: ~2 characters per token
/// - CJK characters: ~1.5 characters per token
/// - Other Unicode: ~2 characters per token
pub fn estimate_tokens_heuristic(text: &str) -> usize {
    let mut ascii = 0usize;
    let mut symbols = 0usize;
    let mut cjk = 0usize;
    let mut other = 0usize;

    for c in text.chars() {
        match c {
            c if c.is_ascii() && is_code_symbol(c) => symbols += 1,
            c if c.is_ascii() => ascii += 1,
            c if is_cjk_char(c) => cjk += 1,
            _ => other += 1,
        }
    }

    ascii.div_ceil(4) + symbols.div_ceil(2) + (cjk * 2).div_ceil(3) + other.div_ceil(2)
}

#[inline]
fn is_code_symbol(c: char) -> bool {
    c.is_ascii_punctuation()
}

#[inline]
fn is_cjk_char(c: char) -> bool {
    matches!(c as u32,
        0x4E00..=0x9FFF      // CJK Unified Ideographs
        | 0x3400..=0x4DBF    // CJK Extension A
        | 0x3000..=0x303F    // CJK Symbols and Punctuation
        | 0x3040..=0x309F    // Hiragana
        | 0x30A0..=0x30FF    // Katakana
        | 0xAC00..=0xD7AF    // Hangul Syllables
        | 0xFF00..=0xFFEF    // Fullwidth Forms
    )
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Counts whitespace separated words; enough to make totals predictable
    #[derive(Debug, Default)]
    pub struct WordTokenizer;

    impl Tokenizer for WordTokenizer {
        fn count_tokens(&self, text: &str) -> Result<usize, TokenizerError> {
            Ok(text.split_whitespace().count())
        }

        fn name(&self) -> String {
            "words".to_string()
        }
    }

    /// Fails on any text containing the marker
    #[derive(Debug)]
    pub struct FailingTokenizer {
        pub marker: &'static str,
    }

    impl Tokenizer for FailingTokenizer {
        fn count_tokens(&self, text: &str) -> Result<usize, TokenizerError> {
            if text.contains(self.marker) {
                return Err(TokenizerError::Encode(format!(
                    "refusing to encode text containing {:?}",
                    self.marker
                )));
            }
            Ok(text.split_whitespace().count())
        }

        fn name(&self) -> String {
            "failing".to_string()
        }
    }
}
