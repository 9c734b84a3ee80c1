//! Context window comparison and number formatting

/// A model's maximum request size in tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextWindow {
    pub model_name: &'static str,
    pub size_in_tokens: u64,
}

const fn window(model_name: &'static str, size_in_tokens: u64) -> ContextWindow {
    ContextWindow {
        model_name,
        size_in_tokens,
    }
}

/// Known context windows, in display order
pub const CONTEXT_WINDOWS: &[ContextWindow] = &[
    // OpenAI
    window("GPT-3.5 (4K)", 4096),
    window("GPT-4 (8K)", 8192),
    window("GPT-4 (32K)", 32768),
    window("GPT-4 Turbo (128K)", 128000),
    // Anthropic
    window("Claude 2 (100K)", 100000),
    window("Claude 3 Opus (200K)", 200000),
    window("Claude 3 Sonnet (200K)", 200000),
    window("Claude 3 Haiku (200K)", 200000),
    // Google
    window("Gemini Pro (32K)", 32768),
    window("PaLM 2 (8K)", 8192),
    // Meta
    window("Llama 2 (4K)", 4096),
    window("Code Llama (100K)", 100000),
    // Others
    window("Mistral Large (32K)", 32768),
    window("Mixtral 8x7B (32K)", 32768),
    window("Yi-34B (200K)", 200000),
    window("Cohere Command (128K)", 128000),
];

/// How much of one window a token total occupies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowUsage {
    pub window: ContextWindow,
    pub usage_pct: f64,
}

impl WindowUsage {
    /// Whether the total fits in the window
    pub fn fits(&self) -> bool {
        self.usage_pct <= 100.0
    }
}

/// Percentage of a window used; above 100 means the codebase doesn't fit
pub fn usage_pct(total_tokens: usize, size_in_tokens: u64) -> f64 {
    total_tokens as f64 / size_in_tokens as f64 * 100.0
}

/// Usage for every window, keeping the table's order
pub fn context_usage(total_tokens: usize, windows: &[ContextWindow]) -> Vec<WindowUsage> {
    windows
        .iter()
        .map(|w| WindowUsage {
            window: *w,
            usage_pct: usage_pct(total_tokens, w.size_in_tokens),
        })
        .collect()
}

/// Abbreviate large numbers ("1.5M", "2.0B"); smaller ones get thousands separators
pub fn format_number(n: usize) -> String {
    const MILLION: usize = 1_000_000;
    const BILLION: usize = 1_000_000_000;

    if n >= BILLION {
        format!("{:.1}B", n as f64 / BILLION as f64)
    } else if n >= MILLION {
        format!("{:.1}M", n as f64 / MILLION as f64)
    } else {
        group_thousands(n)
    }
}

/// "1234567" -> "1,234,567"
pub fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Abbreviated form followed by the exact value, e.g. "1.5M (1,500,000)"
pub fn format_tokens(n: usize) -> String {
    format!("{} ({})", format_number(n), group_thousands(n))
}

/// "1 file" / "3 files"
pub fn format_file_count(n: usize) -> String {
    if n == 1 {
        "1 file".to_string()
    } else {
        format!("{} files", group_thousands(n))
    }
}
