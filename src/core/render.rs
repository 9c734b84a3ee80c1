//! Renderer module
//!
//! Renders a CountReport as human-readable tables, or as a bare total

use colored::{Color, Colorize};

use crate::core::model::{CountReport, TokenStat};
use crate::core::report::{format_file_count, format_tokens};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Summary line plus extension, technology and context window tables
    #[default]
    Table,
    /// Only the grand total, as a plain integer
    Total,
}

/// Column alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
}

#[derive(Debug, Clone)]
struct Cell {
    text: String,
    color: Option<Color>,
}

impl Cell {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
        }
    }

    fn colored(text: impl Into<String>, color: Color) -> Self {
        Self {
            text: text.into(),
            color: Some(color),
        }
    }
}

/// Fixed-width text table; widths are measured before any color is applied
#[derive(Debug)]
struct TextTable {
    title: String,
    columns: Vec<(&'static str, Align)>,
    rows: Vec<Vec<Cell>>,
}

impl TextTable {
    fn new(title: impl Into<String>, columns: Vec<(&'static str, Align)>) -> Self {
        Self {
            title: title.into(),
            columns,
            rows: Vec::new(),
        }
    }

    fn push(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    fn render(&self, color: bool) -> String {
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, (header, _))| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(|cell| cell.text.chars().count())
                    .chain(std::iter::once(header.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut output = String::new();
        output.push_str(&paint(&self.title, None, true, color));
        output.push('\n');

        let headers: Vec<Cell> = self.columns.iter().map(|(h, _)| Cell::plain(*h)).collect();
        output.push_str(&self.render_row(&headers, &widths, color, true));
        output.push('\n');

        let rule: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
        output.push_str(&format!("  {}", rule.join("  ")));
        output.push('\n');

        for row in &self.rows {
            output.push_str(&self.render_row(row, &widths, color, false));
            output.push('\n');
        }

        output
    }

    fn render_row(&self, row: &[Cell], widths: &[usize], color: bool, bold: bool) -> String {
        let cells: Vec<String> = row
            .iter()
            .zip(widths)
            .zip(&self.columns)
            .map(|((cell, width), (_, align))| {
                let padded = match align {
                    Align::Left => format!("{:<width$}", cell.text, width = width),
                    Align::Right => format!("{:>width$}", cell.text, width = width),
                };
                paint(&padded, cell.color, bold, color)
            })
            .collect();
        format!("  {}", cells.join("  ")).trim_end().to_string()
    }
}

fn paint(text: &str, fg: Option<Color>, bold: bool, enabled: bool) -> String {
    if !enabled {
        return text.to_string();
    }
    let mut styled = text.normal();
    if let Some(fg) = fg {
        styled = styled.color(fg);
    }
    if bold {
        styled = styled.bold();
    }
    styled.to_string()
}

/// Renderer for count reports
pub struct Renderer {
    format: OutputFormat,
    color: bool,
}

impl Renderer {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            color: false,
        }
    }

    /// Enable or disable ANSI colors
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Render a report to a string
    pub fn render(&self, report: &CountReport) -> String {
        match self.format {
            OutputFormat::Total => report.summary.total_tokens.to_string(),
            OutputFormat::Table => self.render_tables(report),
        }
    }

    fn render_tables(&self, report: &CountReport) -> String {
        let summary = &report.summary;
        let mut output = String::new();

        if summary.is_empty() {
            output.push_str(&format!("No text files found in {}\n", report.source));
            output.push_str(&format!(
                "Total tokens: {}\n",
                paint(&format_tokens(0), Some(Color::Green), false, self.color)
            ));
            self.render_skips(&mut output, report);
            return output.trim_end().to_string();
        }

        output.push_str(&paint("Results:", Some(Color::Cyan), true, self.color));
        output.push('\n');
        output.push_str(&format!(
            "Total tokens: {} in {}\n\n",
            paint(
                &format_tokens(summary.total_tokens),
                Some(Color::Green),
                false,
                self.color
            ),
            format_file_count(summary.total_files)
        ));

        output.push_str(
            &stat_table(
                "Tokens by file extension",
                "Extension",
                Color::Cyan,
                &summary.extensions,
                |key| if key.is_empty() { "(none)" } else { key },
            )
            .render(self.color),
        );
        output.push('\n');

        output.push_str(
            &stat_table(
                "Tokens by Technology",
                "Technology",
                Color::Magenta,
                &summary.technologies,
                |key| key,
            )
            .render(self.color),
        );
        output.push('\n');

        let mut windows = TextTable::new(
            "Context Window Comparisons",
            vec![("Model", Align::Left), ("Context Usage", Align::Right)],
        );
        for usage in &report.windows {
            let pct_color = if usage.fits() { Color::Green } else { Color::Red };
            windows.push(vec![
                Cell::colored(usage.window.model_name, Color::Blue),
                Cell::colored(format!("{:.1}%", usage.usage_pct), pct_color),
            ]);
        }
        output.push_str(&windows.render(self.color));

        self.render_skips(&mut output, report);
        output.trim_end().to_string()
    }

    fn render_skips(&self, output: &mut String, report: &CountReport) {
        let skipped = report.unexpected_skips().count();
        if skipped > 0 {
            output.push('\n');
            output.push_str(&paint(
                &format!(
                    "Skipped {} with errors (see warnings above)",
                    format_file_count(skipped)
                ),
                Some(Color::Yellow),
                false,
                self.color,
            ));
            output.push('\n');
        }
    }
}

fn stat_table(
    title: &str,
    key_header: &'static str,
    key_color: Color,
    stats: &[TokenStat],
    label: impl Fn(&str) -> &str,
) -> TextTable {
    let mut table = TextTable::new(
        title,
        vec![
            (key_header, Align::Left),
            ("Tokens", Align::Right),
            ("Files", Align::Right),
        ],
    );
    for stat in stats {
        table.push(vec![
            Cell::colored(label(&stat.key), key_color),
            Cell::colored(format_tokens(stat.total_tokens), Color::Green),
            Cell::colored(format_file_count(stat.file_count), Color::Yellow),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aggregate::Aggregator;
    use crate::core::model::{FileRecord, SkipReason, SkippedFile, Summary};
    use crate::core::report::{context_usage, CONTEXT_WINDOWS};

    fn report_with(records: &[(&str, &str, &str, usize)]) -> CountReport {
        let mut agg = Aggregator::new();
        for (path, ext, tech, tokens) in records {
            agg.add(&FileRecord {
                path: path.to_string(),
                extension: ext.to_string(),
                technology: tech.to_string(),
                token_count: *tokens,
            })
            .unwrap();
        }
        let summary = agg.summary();
        CountReport {
            source: "project".to_string(),
            windows: context_usage(summary.total_tokens, CONTEXT_WINDOWS),
            summary,
            skipped: Vec::new(),
        }
    }

    #[test]
    fn test_render_total_only() {
        let report = report_with(&[
            ("a.py", ".py", "Python", 4000),
            ("b.md", ".md", "Markdown", 828),
        ]);
        let output = Renderer::new(OutputFormat::Total).render(&report);
        assert_eq!(output, "4828");
    }

    #[test]
    fn test_render_tables() {
        let report = report_with(&[
            ("a.py", ".py", "Python", 1_200_000),
            ("b.py", ".py", "Python", 300_000),
            ("README.md", ".md", "Markdown", 12),
        ]);
        let output = Renderer::new(OutputFormat::Table).render(&report);

        assert!(output.contains("Total tokens: 1.5M (1,500,012) in 3 files"));
        assert!(output.contains("Tokens by file extension"));
        assert!(output.contains("Tokens by Technology"));
        assert!(output.contains("Context Window Comparisons"));
        assert!(output.contains("1.5M (1,500,000)"));
        assert!(output.contains("2 files"));
        assert!(output.contains("1 file"));
        assert!(!output.contains('\u{1b}'), "colors must be off by default");
    }

    #[test]
    fn test_render_window_rows_in_declared_order() {
        let report = report_with(&[("a.py", ".py", "Python", 4096)]);
        let output = Renderer::new(OutputFormat::Table).render(&report);

        let first = output.find("GPT-3.5 (4K)").unwrap();
        let last = output.find("Cohere Command (128K)").unwrap();
        assert!(first < last);
        assert!(output.contains("100.0%"));
    }

    #[test]
    fn test_render_empty_extension_label() {
        let report = report_with(&[("LICENSE", "", "Unknown", 10)]);
        let output = Renderer::new(OutputFormat::Table).render(&report);
        assert!(output.contains("(none)"));
        assert!(output.contains("Unknown"));
    }

    #[test]
    fn test_render_empty_report() {
        let report = CountReport {
            source: "empty-dir".to_string(),
            summary: Summary::default(),
            skipped: Vec::new(),
            windows: context_usage(0, CONTEXT_WINDOWS),
        };
        let output = Renderer::new(OutputFormat::Table).render(&report);
        assert!(output.contains("No text files found in empty-dir"));
        assert!(output.contains("Total tokens: 0 (0)"));
        assert!(!output.contains("Tokens by file extension"));

        assert_eq!(Renderer::new(OutputFormat::Total).render(&report), "0");
    }

    #[test]
    fn test_render_reports_unexpected_skips_only() {
        let mut report = report_with(&[("a.py", ".py", "Python", 5)]);
        report.skipped.push(SkippedFile {
            path: "logo.png".to_string(),
            reason: SkipReason::Binary,
        });
        let output = Renderer::new(OutputFormat::Table).render(&report);
        assert!(!output.contains("Skipped"));

        report.skipped.push(SkippedFile {
            path: "latin1.txt".to_string(),
            reason: SkipReason::InvalidUtf8,
        });
        let output = Renderer::new(OutputFormat::Table).render(&report);
        assert!(output.contains("Skipped 1 file"));
    }

    #[test]
    fn test_render_with_color() {
        let report = report_with(&[("a.py", ".py", "Python", 5)]);
        colored::control::set_override(true);
        let output = Renderer::new(OutputFormat::Table)
            .with_color(true)
            .render(&report);
        colored::control::unset_override();
        assert!(output.contains('\u{1b}'));
    }

    #[test]
    fn test_table_columns_align() {
        let mut table = TextTable::new("T", vec![("Key", Align::Left), ("N", Align::Right)]);
        table.push(vec![Cell::plain("a"), Cell::plain("1")]);
        table.push(vec![Cell::plain("longer"), Cell::plain("100")]);
        let output = table.render(false);
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines[0], "T");
        assert_eq!(lines[1], "  Key       N");
        assert_eq!(lines[3], "  a         1");
        assert_eq!(lines[4], "  longer  100");
    }
}
