//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one value per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use execlink_core::{LogKind, LogLine};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Resolved output settings ─────────────────────────────────────────

/// Format, color and quiet mode after merging flags with config defaults.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub format: OutputFormat,
    pub color: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(format: OutputFormat, color: ColorMode, quiet: bool) -> Self {
        Self {
            format,
            color: should_color(color),
            quiet,
        }
    }
}

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Parse a config-file value (`table`, `json`, ...) the way clap would.
pub fn parse_format(value: &str) -> Option<OutputFormat> {
    clap::ValueEnum::from_str(value, true).ok()
}

pub fn parse_color(value: &str) -> Option<ColorMode> {
    clap::ValueEnum::from_str(value, true).ok()
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(data.iter().map(&id_fn).collect::<Vec<_>>().join("\n")),
    }
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses `detail_fn`, since single-item views don't use
/// the `Tabled` derive.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(id_fn(data)),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let rendered = if compact {
        serde_json::to_string(data)?
    } else {
        serde_json::to_string_pretty(data)?
    };
    Ok(rendered)
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    Ok(serde_yaml::to_string(data)?)
}

// ── Detail helpers ───────────────────────────────────────────────────

/// Align `label: value` pairs for single-item table views.
pub fn detail(pairs: &[(&str, String)]) -> String {
    let width = pairs.iter().map(|(k, _)| k.len()).max().unwrap_or(0) + 1;
    pairs
        .iter()
        .map(|(k, v)| format!("{:<width$} {v}", format!("{k}:")))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn yes_no(value: bool) -> String {
    if value { "yes".into() } else { "no".into() }
}

/// One console log line, tinted by kind when color is on.
pub fn log_line(line: &LogLine, color: bool) -> String {
    let text = line.to_string();
    if !color {
        return text;
    }
    match line.kind {
        LogKind::System => text.cyan().to_string(),
        LogKind::Error => text.red().to_string(),
        LogKind::Execution => text.green().to_string(),
        LogKind::Stream => text.dimmed().to_string(),
    }
}

/// A short status word, green or red.
pub fn state_word(text: &str, good: bool, color: bool) -> String {
    match (color, good) {
        (false, _) => text.to_owned(),
        (true, true) => text.green().to_string(),
        (true, false) => text.red().to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(serde::Serialize)]
    struct Item {
        name: String,
    }

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "Name")]
        name: String,
    }

    #[test]
    fn detail_aligns_labels() {
        let text = detail(&[("Port", "8082".into()), ("TCP port", "9000".into())]);
        assert_eq!(text, "Port:     8082\nTCP port: 9000");
    }

    #[test]
    fn plain_list_is_one_value_per_line() {
        let data = vec![Item { name: "a".into() }, Item { name: "b".into() }];
        let out = render_list(
            OutputFormat::Plain,
            &data,
            |i| Row { name: i.name.clone() },
            |i| i.name.clone(),
        )
        .unwrap();
        assert_eq!(out, "a\nb");
    }

    #[test]
    fn compact_json_is_single_line() {
        let out = render_single(
            OutputFormat::JsonCompact,
            &Item { name: "a".into() },
            |_| String::new(),
            |_| String::new(),
        )
        .unwrap();
        assert_eq!(out, r#"{"name":"a"}"#);
    }

    #[test]
    fn config_values_parse_case_insensitively() {
        assert_eq!(parse_format("JSON"), Some(OutputFormat::Json));
        assert_eq!(parse_format("json-compact"), Some(OutputFormat::JsonCompact));
        assert_eq!(parse_color("never"), Some(ColorMode::Never));
        assert_eq!(parse_format("xml"), None);
    }

    #[test]
    fn uncolored_log_line_matches_display() {
        let line = LogLine {
            kind: LogKind::Error,
            text: "boom".into(),
            at: chrono::Utc::now(),
        };
        assert_eq!(log_line(&line, false), "[Error] boom");
    }
}
