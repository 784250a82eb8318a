//! Rendering for `--output`: tables through `tabled`, structured formats
//! through serde, and event-name coloring through `owo-colors`.

use std::io::{self, IsTerminal, Write};

use owo_colors::{OwoColorize, Style as Paint};
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::{ColorMode, OutputFormat};

// ── Color ────────────────────────────────────────────────────────────

pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

/// Additions green, removals red, everything else cyan.
pub fn event_style(event: &str) -> Paint {
    if event.ends_with("_added") {
        Paint::new().green()
    } else if event.ends_with("_removed") {
        Paint::new().red()
    } else {
        Paint::new().cyan()
    }
}

pub fn paint(text: &str, style: Paint, color: bool) -> String {
    if color {
        text.style(style).to_string()
    } else {
        text.to_owned()
    }
}

// ── Rendering ────────────────────────────────────────────────────────

/// Serde rendering for the JSON and YAML formats; `None` for the two
/// text formats, which every caller lays out itself.
pub fn structured<T: Serialize + ?Sized>(format: OutputFormat, data: &T) -> Option<String> {
    let text = match format {
        OutputFormat::Json => serde_json::to_string_pretty(data).expect("serialization should not fail"),
        OutputFormat::JsonCompact => serde_json::to_string(data).expect("serialization should not fail"),
        OutputFormat::Yaml => serde_yaml::to_string(data).expect("serialization should not fail"),
        OutputFormat::Table | OutputFormat::Plain => return None,
    };
    Some(text)
}

/// A list as a rounded table, one `plain` line per item, or serde output.
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    plain: impl Fn(&T) -> String,
) -> String
where
    T: Serialize,
    R: Tabled,
{
    if let Some(text) = structured(format, data) {
        return text;
    }
    match format {
        OutputFormat::Plain => data.iter().map(plain).collect::<Vec<_>>().join("\n"),
        _ => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Table::new(rows).with(Style::rounded()).to_string()
        }
    }
}

/// Write to stdout unless quiet or empty.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let _ = writeln!(io::stdout().lock(), "{output}");
}
