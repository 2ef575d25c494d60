//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line.
//! Notifications from the core go to stderr so stdout stays parseable.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use servdesk_core::{Level, Notification, Notifier};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color ────────────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stderr().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
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

/// Render a single item. Table mode uses `detail_fn` for a one-line summary.
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
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.map_err(|e| CliError::Internal(format!("JSON rendering failed: {e}")))
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    serde_yaml::to_string(data).map_err(|e| CliError::Internal(format!("YAML rendering failed: {e}")))
}

// ── Cell helpers ─────────────────────────────────────────────────────

pub fn active_cell(active: bool, color: bool) -> String {
    match (active, color) {
        (true, true) => "active".green().to_string(),
        (false, true) => "inactive".dimmed().to_string(),
        (true, false) => "active".into(),
        (false, false) => "inactive".into(),
    }
}

pub fn date_cell(ts: Option<chrono::DateTime<chrono::Utc>>) -> String {
    ts.map_or_else(|| "-".into(), |t| t.format("%Y-%m-%d %H:%M").to_string())
}

pub fn opt_cell(value: Option<&str>) -> String {
    value.filter(|v| !v.is_empty()).unwrap_or("-").to_owned()
}

/// `"page 2 of 5 (43 items)"`
pub fn page_footer(page: u32, total_pages: u32, total_items: u64) -> String {
    format!("page {page} of {total_pages} ({total_items} items)")
}

// ── Notifications ────────────────────────────────────────────────────

/// Prints core notifications to stderr. Success messages are dropped in
/// quiet mode; warnings and errors always show.
#[derive(Debug, Clone, Copy)]
pub struct StderrNotifier {
    pub color: bool,
    pub quiet: bool,
}

impl Notifier for StderrNotifier {
    fn notify(&self, notification: Notification) {
        let Notification { level, message } = notification;
        if self.quiet && matches!(level, Level::Success | Level::Info) {
            return;
        }
        let tag = match (level, self.color) {
            (Level::Success, true) => "✓".green().to_string(),
            (Level::Info, true) => "•".cyan().to_string(),
            (Level::Warning, true) => "!".yellow().to_string(),
            (Level::Error, true) => "✗".red().to_string(),
            (Level::Success, false) => "ok".into(),
            (Level::Info, false) => "info".into(),
            (Level::Warning, false) => "warning".into(),
            (Level::Error, false) => "error".into(),
        };
        let mut stderr = io::stderr().lock();
        let _ = writeln!(stderr, "{tag} {message}");
    }
}
