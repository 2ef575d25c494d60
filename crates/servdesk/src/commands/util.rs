//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use servdesk_core::filter::SEARCH;
use servdesk_core::{
    Backend, CoreError, FilterState, LoadOutcome, ManagementPage, PageDefinition, PageView,
    SortOrder,
};

use crate::cli::{Direction, GlobalOpts, ListArgs, OutputFormat};
use crate::error::CliError;
use crate::output;

/// Apply list flags to the filter state.
///
/// `extra` carries page-specific filters. The page number goes last
/// because every other change sends the list back to page 1.
pub fn apply_list_args(
    filters: &mut FilterState,
    args: &ListArgs,
    extra: &[(&'static str, Option<&str>)],
) -> Result<(), CoreError> {
    if let Some(ref search) = args.search {
        filters.set_field(SEARCH, search.trim())?;
    }
    if let Some(ref status) = args.status {
        filters.set_field(servdesk_core::filter::STATUS, status.as_str())?;
    }
    for (key, value) in extra {
        if let Some(value) = value {
            filters.set_field(key, *value)?;
        }
    }
    if args.sort_by.is_some() || args.order.is_some() {
        let sort_by = args
            .sort_by
            .clone()
            .unwrap_or_else(|| filters.sort_by().to_owned());
        let order = args.order.map_or(filters.sort_order(), sort_order);
        filters.set_sort(&sort_by, order)?;
    }
    if let Some(limit) = args.limit {
        if limit == 0 {
            return Err(CoreError::InvalidFilterValue {
                field: "limit".into(),
                value: "0".into(),
                allowed: "1 or more".into(),
            });
        }
        filters.set_page_size(limit);
    }
    if let Some(page) = args.page {
        filters.set_page(page.max(1));
    }
    Ok(())
}

fn sort_order(direction: Direction) -> SortOrder {
    match direction {
        Direction::Asc => SortOrder::Asc,
        Direction::Desc => SortOrder::Desc,
    }
}

/// Fetch the list behind a spinner and return what should be shown.
///
/// A failed fetch has already been reported through the notifier; the
/// error returned here only sets the exit code.
pub async fn load<T, B>(page: &ManagementPage<T, B>, global: &GlobalOpts) -> Result<PageView<T>, CliError>
where
    T: PageDefinition,
    B: Backend<T>,
{
    let spinner = spinner(&format!("Loading {}", T::PLURAL), global.quiet);
    let outcome = page.mount().await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    tracing::debug!(collection = T::COLLECTION, ?outcome, "list loaded");
    let view = page.visible();
    match outcome {
        LoadOutcome::Failed => Err(CliError::ApiError {
            status: None,
            message: view
                .error
                .unwrap_or_else(|| format!("Failed to fetch {}", T::PLURAL)),
        }),
        LoadOutcome::Applied | LoadOutcome::Skipped => Ok(view),
        LoadOutcome::Superseded | LoadOutcome::Cancelled => {
            Err(CliError::Internal(format!("load of {} was interrupted", T::PLURAL)))
        }
    }
}

/// Page position under a table, on stderr.
pub fn print_footer<T>(view: &PageView<T>, global: &GlobalOpts) {
    if matches!(global.output, OutputFormat::Table) && !global.quiet {
        eprintln!(
            "{}",
            output::page_footer(view.page, view.total_pages, view.total_items)
        );
    }
}

/// A stderr spinner, unless output is quiet or not a terminal.
pub fn spinner(message: &str, quiet: bool) -> Option<ProgressBar> {
    if quiet || !std::io::stderr().is_terminal() {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    Some(pb)
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, global: &GlobalOpts) -> Result<bool, CliError> {
    if global.yes {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.to_owned(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))
}
