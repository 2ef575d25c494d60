//! Command dispatch: bridges CLI args -> management pages -> output formatting.

pub mod areas;
pub mod config_cmd;
pub mod services;
pub mod transactions;
pub mod util;

use std::sync::Arc;

use servdesk_core::{
    CoreError, EntityId, ListSettings, ManagementPage, Notifier, PageDefinition, Resource,
    RestClient, Toggle,
};

use crate::cli::{Command, GlobalOpts, OutputFormat};
use crate::config;
use crate::error::CliError;
use crate::output::{self, StderrNotifier};

/// Everything a command needs to talk to the API.
pub struct Session {
    client: Arc<RestClient>,
    settings: ListSettings,
    notifier: Arc<dyn Notifier>,
    pub color: bool,
}

impl Session {
    /// Resolve configuration and build the REST client.
    pub fn connect(global: &GlobalOpts) -> Result<Self, CliError> {
        let cfg = config::resolve(global)?;
        let transport = cfg.transport()?;
        let settings = cfg.list_settings()?;
        let client = RestClient::new(&cfg.api.base_url, &transport).map_err(CoreError::from)?;

        let color = output::should_color(global.color);
        tracing::debug!(base_url = %cfg.api.base_url, "session ready");
        Ok(Self {
            client: Arc::new(client),
            settings,
            notifier: Arc::new(StderrNotifier {
                color,
                quiet: global.quiet,
            }),
            color,
        })
    }

    /// A management page for `T` sharing this session's client.
    pub fn page<T: PageDefinition>(&self) -> Arc<ManagementPage<T, RestClient>> {
        ManagementPage::new(
            Arc::clone(&self.client),
            self.settings.clone(),
            Arc::clone(&self.notifier),
        )
    }
}

/// Dispatch an API-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Services(args) => services::handle(session, args, global).await,
        Command::Areas(args) => areas::handle(session, args, global).await,
        Command::Transactions(args) => transactions::handle(session, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}

// ── Row actions shared by services and areas ─────────────────────────

/// Load the list, then flip one row's active flag.
pub(crate) async fn toggle<T>(
    session: &Session,
    raw_id: &str,
    global: &GlobalOpts,
    describe: impl Fn(&T) -> String,
) -> Result<(), CliError>
where
    T: PageDefinition + Toggle + serde::Serialize,
{
    let page = session.page::<T>();
    util::load(&page, global).await?;

    let id = EntityId::from(raw_id);
    let spinner = util::spinner(&format!("Updating {} {id}", T::SINGULAR), global.quiet);
    let result = page.toggle(id).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let item = result?;
    let out = output::render_single(global.output, &item, describe, |i| i.id().to_string())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Load the list, confirm, then delete one row through the delete dialog.
pub(crate) async fn delete<T>(
    session: &Session,
    raw_id: &str,
    global: &GlobalOpts,
    describe: impl Fn(&T) -> String,
) -> Result<(), CliError>
where
    T: PageDefinition,
{
    let page = session.page::<T>();
    util::load(&page, global).await?;

    let id = EntityId::from(raw_id);
    let target = page.list().find(&id).ok_or_else(|| CoreError::NotFound {
        entity_type: T::SINGULAR.into(),
        identifier: id.to_string(),
    })?;

    let prompt = format!("Delete {} {}? This cannot be undone.", T::SINGULAR, describe(&target));
    if !util::confirm(&prompt, global)? {
        return Ok(());
    }

    page.open_delete(target);
    page.confirm_delete().await?;
    if matches!(global.output, OutputFormat::Plain) {
        output::print_output(&id.to_string(), global.quiet);
    }
    Ok(())
}
