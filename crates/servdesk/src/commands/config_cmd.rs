//! Config subcommand handlers.

use dialoguer::Input;

use servdesk_config::Config;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config;
use crate::error::CliError;
use crate::output;

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Copy of `cfg` safe to print.
fn redacted(cfg: &Config) -> Config {
    let mut shown = cfg.clone();
    if shown.api.token.is_some() {
        shown.api.token = Some("********".into());
    }
    shown
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = redacted(&config::resolve(global)?);
            let out = match global.output {
                OutputFormat::Table | OutputFormat::Plain => toml::to_string_pretty(&cfg)
                    .map_err(|e| CliError::Internal(format!("TOML rendering failed: {e}")))?,
                format => output::render_single(format, &cfg, |_| String::new(), |_| String::new())?,
            };
            output::print_output(out.trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::Init => {
            let path = config::config_path();
            eprintln!("servdesk configuration");
            eprintln!("   Config path: {}\n", path.display());

            let mut cfg = servdesk_config::load_config_or_default();

            let base_url: String = Input::new()
                .with_prompt("API base URL")
                .default(cfg.api.base_url.clone())
                .interact_text()
                .map_err(prompt_err)?;

            let token_env: String = Input::new()
                .with_prompt("Environment variable holding the API token (blank for none)")
                .default(cfg.api.token_env.clone().unwrap_or_default())
                .allow_empty(true)
                .interact_text()
                .map_err(prompt_err)?;

            let page_size: u32 = Input::new()
                .with_prompt("Rows per page")
                .default(cfg.list.page_size)
                .interact_text()
                .map_err(prompt_err)?;

            cfg.api.base_url = base_url.trim().to_owned();
            cfg.api.token_env = Some(token_env.trim().to_owned()).filter(|v| !v.is_empty());
            cfg.list.page_size = page_size;

            // Refuse to write something the next run cannot use.
            cfg.transport()?;
            cfg.list_settings()?;

            let written = config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("   Saved {}", written.display());
            }
            Ok(())
        }
    }
}
