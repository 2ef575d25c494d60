//! Resolve the effective configuration: config file and `SERVDESK_*`
//! environment first, then command-line flags on top.

use servdesk_config::Config;
pub use servdesk_config::{config_path, save_config};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Load the config file and apply global flag overrides.
pub fn resolve(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = servdesk_config::load_config()?;
    apply_overrides(&mut cfg, global);
    Ok(cfg)
}

fn apply_overrides(cfg: &mut Config, global: &GlobalOpts) {
    if let Some(ref url) = global.base_url {
        cfg.api.base_url.clone_from(url);
    }
    if let Some(ref token) = global.token {
        // An explicit token beats whatever token_env points at.
        cfg.api.token = Some(token.clone());
        cfg.api.token_env = None;
    }
    if global.insecure {
        cfg.api.insecure = true;
    }
    if let Some(timeout) = global.timeout {
        cfg.api.timeout_secs = timeout;
    }
}
