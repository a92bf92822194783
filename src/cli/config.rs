use anyhow::{Context, Result};

use crate::cli::flags::{Cli, Command};
use crate::config::{load_config, AppConfig, SourceMode};

/// File config, then environment, then command-line flags.
pub fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let cfg = load_config(cli.config.as_deref()).context("loading configuration")?;
    let cfg = apply_overrides(cfg, cli);
    cfg.validate().context("invalid configuration")?;
    Ok(cfg)
}

pub fn apply_overrides(mut cfg: AppConfig, cli: &Cli) -> AppConfig {
    if let Some(url) = cli.base_url.as_deref().map(str::trim) {
        if !url.is_empty() {
            cfg.base_url = url.to_string();
        }
    }
    if cli.demo {
        cfg.source = SourceMode::Demo;
    }
    if let Some(policy) = cli.count_policy {
        cfg.count_policy = Some(policy.into());
    }
    if let Some(Command::Watch {
        poll_interval: Some(secs),
    }) = &cli.command
    {
        cfg.poll_interval_secs = *secs;
    }
    cfg
}
