use std::io::{self, BufRead, IsTerminal};
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use dialoguer::Password;

use crate::cli::config::resolve_config;
use crate::cli::flags::{Cli, Command};
use crate::config::AppConfig;
use crate::core::engine::{password_result_text, Engine};
use crate::core::output::{render_snapshot, write_output};
use crate::core::snapshot::DashboardSnapshot;
use crate::core::types::OutputFormat;
use crate::sources::build_source;
use crate::ui::{app::DashboardApp, terminal::run_tui};

pub async fn run(cli: Cli) -> Result<()> {
    let cfg = resolve_config(&cli)?;
    let engine = build_engine(cfg)?;

    match cli.command {
        None | Some(Command::Watch { .. }) => run_watch(engine).await,
        Some(Command::Snapshot { format, output }) => {
            run_snapshot(&engine, format.into(), output.as_deref()).await
        }
        Some(Command::PasswordCheck) => run_password_check(&engine).await,
    }
}

fn build_engine(cfg: AppConfig) -> Result<Arc<Engine>> {
    let source = build_source(&cfg).context("building incident source")?;
    tracing::info!(
        source = source.name(),
        demo = source.is_demo(),
        poll_interval_secs = cfg.poll_interval_secs,
        count_policy = ?cfg.count_policy_for(source.is_demo()),
        "engine ready"
    );
    Ok(Arc::new(Engine::new(cfg, source)))
}

async fn run_watch(engine: Arc<Engine>) -> Result<()> {
    let app = DashboardApp::new(&engine.config, engine.is_demo(), engine.source_name());
    run_tui(engine, app).await.context("terminal dashboard")
}

async fn run_snapshot(engine: &Engine, format: OutputFormat, output: Option<&Path>) -> Result<()> {
    let outcome = engine
        .run_cycle()
        .await
        .ok_or_else(|| anyhow!("refresh cycle was skipped"))?;
    if !outcome.is_complete() {
        tracing::warn!(
            failed_sections = outcome.errors.len(),
            "snapshot contains stale or missing sections"
        );
    }
    let mut snapshot = DashboardSnapshot::new(engine.is_demo());
    snapshot.apply(outcome);

    let policy = engine.config.count_policy_for(engine.is_demo());
    let rendered = render_snapshot(&snapshot, format, policy)?;
    write_output(&rendered, output).context("writing snapshot")?;
    if let Some(path) = output {
        tracing::info!("snapshot written to {}", path.display());
    }
    Ok(())
}

async fn run_password_check(engine: &Engine) -> Result<()> {
    let password = if io::stdin().is_terminal() {
        Password::new()
            .with_prompt("Password to check")
            .allow_empty_password(true)
            .interact()
            .context("reading password from terminal")?
    } else {
        read_piped_password(io::stdin().lock())?
    };

    let result = engine.check_password(&password).await;
    if let Err(err) = &result {
        tracing::warn!(error = %err, "password check failed");
    }
    println!("{}", password_result_text(&result));
    Ok(())
}

/// First line of piped input, without its line ending.
fn read_piped_password<R: BufRead>(mut reader: R) -> Result<String> {
    let mut line = String::new();
    reader
        .read_line(&mut line)
        .context("reading password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn piped_password_keeps_only_the_first_line() {
        let password = read_piped_password(Cursor::new("hunter2\r\nsecond line\n")).unwrap();
        assert_eq!(password, "hunter2");
        assert_eq!(read_piped_password(Cursor::new("")).unwrap(), "");
        assert_eq!(read_piped_password(Cursor::new(" spaced ")).unwrap(), " spaced ");
    }
}
