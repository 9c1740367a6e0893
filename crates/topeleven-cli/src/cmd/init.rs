//! `t11 init`: create the state directory, default config, and store.

use anyhow::{Context as _, Result};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use topeleven_core::config::{self, ProjectConfig, STATE_DIR};
use topeleven_core::db::{Store, migrations};

use super::CmdContext;
use crate::output::{CliError, pretty_kv, render_mode};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Rewrite `config.toml` with defaults even if the project exists.
    /// The store itself is never recreated.
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
struct InitReport {
    state_dir: PathBuf,
    db_path: PathBuf,
    schema_version: u32,
}

/// Execute `t11 init`. Creates:
///
/// ```text
/// .topeleven/
///   config.toml     (default project config)
///   .gitignore      (store database and maintenance lock)
///   topeleven.db    (migrated SQLite store)
/// ```
///
/// # Errors
///
/// Returns an error if the project is already initialized and `--force` is
/// not set, or if any filesystem or store operation fails.
pub fn run_init(args: &InitArgs, ctx: &CmdContext<'_>) -> Result<()> {
    let state_dir = ctx.project_root.join(STATE_DIR);
    let config_path = state_dir.join("config.toml");

    if config_path.exists() && !args.force {
        return Err(ctx.fail(&CliError::with_details(
            format!("{STATE_DIR}/ already exists"),
            "Use `t11 init --force` to rewrite the default config",
            "already_initialized",
        )));
    }

    std::fs::create_dir_all(&state_dir)
        .with_context(|| format!("Failed to create {}", state_dir.display()))?;

    let defaults = toml::to_string_pretty(&ProjectConfig::default())
        .context("Failed to serialize default config")?;
    std::fs::write(&config_path, defaults)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    let gitignore = state_dir.join(".gitignore");
    if !gitignore.exists() {
        std::fs::write(&gitignore, "*.db\n*.db-*\n*.lock\n")
            .with_context(|| format!("Failed to write {}", gitignore.display()))?;
    }

    let effective = config::resolve_config(ctx.project_root)?;
    let store = Store::open(&effective.db_path, effective.project.store.busy_timeout())?;
    let schema_version = migrations::current_schema_version(store.conn())?;

    tracing::info!(db = %effective.db_path.display(), schema_version, "initialized project");

    let report = InitReport {
        state_dir,
        db_path: effective.db_path,
        schema_version,
    };

    render_mode(
        ctx.output,
        &report,
        |r, w| writeln!(w, "{}\t{}", r.db_path.display(), r.schema_version),
        |r, w| {
            writeln!(w, "Initialized topeleven project")?;
            pretty_kv(w, "state", r.state_dir.display().to_string())?;
            pretty_kv(w, "store", r.db_path.display().to_string())?;
            pretty_kv(w, "schema", format!("v{}", r.schema_version))
        },
    )
}
