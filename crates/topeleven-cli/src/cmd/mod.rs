pub mod alloc;
pub mod category;
pub mod init;
pub mod item;
pub mod move_cmd;
pub mod reconcile;
pub mod reference;
pub mod show;

use std::path::Path;

use clap::Args;
use topeleven_core::config::{self, EffectiveConfig};
use topeleven_core::db::Store;
use topeleven_core::error::ErrorCode;
use topeleven_core::{ListId, TopElevenError};

use crate::output::{CliError, OutputMode, render_error};
use crate::owner;

/// Everything a command handler needs besides its own arguments.
#[derive(Debug, Clone, Copy)]
pub struct CmdContext<'a> {
    pub project_root: &'a Path,
    pub output: OutputMode,
    pub owner_flag: Option<&'a str>,
}

impl CmdContext<'_> {
    /// Render `error` and hand it back as an `anyhow` error.
    pub fn fail(&self, error: &CliError) -> anyhow::Error {
        if let Err(render_err) = render_error(self.output, error) {
            tracing::warn!(error = %render_err, "failed to render error");
        }
        anyhow::anyhow!("{}", error.message)
    }

    /// Unwrap a core result, rendering the error in the selected mode.
    pub fn check<T>(&self, result: Result<T, TopElevenError>) -> anyhow::Result<T> {
        result.map_err(|err| {
            let rendered = self.fail(&CliError::from(&err));
            tracing::debug!(code = %err.code(), kind = %err.kind(), "command failed");
            rendered
        })
    }

    /// Resolve config and open the store; the store must already exist.
    pub fn open(&self) -> anyhow::Result<(EffectiveConfig, Store)> {
        let config = match config::resolve_config(self.project_root) {
            Ok(config) => config,
            Err(err) => {
                return Err(self.fail(&CliError::with_details(
                    format!("{err:#}"),
                    ErrorCode::ConfigParseError.hint().unwrap_or_default(),
                    ErrorCode::ConfigParseError.code(),
                )));
            }
        };

        if !config.db_path.exists() {
            return Err(self.fail(&CliError::with_details(
                format!(
                    "{} at {}",
                    ErrorCode::NotInitialized.message(),
                    config.db_path.display()
                ),
                ErrorCode::NotInitialized.hint().unwrap_or_default(),
                ErrorCode::NotInitialized.code(),
            )));
        }

        let store = Store::open(&config.db_path, config.project.store.busy_timeout())
            .map_err(|err| {
                self.fail(&CliError::with_details(
                    format!("{err:#}"),
                    ErrorCode::StoreFailure.hint().unwrap_or_default(),
                    ErrorCode::StoreFailure.code(),
                ))
            })?;
        Ok((config, store))
    }

    /// Acting owner for a mutating command.
    pub fn require_owner(&self, config: &EffectiveConfig) -> anyhow::Result<String> {
        owner::require_owner(self.owner_flag, config.owner.as_deref()).map_err(|err| {
            self.fail(&CliError::with_details(
                &err.message,
                "Set --owner, T11_OWNER, or owner in the user config",
                err.code,
            ))
        })
    }
}

/// `--sub <ID>` or `--main <ID>`, exactly one.
#[derive(Args, Debug, Clone, Copy)]
#[group(required = true, multiple = false)]
pub struct ListTarget {
    /// Sub category list.
    #[arg(long, value_name = "ID")]
    pub sub: Option<i64>,

    /// Main category list.
    #[arg(long, value_name = "ID")]
    pub main: Option<i64>,
}

impl ListTarget {
    pub fn list(self) -> anyhow::Result<ListId> {
        match (self.sub, self.main) {
            (Some(id), None) => Ok(ListId::Sub(id)),
            (None, Some(id)) => Ok(ListId::Main(id)),
            _ => anyhow::bail!("pass exactly one of --sub or --main"),
        }
    }
}

/// Position display: `-` for an unranked entry.
pub fn slot_label(position: Option<i64>) -> String {
    position.map_or_else(|| "-".to_string(), |p| p.to_string())
}
