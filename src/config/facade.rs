//! Config loading entry points.

use crate::config::merge::merge_policy;
use crate::config::sources::{global_file, workspace_file};
use crate::config::AppFrameConfig;
use crate::error::EmbedError;
use config::{Environment, File};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loads [`AppFrameConfig`] from its layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults, then the global file, then workspace files, then environment.
    pub fn load(workspace_root: &Path) -> Result<AppFrameConfig, EmbedError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let config: AppFrameConfig = builder
            .add_source(environment())
            .build()?
            .try_deserialize()?;
        config.ensure_valid()?;
        debug!(workspace = %workspace_root.display(), "Configuration loaded");
        Ok(config)
    }

    /// Defaults, then exactly one file, then environment.
    pub fn load_from_file(path: &Path) -> Result<AppFrameConfig, EmbedError> {
        let config: AppFrameConfig = merge_policy::builder_with_defaults()?
            .add_source(File::from(path.to_path_buf()))
            .add_source(environment())
            .build()?
            .try_deserialize()?;
        config.ensure_valid()?;
        Ok(config)
    }

    /// Built-in defaults only.
    pub fn defaults() -> Result<AppFrameConfig, EmbedError> {
        let config: AppFrameConfig = merge_policy::builder_with_defaults()?
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Location of the user's global configuration file.
    pub fn xdg_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }
}

fn environment() -> Environment {
    Environment::with_prefix("APPFRAME")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

