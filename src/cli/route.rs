//! CLI route: single route table and run context. Dispatches to library services and presentation.

use crate::cli::parse::{Commands, ConfigCommands, DirtyCommands};
use crate::cli::presentation::{
    format_dirty_entries_json, format_dirty_entries_text, format_plan_json, format_plan_text,
};
use crate::config::{AppFrameConfig, ConfigLoader};
use crate::dirty::{DirtyState, DirtyStateSynchronizer, SledStateStore};
use crate::embedding::{EmbedRequest, EmbeddingStrategy, NoStatePersistence};
use crate::error::{EmbedError, StorageError};
use crate::frame::{FrameCell, HeadlessSurface};
use crate::types::{ApplicationType, ContainerId};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

/// Runtime context for CLI execution: effective config, store location and a
/// single-threaded runtime for the async library calls.
pub struct RunContext {
    config: AppFrameConfig,
    store_path: PathBuf,
    runtime: tokio::runtime::Runtime,
    synchronizer: Mutex<Option<Arc<DirtyStateSynchronizer>>>,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(
        workspace_root: PathBuf,
        config_path: Option<PathBuf>,
        store_override: Option<PathBuf>,
    ) -> Result<Self, EmbedError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        let store_path = match store_override {
            Some(path) => path,
            None => config.storage.resolved_store_path()?,
        };
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(StorageError::IoError)?;

        debug!(store = %store_path.display(), "Run context ready");
        Ok(Self {
            config,
            store_path,
            runtime,
            synchronizer: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &AppFrameConfig {
        &self.config
    }

    pub fn execute(&self, command: &Commands) -> Result<String, EmbedError> {
        match command {
            Commands::Plan {
                app_type,
                url,
                container,
                no_form_post,
                theme,
                system_alias,
                format,
            } => self.handle_plan(
                *app_type,
                url,
                container,
                !*no_form_post,
                theme.clone(),
                system_alias.clone(),
                format,
            ),
            Commands::Dirty { command } => self.handle_dirty(command),
            Commands::Config { command } => match command {
                ConfigCommands::Show => self.config.to_toml(),
            },
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn handle_plan(
        &self,
        app_type: ApplicationType,
        url: &str,
        container: &str,
        form_post_supported: bool,
        theme: Option<String>,
        system_alias: Option<String>,
        format: &str,
    ) -> Result<String, EmbedError> {
        let mut request = EmbedRequest::new(app_type, Url::parse(url)?);
        request.form_post_supported = form_post_supported;
        request.host.theme = theme;
        request.host.system_alias = system_alias;

        let strategy = EmbeddingStrategy::new(self.config.embedding.clone(), Arc::new(NoStatePersistence));
        let surface = HeadlessSurface::new();
        let container = ContainerId::new(container);
        let cell = FrameCell::new();

        let plan = self.runtime.block_on(async {
            let plan = strategy.plan(&container, &request).await?;
            strategy.realize(&surface, &container, &cell, &plan).await?;
            Ok::<_, EmbedError>(plan)
        })?;

        let ops = surface.ops();
        match format {
            "json" => format_plan_json(&plan, &ops),
            _ => Ok(format_plan_text(&plan, &ops)),
        }
    }

    fn handle_dirty(&self, command: &DirtyCommands) -> Result<String, EmbedError> {
        let sync = self.open_synchronizer()?;
        match command {
            DirtyCommands::List { format } => {
                let entries = sync.store().scan_prefix(&sync.config().key_prefix)?;
                match format.as_str() {
                    "json" => format_dirty_entries_json(&entries),
                    _ => Ok(format_dirty_entries_text(&entries)),
                }
            }
            DirtyCommands::Get { key } => {
                let key = resolve_key(&sync, key);
                Ok(match sync.state(&key)? {
                    Some(state) => format!("{} {}", key, state),
                    None => format!("{} (no entry)", key),
                })
            }
            DirtyCommands::Set { key, state } => {
                let key = resolve_key(&sync, key);
                sync.set_state(&key, *state)?;
                sync.store().flush()?;
                info!(key = %key, state = %state, "Dirty state written");
                Ok(format!("{} {}", key, state))
            }
            DirtyCommands::Clear { key } => {
                let key = resolve_key(&sync, key);
                let removed = sync.store().remove(&key)?;
                sync.store().flush()?;
                Ok(if removed {
                    format!("Removed {}", key)
                } else {
                    format!("{} (no entry)", key)
                })
            }
            DirtyCommands::Query { key } => {
                let key = resolve_key(&sync, key);
                let answer = self.runtime.block_on(sync.query(&key))?;
                sync.store().flush()?;
                Ok(match answer {
                    Some(state) => format!("{} {}", key, state),
                    None => format!("{} (no entry)", key),
                })
            }
            DirtyCommands::Watch { count } => {
                let mut subscription = sync.store().subscribe(&sync.config().key_prefix);
                let seen = self.runtime.block_on(async {
                    let mut seen = 0usize;
                    while count.map_or(true, |limit| seen < limit) {
                        let Some(change) = subscription.next().await else {
                            break;
                        };
                        let shown = change
                            .value
                            .as_deref()
                            .map(|v| v.parse::<DirtyState>().map(|s| s.to_string()).unwrap_or_else(|_| v.to_string()))
                            .unwrap_or_else(|| "(removed)".to_string());
                        println!("{} {} {}", chrono::Utc::now().to_rfc3339(), change.key, shown);
                        seen += 1;
                    }
                    seen
                });
                Ok(format!("Watched {} change(s)", seen))
            }
        }
    }

    /// The store is opened on first use and kept for the rest of the run.
    fn open_synchronizer(&self) -> Result<Arc<DirtyStateSynchronizer>, EmbedError> {
        let mut slot = self.synchronizer.lock();
        if let Some(sync) = slot.as_ref() {
            return Ok(sync.clone());
        }
        std::fs::create_dir_all(&self.store_path).map_err(StorageError::IoError)?;
        let store = SledStateStore::open(&self.store_path)?;
        let sync = Arc::new(DirtyStateSynchronizer::new(store, self.config.dirty_state.clone()));
        *slot = Some(sync.clone());
        Ok(sync)
    }
}

/// Accept either a full key or just the container token.
fn resolve_key(sync: &DirtyStateSynchronizer, key: &str) -> String {
    if key.starts_with(&sync.config().key_prefix) {
        key.to_string()
    } else {
        sync.key_for(key)
    }
}
