//! Merge rules: defaults, override order, conflict handling.

use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
///
/// Later sources override earlier ones key by key; lists replace, never append.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("embedding.max_url_length", 2048_i64)?
        .set_default("embedding.context_field", "sap-flp-params")?
        .set_default("dirty_state.key_prefix", "appframe.dirtyState")?
        .set_default("dirty_state.query_timeout_ms", 1500_i64)?
        .set_default("logging.level", "info")?
        .set_default("logging.format", "text")?
        .set_default("logging.output", "stderr")
}
