//! MergeService: orchestrates sources, applies merge policy, deserializes to SyncConfig.

use crate::config::sources::{environment, file, legacy};
use crate::config::SyncConfig;
use config::ConfigError;
use std::collections::HashMap;
use std::path::Path;

use super::merge_policy;

/// Merge service for config composition.
pub struct MergeService;

impl MergeService {
    /// Load config from an optional file and an environment snapshot.
    /// Precedence: defaults (lowest) -> file -> DASHSYNC_* env -> legacy env (highest).
    pub fn load(
        config_file: Option<&Path>,
        env: &HashMap<String, String>,
    ) -> Result<SyncConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = file::add_to_builder(builder, config_file)?;
        let builder = environment::add_to_builder(builder, env)?;
        let builder = legacy::add_to_builder(builder, env)?;

        let config = builder.build()?;
        config.try_deserialize()
    }
}
