//! ConfigLoader facade delegating to merge service.

use super::merge::service::MergeService;
use super::SyncConfig;
use crate::error::SyncError;
use std::collections::HashMap;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from the process environment and an optional file, then validate.
    pub fn load(config_file: Option<&Path>) -> Result<SyncConfig, SyncError> {
        let env: HashMap<String, String> = std::env::vars().collect();
        Self::load_with_env(config_file, &env)
    }

    /// Load from an explicit environment snapshot, then validate.
    pub fn load_with_env(
        config_file: Option<&Path>,
        env: &HashMap<String, String>,
    ) -> Result<SyncConfig, SyncError> {
        let config = MergeService::load(config_file, env)?;
        config.validate()?;
        Ok(config)
    }

    /// Load without validation, for inspecting a partial setup.
    pub fn load_unvalidated(config_file: Option<&Path>) -> Result<SyncConfig, SyncError> {
        let env: HashMap<String, String> = std::env::vars().collect();
        Ok(MergeService::load(config_file, &env)?)
    }
}
