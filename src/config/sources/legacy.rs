//! Flat environment variables of existing sidecar deployments
//!
//! These take precedence over every other layer. Empty values are treated as
//! unset.

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError};
use std::collections::HashMap;

/// Legacy variable name and the config key it sets
const STRING_KEYS: &[(&str, &str)] = &[
    ("GIT_REPO_URL", "source.repo_url"),
    ("GIT_BRANCH", "source.branch"),
    ("GIT_SSH_KEY", "source.ssh_key"),
    ("GIT_HTTPS_USER", "source.https_user"),
    ("GIT_HTTPS_PASS", "source.https_password"),
    ("GIT_LOCAL_REPO_DIR", "source.repo_dir"),
    ("GIT_REPO_SUBDIR", "source.repo_subdir"),
    ("DASHBOARDS_DIR", "source.dashboards_dir"),
    ("GRAFANA_URL", "remote.url"),
    ("GF_SECURITY_ADMIN_USER", "remote.user"),
    ("GF_SECURITY_ADMIN_PASSWORD", "remote.password"),
    ("GF_SECURITY_TOKEN", "remote.token"),
    ("HEALTH_ADDR", "health_addr"),
];

const POLL_INTERVAL: &str = "POLL_INTERVAL_SEC";

fn lookup<'a>(env: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    env.get(name).map(String::as_str).filter(|v| !v.is_empty())
}

/// Add overrides for every legacy variable present in `env`.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    env: &HashMap<String, String>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let mut builder = builder;
    for (var, key) in STRING_KEYS {
        builder = builder.set_override_option(*key, lookup(env, var))?;
    }

    let poll_interval = lookup(env, POLL_INTERVAL)
        .map(|raw| match raw.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(secs),
            _ => Err(ConfigError::Message(format!(
                "invalid {} value: {}",
                POLL_INTERVAL, raw
            ))),
        })
        .transpose()?;
    builder.set_override_option("poll_interval_secs", poll_interval)
}
