//! Runner settings read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ServiceError, ServiceResult};

const DEFAULT_SEED_PATH: &str = "crates/snomed-service/seed/extension-upgrade.json";
const DEFAULT_CODESYSTEM: &str = "SNOMEDCT-A";
const DEFAULT_VERSION: u32 = 20250101;
const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// What to upgrade and how to watch it.
///
/// | Variable | Default |
/// |----------|---------|
/// | `SNOMED_SEED_PATH` | `crates/snomed-service/seed/extension-upgrade.json` |
/// | `SNOMED_UPGRADE_CODESYSTEM` | `SNOMEDCT-A` |
/// | `SNOMED_UPGRADE_VERSION` | `20250101` |
/// | `SNOMED_CONTENT_AUTOMATIONS` | `true` |
/// | `SNOMED_POLL_INTERVAL_MS` | `100` |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// JSON seed applied to the empty store.
    pub seed_path: PathBuf,
    /// Short name of the code system to upgrade.
    pub code_system: String,
    /// Effective date of the parent version to upgrade to.
    pub version: u32,
    /// Run the post-upgrade content automations.
    pub content_automations: bool,
    /// Delay between job status polls.
    pub poll_interval: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            seed_path: PathBuf::from(DEFAULT_SEED_PATH),
            code_system: DEFAULT_CODESYSTEM.to_string(),
            version: DEFAULT_VERSION,
            content_automations: true,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl ServiceConfig {
    /// Reads settings from the process environment.
    pub fn from_env() -> ServiceResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads settings through `lookup`, falling back to defaults for unset names.
    pub fn from_lookup<F>(lookup: F) -> ServiceResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(path) = lookup("SNOMED_SEED_PATH") {
            config.seed_path = PathBuf::from(path);
        }
        if let Some(short_name) = lookup("SNOMED_UPGRADE_CODESYSTEM") {
            config.code_system = short_name;
        }
        if let Some(version) = lookup("SNOMED_UPGRADE_VERSION") {
            config.version = parse("SNOMED_UPGRADE_VERSION", version)?;
        }
        if let Some(flag) = lookup("SNOMED_CONTENT_AUTOMATIONS") {
            config.content_automations = parse("SNOMED_CONTENT_AUTOMATIONS", flag)?;
        }
        if let Some(millis) = lookup("SNOMED_POLL_INTERVAL_MS") {
            config.poll_interval = Duration::from_millis(parse("SNOMED_POLL_INTERVAL_MS", millis)?);
        }
        Ok(config)
    }
}

fn parse<T: std::str::FromStr>(name: &'static str, value: String) -> ServiceResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ServiceError::InvalidSetting { name, value })
}
