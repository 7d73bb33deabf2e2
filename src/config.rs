//! Configuration loading and parsing for `stagehand.toml` files.
//!
//! Every field has a default, so a repository without a config file stages
//! with the built-in conventions.
use log::*;
use serde::Deserialize;
use std::{fs, path::Path};

use crate::Result;

pub mod changelog;
pub mod storage;
pub mod submit;

pub use changelog::ChangelogConfig;
pub use storage::{RegistryConfig, StorageConfig};
pub use submit::SubmitConfig;

/// Default configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "stagehand.toml";
/// Default branch releases are cut from.
pub const DEFAULT_BRANCH: &str = "master";
/// Default prefix identifying release branches.
pub const DEFAULT_RELEASE_BRANCH_PREFIX: &str = "release-";
/// Default local build output directory prefix (`_output-<version>`).
pub const DEFAULT_BUILD_DIR_PREFIX: &str = "_output";

/// Commit identity used when the repository has none configured.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GitIdentityConfig {
    pub name: String,
    pub email: String,
}

impl Default for GitIdentityConfig {
    fn default() -> Self {
        Self {
            name: "Stagehand Release Bot".into(),
            email: "release-bot@localhost".into(),
        }
    }
}

/// Root configuration structure for `stagehand.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Product name used in tag and commit messages. Falls back to the
    /// repository directory name.
    pub product: Option<String>,
    /// Branch that new release branches are cut from.
    pub default_branch: String,
    /// Branch name prefixes that mark release branches. Tagging on a branch
    /// carrying one of these gets an empty release commit first.
    pub release_branch_prefixes: Vec<String>,
    /// Prefix of the per-version build output directory.
    pub build_dir_prefix: String,
    /// Program and arguments invoked to build one version.
    pub build_command: Vec<String>,
    /// Identity configured before tagging.
    pub git: GitIdentityConfig,
    pub storage: StorageConfig,
    pub registry: RegistryConfig,
    pub changelog: ChangelogConfig,
    pub submit: SubmitConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            product: None,
            default_branch: DEFAULT_BRANCH.into(),
            release_branch_prefixes: vec![DEFAULT_RELEASE_BRANCH_PREFIX.into()],
            build_dir_prefix: DEFAULT_BUILD_DIR_PREFIX.into(),
            build_command: vec!["make".into(), "cross-in-a-container".into()],
            git: GitIdentityConfig::default(),
            storage: StorageConfig::default(),
            registry: RegistryConfig::default(),
            changelog: ChangelogConfig::default(),
            submit: SubmitConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, using defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(
                "configuration not found at {}: using default",
                path.display()
            );
            return Ok(Self::default());
        }

        debug!("loading configuration from {}", path.display());
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
