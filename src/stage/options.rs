use derive_builder::Builder;
use std::path::PathBuf;

use crate::{
    Result,
    config::{
        Config, DEFAULT_BUILD_DIR_PREFIX, RegistryConfig, StorageConfig,
        SubmitConfig,
    },
    error::StageError,
    release::{BranchConventions, ReleaseType, parse_build_version},
    stage::StageState,
};

/// Inputs of a staging run. Fixed once validated.
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(setter(into), build_fn(private, name = "_build"))]
pub struct StageOptions {
    pub release_type: ReleaseType,
    /// Branch the release is cut on: the default branch or a release branch.
    pub release_branch: String,
    /// Build version to stage. Discovered from the repository when unset.
    #[builder(default)]
    pub build_version: Option<String>,
    /// Use production storage and registry.
    #[builder(default)]
    pub nomock: bool,
    pub repo_path: PathBuf,
    /// Directory archived as the source tree and receiving the HTML notes.
    pub workspace_dir: PathBuf,
    /// Product name used in commit and tag messages.
    pub product: String,
    #[builder(default)]
    pub conventions: BranchConventions,
    #[builder(default = DEFAULT_BUILD_DIR_PREFIX.to_string())]
    pub build_dir_prefix: String,
    #[builder(default)]
    pub storage: StorageConfig,
    #[builder(default)]
    pub registry: RegistryConfig,
    #[builder(default)]
    pub submit: SubmitConfig,
}

impl StageOptionsBuilder {
    pub fn build(&self) -> Result<StageOptions> {
        self._build().map_err(|e| {
            StageError::invalid_options(format!(
                "Failed to build stage options: {}",
                e
            ))
        })
    }

    /// Take repository conventions and destinations from `config`.
    pub fn config(&mut self, config: &Config) -> &mut Self {
        self.conventions(BranchConventions::from_config(config))
            .build_dir_prefix(config.build_dir_prefix.clone())
            .storage(config.storage.clone())
            .registry(config.registry.clone())
            .submit(config.submit.clone())
    }
}

impl StageOptions {
    pub fn builder() -> StageOptionsBuilder {
        StageOptionsBuilder::default()
    }

    /// Check the options and return the initial state of the run.
    pub fn validate(&self) -> Result<StageState> {
        if self.release_branch.trim().is_empty() {
            return Err(StageError::invalid_options("release branch must be set"));
        }

        if !self.conventions.is_default(&self.release_branch)
            && self.conventions.release_branch(&self.release_branch).is_none()
        {
            return Err(StageError::invalid_options(format!(
                "branch {} is neither {} nor a release branch ({}<major>.<minor>)",
                self.release_branch,
                self.conventions.default_branch,
                self.conventions
                    .release_prefixes
                    .first()
                    .map(String::as_str)
                    .unwrap_or_default(),
            )));
        }

        if self.repo_path.as_os_str().is_empty() {
            return Err(StageError::invalid_options(
                "repository path must be set",
            ));
        }

        let mut state = StageState::default();

        if let Some(build_version) =
            self.build_version.as_deref().filter(|v| !v.is_empty())
        {
            state.semver_build_version = Some(parse_build_version(build_version)?);
            state.build_version = build_version.to_string();
        }

        Ok(state)
    }

    /// Bucket the run stages into.
    pub fn bucket(&self) -> &str {
        if self.nomock {
            &self.storage.bucket
        } else {
            &self.storage.mock_bucket
        }
    }

    /// Registry the run pushes images to.
    pub fn container_registry(&self) -> &str {
        if self.nomock {
            &self.registry.production
        } else {
            &self.registry.mock
        }
    }
}
