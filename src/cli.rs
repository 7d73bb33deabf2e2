//! CLI argument parsing.
use clap::{Args as ClapArgs, Parser, Subcommand};
use color_eyre::eyre::eyre;
use std::path::{Path, PathBuf};

use crate::{
    Result,
    config::{Config, DEFAULT_CONFIG_FILE},
    release::ReleaseType,
    stage::StageOptions,
    submit::JobKind,
};

/// Global CLI arguments.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[arg(long, default_value_t = false, global = true)]
    /// Enable debug logging.
    pub debug: bool,

    #[arg(long, global = true)]
    /// Configuration file. Defaults to stagehand.toml in the repository.
    pub config: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Staging subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Tag, build, write the changelog and stage the artifacts locally.
    Stage(StageArgs),

    /// Submit a staging or release job to the remote build service.
    Submit(SubmitArgs),
}

/// Values describing a single run, shared by both subcommands.
#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    #[arg(long = "type", value_enum, default_value_t = ReleaseType::Alpha)]
    /// Release type to cut.
    pub release_type: ReleaseType,

    #[arg(long)]
    /// Branch to release from: the default branch or a release branch.
    pub branch: String,

    #[arg(long)]
    /// Build version to stage. Discovered from the branch when omitted.
    pub build_version: Option<String>,

    #[arg(long, default_value_t = false)]
    /// Stage to the production bucket and registry.
    pub nomock: bool,

    #[arg(long, default_value = ".")]
    /// Repository to stage.
    pub repo_path: PathBuf,

    #[arg(long)]
    /// Directory the source tree is staged from. Defaults to the parent
    /// of the repository.
    pub workspace_dir: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
pub struct StageArgs {
    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(ClapArgs, Debug)]
pub struct SubmitArgs {
    #[command(flatten)]
    pub run: RunArgs,

    #[arg(long, default_value_t = false)]
    /// Submit a release job promoting a staged build.
    pub release: bool,
}

impl Args {
    /// Path of the configuration file, relative to `repo_path` by default.
    pub fn config_path(&self, repo_path: &Path) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| repo_path.join(DEFAULT_CONFIG_FILE))
    }
}

impl RunArgs {
    /// Combine the flags with `config` into the options of a run.
    pub fn stage_options(&self, config: &Config) -> Result<StageOptions> {
        let workspace_dir = match &self.workspace_dir {
            Some(dir) => dir.clone(),
            None => self
                .repo_path
                .canonicalize()?
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| {
                    eyre!(
                        "cannot derive workspace from {}: pass --workspace-dir",
                        self.repo_path.display()
                    )
                })?,
        };

        StageOptions::builder()
            .config(config)
            .release_type(self.release_type)
            .release_branch(self.branch.clone())
            .build_version(self.build_version.clone())
            .nomock(self.nomock)
            .repo_path(self.repo_path.clone())
            .workspace_dir(workspace_dir)
            .product(product_name(config, &self.repo_path)?)
            .build()
    }
}

impl SubmitArgs {
    pub fn job_kind(&self) -> JobKind {
        if self.release {
            JobKind::Release
        } else {
            JobKind::Stage
        }
    }
}

/// Product named in tags and release commits: the configured name, else the
/// repository directory name.
pub fn product_name(config: &Config, repo_path: &Path) -> Result<String> {
    if let Some(product) = config.product.as_ref().filter(|p| !p.is_empty()) {
        return Ok(product.clone());
    }

    let path = repo_path.canonicalize()?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| eyre!("unable to derive product name from {}", path.display()))?;

    Ok(name.to_string())
}
