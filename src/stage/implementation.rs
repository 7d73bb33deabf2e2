//! Side effects of the staging phases.
use log::*;
use std::path::{Path, PathBuf};

use crate::{
    Result,
    build::{BuildPublisher, Make, PushBuildOptions, clean_build_dirs},
    changelog::{ChangelogGenerator, ChangelogOptions},
    config::Config,
    error::StageError,
    repo::{GitRepo, Repository},
    submit::{SubmitOptions, submit},
};

/// External tools the production implementation calls.
const REQUIRED_TOOLS: &[&str] = &["git", "gsutil", "crane"];

/// Every call the stage controller makes into git, the build, storage and
/// the registry.
#[cfg_attr(test, mockall::automock)]
pub trait StageImpl {
    fn submit(&self, options: &SubmitOptions) -> Result<()>;
    fn prepare_workspace_stage(
        &self,
        repo_path: &Path,
        versions: &[String],
    ) -> Result<()>;
    fn check_prerequisites(&self) -> Result<()>;
    fn configure_default_identity(&self, repo_path: &Path) -> Result<()>;
    fn open_repo(&self, repo_path: &Path) -> Result<Box<dyn Repository>>;
    fn build(&self, version: &str) -> Result<()>;
    fn generate_changelog(&self, options: &ChangelogOptions) -> Result<()>;
    fn check_release_bucket(&self, options: &PushBuildOptions) -> Result<()>;
    fn stage_local_source_tree(
        &self,
        options: &PushBuildOptions,
        work_dir: &Path,
        build_version: &str,
    ) -> Result<()>;
    fn stage_local_artifacts(&self, options: &PushBuildOptions) -> Result<()>;
    fn push_release_artifacts(
        &self,
        options: &PushBuildOptions,
        src: &Path,
        remote_path: &str,
    ) -> Result<()>;
    fn push_container_images(&self, options: &PushBuildOptions) -> Result<()>;
}

/// Production implementation backed by `git2` and the `make`, `gsutil`,
/// `crane` and `gcloud` command line tools.
pub struct DefaultStageImpl {
    config: Config,
    repo_path: PathBuf,
    product: String,
}

impl DefaultStageImpl {
    pub fn new(
        config: Config,
        repo_path: impl Into<PathBuf>,
        product: impl Into<String>,
    ) -> Self {
        Self {
            config,
            repo_path: repo_path.into(),
            product: product.into(),
        }
    }
}

impl StageImpl for DefaultStageImpl {
    fn submit(&self, options: &SubmitOptions) -> Result<()> {
        let output = submit(options)?;
        info!("{output}");
        Ok(())
    }

    fn prepare_workspace_stage(
        &self,
        repo_path: &Path,
        versions: &[String],
    ) -> Result<()> {
        let repo = GitRepo::open(repo_path)?;
        if !repo.is_clean()? {
            return Err(StageError::DirtyWorkingTree(
                repo_path.display().to_string(),
            ));
        }

        clean_build_dirs(repo_path, &self.config.build_dir_prefix, versions)
    }

    fn check_prerequisites(&self) -> Result<()> {
        let build_tool = self.config.build_command.first().map(String::as_str);

        for tool in REQUIRED_TOOLS.iter().copied().chain(build_tool) {
            match which::which(tool) {
                Ok(path) => debug!("found {tool} at {}", path.display()),
                Err(_) => return Err(StageError::MissingTool(tool.to_string())),
            }
        }

        Ok(())
    }

    fn configure_default_identity(&self, repo_path: &Path) -> Result<()> {
        GitRepo::configure_default_identity(
            repo_path,
            &self.config.git.name,
            &self.config.git.email,
        )
    }

    fn open_repo(&self, repo_path: &Path) -> Result<Box<dyn Repository>> {
        Ok(Box::new(GitRepo::open(repo_path)?))
    }

    fn build(&self, version: &str) -> Result<()> {
        Make::new(
            &self.repo_path,
            self.config.build_command.clone(),
            &self.config.build_dir_prefix,
        )
        .build(version)
    }

    fn generate_changelog(&self, options: &ChangelogOptions) -> Result<()> {
        ChangelogGenerator::new(
            options.clone(),
            self.config.changelog.clone(),
            &self.product,
        )
        .run()
    }

    fn check_release_bucket(&self, options: &PushBuildOptions) -> Result<()> {
        BuildPublisher::new(options.clone()).check_release_bucket()
    }

    fn stage_local_source_tree(
        &self,
        options: &PushBuildOptions,
        work_dir: &Path,
        build_version: &str,
    ) -> Result<()> {
        BuildPublisher::new(options.clone()).stage_local_source_tree(
            work_dir,
            build_version,
            &self.config.build_dir_prefix,
        )
    }

    fn stage_local_artifacts(&self, options: &PushBuildOptions) -> Result<()> {
        BuildPublisher::new(options.clone()).stage_local_artifacts()
    }

    fn push_release_artifacts(
        &self,
        options: &PushBuildOptions,
        src: &Path,
        remote_path: &str,
    ) -> Result<()> {
        BuildPublisher::new(options.clone()).push_release_artifacts(src, remote_path)
    }

    fn push_container_images(&self, options: &PushBuildOptions) -> Result<()> {
        BuildPublisher::new(options.clone()).push_container_images()
    }
}
