//! Staging of a release: tag the repository, build, write the changelog and
//! push the build to the staging bucket and registry.
//!
//! [`run_stage`] drives a [`StageClient`] through a fixed sequence of
//! phases and stops at the first failure. [`DefaultStage`] implements the
//! phases on top of a [`StageImpl`], which owns every side effect.
use log::*;
use std::path::PathBuf;

use crate::{
    Result,
    build::{
        GCS_STAGE_PATH, IMAGES_PATH, PushBuildOptions, RELEASE_TARS_PATH,
        STAGE_PATH, build_dir,
    },
    changelog::ChangelogOptions,
    config::Config,
    error::{StageError, StepContext},
    release::{generate_release_version, parse_build_version},
    repo::{CheckoutTarget, Repository},
    submit::{JobKind, SubmitOptions},
};

pub mod implementation;
pub mod options;
pub mod state;

pub use implementation::{DefaultStageImpl, StageImpl};
pub use options::{StageOptions, StageOptionsBuilder};
pub use state::StageState;

/// Phases of a staging run, in the order [`run_stage`] executes them.
#[cfg_attr(test, mockall::automock)]
pub trait StageClient {
    /// Submit the run as a stage or release job to the remote build
    /// service.
    fn submit(&mut self, kind: JobKind) -> Result<()>;
    /// Validate the options and start a fresh state.
    fn validate_options(&mut self) -> Result<()>;
    fn check_prerequisites(&mut self) -> Result<()>;
    /// Determine the parent branch and the build version.
    fn set_build_candidate(&mut self) -> Result<()>;
    fn generate_release_version(&mut self) -> Result<()>;
    fn prepare_workspace(&mut self) -> Result<()>;
    fn tag_repository(&mut self) -> Result<()>;
    fn build(&mut self) -> Result<()>;
    fn generate_changelog(&mut self) -> Result<()>;
    fn stage_artifacts(&mut self) -> Result<()>;
}

/// Run every staging phase in order. The first failing phase ends the run.
pub fn run_stage(client: &mut dyn StageClient) -> Result<()> {
    info!("validating options");
    client.validate_options()?;

    info!("checking prerequisites");
    client.check_prerequisites()?;

    info!("setting build candidate");
    client.set_build_candidate()?;

    info!("generating release version");
    client.generate_release_version()?;

    info!("preparing workspace");
    client.prepare_workspace()?;

    info!("tagging repository");
    client.tag_repository()?;

    info!("building release");
    client.build()?;

    info!("generating changelog");
    client.generate_changelog()?;

    info!("staging artifacts");
    client.stage_artifacts()?;

    info!("staging completed successfully");
    Ok(())
}

/// The production stage controller.
pub struct DefaultStage {
    stage_impl: Box<dyn StageImpl>,
    options: StageOptions,
    state: Option<StageState>,
}

impl DefaultStage {
    pub fn new(options: StageOptions, config: Config) -> Self {
        let stage_impl = DefaultStageImpl::new(
            config,
            options.repo_path.clone(),
            options.product.clone(),
        );
        Self::with_impl(options, Box::new(stage_impl))
    }

    pub fn with_impl(options: StageOptions, stage_impl: Box<dyn StageImpl>) -> Self {
        Self {
            stage_impl,
            options,
            state: None,
        }
    }

    /// Replace the run state, skipping the phases that would produce it.
    pub fn set_state(&mut self, state: StageState) {
        self.state = Some(state);
    }

    pub fn state(&self) -> Option<&StageState> {
        self.state.as_ref()
    }

    fn current_state(&self) -> Result<&StageState> {
        self.state
            .as_ref()
            .ok_or_else(|| StageError::invalid_options("options have not been validated"))
    }

    fn current_state_mut(&mut self) -> Result<&mut StageState> {
        self.state
            .as_mut()
            .ok_or_else(|| StageError::invalid_options("options have not been validated"))
    }

    fn build_dir(&self, version: &str) -> PathBuf {
        build_dir(&self.options.repo_path, &self.options.build_dir_prefix, version)
    }

    fn tag_version(
        &self,
        repo: &dyn Repository,
        state: &StageState,
        version: &str,
        commit: &str,
    ) -> Result<()> {
        info!("preparing version {version}");

        if repo.rev_parse(version).is_ok() {
            return Err(StageError::TagExists(version.to_string()));
        }

        let versions = state.versions()?;
        let release_branch = &self.options.release_branch;

        if !state.parent_branch.is_empty() {
            info!("parent branch provided: {}", state.parent_branch);

            if versions.is_prime(version) {
                info!("version {version} is the prime version");

                let has_branch = repo
                    .has_branch(release_branch)
                    .step("check if repository has branch")?;
                info!("branch {release_branch} already exists: {has_branch}");

                if has_branch {
                    repo.checkout(&CheckoutTarget::rev(release_branch))
                        .step("checkout release branch")?;
                } else {
                    info!("creating release branch {release_branch} from commit {commit}");
                    repo.checkout(&CheckoutTarget::new_branch(release_branch, commit))
                        .step("create new release branch")?;
                }
            } else {
                info!("version {version} is not the prime, checking out parent branch");
                repo.checkout(&CheckoutTarget::rev(&state.parent_branch))
                    .step("checkout parent branch")?;
            }
        } else {
            info!("checking out commit {commit}");
            repo.checkout(&CheckoutTarget::rev(commit))
                .step("checkout release commit")?;
        }

        // empty on a detached HEAD
        let branch = repo.current_branch().step("get current branch")?;
        info!("current branch is {branch:?}");

        // each release branch tag gets its own commit so describe never
        // sees two tags on one commit
        if self.options.conventions.has_release_prefix(&branch) {
            info!("creating empty release commit for tag {version}");
            repo.commit_empty(&format!(
                "Release commit for {} {version}",
                self.options.product
            ))
            .step("create empty release commit")?;
        }

        info!("tagging version {version}");
        repo.tag(
            version,
            &format!(
                "{} {} release {version}",
                self.options.product, self.options.release_type
            ),
        )
        .step("tag version")?;

        Ok(())
    }
}

impl StageClient for DefaultStage {
    fn submit(&mut self, kind: JobKind) -> Result<()> {
        let config_file = match kind {
            JobKind::Stage => self.options.submit.stage_config.clone(),
            JobKind::Release => self.options.submit.release_config.clone(),
        };

        let options = SubmitOptions::builder()
            .kind(kind)
            .nomock(self.options.nomock)
            .branch(self.options.release_branch.clone())
            .release_type(self.options.release_type)
            .build_version(self.options.build_version.clone())
            .project(self.options.submit.project.clone())
            .config_file(config_file)
            .build()?;

        self.stage_impl
            .submit(&options)
            .with_step(|| format!("submitting {kind} job"))
    }

    fn validate_options(&mut self) -> Result<()> {
        let state = self.options.validate().step("validating options")?;
        self.state = Some(state);
        Ok(())
    }

    fn check_prerequisites(&mut self) -> Result<()> {
        self.stage_impl
            .check_prerequisites()
            .step("checking prerequisites")
    }

    fn set_build_candidate(&mut self) -> Result<()> {
        let conventions = self.options.conventions.clone();
        let release_branch = self.options.release_branch.clone();
        let repo = self
            .stage_impl
            .open_repo(&self.options.repo_path)
            .step("open repository")?;

        // a release branch that does not exist yet is cut from the default
        // branch during tagging
        let parent_branch = if conventions.release_branch(&release_branch).is_some()
            && !repo
                .has_branch(&release_branch)
                .step("check if repository has branch")?
        {
            conventions.default_branch.clone()
        } else {
            String::new()
        };

        let state = self.current_state_mut()?;

        if state.build_version.is_empty() {
            let rev = if parent_branch.is_empty() {
                &release_branch
            } else {
                &parent_branch
            };
            let build_version = repo
                .describe(rev)
                .with_step(|| format!("discover build version of {rev}"))?;
            info!("discovered build version {build_version} on {rev}");
            state.semver_build_version = Some(parse_build_version(&build_version)?);
            state.build_version = build_version;
        }

        if !parent_branch.is_empty() {
            info!("release branch {release_branch} will be cut from {parent_branch}");
        }
        state.parent_branch = parent_branch;

        // fail before any side effect when the candidate names no commit
        state.commit().step("setting build candidate")?;

        Ok(())
    }

    fn generate_release_version(&mut self) -> Result<()> {
        let release_type = self.options.release_type;
        let release_branch = self.options.release_branch.clone();
        let conventions = self.options.conventions.clone();
        let state = self.current_state_mut()?;

        let versions = generate_release_version(
            release_type,
            &state.build_version,
            &release_branch,
            state.parent_branch == conventions.default_branch,
            &conventions,
        )
        .step("generating release versions for stage")?;

        state.versions = Some(versions);
        Ok(())
    }

    fn prepare_workspace(&mut self) -> Result<()> {
        let versions = self
            .current_state()?
            .versions()?
            .ordered()
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>();

        self.stage_impl
            .prepare_workspace_stage(&self.options.repo_path, &versions)
            .step("prepare workspace")
    }

    fn tag_repository(&mut self) -> Result<()> {
        info!("configuring git user and email");
        self.stage_impl
            .configure_default_identity(&self.options.repo_path)
            .step("configure git user and email")?;

        let repo = self
            .stage_impl
            .open_repo(&self.options.repo_path)
            .step("open repository")?;

        let state = self.current_state()?;
        let commit = state.commit()?;

        for version in state.versions()?.ordered() {
            self.tag_version(repo.as_ref(), state, version, &commit)
                .map_err(|e| match e {
                    StageError::TagExists(_) => e,
                    e => StageError::Step {
                        step: format!("tagging {version}"),
                        source: Box::new(e),
                    },
                })?;
        }

        Ok(())
    }

    fn build(&mut self) -> Result<()> {
        for version in self.current_state()?.versions()?.ordered() {
            self.stage_impl
                .build(version)
                .with_step(|| format!("build artifacts for {version}"))?;
        }
        Ok(())
    }

    fn generate_changelog(&mut self) -> Result<()> {
        let state = self.current_state()?;
        let prime = state.versions()?.prime();

        let branch = if state.parent_branch.is_empty() {
            self.options.release_branch.clone()
        } else {
            state.parent_branch.clone()
        };

        let options = ChangelogOptions::builder()
            .repo_path(self.options.repo_path.clone())
            .tag(prime)
            .branch(branch)
            .bucket(self.options.bucket())
            .html_file(self.options.workspace_dir.join("src/release-notes.html"))
            .dependencies(true)
            .tars(self.build_dir(prime).join(RELEASE_TARS_PATH))
            .build()?;

        self.stage_impl
            .generate_changelog(&options)
            .step("generate changelog")
    }

    fn stage_artifacts(&mut self) -> Result<()> {
        let state = self.current_state()?;
        let build_version = state.build_version.as_str();

        for version in state.versions()?.ordered() {
            info!("staging artifacts for version {version}");
            let build_dir = self.build_dir(version);

            let push_options = PushBuildOptions::builder()
                .bucket(self.options.bucket())
                .build_dir(build_dir.clone())
                .registry(self.options.container_registry())
                .version(version)
                .allow_dup(true)
                .validate_remote_image_digests(true)
                .build()?;

            self.stage_impl
                .check_release_bucket(&push_options)
                .step("check release bucket access")?;

            self.stage_impl
                .stage_local_source_tree(
                    &push_options,
                    &self.options.workspace_dir,
                    build_version,
                )
                .step("staging local source tree")?;

            self.stage_impl
                .stage_local_artifacts(&push_options)
                .step("staging local artifacts")?;

            let stage_path = format!("{STAGE_PATH}/{build_version}/{version}");

            self.stage_impl
                .push_release_artifacts(
                    &push_options,
                    &build_dir.join(GCS_STAGE_PATH).join(version),
                    &format!("{stage_path}/{GCS_STAGE_PATH}/{version}"),
                )
                .step("pushing release artifacts")?;

            self.stage_impl
                .push_release_artifacts(
                    &push_options,
                    &build_dir.join(IMAGES_PATH),
                    &format!("{stage_path}/{IMAGES_PATH}"),
                )
                .step("pushing release images")?;

            self.stage_impl
                .push_container_images(&push_options)
                .step("pushing container images")?;
        }

        info!(
            "To release this staged build, run:\n\n$ {}",
            release_command(&self.options, build_version)
        );
        Ok(())
    }
}

/// Command that promotes the staged build.
pub fn release_command(options: &StageOptions, build_version: &str) -> String {
    let mut command = format!(
        "stagehand submit --release --type {} --branch {} --build-version={build_version}",
        options.release_type, options.release_branch
    );
    if options.nomock {
        command.push_str(" --nomock");
    }
    command
}

#[cfg(test)]
mod tests;
