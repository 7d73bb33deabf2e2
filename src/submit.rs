//! Submission of staging and release jobs to the remote build service.
use derive_builder::Builder;
use log::*;

use crate::{Result, error::StageError, process::Cmd, release::ReleaseType};

const GCLOUD: &str = "gcloud";

/// Whether a job stages a build or releases a staged one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Stage,
    Release,
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stage => write!(f, "stage"),
            Self::Release => write!(f, "release"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Builder)]
#[builder(setter(into), build_fn(private, name = "_build"))]
pub struct SubmitOptions {
    pub kind: JobKind,
    #[builder(default)]
    pub nomock: bool,
    pub branch: String,
    pub release_type: ReleaseType,
    #[builder(default)]
    pub build_version: Option<String>,
    pub project: String,
    /// Build configuration file of the job.
    pub config_file: String,
}

impl SubmitOptionsBuilder {
    pub fn build(&self) -> Result<SubmitOptions> {
        let options = self._build().map_err(|e| {
            StageError::invalid_options(format!(
                "Failed to build submit options: {}",
                e
            ))
        })?;

        if options.kind == JobKind::Release
            && options.build_version.as_deref().unwrap_or_default().is_empty()
        {
            return Err(StageError::invalid_options(
                "releasing a staged build requires its build version",
            ));
        }

        Ok(options)
    }
}

impl SubmitOptions {
    pub fn builder() -> SubmitOptionsBuilder {
        SubmitOptionsBuilder::default()
    }

    /// Substitution variables handed to the job.
    pub fn substitutions(&self) -> Vec<(&'static str, String)> {
        let mut subs = vec![
            ("_RELEASE_BRANCH", self.branch.clone()),
            ("_TYPE", self.release_type.to_string()),
            (
                "_NOMOCK",
                if self.nomock { "--nomock".into() } else { String::new() },
            ),
        ];

        if let Some(build_version) = &self.build_version {
            subs.push(("_BUILDVERSION", build_version.clone()));
        }

        subs
    }

    fn command(&self) -> Cmd {
        let substitutions = self
            .substitutions()
            .into_iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(",");

        Cmd::new(GCLOUD)
            .args(["builds", "submit", "--no-source"])
            .args(["--config", self.config_file.as_str()])
            .args(["--project", self.project.as_str()])
            .arg(format!("--substitutions={substitutions}"))
    }
}

/// Submit the job and return the service's output.
pub fn submit(options: &SubmitOptions) -> Result<String> {
    let cmd = options.command();
    info!(
        "submitting {} job for {} ({}): {}",
        options.kind,
        options.branch,
        options.release_type,
        cmd.display()
    );
    cmd.run()
}
