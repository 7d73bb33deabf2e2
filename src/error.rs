//! Error types for staging runs.

use thiserror::Error;

/// Main error type for stagehand operations.
#[derive(Error, Debug)]
pub enum StageError {
    // Options / input errors
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("Unknown release type: {0}")]
    UnknownReleaseType(String),

    #[error("Invalid version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },

    #[error("Branch '{branch}' cannot be used for {release_type} releases: {reason}")]
    BranchMismatch {
        branch: String,
        release_type: String,
        reason: String,
    },

    // Repository preconditions
    #[error("tag {0} already exists")]
    TagExists(String),

    #[error("Working tree of {0} has uncommitted changes")]
    DirtyWorkingTree(String),

    // Collaborator failures
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Command `{command}` failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("Required tool `{0}` not found in PATH")]
    MissingTool(String),

    #[error("Template rendering failed: {0}")]
    Template(#[from] tera::Error),

    #[error("TOML parse error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Version parse error: {0}")]
    Semver(#[from] semver::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Logger initialization error: {0}")]
    Logger(#[from] log::SetLoggerError),

    /// Failure of a named step, annotated with phase and version context.
    #[error("{step}: {source}")]
    Step {
        step: String,
        #[source]
        source: Box<StageError>,
    },

    // Generic wrapper for other errors
    #[error(transparent)]
    Other(#[from] color_eyre::Report),
}

/// Result type alias using StageError
pub type Result<T> = std::result::Result<T, StageError>;

impl StageError {
    pub fn invalid_options(msg: impl Into<String>) -> Self {
        Self::InvalidOptions(msg.into())
    }

    pub fn invalid_version(
        version: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidVersion {
            version: version.into(),
            reason: reason.into(),
        }
    }

    pub fn branch_mismatch(
        branch: impl Into<String>,
        release_type: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Self::BranchMismatch {
            branch: branch.into(),
            release_type: release_type.to_string(),
            reason: reason.into(),
        }
    }

    pub fn command_failed(
        command: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    /// Innermost cause, skipping any step annotations.
    pub fn root(&self) -> &StageError {
        match self {
            Self::Step { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Annotates errors with the step that produced them.
pub trait StepContext<T> {
    fn step(self, step: impl Into<String>) -> Result<T>;

    fn with_step<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> StepContext<T> for Result<T> {
    fn step(self, step: impl Into<String>) -> Result<T> {
        self.map_err(|e| StageError::Step {
            step: step.into(),
            source: Box::new(e),
        })
    }

    fn with_step<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| StageError::Step {
            step: f().into(),
            source: Box::new(e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_formats() {
        let err = StageError::invalid_options("missing branch");
        assert_eq!(err.to_string(), "Invalid options: missing branch");

        let err = StageError::TagExists("v1.30.0".into());
        assert_eq!(err.to_string(), "tag v1.30.0 already exists");

        let err = StageError::command_failed("gsutil ls", "denied");
        assert_eq!(err.to_string(), "Command `gsutil ls` failed: denied");
    }

    #[test]
    fn step_context_wraps_and_root_unwraps() {
        let res: Result<()> = Err(StageError::TagExists("v1.0.0".into()));
        let err = res
            .step("tag version v1.0.0")
            .step("tagging repository")
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "tagging repository: tag version v1.0.0: tag v1.0.0 already exists"
        );
        assert!(matches!(err.root(), StageError::TagExists(tag) if tag == "v1.0.0"));
    }

    #[test]
    fn test_from_conversions() {
        let semver_err = semver::Version::parse("invalid").unwrap_err();
        let err: StageError = semver_err.into();
        assert!(matches!(err, StageError::Semver(_)));
    }
}
