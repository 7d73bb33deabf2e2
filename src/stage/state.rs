use semver::Version;

use crate::{Result, error::StageError, release::Versions};

/// Mutable state of one staging run, threaded through the phases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageState {
    /// Branch the release branch is cut from. Empty when tagging a commit
    /// directly.
    pub parent_branch: String,
    /// Set by the version generation phase.
    pub versions: Option<Versions>,
    pub build_version: String,
    pub semver_build_version: Option<Version>,
}

impl StageState {
    pub fn versions(&self) -> Result<&Versions> {
        self.versions.as_ref().ok_or_else(|| {
            StageError::invalid_options("release versions have not been generated")
        })
    }

    /// Commit of the build candidate: the first build metadata identifier
    /// of the build version.
    pub fn commit(&self) -> Result<String> {
        let version = self.semver_build_version.as_ref().ok_or_else(|| {
            StageError::invalid_options("build candidate has not been set")
        })?;

        version
            .build
            .as_str()
            .split('.')
            .next()
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                StageError::invalid_version(
                    self.build_version.clone(),
                    "build metadata does not name a commit",
                )
            })
    }
}
