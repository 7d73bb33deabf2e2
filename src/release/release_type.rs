use clap::ValueEnum;
use serde::Deserialize;
use std::{fmt::Display, str::FromStr};

use crate::error::StageError;

/// Kind of release a staging run cuts.
#[derive(
    Debug, Default, Copy, Clone, PartialEq, Eq, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseType {
    /// Next pre-release on the default branch (`vX.Y.Z-alpha.N`).
    #[default]
    Alpha,
    /// Beta of the upcoming minor (`vX.Y.Z-beta.N`).
    Beta,
    /// Release candidate on a release branch (`vX.Y.Z-rc.N`). Cutting the
    /// first candidate of a new minor creates its release branch.
    Rc,
    /// Final release on a release branch: a new minor `vX.Y.0` or a patch.
    Official,
}

impl ReleaseType {
    /// Pre-release label carried by versions of this type.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            ReleaseType::Alpha => Some("alpha"),
            ReleaseType::Beta => Some("beta"),
            ReleaseType::Rc => Some("rc"),
            ReleaseType::Official => None,
        }
    }
}

impl Display for ReleaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReleaseType::Alpha => f.write_str("alpha"),
            ReleaseType::Beta => f.write_str("beta"),
            ReleaseType::Rc => f.write_str("rc"),
            ReleaseType::Official => f.write_str("official"),
        }
    }
}

impl FromStr for ReleaseType {
    type Err = StageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "alpha" => Ok(ReleaseType::Alpha),
            "beta" => Ok(ReleaseType::Beta),
            "rc" => Ok(ReleaseType::Rc),
            "official" => Ok(ReleaseType::Official),
            _ => Err(StageError::UnknownReleaseType(s.to_string())),
        }
    }
}
