use crate::{Result, error::StageError};

/// The versions a staging run releases.
///
/// Slots are kept in release precedence: official, rc, beta, alpha. The
/// first populated slot is the prime version, which decides the release
/// branch and the changelog scope. Construction guarantees at least one slot
/// is populated, so a prime version always exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versions {
    official: Option<String>,
    rc: Option<String>,
    beta: Option<String>,
    alpha: Option<String>,
}

impl Versions {
    pub fn new(
        official: Option<String>,
        rc: Option<String>,
        beta: Option<String>,
        alpha: Option<String>,
    ) -> Result<Self> {
        let versions = Self {
            official: non_empty(official),
            rc: non_empty(rc),
            beta: non_empty(beta),
            alpha: non_empty(alpha),
        };

        if versions.ordered().is_empty() {
            return Err(StageError::invalid_options(
                "at least one release version must be resolved",
            ));
        }

        Ok(versions)
    }

    pub fn official(&self) -> Option<&str> {
        self.official.as_deref()
    }

    pub fn rc(&self) -> Option<&str> {
        self.rc.as_deref()
    }

    pub fn beta(&self) -> Option<&str> {
        self.beta.as_deref()
    }

    pub fn alpha(&self) -> Option<&str> {
        self.alpha.as_deref()
    }

    /// The principal version of this run.
    pub fn prime(&self) -> &str {
        // new() rejects an empty set
        self.ordered().first().copied().unwrap_or_default()
    }

    /// All populated versions, prime first.
    pub fn ordered(&self) -> Vec<&str> {
        [&self.official, &self.rc, &self.beta, &self.alpha]
            .into_iter()
            .filter_map(|v| v.as_deref())
            .collect()
    }

    pub fn is_prime(&self, version: &str) -> bool {
        self.prime() == version
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
