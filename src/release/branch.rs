use regex::Regex;

use crate::config::Config;

/// Branch naming conventions of the repository being released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchConventions {
    pub default_branch: String,
    pub release_prefixes: Vec<String>,
}

impl BranchConventions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            default_branch: config.default_branch.clone(),
            release_prefixes: config.release_branch_prefixes.clone(),
        }
    }

    pub fn is_default(&self, branch: &str) -> bool {
        branch == self.default_branch
    }

    pub fn release_branch(&self, branch: &str) -> Option<ReleaseBranch> {
        ReleaseBranch::parse(branch, &self.release_prefixes)
    }

    pub fn has_release_prefix(&self, branch: &str) -> bool {
        ReleaseBranch::has_release_prefix(branch, &self.release_prefixes)
    }
}

impl Default for BranchConventions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// A release branch name split into its prefix and `major.minor`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseBranch {
    pub prefix: String,
    pub major: u64,
    pub minor: u64,
}

impl ReleaseBranch {
    /// Parse `branch` as `<prefix><major>.<minor>` for any of `prefixes`.
    pub fn parse(branch: &str, prefixes: &[String]) -> Option<Self> {
        for prefix in prefixes {
            let pattern = format!(r"^{}(\d+)\.(\d+)$", regex::escape(prefix));
            let Ok(re) = Regex::new(&pattern) else {
                continue;
            };

            if let Some(caps) = re.captures(branch) {
                let major = caps[1].parse().ok()?;
                let minor = caps[2].parse().ok()?;
                return Some(Self {
                    prefix: prefix.clone(),
                    major,
                    minor,
                });
            }
        }

        None
    }

    /// True when `branch` carries one of the release branch prefixes.
    pub fn has_release_prefix(branch: &str, prefixes: &[String]) -> bool {
        !branch.is_empty()
            && prefixes
                .iter()
                .any(|p| !p.is_empty() && branch.starts_with(p.as_str()))
    }
}
