use serde::Deserialize;

/// Default location of the dependency manifest diffed between releases.
pub const DEFAULT_DEPENDENCY_MANIFEST: &str = "go.mod";
/// Directory, relative to the repository root, holding changelog files.
pub const DEFAULT_CHANGELOG_DIR: &str = "CHANGELOG";

/// Changelog generation settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChangelogConfig {
    /// Manifest whose `module version` lines are compared between releases.
    pub dependency_manifest: String,
    /// Directory receiving `CHANGELOG-<major>.<minor>.md`.
    pub directory: String,
    /// Base URL for artifact download links.
    pub download_base_url: String,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        Self {
            dependency_manifest: DEFAULT_DEPENDENCY_MANIFEST.into(),
            directory: DEFAULT_CHANGELOG_DIR.into(),
            download_base_url: "https://storage.googleapis.com".into(),
        }
    }
}
