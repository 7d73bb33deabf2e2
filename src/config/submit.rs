use serde::Deserialize;

/// Remote build submission settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SubmitConfig {
    /// Cloud project the job runs in.
    pub project: String,
    /// Build config file for staging jobs.
    pub stage_config: String,
    /// Build config file for release (promotion) jobs.
    pub release_config: String,
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            project: "release-builds".into(),
            stage_config: "gcb/stage/cloudbuild.yaml".into(),
            release_config: "gcb/release/cloudbuild.yaml".into(),
        }
    }
}
