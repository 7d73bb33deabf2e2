use serde::Deserialize;

/// Object storage buckets staged builds are pushed to.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    /// Bucket used when staging for real (`--nomock`).
    pub bucket: String,
    /// Bucket used for mock runs.
    pub mock_bucket: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: "release-staging".into(),
            mock_bucket: "release-staging-mock".into(),
        }
    }
}

/// Container registries images are pushed to.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RegistryConfig {
    /// Registry used when staging for real (`--nomock`).
    pub production: String,
    /// Registry used for mock runs.
    pub mock: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            production: "gcr.io/release-staging".into(),
            mock: "gcr.io/release-staging-test".into(),
        }
    }
}
