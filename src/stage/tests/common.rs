//! Common test utilities for stage tests.

use crate::{
    error::StageError,
    release::{ReleaseType, Versions, parse_build_version},
    stage::{DefaultStage, StageOptions, StageState, implementation::MockStageImpl},
};

pub const PRODUCT: &str = "Widget";
pub const REPO_PATH: &str = "/src/widget";
pub const WORKSPACE_DIR: &str = "/workspace";
pub const COMMIT: &str = "abc123";
pub const ALPHA_BUILD_VERSION: &str = "v1.30.0-alpha.0.12+abc123";
pub const RC_BUILD_VERSION: &str = "v1.31.0-rc.1.3+abc123";

pub fn options(release_type: ReleaseType, branch: &str) -> StageOptions {
    StageOptions::builder()
        .release_type(release_type)
        .release_branch(branch)
        .repo_path(REPO_PATH)
        .workspace_dir(WORKSPACE_DIR)
        .product(PRODUCT)
        .build()
        .unwrap()
}

pub fn versions(
    official: Option<&str>,
    rc: Option<&str>,
    beta: Option<&str>,
    alpha: Option<&str>,
) -> Versions {
    Versions::new(
        official.map(String::from),
        rc.map(String::from),
        beta.map(String::from),
        alpha.map(String::from),
    )
    .unwrap()
}

/// State as it stands after version generation.
pub fn state(parent_branch: &str, build_version: &str, versions: Versions) -> StageState {
    StageState {
        parent_branch: parent_branch.to_string(),
        versions: Some(versions),
        build_version: build_version.to_string(),
        semver_build_version: Some(parse_build_version(build_version).unwrap()),
    }
}

/// The single alpha run: no parent branch, one version.
pub fn alpha_state() -> StageState {
    state(
        "",
        ALPHA_BUILD_VERSION,
        versions(None, None, None, Some("v1.30.0-alpha.1")),
    )
}

/// The first official release of a minor, cut from the default branch.
pub fn official_state() -> StageState {
    state("master", RC_BUILD_VERSION, versions(Some("v1.31.0"), None, None, None))
}

pub fn create_test_stage(
    options: StageOptions,
    mock_impl: MockStageImpl,
    state: Option<StageState>,
) -> DefaultStage {
    let mut stage = DefaultStage::with_impl(options, Box::new(mock_impl));
    if let Some(state) = state {
        stage.set_state(state);
    }
    stage
}

pub fn git_error(msg: &str) -> StageError {
    StageError::Git(git2::Error::from_str(msg))
}
