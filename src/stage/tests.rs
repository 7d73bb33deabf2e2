//! Tests for the stage controller.
//!
//! Test organization:
//! - `common`: Shared options, state and mock helpers
//! - `validate`: Option validation and build candidate discovery
//! - `versions`: Release version generation and workspace preparation
//! - `tag_repository`: Tagging, branch creation and empty release commits
//! - `build`: Per version builds
//! - `changelog`: Changelog options handed to the generator
//! - `stage_artifacts`: Artifact staging paths and the promotion command
//! - `run`: Phase ordering of `run_stage`
//! - `submit`: Remote job submission

mod common;
mod run;
