//! Release staging: resolve the versions of a run, tag the repository, build
//! every version, write the changelog and push the build to the staging
//! bucket and container registry.
pub mod build;
pub mod changelog;
pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod object;
pub mod process;
pub mod registry;
pub mod release;
pub mod repo;
pub mod stage;
pub mod submit;

pub use error::{Result, StageError};
pub use release::{ReleaseType, Versions, generate_release_version};
pub use stage::{
    DefaultStage, StageClient, StageImpl, StageOptions, StageState, run_stage,
};
