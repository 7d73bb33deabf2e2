//! Subcommand execution.
//!
//! - **stage**: run every staging phase against a local repository
//! - **submit**: hand a staging or release run to the remote build service

/// Local staging run.
pub mod stage;

/// Remote job submission.
pub mod submit;
