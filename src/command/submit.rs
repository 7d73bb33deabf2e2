//! Remote job submission.
use log::*;

use crate::{
    Result,
    cli::{Args, SubmitArgs},
    config::Config,
    stage::{DefaultStage, StageClient},
};

/// Execute the submit command.
pub fn execute(args: &Args, submit_args: &SubmitArgs) -> Result<()> {
    let config = Config::load(&args.config_path(&submit_args.run.repo_path))?;
    let options = submit_args.run.stage_options(&config)?;
    let kind = submit_args.job_kind();

    info!(
        "submitting {kind} job for {} on {}",
        options.release_type, options.release_branch
    );

    DefaultStage::new(options, config).submit(kind)
}
