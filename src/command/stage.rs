//! Local staging run.
use log::*;

use crate::{
    Result,
    cli::{Args, StageArgs},
    config::Config,
    stage::{DefaultStage, run_stage},
};

/// Execute the stage command.
pub fn execute(args: &Args, stage_args: &StageArgs) -> Result<()> {
    let config = Config::load(&args.config_path(&stage_args.run.repo_path))?;
    let options = stage_args.run.stage_options(&config)?;

    info!(
        "staging {} {} release from {} ({})",
        options.product,
        options.release_type,
        options.release_branch,
        if options.nomock { "nomock" } else { "mock" }
    );

    let mut stage = DefaultStage::new(options, config);
    run_stage(&mut stage)
}
