use log::*;
use std::{fs, path::PathBuf};

use crate::{Result, build::build_dir, error::StageError, process::Cmd};

/// Runs the repository's build command for one version and moves its output
/// into the version's build directory.
#[derive(Debug, Clone)]
pub struct Make {
    repo_path: PathBuf,
    command: Vec<String>,
    build_dir_prefix: String,
}

impl Make {
    pub fn new(
        repo_path: impl Into<PathBuf>,
        command: Vec<String>,
        build_dir_prefix: impl Into<String>,
    ) -> Self {
        Self {
            repo_path: repo_path.into(),
            command,
            build_dir_prefix: build_dir_prefix.into(),
        }
    }

    fn cmd(&self, version: &str) -> Result<Cmd> {
        let (program, args) = self.command.split_first().ok_or_else(|| {
            StageError::invalid_options("build command must not be empty")
        })?;

        Ok(Cmd::new(program)
            .args(args)
            .env("VERSION", version)
            .dir(&self.repo_path))
    }

    pub fn build(&self, version: &str) -> Result<()> {
        let cmd = self.cmd(version)?;
        info!("building {version}: {}", cmd.display());

        let output = cmd.run()?;
        debug!("{output}");

        let shared = self.repo_path.join(&self.build_dir_prefix);
        let versioned =
            build_dir(&self.repo_path, &self.build_dir_prefix, version);

        if shared.is_dir() {
            if versioned.exists() {
                fs::remove_dir_all(&versioned)?;
            }
            debug!(
                "moving {} to {}",
                shared.display(),
                versioned.display()
            );
            fs::rename(&shared, &versioned)?;
        } else if !versioned.is_dir() {
            warn!(
                "build of {version} left no output in {} or {}",
                shared.display(),
                versioned.display()
            );
        }

        Ok(())
    }
}
