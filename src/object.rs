//! Object storage access through the `gsutil` CLI.
use log::*;
use std::path::Path;

use crate::{Result, error::StageError, process::Cmd};

/// URL scheme prefix of storage paths.
pub const GCS_PREFIX: &str = "gs://";

const GSUTIL: &str = "gsutil";

/// Copy behavior for [`Gcs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GcsOptions {
    /// Run copies with parallel workers (`-m`).
    pub concurrent: bool,
    pub recursive: bool,
    /// Never overwrite existing remote objects (`-n`).
    pub no_clobber: bool,
    /// Skip, rather than fail, a copy whose local source does not exist.
    pub allow_missing: bool,
}

impl Default for GcsOptions {
    fn default() -> Self {
        Self {
            concurrent: true,
            recursive: true,
            no_clobber: true,
            allow_missing: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Gcs {
    options: GcsOptions,
}

impl Gcs {
    pub fn new(options: GcsOptions) -> Self {
        Self { options }
    }

    /// Copy a local file or directory to `gcs_path`.
    pub fn copy_to_remote(&self, src: &Path, gcs_path: &str) -> Result<()> {
        let dst = normalize_path(&[gcs_path])?;
        info!("copying {} to {dst}", src.display());

        if !src.exists() {
            if self.options.allow_missing {
                info!(
                    "source {} does not exist: skipping upload",
                    src.display()
                );
                return Ok(());
            }

            return Err(StageError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("source {} does not exist", src.display()),
            )));
        }

        self.copy_command(&src.display().to_string(), &dst).run()?;
        Ok(())
    }

    /// Whether `gcs_path` lists successfully. A listing failure is reported
    /// as `false`; a malformed path is an error.
    pub fn path_exists(&self, gcs_path: &str) -> Result<bool> {
        if !is_path_normalized(gcs_path) {
            return Err(StageError::invalid_options(format!(
                "storage path {gcs_path} does not begin with {GCS_PREFIX}"
            )));
        }

        match Cmd::new(GSUTIL).arg("ls").arg(gcs_path).run() {
            Ok(_) => Ok(true),
            Err(err) => {
                debug!("listing {gcs_path} failed: {err}");
                Ok(false)
            }
        }
    }

    fn copy_command(&self, src: &str, dst: &str) -> Cmd {
        let mut cmd = Cmd::new(GSUTIL);
        if self.options.concurrent {
            cmd = cmd.arg("-m");
        }
        cmd = cmd.arg("cp");
        if self.options.recursive {
            cmd = cmd.arg("-r");
        }
        if self.options.no_clobber {
            cmd = cmd.arg("-n");
        }
        cmd.args([src, dst])
    }
}

/// Join `parts` into a single `gs://` path.
///
/// Accepts a bucket with or without the scheme as the first part and
/// collapses duplicate separators. Only the first part may carry the scheme.
pub fn normalize_path(parts: &[&str]) -> Result<String> {
    let invalid = |reason: &str| {
        StageError::invalid_options(format!(
            "cannot build storage path from {parts:?}: {reason}"
        ))
    };

    if parts.is_empty() {
        return Err(invalid("at least one path part is required"));
    }

    if parts.iter().all(|p| p.is_empty()) {
        return Err(invalid("all path parts are empty"));
    }

    if parts.iter().skip(1).any(|p| p.contains("gs:/")) {
        return Err(invalid("only the first part may contain a scheme"));
    }

    let first = parts[0]
        .strip_prefix(GCS_PREFIX)
        .or_else(|| parts[0].strip_prefix("gs:/"))
        .unwrap_or(parts[0]);

    let joined = std::iter::once(first)
        .chain(parts.iter().skip(1).copied())
        .flat_map(|p| p.split('/'))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/");

    let path = format!("{GCS_PREFIX}{joined}");
    if !is_path_normalized(&path) {
        return Err(invalid("result is not a valid storage path"));
    }

    Ok(path)
}

/// True when `path` starts with `gs://` and contains no further scheme.
pub fn is_path_normalized(path: &str) -> bool {
    match path.strip_prefix(GCS_PREFIX) {
        Some(rest) => !rest.contains("gs:/"),
        None => false,
    }
}
