//! Build outputs and their publication.
//!
//! Each version is built into `<repo>/<prefix>-<version>`. Inside it,
//! release tarballs live in `release-tars`, the upload layout is assembled
//! in `gcs-stage/<version>` and image archives are kept in
//! `release-images/<arch>/<name>.tar`.
use derive_builder::Builder;
use log::*;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    Result,
    error::StageError,
    object::{Gcs, normalize_path},
    registry,
};

pub mod artifacts;
pub mod checksum;
pub mod make;
pub mod source;

pub use make::Make;

/// Upload layout directory inside a build directory.
pub const GCS_STAGE_PATH: &str = "gcs-stage";
/// Container image archives inside a build directory.
pub const IMAGES_PATH: &str = "release-images";
/// Release tarballs inside a build directory.
pub const RELEASE_TARS_PATH: &str = "release-tars";
/// Remote root of staged builds.
pub const STAGE_PATH: &str = "stage";
/// Name of the source tree archive.
pub const SOURCE_TARBALL: &str = "src.tar.gz";

/// Build directory of `version`: `<repo>/<prefix>-<version>`.
pub fn build_dir(repo_path: &Path, prefix: &str, version: &str) -> PathBuf {
    repo_path.join(format!("{prefix}-{version}"))
}

/// Remove the shared build output and the build directories of `versions`
/// left behind by an earlier run.
pub fn clean_build_dirs(
    repo_path: &Path,
    prefix: &str,
    versions: &[String],
) -> Result<()> {
    let stale = std::iter::once(repo_path.join(prefix))
        .chain(versions.iter().map(|v| build_dir(repo_path, prefix, v)));

    for dir in stale {
        if dir.exists() {
            info!("removing stale build directory {}", dir.display());
            fs::remove_dir_all(&dir)?;
        }
    }

    Ok(())
}

/// Options for publishing the build of one version.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
#[builder(setter(into), build_fn(private, name = "_build"))]
pub struct PushBuildOptions {
    pub bucket: String,
    pub build_dir: PathBuf,
    pub registry: String,
    pub version: String,
    /// Do not fail when the destination already holds objects.
    #[builder(default = true)]
    pub allow_dup: bool,
    /// Compare pushed image digests with the local archives.
    #[builder(default = true)]
    pub validate_remote_image_digests: bool,
}

impl PushBuildOptionsBuilder {
    pub fn build(&self) -> Result<PushBuildOptions> {
        self._build().map_err(|e| {
            StageError::invalid_options(format!(
                "Failed to build push options: {}",
                e
            ))
        })
    }
}

impl PushBuildOptions {
    pub fn builder() -> PushBuildOptionsBuilder {
        PushBuildOptionsBuilder::default()
    }

    pub fn release_tars_dir(&self) -> PathBuf {
        self.build_dir.join(RELEASE_TARS_PATH)
    }

    pub fn gcs_stage_dir(&self) -> PathBuf {
        self.build_dir.join(GCS_STAGE_PATH).join(&self.version)
    }

    pub fn images_dir(&self) -> PathBuf {
        self.build_dir.join(IMAGES_PATH)
    }
}

/// Publishes the build of one version to object storage and the registry.
pub struct BuildPublisher {
    options: PushBuildOptions,
    gcs: Gcs,
}

impl BuildPublisher {
    pub fn new(options: PushBuildOptions) -> Self {
        Self {
            options,
            gcs: Gcs::default(),
        }
    }

    /// Fail unless the release bucket can be listed.
    pub fn check_release_bucket(&self) -> Result<()> {
        let bucket = normalize_path(&[&self.options.bucket])?;
        info!("checking release bucket {bucket}");

        if !self.gcs.path_exists(&bucket)? {
            return Err(StageError::command_failed(
                format!("gsutil ls {bucket}"),
                "release bucket is not accessible",
            ));
        }

        Ok(())
    }

    /// Archive `work_dir` into the build directory and upload it to
    /// `stage/<build_version>/src.tar.gz`.
    pub fn stage_local_source_tree(
        &self,
        work_dir: &Path,
        build_version: &str,
        exclude_prefix: &str,
    ) -> Result<()> {
        let tarball = self.options.build_dir.join(SOURCE_TARBALL);
        source::create_source_tarball(work_dir, &tarball, exclude_prefix)?;

        let remote = normalize_path(&[
            &self.options.bucket,
            STAGE_PATH,
            build_version,
            SOURCE_TARBALL,
        ])?;
        self.gcs.copy_to_remote(&tarball, &remote)
    }

    pub fn stage_local_artifacts(&self) -> Result<()> {
        artifacts::stage_local_artifacts(&self.options)
    }

    /// Copy `src` below the bucket at `remote_path`.
    pub fn push_release_artifacts(
        &self,
        src: &Path,
        remote_path: &str,
    ) -> Result<()> {
        let remote = normalize_path(&[&self.options.bucket, remote_path])?;

        if !self.options.allow_dup && self.gcs.path_exists(&remote)? {
            return Err(StageError::invalid_options(format!(
                "{remote} already exists and duplicates are not allowed"
            )));
        }

        self.gcs.copy_to_remote(src, &remote)
    }

    pub fn push_container_images(&self) -> Result<()> {
        registry::push_container_images(&self.options)
    }
}
