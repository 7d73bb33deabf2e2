//! Pushes container image archives to a registry with `crane`.
use log::*;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{Result, build::PushBuildOptions, error::StageError, process::Cmd};

const CRANE: &str = "crane";

/// An image archive at `<images dir>/<arch>/<name>.tar`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageArchive {
    pub arch: String,
    pub name: String,
    pub path: PathBuf,
}

impl ImageArchive {
    /// `<registry>/<name>-<arch>:<version>`
    pub fn reference(&self, registry: &str, version: &str) -> String {
        format!(
            "{}/{}-{}:{version}",
            registry.trim_end_matches('/'),
            self.name,
            self.arch
        )
    }
}

/// Image archives below `images_dir`, sorted by architecture then name.
pub fn discover_images(images_dir: &Path) -> Result<Vec<ImageArchive>> {
    let mut images = vec![];

    for arch_entry in fs::read_dir(images_dir)? {
        let arch_path = arch_entry?.path();
        if !arch_path.is_dir() {
            continue;
        }
        let Some(arch) = arch_path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        for image_entry in fs::read_dir(&arch_path)? {
            let path = image_entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("tar") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|n| n.to_str()) else {
                continue;
            };

            images.push(ImageArchive {
                arch: arch.to_string(),
                name: name.to_string(),
                path: path.clone(),
            });
        }
    }

    images.sort_by(|a, b| (&a.arch, &a.name).cmp(&(&b.arch, &b.name)));
    Ok(images)
}

fn push_cmd(archive: &ImageArchive, reference: &str) -> Cmd {
    Cmd::new(CRANE)
        .arg("push")
        .arg(archive.path.display().to_string())
        .arg(reference)
}

fn local_digest_cmd(archive: &ImageArchive) -> Cmd {
    Cmd::new(CRANE)
        .args(["digest", "--tarball"])
        .arg(archive.path.display().to_string())
}

fn remote_digest_cmd(reference: &str) -> Cmd {
    Cmd::new(CRANE).arg("digest").arg(reference)
}

/// Push every image archive of the build. A build without an images
/// directory has nothing to push.
pub fn push_container_images(options: &PushBuildOptions) -> Result<()> {
    let images_dir = options.images_dir();
    if !images_dir.is_dir() {
        info!(
            "no container images found at {}: skipping push",
            images_dir.display()
        );
        return Ok(());
    }

    for archive in discover_images(&images_dir)? {
        let reference = archive.reference(&options.registry, &options.version);
        info!("pushing {} to {reference}", archive.path.display());
        push_cmd(&archive, &reference).run()?;

        if options.validate_remote_image_digests {
            let local = local_digest_cmd(&archive).run()?;
            let remote = remote_digest_cmd(&reference).run()?;
            if local != remote {
                return Err(StageError::command_failed(
                    remote_digest_cmd(&reference).display(),
                    format!("remote digest {remote} does not match local {local}"),
                ));
            }
            debug!("verified {reference} at {remote}");
        }
    }

    Ok(())
}
