//! Assembles the upload layout of release tarballs.
use log::*;
use std::{fs, io, path::PathBuf};

use crate::{
    Result,
    build::{
        PushBuildOptions,
        checksum::{sha256_file, sha512_file},
    },
    error::StageError,
};

pub const SHA256_SUMS: &str = "SHA256SUMS";
pub const SHA512_SUMS: &str = "SHA512SUMS";

/// Copy every release tarball into `gcs-stage/<version>` with a `.sha256`
/// and `.sha512` file beside each, plus aggregate `SHA256SUMS` and
/// `SHA512SUMS` in `sha256sum` format.
pub fn stage_local_artifacts(options: &PushBuildOptions) -> Result<()> {
    let tars = options.release_tars_dir();
    if !tars.is_dir() {
        return Err(StageError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("release tarballs not found at {}", tars.display()),
        )));
    }

    let stage = options.gcs_stage_dir();
    info!("staging local artifacts into {}", stage.display());
    fs::create_dir_all(&stage)?;

    let mut files = fs::read_dir(&tars)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect::<Vec<PathBuf>>();
    files.sort();

    let mut sha256_sums = String::new();
    let mut sha512_sums = String::new();

    for file in files {
        let Some(name) = file.file_name().and_then(|n| n.to_str()) else {
            warn!("skipping artifact with non utf-8 name: {}", file.display());
            continue;
        };

        let dest = stage.join(name);
        fs::copy(&file, &dest)?;

        let sha256 = sha256_file(&dest)?;
        let sha512 = sha512_file(&dest)?;
        fs::write(stage.join(format!("{name}.sha256")), &sha256)?;
        fs::write(stage.join(format!("{name}.sha512")), &sha512)?;

        sha256_sums.push_str(&format!("{sha256}  {name}\n"));
        sha512_sums.push_str(&format!("{sha512}  {name}\n"));
        debug!("staged {name}");
    }

    fs::write(stage.join(SHA256_SUMS), sha256_sums)?;
    fs::write(stage.join(SHA512_SUMS), sha512_sums)?;

    Ok(())
}
