use sha2::{Digest, Sha256, Sha512};
use std::{fs::File, io, path::Path};

use crate::Result;

fn file_digest<D: Digest + io::Write>(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = D::new();
    io::copy(&mut file, &mut hasher)?;

    Ok(hex::encode(hasher.finalize()))
}

/// Hex encoded SHA-256 of the file at `path`.
pub fn sha256_file(path: &Path) -> Result<String> {
    file_digest::<Sha256>(path)
}

/// Hex encoded SHA-512 of the file at `path`.
pub fn sha512_file(path: &Path) -> Result<String> {
    file_digest::<Sha512>(path)
}
