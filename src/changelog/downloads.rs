use serde::Serialize;
use std::{fs, path::Path};

use crate::{Result, build::checksum::sha512_file};

/// A release tarball listed in the notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Download {
    pub name: String,
    pub url: String,
    pub sha512: String,
}

/// Tarballs in `tars_dir` with their download links below
/// `<base_url>/<bucket>/release/<tag>/`. A missing directory yields none.
pub fn collect(
    tars_dir: &Path,
    base_url: &str,
    bucket: &str,
    tag: &str,
) -> Result<Vec<Download>> {
    if !tars_dir.is_dir() {
        return Ok(vec![]);
    }

    let mut paths = fs::read_dir(tars_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect::<Vec<_>>();
    paths.sort();

    let base = base_url.trim_end_matches('/');
    let mut downloads = vec![];

    for path in paths {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        downloads.push(Download {
            name: name.to_string(),
            url: format!("{base}/{bucket}/release/{tag}/{name}"),
            sha512: sha512_file(&path)?,
        });
    }

    Ok(downloads)
}
