use flate2::{Compression, write::GzEncoder};
use log::*;
use std::{
    fs::{self, File},
    io::{self, Write},
    path::Path,
};
use tar::{EntryType, HeaderMode};
use walkdir::{DirEntry, WalkDir};

use crate::Result;

fn is_excluded(entry: &DirEntry, exclude_prefix: &str) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }

    let name = entry.file_name().to_string_lossy();
    name == ".git" || (!exclude_prefix.is_empty() && name.starts_with(exclude_prefix))
}

/// Write a gzipped tarball of `src_dir` to `dest`, leaving out `.git` and
/// every directory whose name starts with `exclude_prefix`.
pub fn create_source_tarball(
    src_dir: &Path,
    dest: &Path,
    exclude_prefix: &str,
) -> Result<()> {
    info!(
        "archiving source tree {} into {}",
        src_dir.display(),
        dest.display()
    );

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    let file = File::create(dest)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut tar = tar::Builder::new(encoder);

    let walker = WalkDir::new(src_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_excluded(e, exclude_prefix));

    for entry in walker {
        let entry = entry.map_err(io::Error::from)?;
        let path = entry.path();

        if path == src_dir {
            continue;
        }

        let rel_path = path.strip_prefix(src_dir).map_err(io::Error::other)?;
        let metadata = entry.metadata().map_err(io::Error::from)?;

        let mut header = tar::Header::new_gnu();
        header.set_metadata_in_mode(&metadata, HeaderMode::Deterministic);

        if entry.file_type().is_dir() {
            tar.append_data(&mut header, rel_path, &mut io::empty())?;
        } else if entry.file_type().is_symlink() {
            let target = fs::read_link(path)?;
            header.set_entry_type(EntryType::Symlink);
            header.set_size(0);
            tar.append_link(&mut header, rel_path, target)?;
        } else {
            let mut file = File::open(path)?;
            tar.append_data(&mut header, rel_path, &mut file)?;
        }
    }

    let encoder = tar.into_inner()?;
    let mut finished = encoder.finish()?;
    finished.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use tempfile::TempDir;

    fn entries(tarball: &Path) -> Vec<String> {
        let file = File::open(tarball).unwrap();
        let mut archive = tar::Archive::new(GzDecoder::new(file));
        let mut names = archive
            .entries()
            .unwrap()
            .map(|e| {
                e.unwrap()
                    .path()
                    .unwrap()
                    .to_string_lossy()
                    .trim_end_matches('/')
                    .to_string()
            })
            .collect::<Vec<_>>();
        names.sort();
        names
    }

    #[test]
    fn archives_tree_without_git_and_build_output() {
        let src = TempDir::new().unwrap();
        let root = src.path();
        fs::create_dir_all(root.join(".git/objects")).unwrap();
        fs::create_dir_all(root.join("_output-v1.0.0/release-tars")).unwrap();
        fs::create_dir_all(root.join("pkg")).unwrap();
        fs::write(root.join("go.mod"), "module example.com/x\n").unwrap();
        fs::write(root.join("pkg/lib.go"), "package pkg\n").unwrap();
        fs::write(root.join(".git/HEAD"), "ref: refs/heads/master\n").unwrap();

        let out = TempDir::new().unwrap();
        let dest = out.path().join("nested/src.tar.gz");
        create_source_tarball(root, &dest, "_output").unwrap();

        assert_eq!(entries(&dest), vec!["go.mod", "pkg", "pkg/lib.go"]);
    }
}
