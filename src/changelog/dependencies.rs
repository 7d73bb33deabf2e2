//! Dependency changes between two revisions of a `go.mod` style manifest.
use git2::{Oid, Repository};
use serde::Serialize;
use std::{collections::BTreeMap, path::Path};

use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dependency {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyChange {
    pub name: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DependencyDiff {
    pub added: Vec<Dependency>,
    pub changed: Vec<DependencyChange>,
    pub removed: Vec<Dependency>,
}

impl DependencyDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.removed.is_empty()
    }
}

/// Required modules and versions of a manifest. Both the block form
/// (`require ( ... )`) and single `require` lines are read; comments and
/// `// indirect` markers are ignored.
pub fn parse_manifest(content: &str) -> BTreeMap<String, String> {
    let mut deps = BTreeMap::new();
    let mut in_block = false;

    for line in content.lines() {
        let line = line.split("//").next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }

        let entry = if in_block {
            if line == ")" {
                in_block = false;
                continue;
            }
            line
        } else if let Some(rest) = line.strip_prefix("require") {
            let rest = rest.trim();
            if rest == "(" {
                in_block = true;
                continue;
            }
            rest
        } else {
            continue;
        };

        let mut parts = entry.split_whitespace();
        if let (Some(name), Some(version)) = (parts.next(), parts.next()) {
            deps.insert(name.to_string(), version.to_string());
        }
    }

    deps
}

pub fn diff(
    old: &BTreeMap<String, String>,
    new: &BTreeMap<String, String>,
) -> DependencyDiff {
    let mut result = DependencyDiff::default();

    for (name, version) in new {
        match old.get(name) {
            None => result.added.push(Dependency {
                name: name.clone(),
                version: version.clone(),
            }),
            Some(previous) if previous != version => {
                result.changed.push(DependencyChange {
                    name: name.clone(),
                    from: previous.clone(),
                    to: version.clone(),
                })
            }
            Some(_) => {}
        }
    }

    for (name, version) in old {
        if !new.contains_key(name) {
            result.removed.push(Dependency {
                name: name.clone(),
                version: version.clone(),
            });
        }
    }

    result
}

fn manifest_at(
    repo: &Repository,
    commit: Oid,
    manifest: &str,
) -> Result<BTreeMap<String, String>> {
    let tree = repo.find_commit(commit)?.tree()?;
    let Ok(entry) = tree.get_path(Path::new(manifest)) else {
        return Ok(BTreeMap::new());
    };

    let blob = repo.find_blob(entry.id())?;
    Ok(parse_manifest(&String::from_utf8_lossy(blob.content())))
}

/// Diff `manifest` between `since` (empty when absent) and `head`.
pub fn diff_revisions(
    repo: &Repository,
    since: Option<Oid>,
    head: Oid,
    manifest: &str,
) -> Result<DependencyDiff> {
    let old = match since {
        Some(oid) => manifest_at(repo, oid, manifest)?,
        None => BTreeMap::new(),
    };
    let new = manifest_at(repo, head, manifest)?;
    Ok(diff(&old, &new))
}

#[cfg(test)]
mod tests {
    use super::*;

    const OLD: &str = r#"module example.com/widget

go 1.22

require (
	github.com/spf13/cobra v1.7.0
	golang.org/x/sys v0.10.0 // indirect
	github.com/pkg/errors v0.9.1
)
"#;

    const NEW: &str = r#"module example.com/widget

go 1.22

require github.com/sirupsen/logrus v1.9.3

require (
	github.com/spf13/cobra v1.8.0
	golang.org/x/sys v0.10.0 // indirect
)
"#;

    #[test]
    fn parses_block_and_single_requires() {
        let deps = parse_manifest(NEW);
        assert_eq!(deps.len(), 3);
        assert_eq!(deps["github.com/sirupsen/logrus"], "v1.9.3");
        assert_eq!(deps["golang.org/x/sys"], "v0.10.0");
    }

    #[test]
    fn diffs_added_changed_removed() {
        let result = diff(&parse_manifest(OLD), &parse_manifest(NEW));

        assert_eq!(
            result.added,
            vec![Dependency {
                name: "github.com/sirupsen/logrus".into(),
                version: "v1.9.3".into()
            }]
        );
        assert_eq!(
            result.changed,
            vec![DependencyChange {
                name: "github.com/spf13/cobra".into(),
                from: "v1.7.0".into(),
                to: "v1.8.0".into()
            }]
        );
        assert_eq!(result.removed.len(), 1);
        assert_eq!(result.removed[0].name, "github.com/pkg/errors");
    }

    #[test]
    fn identical_manifests_have_no_changes() {
        let deps = parse_manifest(OLD);
        assert!(diff(&deps, &deps).is_empty());
    }
}
