//! Commit collection and grouping for release notes.
use git_conventional::Commit as ConventionalCommit;
use git2::{Oid, Repository, Sort};
use log::*;
use semver::Version;
use serde::Serialize;
use std::collections::HashMap;

use crate::{Result, release::parse_build_version};

/// Release notes section a commit is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Group {
    Feat,
    Fix,
    Other,
}

impl Group {
    fn from_type(commit_type: &str) -> Self {
        match commit_type.to_lowercase().as_str() {
            "feat" => Self::Feat,
            "fix" => Self::Fix,
            _ => Self::Other,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Feat => "Features",
            Self::Fix => "Bug Fixes",
            Self::Other => "Other Changes",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChangeCommit {
    pub id: String,
    pub short_id: String,
    pub title: String,
    pub scope: Option<String>,
    pub body: Option<String>,
    pub breaking: bool,
    pub breaking_description: Option<String>,
    #[serde(skip)]
    pub group: Group,
}

impl ChangeCommit {
    pub fn parse(id: &str, raw_message: &str) -> Self {
        let short_id = id.chars().take(8).collect::<String>();

        match ConventionalCommit::parse(raw_message.trim_end()) {
            Ok(cc) => Self {
                id: id.to_string(),
                short_id,
                title: cc.description().to_string(),
                scope: cc.scope().map(|s| s.to_string()),
                body: cc.body().map(|b| b.to_string()),
                breaking: cc.breaking(),
                breaking_description: cc
                    .breaking_description()
                    .map(|d| d.to_string()),
                group: Group::from_type(cc.type_().as_str()),
            },
            Err(_) => {
                let (title, body) = match raw_message.trim().split_once('\n') {
                    Some((t, b)) if !b.trim().is_empty() => {
                        (t.to_string(), Some(b.trim().to_string()))
                    }
                    Some((t, _)) => (t.to_string(), None),
                    None => (raw_message.trim().to_string(), None),
                };

                Self {
                    id: id.to_string(),
                    short_id,
                    title,
                    scope: None,
                    body,
                    breaking: false,
                    breaking_description: None,
                    group: Group::Other,
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub title: String,
    pub commits: Vec<ChangeCommit>,
}

/// Group commits into sections in display order, dropping empty ones.
pub fn sections(commits: Vec<ChangeCommit>) -> Vec<Section> {
    [Group::Feat, Group::Fix, Group::Other]
        .into_iter()
        .filter_map(|group| {
            let commits = commits
                .iter()
                .filter(|c| c.group == group)
                .cloned()
                .collect::<Vec<_>>();

            (!commits.is_empty()).then(|| Section {
                title: group.title().to_string(),
                commits,
            })
        })
        .collect()
}

/// The tag a release's notes start from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviousTag {
    pub name: String,
    pub oid: Oid,
}

fn tagged_versions(repo: &Repository) -> Result<HashMap<Oid, Vec<(String, Version)>>> {
    let mut tags: HashMap<Oid, Vec<(String, Version)>> = HashMap::new();

    for name in repo.tag_names(None)?.iter().flatten() {
        let Ok(version) = parse_build_version(name) else {
            continue;
        };
        let Ok(object) = repo.revparse_single(name) else {
            continue;
        };
        let Ok(commit) = object.peel_to_commit() else {
            continue;
        };

        tags.entry(commit.id())
            .or_default()
            .push((name.to_string(), version));
    }

    Ok(tags)
}

/// Nearest tag reachable from `head` whose version is lower than `current`.
pub fn previous_tag(
    repo: &Repository,
    head: Oid,
    current: &Version,
) -> Result<Option<PreviousTag>> {
    let tags = tagged_versions(repo)?;

    let mut walk = repo.revwalk()?;
    walk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
    walk.push(head)?;

    for oid in walk {
        let oid = oid?;
        let Some(candidates) = tags.get(&oid) else {
            continue;
        };

        if let Some((name, _)) = candidates
            .iter()
            .filter(|(_, v)| v < current)
            .max_by(|(_, a), (_, b)| a.cmp(b))
        {
            debug!("previous tag of {current} is {name}");
            return Ok(Some(PreviousTag {
                name: name.clone(),
                oid,
            }));
        }
    }

    Ok(None)
}

/// Non-merge commits reachable from `head` but not from `since`, newest
/// first.
pub fn collect(
    repo: &Repository,
    head: Oid,
    since: Option<Oid>,
) -> Result<Vec<ChangeCommit>> {
    let mut walk = repo.revwalk()?;
    walk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
    walk.push(head)?;
    if let Some(since) = since {
        walk.hide(since)?;
    }

    let mut commits = vec![];
    for oid in walk {
        let commit = repo.find_commit(oid?)?;
        if commit.parent_count() > 1 {
            continue;
        }

        let message = String::from_utf8_lossy(commit.message_bytes());
        commits.push(ChangeCommit::parse(&commit.id().to_string(), &message));
    }

    Ok(commits)
}
