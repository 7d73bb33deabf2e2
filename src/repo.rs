//! Git repository operations used while staging.
//!
//! The [`Repository`] trait is the only surface the stage controller sees;
//! [`GitRepo`] implements it with `git2` against a local working copy.
use color_eyre::eyre::eyre;
use git2::{BranchType, DescribeFormatOptions, DescribeOptions, ErrorCode};
use log::*;
use regex::Regex;
use std::{path::Path, sync::LazyLock};

use crate::{Result, error::StageError};

static DESCRIBE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?<tag>.+)-(?<count>\d+)-g(?<sha>[0-9a-f]+)$").unwrap()
});

/// Where a checkout should leave HEAD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutTarget {
    /// An existing branch (HEAD attached) or any other revision (detached).
    Rev(String),
    /// Create `branch` at `start_point` and check it out.
    NewBranch { branch: String, start_point: String },
}

impl CheckoutTarget {
    pub fn rev(rev: impl Into<String>) -> Self {
        Self::Rev(rev.into())
    }

    pub fn new_branch(
        branch: impl Into<String>,
        start_point: impl Into<String>,
    ) -> Self {
        Self::NewBranch {
            branch: branch.into(),
            start_point: start_point.into(),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait Repository {
    /// Resolve `rev` to a commit id.
    fn rev_parse(&self, rev: &str) -> Result<String>;
    /// Whether a local or remote-tracking branch named `branch` exists.
    fn has_branch(&self, branch: &str) -> Result<bool>;
    fn checkout(&self, target: &CheckoutTarget) -> Result<()>;
    /// Name of the checked out branch; empty when HEAD is detached.
    fn current_branch(&self) -> Result<String>;
    /// Commit on top of HEAD without changing the tree.
    fn commit_empty(&self, message: &str) -> Result<()>;
    /// Create an annotated tag at HEAD.
    fn tag(&self, name: &str, message: &str) -> Result<()>;
    /// Build version of `rev`, derived from the nearest tag.
    fn describe(&self, rev: &str) -> Result<String>;
    /// True when tracked files have no uncommitted changes.
    fn is_clean(&self) -> Result<bool>;
}

/// `git2` backed working copy.
pub struct GitRepo {
    repo: git2::Repository,
}

impl GitRepo {
    pub fn open(path: &Path) -> Result<Self> {
        debug!("opening repository at {}", path.display());
        let repo = git2::Repository::open(path)?;
        Ok(Self { repo })
    }

    /// Set `user.name` and `user.email` in the repository config when no
    /// identity is configured at any level.
    pub fn configure_default_identity(
        path: &Path,
        name: &str,
        email: &str,
    ) -> Result<()> {
        let repo = git2::Repository::open(path)?;
        let mut config = repo.config()?;

        if config.get_string("user.name").is_err() {
            info!("setting git user.name to {name}");
            config.set_str("user.name", name)?;
        }

        if config.get_string("user.email").is_err() {
            info!("setting git user.email to {email}");
            config.set_str("user.email", email)?;
        }

        Ok(())
    }

    fn head_commit(&self) -> Result<git2::Commit<'_>> {
        Ok(self.repo.head()?.peel_to_commit()?)
    }

    /// Remote tracking branch named exactly `<remote>/<branch>`.
    fn find_remote_branch(&self, branch: &str) -> Result<Option<git2::Oid>> {
        for entry in self.repo.branches(Some(BranchType::Remote))? {
            let (remote_branch, _) = entry?;
            if let Some(name) = remote_branch.name()?
                && name.split_once('/').map(|(_, rest)| rest) == Some(branch)
                && let Some(oid) = remote_branch.get().target()
            {
                return Ok(Some(oid));
            }
        }
        Ok(None)
    }

    fn switch_branch(&self, branch: &str) -> Result<()> {
        info!("switching to branch: {branch}");
        let ref_name = format!("refs/heads/{branch}");
        let target = self.repo.revparse_single(&ref_name)?;
        self.repo.checkout_tree(&target, None)?;
        self.repo.set_head(&ref_name)?;
        Ok(())
    }
}

impl Repository for GitRepo {
    fn rev_parse(&self, rev: &str) -> Result<String> {
        let object = self.repo.revparse_single(rev)?;
        Ok(object.peel_to_commit()?.id().to_string())
    }

    fn has_branch(&self, branch: &str) -> Result<bool> {
        match self.repo.find_branch(branch, BranchType::Local) {
            Ok(_) => return Ok(true),
            Err(e) if e.code() == ErrorCode::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        Ok(self.find_remote_branch(branch)?.is_some())
    }

    fn checkout(&self, target: &CheckoutTarget) -> Result<()> {
        match target {
            CheckoutTarget::NewBranch {
                branch,
                start_point,
            } => {
                info!("creating branch {branch} from {start_point}");
                let commit =
                    self.repo.revparse_single(start_point)?.peel_to_commit()?;
                self.repo.branch(branch, &commit, false)?;
                self.switch_branch(branch)
            }
            CheckoutTarget::Rev(rev) => {
                if self.repo.find_branch(rev, BranchType::Local).is_ok() {
                    return self.switch_branch(rev);
                }

                if let Some(oid) = self.find_remote_branch(rev)? {
                    info!("creating local branch {rev} from its remote");
                    let commit = self.repo.find_commit(oid)?;
                    self.repo.branch(rev, &commit, false)?;
                    return self.switch_branch(rev);
                }

                info!("checking out {rev} in detached state");
                let commit = self.repo.revparse_single(rev)?.peel_to_commit()?;
                self.repo.checkout_tree(commit.as_object(), None)?;
                self.repo.set_head_detached(commit.id())?;
                Ok(())
            }
        }
    }

    fn current_branch(&self) -> Result<String> {
        if self.repo.head_detached()? {
            return Ok(String::new());
        }

        let head = self.repo.head()?;
        let name = head
            .shorthand()
            .ok_or(eyre!("unable to read current branch name"))?;
        Ok(name.to_string())
    }

    fn commit_empty(&self, message: &str) -> Result<()> {
        let parent = self.head_commit()?;
        let tree = parent.tree()?;
        let signature = self.repo.signature()?;
        let oid = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &[&parent],
        )?;
        debug!("created empty commit {oid}");
        Ok(())
    }

    fn tag(&self, name: &str, message: &str) -> Result<()> {
        let commit = self.head_commit()?;
        let tagger = self.repo.signature()?;
        self.repo
            .tag(name, commit.as_object(), &tagger, message, false)?;
        info!("tagged {} as {name}", commit.id());
        Ok(())
    }

    fn describe(&self, rev: &str) -> Result<String> {
        let object = match self.repo.revparse_single(rev) {
            Ok(object) => object,
            Err(e) if e.code() == ErrorCode::NotFound => {
                self.repo.revparse_single(&format!("origin/{rev}"))?
            }
            Err(e) => return Err(e.into()),
        };
        let mut options = DescribeOptions::new();
        options.describe_tags();
        let describe = object.describe(&options)?;

        let mut format = DescribeFormatOptions::new();
        format.always_use_long_format(true).abbreviated_size(14);

        build_version_from_describe(&describe.format(Some(&format))?)
    }

    fn is_clean(&self) -> Result<bool> {
        let mut options = git2::StatusOptions::new();
        options.include_untracked(false).include_ignored(false);
        let statuses = self.repo.statuses(Some(&mut options))?;
        Ok(statuses.is_empty())
    }
}

/// Turn long-format describe output (`<tag>-<count>-g<sha>`) into a build
/// version whose first build metadata identifier is the commit:
/// `v1.30.0-alpha.0-12-gabc` -> `v1.30.0-alpha.0.12+abc`,
/// `v1.31.2-7-gabc` -> `v1.31.2+abc.7`.
pub fn build_version_from_describe(describe: &str) -> Result<String> {
    let caps = DESCRIBE_REGEX.captures(describe.trim()).ok_or_else(|| {
        StageError::invalid_version(describe, "unexpected describe output")
    })?;

    let tag = &caps["tag"];
    let count = &caps["count"];
    let sha = &caps["sha"];

    if tag.contains('-') {
        Ok(format!("{tag}.{count}+{sha}"))
    } else {
        Ok(format!("{tag}+{sha}.{count}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn init_repo() -> (TempDir, GitRepo) {
        let dir = TempDir::new().unwrap();
        let mut opts = git2::RepositoryInitOptions::new();
        opts.initial_head("master");
        let repo = git2::Repository::init_opts(dir.path(), &opts).unwrap();
        {
            let mut config = repo.config().unwrap();
            config.set_str("user.name", "Test User").unwrap();
            config.set_str("user.email", "test@example.com").unwrap();
        }
        drop(repo);

        let repo = GitRepo::open(dir.path()).unwrap();
        commit_file(&repo, dir.path(), "README.md", "hello", "initial");
        (dir, repo)
    }

    fn commit_file(
        repo: &GitRepo,
        root: &Path,
        file: &str,
        content: &str,
        message: &str,
    ) -> git2::Oid {
        fs::write(root.join(file), content).unwrap();
        let mut index = repo.repo.index().unwrap();
        index.add_path(Path::new(file)).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.repo.find_tree(tree_id).unwrap();
        let sig = repo.repo.signature().unwrap();
        let parents: Vec<git2::Commit> = repo
            .repo
            .head()
            .ok()
            .and_then(|h| h.peel_to_commit().ok())
            .into_iter()
            .collect();
        let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
        repo.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
            .unwrap()
    }

    #[test]
    fn rev_parse_fails_for_missing_tag() {
        let (_dir, repo) = init_repo();
        assert!(repo.rev_parse("v1.0.0").is_err());
        assert!(repo.rev_parse("HEAD").is_ok());
    }

    #[test]
    fn tag_is_resolvable_afterwards() {
        let (_dir, repo) = init_repo();
        let head = repo.rev_parse("HEAD").unwrap();

        repo.tag("v1.0.0", "Product official release v1.0.0").unwrap();

        assert_eq!(repo.rev_parse("v1.0.0").unwrap(), head);
        let tag = repo
            .repo
            .revparse_single("v1.0.0")
            .unwrap()
            .into_tag()
            .expect("annotated tag");
        assert_eq!(tag.message(), Some("Product official release v1.0.0"));
    }

    #[test]
    fn creates_and_checks_out_new_branch() {
        let (_dir, repo) = init_repo();
        let head = repo.rev_parse("HEAD").unwrap();

        assert!(!repo.has_branch("release-1.31").unwrap());
        repo.checkout(&CheckoutTarget::new_branch("release-1.31", head.clone()))
            .unwrap();

        assert!(repo.has_branch("release-1.31").unwrap());
        assert_eq!(repo.current_branch().unwrap(), "release-1.31");

        repo.checkout(&CheckoutTarget::rev("master")).unwrap();
        assert_eq!(repo.current_branch().unwrap(), "master");
    }

    fn remote_branch(repo: &GitRepo, name: &str) {
        let head = repo.rev_parse("HEAD").unwrap();
        repo.repo
            .reference(
                &format!("refs/remotes/{name}"),
                git2::Oid::from_str(&head).unwrap(),
                false,
                "remote branch",
            )
            .unwrap();
    }

    #[test]
    fn remote_branch_must_match_exactly() {
        let (_dir, repo) = init_repo();
        remote_branch(&repo, "origin/backport/release-1.31");

        assert!(!repo.has_branch("release-1.31").unwrap());
        assert!(repo.find_remote_branch("release-1.31").unwrap().is_none());
    }

    #[test]
    fn remote_only_branch_is_checked_out_locally() {
        let (_dir, repo) = init_repo();
        remote_branch(&repo, "origin/release-1.31");
        remote_branch(&repo, "origin/feature/release-1.32");

        assert!(repo.has_branch("release-1.31").unwrap());
        assert!(repo.has_branch("feature/release-1.32").unwrap());

        repo.checkout(&CheckoutTarget::rev("release-1.31")).unwrap();
        assert_eq!(repo.current_branch().unwrap(), "release-1.31");
    }

    #[test]
    fn checkout_commit_detaches_head() {
        let (dir, repo) = init_repo();
        let first = repo.rev_parse("HEAD").unwrap();
        commit_file(&repo, dir.path(), "a.txt", "a", "second");

        repo.checkout(&CheckoutTarget::rev(first.clone())).unwrap();

        assert_eq!(repo.current_branch().unwrap(), "");
        assert_eq!(repo.rev_parse("HEAD").unwrap(), first);
    }

    #[test]
    fn empty_commit_keeps_tree() {
        let (_dir, repo) = init_repo();
        let before = repo.head_commit().unwrap();
        let before_tree = before.tree_id();
        let before_id = before.id();

        repo.commit_empty("Release commit for Product v1.0.0").unwrap();

        let after = repo.head_commit().unwrap();
        assert_ne!(after.id(), before_id);
        assert_eq!(after.tree_id(), before_tree);
        assert_eq!(after.parent_id(0).unwrap(), before_id);
        assert_eq!(after.message(), Some("Release commit for Product v1.0.0"));
    }

    #[test]
    fn describe_counts_commits_since_tag() {
        let (dir, repo) = init_repo();
        repo.tag("v1.30.0-alpha.0", "alpha").unwrap();
        commit_file(&repo, dir.path(), "a.txt", "a", "one");
        let head = commit_file(&repo, dir.path(), "b.txt", "b", "two");

        let version = repo.describe("HEAD").unwrap();
        let short = &head.to_string()[..14];
        assert_eq!(version, format!("v1.30.0-alpha.0.2+{short}"));
    }

    #[test]
    fn cleanliness_ignores_untracked_files() {
        let (dir, repo) = init_repo();
        assert!(repo.is_clean().unwrap());

        fs::write(dir.path().join("untracked.txt"), "x").unwrap();
        assert!(repo.is_clean().unwrap());

        fs::write(dir.path().join("README.md"), "changed").unwrap();
        assert!(!repo.is_clean().unwrap());
    }

    #[test]
    fn configures_identity_only_when_missing() {
        let (dir, _repo) = init_repo();
        GitRepo::configure_default_identity(dir.path(), "Bot", "bot@example.com")
            .unwrap();

        let repo = git2::Repository::open(dir.path()).unwrap();
        let config = repo.config().unwrap();
        assert_eq!(config.get_string("user.name").unwrap(), "Test User");
    }

    #[test]
    fn describe_output_normalization() {
        assert_eq!(
            build_version_from_describe("v1.30.0-alpha.0-12-gabc123").unwrap(),
            "v1.30.0-alpha.0.12+abc123"
        );
        assert_eq!(
            build_version_from_describe("v1.31.2-7-gabc123").unwrap(),
            "v1.31.2+abc123.7"
        );
        assert!(build_version_from_describe("v1.31.2").is_err());
    }
}
