//! Release notes for the prime version of a staging run.
//!
//! Notes cover the commits between the previous release tag and the new
//! tag, the dependency manifest changes over the same range and the release
//! tarballs with their download links. They are rendered twice: as Markdown
//! prepended to `CHANGELOG/CHANGELOG-<major>.<minor>.md` next to the HTML
//! notes and as a standalone HTML page.
use chrono::Utc;
use derive_builder::Builder;
use git2::{Oid, Repository};
use log::*;
use serde::Serialize;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use tera::{Context, Tera};

use crate::{
    Result,
    config::ChangelogConfig,
    error::StageError,
    release::parse_build_version,
};

pub mod commits;
pub mod dependencies;
pub mod downloads;
pub mod templates;

use commits::Section;
use dependencies::DependencyDiff;
use downloads::Download;
use templates::{
    HTML_TEMPLATE, HTML_TEMPLATE_NAME, MARKDOWN_TEMPLATE, MARKDOWN_TEMPLATE_NAME,
};

/// What to generate notes for and where to put them.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
#[builder(setter(into), build_fn(private, name = "_build"))]
pub struct ChangelogOptions {
    pub repo_path: PathBuf,
    /// Tag of the release the notes describe.
    pub tag: String,
    /// Branch the release was cut from.
    pub branch: String,
    pub bucket: String,
    pub html_file: PathBuf,
    /// Include dependency manifest changes.
    #[builder(default = true)]
    pub dependencies: bool,
    /// Directory holding the release tarballs.
    pub tars: PathBuf,
}

impl ChangelogOptionsBuilder {
    pub fn build(&self) -> Result<ChangelogOptions> {
        self._build().map_err(|e| {
            StageError::invalid_options(format!(
                "Failed to build changelog options: {}",
                e
            ))
        })
    }
}

impl ChangelogOptions {
    pub fn builder() -> ChangelogOptionsBuilder {
        ChangelogOptionsBuilder::default()
    }
}

#[derive(Debug, Serialize)]
struct ChangelogContext {
    product: String,
    version: String,
    branch: String,
    date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    previous_tag: Option<String>,
    sections: Vec<Section>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dependencies: Option<DependencyDiff>,
    downloads: Vec<Download>,
}

/// Rendered release notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notes {
    pub markdown: String,
    pub html: String,
}

pub struct ChangelogGenerator {
    options: ChangelogOptions,
    config: ChangelogConfig,
    product: String,
}

impl ChangelogGenerator {
    pub fn new(
        options: ChangelogOptions,
        config: ChangelogConfig,
        product: impl Into<String>,
    ) -> Self {
        Self {
            options,
            config,
            product: product.into(),
        }
    }

    /// Generate the notes and write both outputs.
    pub fn run(&self) -> Result<()> {
        let notes = self.generate()?;

        let changelog_file = self.changelog_file()?;
        info!("writing changelog {}", changelog_file.display());
        prepend(&changelog_file, &notes.markdown)?;

        info!("writing release notes {}", self.options.html_file.display());
        if let Some(parent) = self.options.html_file.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.options.html_file, &notes.html)?;

        Ok(())
    }

    pub fn generate(&self) -> Result<Notes> {
        let repo = Repository::open(&self.options.repo_path)?;
        let version = parse_build_version(&self.options.tag)?;
        let head = self.head(&repo)?;

        let previous = commits::previous_tag(&repo, head, &version)?;
        let since = previous.as_ref().map(|p| p.oid);
        match &previous {
            Some(p) => info!("generating notes for {} since {}", self.options.tag, p.name),
            None => info!("generating notes for {} from the first commit", self.options.tag),
        }

        let sections = commits::sections(commits::collect(&repo, head, since)?);

        let dependencies = if self.options.dependencies {
            Some(dependencies::diff_revisions(
                &repo,
                since,
                head,
                &self.config.dependency_manifest,
            )?)
        } else {
            None
        };

        let downloads = downloads::collect(
            &self.options.tars,
            &self.config.download_base_url,
            &self.options.bucket,
            &self.options.tag,
        )?;

        let context = ChangelogContext {
            product: self.product.clone(),
            version: self.options.tag.clone(),
            branch: self.options.branch.clone(),
            date: Utc::now().format("%Y-%m-%d").to_string(),
            previous_tag: previous.map(|p| p.name),
            sections,
            dependencies,
            downloads,
        };

        render(&context)
    }

    /// Commit the notes end at: the release tag when it exists, otherwise
    /// the branch head.
    fn head(&self, repo: &Repository) -> Result<Oid> {
        let candidates = [
            self.options.tag.clone(),
            self.options.branch.clone(),
            format!("origin/{}", self.options.branch),
        ];

        for rev in candidates.iter().filter(|r| !r.is_empty()) {
            if let Ok(object) = repo.revparse_single(rev) {
                return Ok(object.peel_to_commit()?.id());
            }
        }

        Err(StageError::invalid_options(format!(
            "neither tag {} nor branch {} exist",
            self.options.tag, self.options.branch
        )))
    }

    /// Markdown changelog beside the HTML notes, outside the working tree.
    fn changelog_file(&self) -> Result<PathBuf> {
        let version = parse_build_version(&self.options.tag)?;
        let notes_dir = self.options.html_file.parent().ok_or_else(|| {
            StageError::invalid_options(format!(
                "release notes path {} has no parent directory",
                self.options.html_file.display()
            ))
        })?;

        Ok(notes_dir
            .join(&self.config.directory)
            .join(format!("CHANGELOG-{}.{}.md", version.major, version.minor)))
    }
}

fn render(context: &ChangelogContext) -> Result<Notes> {
    let mut tera = Tera::default();
    tera.add_raw_template(MARKDOWN_TEMPLATE_NAME, MARKDOWN_TEMPLATE)?;
    tera.add_raw_template(HTML_TEMPLATE_NAME, HTML_TEMPLATE)?;

    let context = Context::from_serialize(context)?;

    Ok(Notes {
        markdown: tera.render(MARKDOWN_TEMPLATE_NAME, &context)?,
        html: tera.render(HTML_TEMPLATE_NAME, &context)?,
    })
}

fn prepend(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let existing = match fs::read_to_string(path) {
        Ok(existing) => existing,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };
    let combined = if existing.trim().is_empty() {
        content.to_string()
    } else {
        format!("{}\n\n{}", content.trim_end(), existing)
    };

    fs::write(path, combined)?;
    Ok(())
}
