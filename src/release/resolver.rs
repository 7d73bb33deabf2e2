//! Computes the versions to release from a build version.
//!
//! A build version is what describing the branch head yields:
//! `v1.30.0-alpha.0.12+abc123` is twelve commits past tag `v1.30.0-alpha.0`
//! at commit `abc123`; past a final tag it reads `v1.31.2+abc123.7`. The
//! first build metadata identifier is always the commit. The pre-release
//! label and number of the nearest tag decide which number the next release
//! of each type gets.
use log::*;
use semver::Version;

use crate::{
    Result,
    error::StageError,
    release::{BranchConventions, ReleaseType, Versions},
};

/// Parse a build version, tolerating a leading `v`.
pub fn parse_build_version(version: &str) -> Result<Version> {
    let trimmed = version.trim();
    let raw = trimmed.strip_prefix('v').unwrap_or(trimmed);
    Version::parse(raw)
        .map_err(|e| StageError::invalid_version(version, e.to_string()))
}

/// Pre-release label and number of a parsed build version
/// (`alpha.2.663` -> `("alpha", 2)`).
fn prerelease_label(version: &Version) -> Option<(String, u64)> {
    if version.pre.is_empty() {
        return None;
    }

    let mut parts = version.pre.as_str().split('.');
    let label = parts.next()?.to_string();
    let number = parts.next().and_then(|n| n.parse().ok()).unwrap_or(0);

    Some((label, number))
}

/// Resolve the versions for a staging run.
///
/// `branch_from_default` is true when the release branch is being cut from
/// the default branch in this run, which additionally opens the next minor
/// on the default branch with an `alpha.0`.
pub fn generate_release_version(
    release_type: ReleaseType,
    build_version: &str,
    branch: &str,
    branch_from_default: bool,
    conventions: &BranchConventions,
) -> Result<Versions> {
    info!("setting release version for {branch} ({build_version})");

    let sv = parse_build_version(build_version)?;
    check_branch(release_type, branch, &sv, conventions)?;

    let label = prerelease_label(&sv);
    let (major, minor, patch) = (sv.major, sv.minor, sv.patch);

    let mut official = None;
    let mut rc = None;
    let mut beta = None;
    let mut alpha = None;

    match release_type {
        ReleaseType::Official => {
            let official_patch = match label {
                Some(_) => patch,
                None => patch + 1,
            };
            official = Some(format!("v{major}.{minor}.{official_patch}"));
            // the release branch moves on to the next patch's first candidate
            rc = Some(format!("v{major}.{minor}.{}-rc.0", official_patch + 1));
        }
        ReleaseType::Rc => {
            rc = Some(match label.as_ref().map(|(l, n)| (l.as_str(), *n)) {
                Some(("rc", n)) => format!("v{major}.{minor}.{patch}-rc.{}", n + 1),
                Some(_) => format!("v{major}.{minor}.{patch}-rc.0"),
                None => format!("v{major}.{minor}.{}-rc.0", patch + 1),
            });
        }
        ReleaseType::Beta => {
            beta = Some(match label.as_ref().map(|(l, n)| (l.as_str(), *n)) {
                Some(("alpha", _)) => format!("v{major}.{minor}.{patch}-beta.0"),
                Some(("beta", n)) => {
                    format!("v{major}.{minor}.{patch}-beta.{}", n + 1)
                }
                _ => {
                    return Err(StageError::invalid_version(
                        build_version,
                        "beta releases must follow an alpha or beta",
                    ));
                }
            });
        }
        ReleaseType::Alpha => {
            alpha = Some(match label.as_ref().map(|(l, n)| (l.as_str(), *n)) {
                Some(("alpha", n)) => {
                    format!("v{major}.{minor}.{patch}-alpha.{}", n + 1)
                }
                _ => {
                    return Err(StageError::invalid_version(
                        build_version,
                        "alpha releases must follow an alpha",
                    ));
                }
            });
        }
    }

    if branch_from_default {
        alpha = Some(format!("v{major}.{}.0-alpha.0", minor + 1));
    }

    let versions = Versions::new(official, rc, beta, alpha)?;
    info!(
        "resolved versions {:?}, prime {}",
        versions.ordered(),
        versions.prime()
    );

    Ok(versions)
}

fn check_branch(
    release_type: ReleaseType,
    branch: &str,
    version: &Version,
    conventions: &BranchConventions,
) -> Result<()> {
    let release_branch = conventions.release_branch(branch);
    let on_default = conventions.is_default(branch);

    match release_type {
        ReleaseType::Alpha if !on_default => {
            return Err(StageError::branch_mismatch(
                branch,
                release_type,
                format!(
                    "alpha releases are cut from the default branch {}",
                    conventions.default_branch
                ),
            ));
        }
        ReleaseType::Rc | ReleaseType::Official if release_branch.is_none() => {
            return Err(StageError::branch_mismatch(
                branch,
                release_type,
                "not a release branch",
            ));
        }
        ReleaseType::Beta if !on_default && release_branch.is_none() => {
            return Err(StageError::branch_mismatch(
                branch,
                release_type,
                "neither the default branch nor a release branch",
            ));
        }
        _ => {}
    }

    if let Some(rb) = release_branch
        && (rb.major, rb.minor) != (version.major, version.minor)
    {
        return Err(StageError::branch_mismatch(
            branch,
            release_type,
            format!(
                "build version {}.{} does not belong to release {}.{}",
                version.major, version.minor, rb.major, rb.minor
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conventions() -> BranchConventions {
        BranchConventions::default()
    }

    fn resolve(
        release_type: ReleaseType,
        build_version: &str,
        branch: &str,
        from_default: bool,
    ) -> Result<Versions> {
        generate_release_version(
            release_type,
            build_version,
            branch,
            from_default,
            &conventions(),
        )
    }

    #[test]
    fn parses_build_version_with_metadata() {
        let sv = parse_build_version("v1.18.0-alpha.2.663+df908c3aad70be").unwrap();
        assert_eq!((sv.major, sv.minor, sv.patch), (1, 18, 0));
        assert_eq!(sv.pre.as_str(), "alpha.2.663");
        assert_eq!(sv.build.as_str(), "df908c3aad70be");
        assert_eq!(
            prerelease_label(&sv),
            Some(("alpha".to_string(), 2))
        );
    }

    #[test]
    fn rejects_malformed_build_version() {
        let err = resolve(ReleaseType::Alpha, "v1.x", "master", false).unwrap_err();
        assert!(matches!(err, StageError::InvalidVersion { version, .. } if version == "v1.x"));
    }

    #[test]
    fn alpha_increments_alpha_number() {
        let versions =
            resolve(ReleaseType::Alpha, "v1.30.0-alpha.0.12+abc123", "master", false)
                .unwrap();
        assert_eq!(versions.ordered(), vec!["v1.30.0-alpha.1"]);
        assert_eq!(versions.prime(), "v1.30.0-alpha.1");
    }

    #[test]
    fn alpha_after_beta_is_rejected() {
        let err =
            resolve(ReleaseType::Alpha, "v1.30.0-beta.0.3+abc123", "master", false)
                .unwrap_err();
        assert!(matches!(err, StageError::InvalidVersion { .. }));
    }

    #[test]
    fn alpha_requires_default_branch() {
        let err = resolve(
            ReleaseType::Alpha,
            "v1.30.0-alpha.0.12+abc123",
            "release-1.30",
            false,
        )
        .unwrap_err();
        assert!(matches!(err, StageError::BranchMismatch { .. }));
    }

    #[test]
    fn beta_after_alpha_starts_at_zero() {
        let versions =
            resolve(ReleaseType::Beta, "v1.30.0-alpha.3.40+abc123", "master", false)
                .unwrap();
        assert_eq!(versions.ordered(), vec!["v1.30.0-beta.0"]);
    }

    #[test]
    fn beta_after_beta_increments() {
        let versions = resolve(
            ReleaseType::Beta,
            "v1.30.0-beta.1.2+abc123",
            "release-1.30",
            false,
        )
        .unwrap();
        assert_eq!(versions.prime(), "v1.30.0-beta.2");
    }

    #[test]
    fn beta_after_rc_is_rejected() {
        let err = resolve(
            ReleaseType::Beta,
            "v1.30.0-rc.0.2+abc123",
            "release-1.30",
            false,
        )
        .unwrap_err();
        assert!(matches!(err, StageError::InvalidVersion { .. }));
    }

    #[test]
    fn rc_cut_from_default_opens_next_minor() {
        let versions = resolve(
            ReleaseType::Rc,
            "v1.31.0-beta.2.10+abc123",
            "release-1.31",
            true,
        )
        .unwrap();
        assert_eq!(versions.prime(), "v1.31.0-rc.0");
        assert_eq!(
            versions.ordered(),
            vec!["v1.31.0-rc.0", "v1.32.0-alpha.0"]
        );
    }

    #[test]
    fn rc_after_rc_increments() {
        let versions = resolve(
            ReleaseType::Rc,
            "v1.31.0-rc.0.4+abc123",
            "release-1.31",
            false,
        )
        .unwrap();
        assert_eq!(versions.ordered(), vec!["v1.31.0-rc.1"]);
    }

    #[test]
    fn rc_requires_release_branch() {
        let err = resolve(ReleaseType::Rc, "v1.31.0-rc.0.4+abc123", "master", false)
            .unwrap_err();
        assert!(matches!(err, StageError::BranchMismatch { .. }));
    }

    #[test]
    fn official_includes_next_rc() {
        let versions = resolve(
            ReleaseType::Official,
            "v1.31.0-rc.1.3+abc123",
            "release-1.31",
            false,
        )
        .unwrap();
        assert_eq!(versions.prime(), "v1.31.0");
        assert_eq!(versions.ordered(), vec!["v1.31.0", "v1.31.1-rc.0"]);
    }

    #[test]
    fn official_patch_without_label() {
        let versions = resolve(
            ReleaseType::Official,
            "v1.31.2+abc123.7",
            "release-1.31",
            false,
        )
        .unwrap();
        assert_eq!(versions.ordered(), vec!["v1.31.3", "v1.31.4-rc.0"]);
    }

    #[test]
    fn release_branch_must_match_build_version() {
        let err = resolve(
            ReleaseType::Official,
            "v1.30.0-rc.1.3+abc123",
            "release-1.31",
            false,
        )
        .unwrap_err();
        assert!(matches!(err, StageError::BranchMismatch { .. }));
    }

    #[test]
    fn prime_is_member_exactly_once_for_all_types() {
        let cases = [
            (ReleaseType::Alpha, "v1.30.0-alpha.0.1+abc", "master", false),
            (ReleaseType::Beta, "v1.30.0-alpha.4.1+abc", "master", false),
            (ReleaseType::Beta, "v1.30.0-beta.0.1+abc", "release-1.30", true),
            (ReleaseType::Rc, "v1.30.0-beta.1.1+abc", "release-1.30", true),
            (ReleaseType::Rc, "v1.30.0-rc.1.1+abc", "release-1.30", false),
            (ReleaseType::Official, "v1.30.0-rc.2.1+abc", "release-1.30", false),
            (ReleaseType::Official, "v1.30.0-rc.2.1+abc", "release-1.30", true),
        ];

        for (release_type, build, branch, from_default) in cases {
            let versions = resolve(release_type, build, branch, from_default).unwrap();
            let prime = versions.prime();
            let ordered = versions.ordered();
            assert_eq!(
                ordered.iter().filter(|v| **v == prime).count(),
                1,
                "{release_type} {build}: {ordered:?}"
            );
            assert_eq!(ordered[0], prime);
        }
    }
}
