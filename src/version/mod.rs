//! Version constraint parsing for requirement links.
//!
//! Constraints are stored verbatim in the manifest and handed to the host
//! resolver untouched, so the resolver stays the authority on what a
//! constraint means. A [`Link`](crate::package::link::Link) still carries a
//! parsed form so callers can ask whether a concrete version would match.
//!
//! Supported syntax:
//!
//! - `*` - any version
//! - `1.2.3`, `v1.2.3`, `1.2.3.4` - exact version
//! - `^1.2`, `~1.2`, `~1.2.3`, `>=1.0 <2.0`, `>=1.0, <2.0`, `1.0 - 2.0`, `1.2.*` - ranges
//! - `^1.0 || ^2.0` (or a single `|`) - alternatives
//! - `dev-main` - branch references
//! - `2.x-dev`, `1.0.x-dev` - development branch aliases
//! - `dev-main as 1.0.x-dev` - inline aliases, matched by the actual version
//! - a trailing `@dev`, `@alpha`, `@beta`, `@RC` or `@stable` stability flag
//!
//! Anything else (`!=1.0`, operators the resolver added later) is kept as
//! [`VersionConstraint::Raw`]. Only an empty constraint or an empty branch
//! name is rejected.
//!
//! # Examples
//!
//! ```rust
//! use skeleton_installer::version::ParsedConstraint;
//! use semver::Version;
//!
//! let constraint = ParsedConstraint::parse("^2.5 || ^3.0")?;
//! assert!(constraint.matches(&Version::parse("3.1.0")?));
//! assert!(!constraint.matches(&Version::parse("2.4.9")?));
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::core::SkeletonError;
use regex::Regex;
use semver::{Version, VersionReq};
use std::fmt;
use std::sync::LazyLock;

static STABILITY_FLAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)@(dev|alpha|beta|rc|stable)$").expect("stability pattern is valid")
});

static SHORT_TILDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^~\s*v?(\d+)\.(\d+)$").expect("tilde pattern is valid")
});

static SPACE_CONJUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9*])\s+([<>=^~!])").expect("conjunction pattern is valid")
});

static HYPHEN_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v?(\S+)\s+-\s+v?(\S+)$").expect("hyphen range pattern is valid")
});

static V_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|[\s,<>=^~])v(\d)").expect("v prefix pattern is valid"));

static BRANCH_ALIAS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^v?(\d+(?:\.\d+)*)\.x-dev$").expect("branch alias pattern is valid")
});

static FOUR_PART_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v?\d+\.\d+\.\d+\.\d+(-[0-9A-Za-z.]+)?$").expect("four-part pattern is valid")
});

/// Structured form of a single constraint alternative.
#[derive(Debug, Clone, PartialEq)]
pub enum VersionConstraint {
    /// `*`
    Any,
    /// Exact version without a range operator
    Exact(Version),
    /// Semver range
    Requirement(VersionReq),
    /// `dev-<branch>` reference
    Branch(String),
    /// `<prefix>.x-dev` development branch alias, holding the numeric prefix
    BranchAlias(String),
    /// Syntax this parser does not model, kept for the host resolver
    Raw(String),
    /// Any one of the inner constraints
    Alternatives(Vec<VersionConstraint>),
}

impl VersionConstraint {
    /// Whether `version` satisfies this constraint. Branches, branch aliases
    /// and raw constraints never match released versions.
    #[must_use]
    pub fn matches(&self, version: &Version) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(exact) => exact == version,
            Self::Requirement(req) => req.matches(version),
            Self::Branch(_) | Self::BranchAlias(_) | Self::Raw(_) => false,
            Self::Alternatives(options) => options.iter().any(|option| option.matches(version)),
        }
    }
}

/// A constraint string together with its parsed form.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedConstraint {
    pretty: String,
    constraint: VersionConstraint,
    stability: Option<String>,
}

impl ParsedConstraint {
    /// Parse a constraint as written in the manifest.
    ///
    /// Fails only for an empty constraint or an empty `dev-` branch name.
    pub fn parse(constraint: &str) -> Result<Self, SkeletonError> {
        let invalid = || SkeletonError::InvalidVersionConstraint {
            constraint: constraint.to_string(),
        };

        let trimmed = constraint.trim();
        if trimmed.is_empty() {
            return Err(invalid());
        }

        let (body, stability) = match STABILITY_FLAG.captures(trimmed) {
            Some(captures) => {
                let flag = captures[1].to_lowercase();
                let body = trimmed[..trimmed.len() - flag.len() - 1].trim();
                (body, Some(flag))
            }
            None => (trimmed, None),
        };

        let options = body
            .split('|')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| parse_single(part).ok_or_else(invalid))
            .collect::<Result<Vec<_>, _>>()?;

        let constraint = match options.len() {
            0 => VersionConstraint::Any,
            1 => options.into_iter().next().ok_or_else(invalid)?,
            _ => VersionConstraint::Alternatives(options),
        };

        Ok(Self {
            pretty: trimmed.to_string(),
            constraint,
            stability,
        })
    }

    /// Keep `constraint` unparsed.
    #[must_use]
    pub fn raw(constraint: &str) -> Self {
        let trimmed = constraint.trim();
        Self {
            pretty: trimmed.to_string(),
            constraint: VersionConstraint::Raw(trimmed.to_string()),
            stability: None,
        }
    }

    /// The constraint exactly as written.
    #[must_use]
    pub fn pretty(&self) -> &str {
        &self.pretty
    }

    /// The parsed form.
    #[must_use]
    pub fn constraint(&self) -> &VersionConstraint {
        &self.constraint
    }

    /// Stability flag (`dev`, `alpha`, ...) if one was given.
    #[must_use]
    pub fn stability(&self) -> Option<&str> {
        self.stability.as_deref()
    }

    /// Whether `version` satisfies the constraint.
    #[must_use]
    pub fn matches(&self, version: &Version) -> bool {
        self.constraint.matches(version)
    }

    /// Whether an installed version string satisfies the constraint.
    ///
    /// Branch versions (`dev-main`) only match the same branch reference or `*`.
    #[must_use]
    pub fn matches_installed(&self, version: &str) -> bool {
        matches_installed(&self.constraint, version)
    }
}

fn matches_installed(constraint: &VersionConstraint, version: &str) -> bool {
    match constraint {
        VersionConstraint::Any => true,
        VersionConstraint::Branch(branch) => version.strip_prefix("dev-") == Some(branch.as_str()),
        VersionConstraint::BranchAlias(prefix) => BRANCH_ALIAS
            .captures(version.trim())
            .is_some_and(|captures| &captures[1] == prefix),
        VersionConstraint::Raw(_) => false,
        VersionConstraint::Alternatives(options) => {
            options.iter().any(|option| matches_installed(option, version))
        }
        other => parse_installed_version(version).is_some_and(|parsed| other.matches(&parsed)),
    }
}

/// Parse a version as recorded for an installed package.
///
/// Accepts a leading `v`, missing minor/patch parts and the four-part
/// normalized form (`2.5.1.0`). A non-zero fourth part is kept as build
/// metadata so `1.2.3.4` and `1.2.3.5` stay distinct. Branch versions
/// return `None`.
#[must_use]
pub fn parse_installed_version(version: &str) -> Option<Version> {
    let cleaned = version.trim();
    let cleaned = cleaned.strip_prefix('v').unwrap_or(cleaned);
    if let Ok(parsed) = Version::parse(cleaned) {
        return Some(parsed);
    }

    let (numbers, pre) = match cleaned.split_once('-') {
        Some((numbers, pre)) => (numbers, Some(pre)),
        None => (cleaned, None),
    };
    let mut parts = numbers.split('.').map(str::parse::<u64>);
    let major = parts.next()?.ok()?;
    let minor = parts.next().transpose().ok()?.unwrap_or(0);
    let patch = parts.next().transpose().ok()?.unwrap_or(0);
    let build = parts.next().transpose().ok()?.unwrap_or(0);
    if parts.next().is_some() {
        return None;
    }
    let mut normalized = format!("{major}.{minor}.{patch}");
    if let Some(pre) = pre {
        normalized.push('-');
        normalized.push_str(pre);
    }
    if build != 0 {
        normalized.push_str(&format!("+{build}"));
    }
    Version::parse(&normalized).ok()
}

impl fmt::Display for ParsedConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pretty)
    }
}

/// Parse one alternative. `None` means the alternative is malformed.
fn parse_single(part: &str) -> Option<VersionConstraint> {
    // `dev-main as 1.0.x-dev` installs dev-main, so match on the left side
    let part = match part.split_once(" as ") {
        Some((actual, _alias)) => actual.trim(),
        None => part,
    };

    if part == "*" {
        return Some(VersionConstraint::Any);
    }

    if let Some(branch) = part.strip_prefix("dev-") {
        return (!branch.is_empty()).then(|| VersionConstraint::Branch(branch.to_string()));
    }

    if let Some(captures) = BRANCH_ALIAS.captures(part) {
        return Some(VersionConstraint::BranchAlias(captures[1].to_string()));
    }

    let cleaned = part.strip_prefix('v').unwrap_or(part);
    if let Ok(version) = Version::parse(cleaned) {
        return Some(VersionConstraint::Exact(version));
    }
    if FOUR_PART_VERSION.is_match(part) {
        if let Some(version) = parse_installed_version(part) {
            return Some(VersionConstraint::Exact(version));
        }
    }

    // Composer's `~X.Y` allows any later minor in the same major
    let normalized = if let Some(captures) = SHORT_TILDE.captures(part) {
        let Ok(major) = captures[1].parse::<u64>() else {
            return Some(VersionConstraint::Raw(part.to_string()));
        };
        format!(">={major}.{}.0, <{}.0.0", &captures[2], major + 1)
    } else if let Some(captures) = HYPHEN_RANGE.captures(part) {
        format!(">={}, <={}", &captures[1], &captures[2])
    } else {
        let without_v = V_PREFIX.replace_all(part, "$1$2");
        SPACE_CONJUNCTION.replace_all(&without_v, "$1, $2").into_owned()
    };

    Some(match VersionReq::parse(&normalized) {
        Ok(req) => VersionConstraint::Requirement(req),
        Err(error) => {
            tracing::trace!(constraint = part, %error, "keeping constraint unparsed");
            VersionConstraint::Raw(part.to_string())
        }
    })
}
