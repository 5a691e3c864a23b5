//! Requirement links and the root package.
//!
//! The root package is the project itself. Its requirement set is what the
//! restricted install resolves against, so selected optional packages are
//! added to it as [`Link`]s before the installer runs.

use crate::collection::Collection;
use crate::constants::ROOT_PACKAGE_SOURCE;
use crate::manifest::Manifest;
use crate::package::OptionalPackage;
use crate::version::ParsedConstraint;
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::fmt;

/// How a link relates its source to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkDescription {
    /// Runtime requirement
    Requires,
    /// Development-only requirement
    RequiresForDevelopment,
}

impl LinkDescription {
    /// Human-readable form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Requires => "requires",
            Self::RequiresForDevelopment => "requires for development",
        }
    }
}

impl fmt::Display for LinkDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dependency edge from one package to another.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    source: String,
    target: String,
    constraint: ParsedConstraint,
    description: LinkDescription,
}

impl Link {
    /// Create a link, parsing `constraint`.
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        constraint: &str,
        description: LinkDescription,
    ) -> Result<Self> {
        let target = target.into();
        let constraint = ParsedConstraint::parse(constraint)
            .with_context(|| format!("Invalid constraint for requirement '{target}'"))?;
        Ok(Self {
            source: source.into(),
            target,
            constraint,
            description,
        })
    }

    /// Link for a requirement already recorded in a manifest.
    ///
    /// The resolver accepted it once, so a constraint that does not parse
    /// here is kept raw instead of failing.
    pub fn existing(
        source: impl Into<String>,
        target: impl Into<String>,
        constraint: &str,
        description: LinkDescription,
    ) -> Self {
        let target = target.into();
        let constraint = ParsedConstraint::parse(constraint).unwrap_or_else(|error| {
            tracing::debug!(requirement = %target, %error, "keeping manifest constraint unparsed");
            ParsedConstraint::raw(constraint)
        });
        Self {
            source: source.into(),
            target,
            constraint,
            description,
        }
    }

    /// Root-package link for a selected optional package.
    pub fn for_optional_package(package: &OptionalPackage) -> Result<Self> {
        let description = if package.is_dev() {
            LinkDescription::RequiresForDevelopment
        } else {
            LinkDescription::Requires
        };
        Self::new(ROOT_PACKAGE_SOURCE, package.name(), package.constraint(), description)
    }

    /// Package declaring the requirement.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Package being required.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Parsed constraint.
    #[must_use]
    pub fn constraint(&self) -> &ParsedConstraint {
        &self.constraint
    }

    /// Constraint as written.
    #[must_use]
    pub fn pretty_constraint(&self) -> &str {
        self.constraint.pretty()
    }

    /// Relationship description.
    #[must_use]
    pub fn description(&self) -> LinkDescription {
        self.description
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} ({})", self.source, self.description, self.target, self.constraint)
    }
}

/// The project's own package, as seen by the installer.
#[derive(Debug, Clone, Default)]
pub struct RootPackage {
    name: String,
    requires: Collection<Link>,
    dev_requires: Collection<Link>,
    extra: Map<String, Value>,
}

impl RootPackage {
    /// Create a root package with no requirements.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Build the root package from a manifest's `name`, `require`,
    /// `require-dev` and `extra` sections.
    #[must_use]
    pub fn from_manifest(manifest: &Manifest) -> Self {
        let links = |section: &str, description: LinkDescription| -> Collection<Link> {
            let mut links = Collection::new();
            for (name, constraint) in manifest.requirements(section) {
                links.set(
                    name.as_str(),
                    Link::existing(ROOT_PACKAGE_SOURCE, name.as_str(), &constraint, description),
                );
            }
            links
        };

        Self {
            name: manifest.name().unwrap_or(ROOT_PACKAGE_SOURCE).to_string(),
            requires: links("require", LinkDescription::Requires),
            dev_requires: links("require-dev", LinkDescription::RequiresForDevelopment),
            extra: manifest.extra().cloned().unwrap_or_default(),
        }
    }

    /// Package name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runtime requirements keyed by target name.
    #[must_use]
    pub fn requires(&self) -> &Collection<Link> {
        &self.requires
    }

    /// Replace the runtime requirement set.
    pub fn set_requires(&mut self, requires: Collection<Link>) {
        self.requires = requires;
    }

    /// Development requirements keyed by target name.
    #[must_use]
    pub fn dev_requires(&self) -> &Collection<Link> {
        &self.dev_requires
    }

    /// Extension metadata.
    #[must_use]
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Replace the extension metadata.
    pub fn set_extra(&mut self, extra: Map<String, Value>) {
        self.extra = extra;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::VersionConstraint;
    use serde_json::json;

    #[test]
    fn test_link_for_runtime_package() {
        let package = OptionalPackage::from_spec(&json!({
            "name": "vendor/db", "constraint": "^2.5", "prompt": "?"
        }))
        .unwrap();
        let link = Link::for_optional_package(&package).unwrap();

        assert_eq!(link.source(), "__root__");
        assert_eq!(link.target(), "vendor/db");
        assert_eq!(link.pretty_constraint(), "^2.5");
        assert_eq!(link.description().as_str(), "requires");
    }

    #[test]
    fn test_link_for_dev_package() {
        let package = OptionalPackage::from_spec(&json!({
            "name": "vendor/debug", "constraint": "~1.0", "prompt": "?", "dev": true
        }))
        .unwrap();
        let link = Link::for_optional_package(&package).unwrap();
        assert_eq!(link.description(), LinkDescription::RequiresForDevelopment);
        assert_eq!(link.to_string(), "__root__ requires for development vendor/debug (~1.0)");
    }

    #[test]
    fn test_invalid_constraint_is_reported() {
        let error = Link::new("__root__", "vendor/x", "dev-", LinkDescription::Requires).unwrap_err();
        assert!(error.to_string().contains("vendor/x"));
    }

    #[test]
    fn test_root_package_from_manifest() {
        let manifest = Manifest::from_value(json!({
            "name": "acme/app",
            "require": {"php": "^8.1", "laminas/laminas-mvc": "^3.0"},
            "require-dev": {"phpunit/phpunit": "^10.0"},
            "extra": {"laminas-skeleton-installer": []}
        }))
        .unwrap();

        let root = RootPackage::from_manifest(&manifest);
        assert_eq!(root.name(), "acme/app");
        assert_eq!(root.requires().len(), 2);
        assert_eq!(root.requires().get("php").unwrap().pretty_constraint(), "^8.1");
        assert_eq!(
            root.dev_requires().get("phpunit/phpunit").unwrap().description(),
            LinkDescription::RequiresForDevelopment
        );
        assert!(root.extra().contains_key("laminas-skeleton-installer"));
    }

    #[test]
    fn test_root_package_keeps_unusual_constraints() {
        let manifest = Manifest::from_value(json!({
            "name": "acme/app",
            "require": {
                "acme/framework": "2.x-dev",
                "acme/legacy": "1.2.3.4",
                "acme/fork": "dev-main as 1.0.x-dev",
                "acme/broken": "!=1.0",
                "acme/blank": ""
            }
        }))
        .unwrap();

        let root = RootPackage::from_manifest(&manifest);
        assert_eq!(root.requires().len(), 5);
        assert_eq!(root.requires().get("acme/framework").unwrap().pretty_constraint(), "2.x-dev");
        assert_eq!(root.requires().get("acme/broken").unwrap().pretty_constraint(), "!=1.0");
        assert_eq!(
            root.requires().get("acme/blank").unwrap().constraint().constraint(),
            &VersionConstraint::Raw(String::new())
        );
    }
}
