//! Lock state and the installed-package repository.
//!
//! The lock file pins every installed package. Self-removal is the only
//! workflow that touches it: the installer's own package is dropped and the
//! remaining packages are written back, partitioned the way the lock file
//! stores them.
//!
//! # Lock File Format
//!
//! ```json
//! {
//!     "content-hash": "…",
//!     "packages": [{"name": "vendor/db", "version": "2.5.1", "…": "…"}],
//!     "packages-dev": [{"name": "vendor/debug", "version": "1.0.0"}],
//!     "aliases": [{"package": "vendor/db", "version": "dev-main", "alias": "2.6.x-dev", "alias_normalized": "2.6.9999999.9999999-dev"}],
//!     "minimum-stability": "stable",
//!     "stability-flags": [],
//!     "prefer-stable": false,
//!     "prefer-lowest": false,
//!     "platform": {"php": "^8.1"},
//!     "platform-dev": []
//! }
//! ```
//!
//! Only the keys above are interpreted. Every other key, top-level or inside
//! a package entry, is carried through untouched.
//!
//! # Seams
//!
//! - [`Locker`] - read lock settings, replace lock data
//! - [`InstalledRepository`] - look up and remove installed packages
//! - [`LockStateLoader`] - open both from the lock file when they are needed
//!
//! [`FileLocker`], [`LockedRepository`] and [`FileLockState`] are the
//! file-backed implementations used by the CLI.

mod io;
mod serde_helpers;

use crate::version::ParsedConstraint;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Default `minimum-stability` when the lock file has none.
pub const DEFAULT_MINIMUM_STABILITY: &str = "stable";

/// A package entry as stored in `packages` / `packages-dev`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockedPackage {
    /// Package name
    pub name: String,
    /// Installed version
    pub version: String,
    /// Everything else the host records (source, dist, autoload, ...)
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl LockedPackage {
    /// Entry with no extra metadata.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            metadata: Map::new(),
        }
    }
}

/// An entry of the `aliases` list: `package` at `version` also known as `alias`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedAlias {
    /// Aliased package name
    pub package: String,
    /// Version being aliased
    pub version: String,
    /// Alias version
    pub alias: String,
    /// Normalized alias version
    #[serde(default)]
    pub alias_normalized: String,
}

/// A package present in the installed repository.
#[derive(Debug, Clone, PartialEq)]
pub enum InstalledPackage {
    /// A real package
    Package {
        /// Lock entry
        package: LockedPackage,
        /// Installed as a development requirement
        dev: bool,
    },
    /// An alias of another installed package
    Alias {
        /// Alias entry
        alias: LockedAlias,
        /// The aliased package is a development requirement
        dev: bool,
    },
}

impl InstalledPackage {
    /// Package name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Package {
                package,
                ..
            } => &package.name,
            Self::Alias {
                alias,
                ..
            } => &alias.package,
        }
    }

    /// Installed version; the alias version for aliases.
    #[must_use]
    pub fn version(&self) -> &str {
        match self {
            Self::Package {
                package,
                ..
            } => &package.version,
            Self::Alias {
                alias,
                ..
            } => &alias.alias,
        }
    }

    /// Whether the package is a development requirement.
    #[must_use]
    pub fn is_dev(&self) -> bool {
        match self {
            Self::Package {
                dev,
                ..
            }
            | Self::Alias {
                dev,
                ..
            } => *dev,
        }
    }

    /// Whether this entry is an alias.
    #[must_use]
    pub fn is_alias(&self) -> bool {
        matches!(self, Self::Alias { .. })
    }
}

/// Installed packages split the way the lock file stores them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartitionedPackages {
    /// Non-alias, non-dev packages
    pub packages: Vec<LockedPackage>,
    /// Non-alias dev packages
    pub dev_packages: Vec<LockedPackage>,
    /// Aliases, dev or not
    pub aliases: Vec<LockedAlias>,
}

impl PartitionedPackages {
    /// Partition `installed`, keeping relative order inside each bucket.
    pub fn from_installed<I>(installed: I) -> Self
    where
        I: IntoIterator<Item = InstalledPackage>,
    {
        installed.into_iter().fold(Self::default(), |mut partitioned, package| {
            match package {
                InstalledPackage::Alias {
                    alias,
                    ..
                } => partitioned.aliases.push(alias),
                InstalledPackage::Package {
                    package,
                    dev: true,
                } => partitioned.dev_packages.push(package),
                InstalledPackage::Package {
                    package,
                    dev: false,
                } => partitioned.packages.push(package),
            }
            partitioned
        })
    }
}

/// Full replacement lock data, in the order the host expects it.
#[derive(Debug, Clone, PartialEq)]
pub struct LockData {
    /// Non-alias, non-dev packages
    pub packages: Vec<LockedPackage>,
    /// Non-alias dev packages
    pub dev_packages: Vec<LockedPackage>,
    /// Platform requirements (`platform`)
    pub platform_requirements: Map<String, Value>,
    /// Development platform requirements (`platform-dev`)
    pub platform_dev_requirements: Map<String, Value>,
    /// Alias entries
    pub aliases: Vec<LockedAlias>,
    /// `minimum-stability`
    pub minimum_stability: String,
    /// `stability-flags`
    pub stability_flags: Map<String, Value>,
    /// `prefer-stable`
    pub prefer_stable: bool,
    /// `prefer-lowest`
    pub prefer_lowest: bool,
    /// `platform-overrides`
    pub platform_overrides: Map<String, Value>,
}

impl LockData {
    /// Lock data for `partitioned` packages, carrying every setting over from
    /// `locker` unchanged.
    pub fn carry_over(partitioned: PartitionedPackages, locker: &dyn Locker) -> Self {
        Self {
            packages: partitioned.packages,
            dev_packages: partitioned.dev_packages,
            platform_requirements: locker.platform_requirements(false),
            platform_dev_requirements: locker.platform_requirements(true),
            aliases: partitioned.aliases,
            minimum_stability: locker.minimum_stability(),
            stability_flags: locker.stability_flags(),
            prefer_stable: locker.prefer_stable(),
            prefer_lowest: locker.prefer_lowest(),
            platform_overrides: locker.platform_overrides(),
        }
    }
}

/// Lock state owned by the host.
pub trait Locker {
    /// `platform-dev` when `dev` is set, `platform` otherwise.
    fn platform_requirements(&self, dev: bool) -> Map<String, Value>;

    /// `minimum-stability`.
    fn minimum_stability(&self) -> String;

    /// `stability-flags`.
    fn stability_flags(&self) -> Map<String, Value>;

    /// `prefer-stable`.
    fn prefer_stable(&self) -> bool;

    /// `prefer-lowest`.
    fn prefer_lowest(&self) -> bool;

    /// `platform-overrides`.
    fn platform_overrides(&self) -> Map<String, Value>;

    /// Replace the lock data and persist it.
    fn set_lock_data(&mut self, data: LockData) -> Result<()>;
}

/// The local repository of installed packages.
pub trait InstalledRepository {
    /// Every installed package, real packages first, then aliases.
    fn packages(&self) -> Vec<InstalledPackage>;

    /// Remove `name` and its aliases from the repository.
    fn remove_package(&mut self, name: &str);

    /// First installed package named `name` whose version satisfies `constraint`.
    ///
    /// Names compare case-insensitively. Real packages are preferred over aliases.
    fn find_package(&self, name: &str, constraint: &str) -> Result<Option<InstalledPackage>> {
        let constraint = ParsedConstraint::parse(constraint)?;
        Ok(self.packages().into_iter().find(|package| {
            package.name().eq_ignore_ascii_case(name)
                && constraint.matches_installed(package.version())
        }))
    }
}

/// Parsed lock file document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LockFile {
    /// Non-dev packages
    #[serde(default)]
    pub packages: Vec<LockedPackage>,

    /// Dev packages
    #[serde(default)]
    pub packages_dev: Vec<LockedPackage>,

    /// Alias entries
    #[serde(default)]
    pub aliases: Vec<LockedAlias>,

    /// Minimum stability
    #[serde(default = "default_minimum_stability")]
    pub minimum_stability: String,

    /// Per-package stability flags
    #[serde(default, with = "serde_helpers::map_or_list")]
    pub stability_flags: Map<String, Value>,

    /// Prefer stable releases
    #[serde(default)]
    pub prefer_stable: bool,

    /// Prefer lowest versions
    #[serde(default)]
    pub prefer_lowest: bool,

    /// Platform requirements
    #[serde(default, with = "serde_helpers::map_or_list")]
    pub platform: Map<String, Value>,

    /// Development platform requirements
    #[serde(default, with = "serde_helpers::map_or_list")]
    pub platform_dev: Map<String, Value>,

    /// Platform overrides, omitted when empty
    #[serde(
        default,
        with = "serde_helpers::map_or_list",
        skip_serializing_if = "Map::is_empty"
    )]
    pub platform_overrides: Map<String, Value>,

    /// Keys this crate does not interpret (`_readme`, `content-hash`, ...)
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

fn default_minimum_stability() -> String {
    DEFAULT_MINIMUM_STABILITY.to_string()
}

impl Default for LockFile {
    fn default() -> Self {
        Self {
            packages: Vec::new(),
            packages_dev: Vec::new(),
            aliases: Vec::new(),
            minimum_stability: default_minimum_stability(),
            stability_flags: Map::new(),
            prefer_stable: false,
            prefer_lowest: false,
            platform: Map::new(),
            platform_dev: Map::new(),
            platform_overrides: Map::new(),
            other: Map::new(),
        }
    }
}

impl LockFile {
    /// Empty lock file.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace packages and settings with `data`. Uninterpreted keys are kept.
    pub fn apply(&mut self, data: LockData) {
        self.packages = data.packages;
        self.packages_dev = data.dev_packages;
        self.platform = data.platform_requirements;
        self.platform_dev = data.platform_dev_requirements;
        self.aliases = data.aliases;
        self.minimum_stability = data.minimum_stability;
        self.stability_flags = data.stability_flags;
        self.prefer_stable = data.prefer_stable;
        self.prefer_lowest = data.prefer_lowest;
        self.platform_overrides = data.platform_overrides;
    }

    /// Installed-package view of this lock file.
    #[must_use]
    pub fn repository(&self) -> LockedRepository {
        let mut installed: Vec<InstalledPackage> = self
            .packages
            .iter()
            .map(|package| InstalledPackage::Package {
                package: package.clone(),
                dev: false,
            })
            .chain(self.packages_dev.iter().map(|package| InstalledPackage::Package {
                package: package.clone(),
                dev: true,
            }))
            .collect();

        for alias in &self.aliases {
            let dev = self.packages_dev.iter().any(|package| package.name == alias.package);
            installed.push(InstalledPackage::Alias {
                alias: alias.clone(),
                dev,
            });
        }

        LockedRepository::new(installed)
    }
}

/// In-memory installed repository.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LockedRepository {
    installed: Vec<InstalledPackage>,
}

impl LockedRepository {
    /// Repository holding `installed`.
    #[must_use]
    pub fn new(installed: Vec<InstalledPackage>) -> Self {
        Self {
            installed,
        }
    }
}

impl InstalledRepository for LockedRepository {
    fn packages(&self) -> Vec<InstalledPackage> {
        let (mut real, aliases): (Vec<_>, Vec<_>) =
            self.installed.iter().cloned().partition(|package| !package.is_alias());
        real.extend(aliases);
        real
    }

    fn remove_package(&mut self, name: &str) {
        self.installed.retain(|package| !package.name().eq_ignore_ascii_case(name));
    }
}

/// [`Locker`] backed by a lock file on disk.
#[derive(Debug, Clone)]
pub struct FileLocker {
    path: PathBuf,
    lock: LockFile,
}

impl FileLocker {
    /// Load the lock file at `path`; a missing file is an empty lock.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let lock = LockFile::load(&path)?;
        Ok(Self {
            path,
            lock,
        })
    }

    /// Current lock document.
    #[must_use]
    pub fn lock(&self) -> &LockFile {
        &self.lock
    }

    /// Path of the lock file.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl Locker for FileLocker {
    fn platform_requirements(&self, dev: bool) -> Map<String, Value> {
        if dev {
            self.lock.platform_dev.clone()
        } else {
            self.lock.platform.clone()
        }
    }

    fn minimum_stability(&self) -> String {
        self.lock.minimum_stability.clone()
    }

    fn stability_flags(&self) -> Map<String, Value> {
        self.lock.stability_flags.clone()
    }

    fn prefer_stable(&self) -> bool {
        self.lock.prefer_stable
    }

    fn prefer_lowest(&self) -> bool {
        self.lock.prefer_lowest
    }

    fn platform_overrides(&self) -> Map<String, Value> {
        self.lock.platform_overrides.clone()
    }

    fn set_lock_data(&mut self, data: LockData) -> Result<()> {
        self.lock.apply(data);
        self.lock.save(&self.path)
    }
}

/// Installed repository and locker read from the same lock file.
pub struct LockState {
    /// Installed packages
    pub repository: Box<dyn InstalledRepository>,
    /// Lock settings and persistence
    pub locker: Box<dyn Locker>,
}

/// Opens the lock state on demand.
///
/// The lock file changes while an install runs, so it is read at the moment
/// it is needed rather than when the host starts.
pub trait LockStateLoader {
    /// Read the current lock state.
    fn load(&self) -> Result<LockState>;
}

impl<F> LockStateLoader for F
where
    F: Fn() -> Result<LockState>,
{
    fn load(&self) -> Result<LockState> {
        self()
    }
}

/// Lock state read from a lock file on disk.
#[derive(Debug, Clone)]
pub struct FileLockState {
    path: PathBuf,
}

impl FileLockState {
    /// Loader for the lock file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
        }
    }

    /// Path of the lock file.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl LockStateLoader for FileLockState {
    fn load(&self) -> Result<LockState> {
        let locker = FileLocker::open(&self.path)?;
        tracing::debug!(path = %self.path.display(), "loaded lock state");
        Ok(LockState {
            repository: Box::new(locker.lock().repository()),
            locker: Box::new(locker),
        })
    }
}
