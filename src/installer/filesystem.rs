//! Installation manager working directly on the vendor directory.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::SkeletonError;
use crate::lockfile::{InstalledPackage, InstalledRepository};
use crate::utils::fs::remove_dir_and_empty_parents;

use super::InstallationManager;

/// Uninstalls packages by deleting `<vendor-dir>/<name>`.
///
/// Empty vendor namespace directories left behind are removed too; the
/// vendor directory itself is kept.
#[derive(Debug, Clone)]
pub struct FilesystemInstallationManager {
    vendor_dir: PathBuf,
}

impl FilesystemInstallationManager {
    /// Manager for packages installed under `vendor_dir`.
    pub fn new(vendor_dir: impl Into<PathBuf>) -> Self {
        Self {
            vendor_dir: vendor_dir.into(),
        }
    }

    /// Directory `package` is installed in.
    ///
    /// Every `/`-separated segment of the name must be a plain directory
    /// name: no empty, `.`, `..`, rooted or drive-prefixed segments.
    pub fn install_path(&self, package: &InstalledPackage) -> Result<PathBuf, SkeletonError> {
        let name = package.name();
        let unsafe_path = || SkeletonError::UnsafePackagePath {
            name: name.to_string(),
        };

        let mut path = self.vendor_dir.clone();
        for segment in name.split('/') {
            if segment.contains('\\') {
                return Err(unsafe_path());
            }
            let mut components = Path::new(segment).components();
            match (components.next(), components.next()) {
                (Some(Component::Normal(part)), None) if part == segment => path.push(part),
                _ => return Err(unsafe_path()),
            }
        }
        Ok(path)
    }

    /// Vendor directory.
    #[must_use]
    pub fn vendor_dir(&self) -> &Path {
        &self.vendor_dir
    }
}

impl InstallationManager for FilesystemInstallationManager {
    fn uninstall(
        &mut self,
        repository: &mut dyn InstalledRepository,
        package: &InstalledPackage,
    ) -> Result<()> {
        let path = self.install_path(package)?;
        tracing::debug!(package = package.name(), path = %path.display(), "uninstalling package");

        remove_dir_and_empty_parents(&path, &self.vendor_dir)
            .with_context(|| format!("Failed to uninstall {}", package.name()))?;
        repository.remove_package(package.name());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lockfile::{LockedPackage, LockedRepository};
    use tempfile::tempdir;

    fn installed(name: &str) -> InstalledPackage {
        InstalledPackage::Package {
            package: LockedPackage::new(name, "1.0.0"),
            dev: false,
        }
    }

    #[test]
    fn test_uninstall_removes_directory_and_repository_entry() {
        let temp = tempdir().unwrap();
        let vendor = temp.path().join("vendor");
        std::fs::create_dir_all(vendor.join("acme/installer/src")).unwrap();
        std::fs::create_dir_all(vendor.join("other/lib")).unwrap();

        let plugin = installed("acme/installer");
        let mut repository = LockedRepository::new(vec![plugin.clone(), installed("other/lib")]);
        let mut manager = FilesystemInstallationManager::new(&vendor);

        manager.uninstall(&mut repository, &plugin).unwrap();

        assert!(!vendor.join("acme").exists());
        assert!(vendor.join("other/lib").exists());
        let names: Vec<String> =
            repository.packages().iter().map(|package| package.name().to_string()).collect();
        assert_eq!(names, vec!["other/lib"]);
    }

    #[test]
    fn test_uninstall_missing_directory_still_updates_repository() {
        let temp = tempdir().unwrap();
        let plugin = installed("acme/installer");
        let mut repository = LockedRepository::new(vec![plugin.clone()]);
        let mut manager = FilesystemInstallationManager::new(temp.path().join("vendor"));

        manager.uninstall(&mut repository, &plugin).unwrap();
        assert!(repository.packages().is_empty());
    }

    #[test]
    fn test_install_path_rejects_escaping_names() {
        let temp = tempdir().unwrap();
        let vendor = temp.path().join("vendor");
        std::fs::create_dir_all(temp.path().join("precious")).unwrap();
        let manager = FilesystemInstallationManager::new(&vendor);

        assert_eq!(manager.install_path(&installed("acme/installer")).unwrap(), vendor.join("acme/installer"));
        for name in ["../precious", "acme/..", "/etc/passwd", "acme//lib", "./acme", "", "acme\\..\\.."] {
            assert_eq!(
                manager.install_path(&installed(name)).unwrap_err(),
                SkeletonError::UnsafePackagePath {
                    name: name.to_string()
                },
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_uninstall_refuses_to_leave_vendor_dir() {
        let temp = tempdir().unwrap();
        let vendor = temp.path().join("vendor");
        std::fs::create_dir_all(temp.path().join("precious")).unwrap();
        let escaping = installed("../precious");
        let mut repository = LockedRepository::new(vec![escaping.clone()]);
        let mut manager = FilesystemInstallationManager::new(&vendor);

        let error = manager.uninstall(&mut repository, &escaping).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<SkeletonError>(),
            Some(SkeletonError::UnsafePackagePath { .. })
        ));
        assert!(temp.path().join("precious").exists());
        assert_eq!(repository.packages().len(), 1);
    }
}
