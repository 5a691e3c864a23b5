//! File system utilities.
//!
//! Atomic writes and JSON helpers shared by the manifest and lock file
//! stores. Every write goes through [`atomic_write`], so readers never see a
//! half-written `composer.json`.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs;
use std::path::Path;

/// Indentation used for JSON documents, matching the package manager's own output.
pub const JSON_INDENT: &[u8] = b"    ";

/// Ensures a directory exists, creating it and its parents if necessary.
///
/// Fails if `path` exists but is not a directory.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    } else if !path.is_dir() {
        return Err(anyhow::anyhow!("Path exists but is not a directory: {}", path.display()));
    }
    Ok(())
}

/// Atomically writes bytes to a file using a write-then-rename strategy.
///
/// 1. Write content to a sibling `.tmp` file
/// 2. Sync it to disk
/// 3. Rename it over the target
///
/// Parent directories are created when missing.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    use std::io::Write;

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }

    let temp_path = path.with_extension("tmp");

    {
        let mut file = fs::File::create(&temp_path).with_context(|| {
            format!(
                "Failed to create temp file: {}\n\nCheck file permissions and that directory exists",
                temp_path.display()
            )
        })?;

        file.write_all(content)
            .with_context(|| format!("Failed to write to temp file: {}", temp_path.display()))?;

        file.sync_all().with_context(|| "Failed to sync file to disk")?;
    }

    fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to rename temp file to: {}", path.display()))?;

    Ok(())
}

/// Serializes `data` as JSON with four-space indentation and a trailing
/// newline. Slashes and non-ASCII characters are written unescaped.
pub fn to_json_pretty<T>(data: &T) -> Result<String>
where
    T: Serialize + ?Sized,
{
    let mut buffer = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(JSON_INDENT));
    data.serialize(&mut serializer).context("Failed to serialize JSON")?;
    buffer.push(b'\n');
    String::from_utf8(buffer).context("Serialized JSON is not valid UTF-8")
}

/// Writes `data` as pretty JSON, atomically.
pub fn write_json_file<T>(path: &Path, data: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let json = to_json_pretty(data)?;
    atomic_write(path, json.as_bytes())
        .with_context(|| format!("Failed to write JSON file: {}", path.display()))
}

/// Removes a directory tree. Missing directories are not an error.
pub fn remove_dir_all(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)
            .with_context(|| format!("Failed to remove directory: {}", path.display()))?;
    }
    Ok(())
}

/// Removes `path` and then every empty parent up to (not including) `stop_at`.
pub fn remove_dir_and_empty_parents(path: &Path, stop_at: &Path) -> Result<()> {
    remove_dir_all(path)?;

    let mut current = path.parent();
    while let Some(dir) = current {
        if dir == stop_at || !dir.starts_with(stop_at) {
            break;
        }
        let is_empty = fs::read_dir(dir).map(|mut entries| entries.next().is_none()).unwrap_or(false);
        if !is_empty {
            break;
        }
        fs::remove_dir(dir).with_context(|| format!("Failed to remove directory: {}", dir.display()))?;
        current = dir.parent();
    }
    Ok(())
}
