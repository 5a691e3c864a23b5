//! Project manifest handling.
//!
//! The manifest is the project's JSON dependency document (`composer.json`).
//! It is kept as an untyped, order-preserving JSON object so that keys this
//! crate knows nothing about survive a rewrite untouched. Only a handful of
//! paths are read or written:
//!
//! - `name`
//! - `require.<name>` / `require-dev.<name>` - constraint strings
//! - `extra.<extension-key>` - optional-package declarations (plus legacy aliases)
//!
//! # Structure
//!
//! ```json
//! {
//!     "name": "acme/skeleton",
//!     "require": { "php": "^8.1" },
//!     "extra": {
//!         "laminas-skeleton-installer": [
//!             { "name": "vendor/db", "constraint": "^2.5", "prompt": "Install DB support?" }
//!         ]
//!     }
//! }
//! ```
//!
//! Reading and writing go through [`ManifestStore`]; [`JsonManifestFile`] is
//! the file-backed implementation.

pub mod manifest_io;
pub mod manifest_mutations;

pub use manifest_io::{JsonManifestFile, ManifestStore};

use crate::collection::json_type_name;
use crate::constants::{EXTENSION_KEY, LEGACY_EXTENSION_KEY};
use crate::core::SkeletonError;
use serde_json::{Map, Value};

/// Parsed manifest document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Manifest {
    document: Map<String, Value>,
}

impl Manifest {
    /// Create an empty manifest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a JSON value; the top level must be an object.
    pub fn from_value(value: Value) -> Result<Self, SkeletonError> {
        match value {
            Value::Object(document) => Ok(Self {
                document,
            }),
            other => Err(SkeletonError::ManifestParseError {
                file: "<memory>".to_string(),
                reason: format!("expected a JSON object, found {}", json_type_name(&other)),
            }),
        }
    }

    /// The whole document.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.document
    }

    /// Consume the manifest, returning the document as a JSON value.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.document)
    }

    /// Package name, if declared.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.document.get("name").and_then(Value::as_str)
    }

    /// The `extra` section, if it is an object.
    #[must_use]
    pub fn extra(&self) -> Option<&Map<String, Value>> {
        self.document.get("extra").and_then(Value::as_object)
    }

    /// `(name, constraint)` pairs of a requirement section, in order.
    ///
    /// Non-string constraints are skipped.
    #[must_use]
    pub fn requirements(&self, section: &str) -> Vec<(String, String)> {
        self.document
            .get(section)
            .and_then(Value::as_object)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|(name, constraint)| {
                        constraint.as_str().map(|c| (name.clone(), c.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Constraint declared for `name` in `section`.
    #[must_use]
    pub fn requirement(&self, section: &str, name: &str) -> Option<&str> {
        self.document.get(section)?.as_object()?.get(name)?.as_str()
    }
}

/// The `extra` keys optional packages may be declared under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionKeys {
    /// Key looked up first
    pub canonical: String,
    /// Fallback keys, looked up in order
    pub legacy: Vec<String>,
}

impl Default for ExtensionKeys {
    fn default() -> Self {
        Self {
            canonical: EXTENSION_KEY.to_string(),
            legacy: vec![LEGACY_EXTENSION_KEY.to_string()],
        }
    }
}

impl ExtensionKeys {
    /// Every key, canonical first.
    pub fn all(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.canonical.as_str()).chain(self.legacy.iter().map(String::as_str))
    }

    /// The raw optional-package specs declared in `extra`.
    ///
    /// The first key holding a list wins. A key holding anything other than
    /// a list is treated as absent.
    #[must_use]
    pub fn find_specs<'a>(&self, extra: &'a Map<String, Value>) -> Option<&'a Vec<Value>> {
        self.all().find_map(|key| extra.get(key).and_then(Value::as_array))
    }
}
