//! Optional package descriptors.
//!
//! A skeleton declares its optional packages as raw JSON objects under the
//! manifest's extension key:
//!
//! ```json
//! { "name": "vendor/db", "constraint": "^2.5", "prompt": "Install DB support?", "dev": false, "module": true }
//! ```
//!
//! Raw specs are checked once with [`is_valid_spec`] and then turned into
//! immutable [`OptionalPackage`] values. Specs that fail the check are dropped
//! by the caller; they never abort a run.
//!
//! The `dev` and `module` flags accept loosely typed values and go through
//! [`is_truthy`], a total conversion over every JSON shape.

pub mod link;

use crate::core::SkeletonError;
use serde_json::{Map, Value};

/// Raw optional-package spec as found in the manifest.
pub type RawSpec = Map<String, Value>;

/// Keys every spec must carry.
pub const REQUIRED_KEYS: [&str; 3] = ["name", "constraint", "prompt"];

/// Whether `spec` carries `name`, `constraint` and `prompt`.
///
/// Only presence is checked; value types and emptiness are not.
#[must_use]
pub fn is_valid_spec(spec: &Value) -> bool {
    spec.as_object().is_some_and(|spec| REQUIRED_KEYS.iter().all(|key| spec.contains_key(*key)))
}

/// Boolean coercion for the `dev` and `module` flags.
///
/// | Input | Result |
/// |---|---|
/// | absent, `null`, `false` | `false` |
/// | `0`, `0.0` | `false` |
/// | `""`, `"0"` | `false` |
/// | `[]`, `{}` | `false` |
/// | anything else | `true` |
#[must_use]
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(text)) => !(text.is_empty() || text == "0"),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(members)) => !members.is_empty(),
    }
}

/// A validated optional package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionalPackage {
    name: String,
    constraint: String,
    prompt: String,
    dev: bool,
    module: bool,
}

impl OptionalPackage {
    /// Build a package from a raw spec.
    ///
    /// Callers are expected to have filtered with [`is_valid_spec`] first; a
    /// missing required key here is a precondition violation reported as
    /// [`SkeletonError::InvalidSpec`]. Non-string values for the required
    /// keys are rendered as their JSON text.
    pub fn from_spec(spec: &Value) -> Result<Self, SkeletonError> {
        let Some(spec) = spec.as_object() else {
            return Err(SkeletonError::InvalidSpec {
                key: REQUIRED_KEYS[0].to_string(),
            });
        };

        let required = |key: &str| {
            spec.get(key).map(text_of).ok_or_else(|| SkeletonError::InvalidSpec {
                key: key.to_string(),
            })
        };

        Ok(Self {
            name: required("name")?,
            constraint: required("constraint")?,
            prompt: required("prompt")?,
            dev: is_truthy(spec.get("dev")),
            module: is_truthy(spec.get("module")),
        })
    }

    /// Package name, e.g. `vendor/package`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Version constraint, verbatim.
    #[must_use]
    pub fn constraint(&self) -> &str {
        &self.constraint
    }

    /// Question shown to the user.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Whether this is a development-only dependency.
    #[must_use]
    pub fn is_dev(&self) -> bool {
        self.dev
    }

    /// Whether selecting this package also needs module wiring.
    #[must_use]
    pub fn is_module(&self) -> bool {
        self.module
    }

    /// Manifest section the package belongs in.
    #[must_use]
    pub fn require_section(&self) -> &'static str {
        if self.dev { "require-dev" } else { "require" }
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
