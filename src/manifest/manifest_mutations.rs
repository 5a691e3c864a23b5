//! Mutation operations for manifest data.
//!
//! All writes the workflows make to the manifest go through these methods:
//! - Adding a requirement to `require` / `require-dev`
//! - Removing a requirement
//! - Dropping the optional-package extension metadata

use crate::manifest::{ExtensionKeys, Manifest};
use serde_json::{Map, Value};

impl Manifest {
    /// Set `section.name` to `constraint`, replacing any previous value.
    ///
    /// A missing or non-object section is replaced by a fresh object.
    pub fn set_requirement(&mut self, section: &str, name: &str, constraint: &str) {
        let entry = self.document.entry(section.to_string()).or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        if let Value::Object(requirements) = entry {
            requirements.insert(name.to_string(), Value::String(constraint.to_string()));
        }
    }

    /// Remove `section.name`. Returns whether an entry was removed.
    pub fn remove_requirement(&mut self, section: &str, name: &str) -> bool {
        self.document
            .get_mut(section)
            .and_then(Value::as_object_mut)
            .is_some_and(|requirements| requirements.shift_remove(name).is_some())
    }

    /// Remove every extension key from `extra`, and `extra` itself once it
    /// is empty. Idempotent.
    pub fn remove_extension_metadata(&mut self, keys: &ExtensionKeys) {
        let now_empty = match self.document.get_mut("extra").and_then(Value::as_object_mut) {
            Some(extra) => {
                for key in keys.all() {
                    extra.shift_remove(key);
                }
                extra.is_empty()
            }
            None => false,
        };

        if now_empty {
            self.document.shift_remove("extra");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn manifest(value: Value) -> Manifest {
        Manifest::from_value(value).unwrap()
    }

    #[test]
    fn test_set_requirement_creates_section() {
        let mut m = manifest(json!({"name": "a/b"}));
        m.set_requirement("require-dev", "vendor/debug", "^1.0");
        assert_eq!(m.requirement("require-dev", "vendor/debug"), Some("^1.0"));
    }

    #[test]
    fn test_set_requirement_last_write_wins() {
        let mut m = manifest(json!({"require": {"vendor/db": "^1.0", "php": "^8.1"}}));
        m.set_requirement("require", "vendor/db", "^2.5");
        assert_eq!(m.requirement("require", "vendor/db"), Some("^2.5"));
        // Position of the existing key is kept
        assert_eq!(m.requirements("require")[0].0, "vendor/db");
    }

    #[test]
    fn test_remove_requirement() {
        let mut m = manifest(json!({"require": {"vendor/db": "^1.0"}}));
        assert!(m.remove_requirement("require", "vendor/db"));
        assert!(!m.remove_requirement("require", "vendor/db"));
        assert!(!m.remove_requirement("require-dev", "vendor/db"));
        assert_eq!(m.into_value(), json!({"require": {}}));
    }

    #[test]
    fn test_remove_extension_metadata_keeps_other_extra_keys() {
        let mut m = manifest(json!({
            "extra": {
                "laminas-skeleton-installer": [],
                "zend-skeleton-installer": [],
                "branch-alias": {"dev-main": "1.0-dev"}
            }
        }));
        m.remove_extension_metadata(&ExtensionKeys::default());
        assert_eq!(m.into_value(), json!({"extra": {"branch-alias": {"dev-main": "1.0-dev"}}}));
    }

    #[test]
    fn test_remove_extension_metadata_drops_empty_extra() {
        let mut m = manifest(json!({"name": "a/b", "extra": {"laminas-skeleton-installer": []}}));
        m.remove_extension_metadata(&ExtensionKeys::default());
        m.remove_extension_metadata(&ExtensionKeys::default());
        assert_eq!(m.into_value(), json!({"name": "a/b"}));
    }
}
