//! Serde adapters for lock file quirks.

/// Maps the host writes as `[]` when they are empty.
pub mod map_or_list {
    use serde::de::{Deserializer, Error};
    use serde::ser::Serializer;
    use serde::{Deserialize, Serialize};
    use serde_json::{Map, Value};

    pub fn serialize<S>(map: &Map<String, Value>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if map.is_empty() {
            Vec::<Value>::new().serialize(serializer)
        } else {
            map.serialize(serializer)
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Object(map) => Ok(map),
            Value::Array(items) if items.is_empty() => Ok(Map::new()),
            Value::Null => Ok(Map::new()),
            other => Err(D::Error::custom(format!("expected an object, found {other}"))),
        }
    }
}
