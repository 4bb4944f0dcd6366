//! Deserialization helpers for the settings file

use indexmap::IndexMap;
use serde::de::{self, MapAccess, Visitor};
use serde::Deserializer;
use serde_yaml::Value;
use std::fmt;

/// Deserialize the flat `properties` map.
///
/// Scalar values of any YAML type are kept as their string form, so
/// `auto.deploy.startlevel: 4` and `auto.deploy.startlevel: "4"` are the
/// same. Key order is preserved.
pub fn deserialize_properties<'de, D>(
    deserializer: D,
) -> std::result::Result<IndexMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct PropertiesVisitor;

    impl<'de> Visitor<'de> for PropertiesVisitor {
        type Value = IndexMap<String, String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a map of property names to scalar values")
        }

        fn visit_unit<E>(self) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(IndexMap::new())
        }

        fn visit_map<M>(self, mut map: M) -> std::result::Result<Self::Value, M::Error>
        where
            M: MapAccess<'de>,
        {
            let mut properties = IndexMap::new();
            while let Some((key, value)) = map.next_entry::<String, Value>()? {
                let value = scalar_to_string(&value).ok_or_else(|| {
                    de::Error::custom(format!("property '{}' must be a scalar value", key))
                })?;
                properties.insert(key, value);
            }
            Ok(properties)
        }
    }

    deserializer.deserialize_any(PropertiesVisitor)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}
