use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Canonical dynamic value shared by both extractors.
///
/// Source attributes and plan `values` are normalized into this shape so rules
/// never need to know which input a resource came from. Numbers are always
/// `f64`; HCL tuples, lists and sets all become `List`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum ConfigValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<ConfigValue>),
    Object(BTreeMap<String, ConfigValue>),
}

/// Prefix and suffix marking an expression that could not be evaluated statically.
const UNRESOLVED_OPEN: &str = "${";
const UNRESOLVED_CLOSE: &str = "}";

impl ConfigValue {
    /// Wraps the source text of an unevaluable expression as `${<text>}`.
    pub fn unresolved(source_text: &str) -> Self {
        ConfigValue::String(format!("{UNRESOLVED_OPEN}{source_text}{UNRESOLVED_CLOSE}"))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ConfigValue::Null)
    }

    /// True for strings carrying the `${...}` marker.
    pub fn is_unresolved(&self) -> bool {
        match self {
            ConfigValue::String(s) => {
                s.starts_with(UNRESOLVED_OPEN) && s.ends_with(UNRESOLVED_CLOSE)
            }
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ConfigValue]> {
        match self {
            ConfigValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, ConfigValue>> {
        match self {
            ConfigValue::Object(map) => Some(map),
            _ => None,
        }
    }
}

impl From<serde_json::Value> for ConfigValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => ConfigValue::Null,
            serde_json::Value::Bool(b) => ConfigValue::Bool(b),
            serde_json::Value::Number(n) => ConfigValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => ConfigValue::String(s),
            serde_json::Value::Array(items) => {
                ConfigValue::List(items.into_iter().map(ConfigValue::from).collect())
            }
            serde_json::Value::Object(map) => ConfigValue::Object(
                map.into_iter()
                    .map(|(k, v)| (k, ConfigValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<hcl::Value> for ConfigValue {
    fn from(value: hcl::Value) -> Self {
        match value {
            hcl::Value::Null => ConfigValue::Null,
            hcl::Value::Bool(b) => ConfigValue::Bool(b),
            hcl::Value::Number(n) => ConfigValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            hcl::Value::String(s) => ConfigValue::String(s),
            hcl::Value::Array(items) => {
                ConfigValue::List(items.into_iter().map(ConfigValue::from).collect())
            }
            hcl::Value::Object(map) => ConfigValue::Object(
                map.into_iter()
                    .map(|(k, v)| (k, ConfigValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        ConfigValue::Number(value)
    }
}
