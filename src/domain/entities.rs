//! Domain entities: property values and well-known names

use std::fmt;

use serde::{Deserialize, Serialize};

/// Property holding a node's structural type tag.
pub const PN_RESOURCE_TYPE: &str = "sling:resourceType";
/// Property (and JSON member) holding a node's primary type.
pub const PN_PRIMARY_TYPE: &str = "jcr:primaryType";

/// Default primary type; its children are orderable.
pub const NT_UNSTRUCTURED: &str = "nt:unstructured";
/// Primary type whose children carry no ordering.
pub const NT_FOLDER: &str = "nt:folder";

/// Path of the tree root.
pub const ROOT_PATH: &str = "/";

/// Typed property value stored on a node.
///
/// Serializes as a plain JSON scalar or array so fixture documents stay readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Boolean(bool),
    Long(i64),
    Double(f64),
    String(String),
    Strings(Vec<String>),
}

impl PropertyValue {
    /// The value as a single string, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            PropertyValue::Long(v) => Some(*v),
            PropertyValue::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Boolean(v) => write!(f, "{v}"),
            PropertyValue::Long(v) => write!(f, "{v}"),
            PropertyValue::Double(v) => write!(f, "{v}"),
            PropertyValue::String(s) => write!(f, "{s}"),
            PropertyValue::Strings(values) => write!(f, "[{}]", values.join(",")),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Long(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Boolean(value)
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(values: Vec<String>) -> Self {
        PropertyValue::Strings(values)
    }
}

/// Join a parent path and a child name.
pub fn join_path(parent: &str, name: &str) -> String {
    if parent == ROOT_PATH {
        format!("/{name}")
    } else {
        format!("{parent}/{name}")
    }
}

/// Node names are non-empty and never contain a path separator.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('/')
}
