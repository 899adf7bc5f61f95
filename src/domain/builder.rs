//! Tree builder for loading content trees from JSON documents.
//!
//! Document shape: `jcr:primaryType` names the primary type, nested objects are
//! children in document order, every other member is a property.

use serde_json::{Map, Value};
use tracing::{instrument, trace};

use crate::domain::arena::{ContentTree, NodeId};
use crate::domain::entities::{PropertyValue, NT_UNSTRUCTURED, PN_PRIMARY_TYPE};
use crate::domain::error::{DomainError, DomainResult};

/// Constructs [`ContentTree`]s from JSON.
#[derive(Debug, Clone, Default)]
pub struct TreeBuilder {
    orderable_types: Vec<String>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Additional primary types whose children are orderable in built trees.
    pub fn with_orderable_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.orderable_types.extend(types.into_iter().map(Into::into));
        self
    }

    pub fn from_json_str(&self, json: &str) -> DomainResult<ContentTree> {
        let value: Value = serde_json::from_str(json).map_err(|e| DomainError::InvalidDocument {
            message: e.to_string(),
        })?;
        self.from_json_value(&value)
    }

    #[instrument(level = "debug", skip_all)]
    pub fn from_json_value(&self, value: &Value) -> DomainResult<ContentTree> {
        let object = value.as_object().ok_or_else(|| DomainError::InvalidDocument {
            message: "document root must be an object".to_string(),
        })?;
        let mut tree = ContentTree::with_root_type(primary_type_of(object)?);
        for primary_type in &self.orderable_types {
            tree.add_orderable_type(primary_type);
        }
        let root = tree.root();
        populate(&mut tree, root, object)?;
        trace!("built tree with {} nodes", tree.len());
        Ok(tree)
    }
}

fn primary_type_of(object: &Map<String, Value>) -> DomainResult<&str> {
    match object.get(PN_PRIMARY_TYPE) {
        None => Ok(NT_UNSTRUCTURED),
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(DomainError::InvalidDocument {
            message: format!("{PN_PRIMARY_TYPE} must be a string, got {other}"),
        }),
    }
}

fn populate(tree: &mut ContentTree, node: NodeId, object: &Map<String, Value>) -> DomainResult<()> {
    for (key, value) in object {
        if key == PN_PRIMARY_TYPE {
            continue;
        }
        match value {
            Value::Object(child) => {
                let id = tree.add_child(node, key, primary_type_of(child)?)?;
                populate(tree, id, child)?;
            }
            other => {
                let property = property_value(key, other)?;
                tree.set_property(node, key, property)?;
            }
        }
    }
    Ok(())
}

fn property_value(key: &str, value: &Value) -> DomainResult<PropertyValue> {
    serde_json::from_value(value.clone()).map_err(|_| DomainError::InvalidDocument {
        message: format!("unsupported value for property '{key}': {value}"),
    })
}

impl ContentTree {
    /// Serialize the subtree at `id` back into the document shape [`TreeBuilder`] reads.
    pub fn to_json(&self, id: NodeId) -> DomainResult<Value> {
        let node = self
            .get_node(id)
            .ok_or_else(|| DomainError::NodeNotFound(format!("{id:?}")))?;
        let mut object = Map::new();
        object.insert(
            PN_PRIMARY_TYPE.to_string(),
            Value::String(node.primary_type.clone()),
        );
        for (name, value) in &node.properties {
            let value = serde_json::to_value(value).map_err(|e| DomainError::InvalidDocument {
                message: e.to_string(),
            })?;
            object.insert(name.clone(), value);
        }
        for &child in &node.children {
            let name = self.name(child)?.to_string();
            object.insert(name, self.to_json(child)?);
        }
        Ok(Value::Object(object))
    }
}
