use std::collections::{BTreeMap, HashSet};
use std::fmt;

use generational_arena::{Arena, Index};
use termtree::Tree;
use tracing::{instrument, trace};

use crate::domain::entities::{
    is_valid_name, join_path, PropertyValue, NT_UNSTRUCTURED, PN_RESOURCE_TYPE, ROOT_PATH,
};
use crate::domain::error::{DomainError, DomainResult};

/// Stable handle of a node in a [`ContentTree`].
///
/// Handles of removed nodes go stale; lookups through them fail instead of
/// reaching a recycled slot.
pub type NodeId = Index;

/// Tree node in the arena-based content structure.
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// Name, unique among the parent's children (empty for the root)
    pub name: String,
    /// Primary type, decides whether the children are orderable
    pub primary_type: String,
    /// Properties by name
    pub properties: BTreeMap<String, PropertyValue>,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<NodeId>,
    /// Indices of child nodes in the arena, in sibling order
    pub children: Vec<NodeId>,
}

impl TreeNode {
    fn new(name: &str, primary_type: &str, parent: Option<NodeId>) -> Self {
        Self {
            name: name.to_string(),
            primary_type: primary_type.to_string(),
            properties: BTreeMap::new(),
            parent,
            children: Vec::new(),
        }
    }

    /// The structural type tag, if the node declares one.
    pub fn resource_type(&self) -> Option<&str> {
        self.properties
            .get(PN_RESOURCE_TYPE)
            .and_then(PropertyValue::as_str)
    }
}

/// Arena-based content tree.
///
/// All mutation goes through name/path addressed primitives; nodes never
/// hold references to each other, only indices.
#[derive(Debug, Clone)]
pub struct ContentTree {
    /// Arena storage for all tree nodes
    arena: Arena<TreeNode>,
    /// Index of the root node
    root: NodeId,
    /// Primary types whose children are orderable
    orderable_types: HashSet<String>,
}

impl Default for ContentTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentTree {
    /// Create a tree holding only an orderable root.
    pub fn new() -> Self {
        Self::with_root_type(NT_UNSTRUCTURED)
    }

    pub fn with_root_type(primary_type: &str) -> Self {
        let mut arena = Arena::new();
        let root = arena.insert(TreeNode::new("", primary_type, None));
        let mut orderable_types = HashSet::new();
        orderable_types.insert(NT_UNSTRUCTURED.to_string());
        Self {
            arena,
            root,
            orderable_types,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.len() <= 1
    }

    pub fn get_node(&self, id: NodeId) -> Option<&TreeNode> {
        self.arena.get(id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains(id)
    }

    fn node(&self, id: NodeId) -> DomainResult<&TreeNode> {
        self.arena
            .get(id)
            .ok_or_else(|| DomainError::NodeNotFound(format!("{id:?}")))
    }

    fn node_mut(&mut self, id: NodeId) -> DomainResult<&mut TreeNode> {
        self.arena
            .get_mut(id)
            .ok_or_else(|| DomainError::NodeNotFound(format!("{id:?}")))
    }

    /// Declare that nodes of `primary_type` keep their children ordered.
    pub fn add_orderable_type(&mut self, primary_type: &str) {
        self.orderable_types.insert(primary_type.to_string());
    }

    /// Whether the children of `id` are orderable.
    pub fn is_orderable(&self, id: NodeId) -> bool {
        self.arena
            .get(id)
            .map(|n| self.orderable_types.contains(&n.primary_type))
            .unwrap_or(false)
    }

    pub fn name(&self, id: NodeId) -> DomainResult<&str> {
        Ok(&self.node(id)?.name)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> DomainResult<&[NodeId]> {
        Ok(&self.node(id)?.children)
    }

    /// Snapshot of the child names in sibling order.
    pub fn child_names(&self, id: NodeId) -> DomainResult<Vec<String>> {
        let node = self.node(id)?;
        Ok(node
            .children
            .iter()
            .filter_map(|&c| self.arena.get(c))
            .map(|c| c.name.clone())
            .collect())
    }

    pub fn child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.arena.get(parent)?.children.iter().copied().find(|&c| {
            self.arena
                .get(c)
                .map(|child| child.name == name)
                .unwrap_or(false)
        })
    }

    /// Current path of a node, recomputed from its parent chain.
    pub fn path(&self, id: NodeId) -> DomainResult<String> {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(idx) = current {
            let node = self.node(idx)?;
            if node.parent.is_some() {
                names.push(node.name.as_str());
            }
            current = node.parent;
        }
        if names.is_empty() {
            return Ok(ROOT_PATH.to_string());
        }
        names.reverse();
        Ok(format!("/{}", names.join("/")))
    }

    /// Resolve an absolute path to a node.
    pub fn find(&self, path: &str) -> Option<NodeId> {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(self.root, |current, segment| self.child(current, segment))
    }

    pub fn property(&self, id: NodeId, name: &str) -> Option<&PropertyValue> {
        self.arena.get(id)?.properties.get(name)
    }

    pub fn set_property(
        &mut self,
        id: NodeId,
        name: &str,
        value: impl Into<PropertyValue>,
    ) -> DomainResult<()> {
        self.node_mut(id)?
            .properties
            .insert(name.to_string(), value.into());
        Ok(())
    }

    pub fn remove_property(&mut self, id: NodeId, name: &str) -> DomainResult<Option<PropertyValue>> {
        Ok(self.node_mut(id)?.properties.remove(name))
    }

    pub fn resource_type(&self, id: NodeId) -> Option<&str> {
        self.arena.get(id)?.resource_type()
    }

    /// Append a new child at the end of `parent`'s children.
    #[instrument(level = "trace", skip(self))]
    pub fn add_child(&mut self, parent: NodeId, name: &str, primary_type: &str) -> DomainResult<NodeId> {
        if !is_valid_name(name) {
            return Err(DomainError::InvalidName(name.to_string()));
        }
        self.node(parent)?;
        if self.child(parent, name).is_some() {
            return Err(DomainError::ChildExists {
                parent: self.path(parent)?,
                name: name.to_string(),
            });
        }
        let idx = self.arena.insert(TreeNode::new(name, primary_type, Some(parent)));
        self.node_mut(parent)?.children.push(idx);
        Ok(idx)
    }

    /// Remove a node together with its whole subtree.
    #[instrument(level = "trace", skip(self))]
    pub fn remove(&mut self, id: NodeId) -> DomainResult<()> {
        let parent = match self.node(id)?.parent {
            Some(parent) => parent,
            None => return Err(DomainError::RootOperation(ROOT_PATH.to_string())),
        };
        let doomed: Vec<NodeId> = self.iter_subtree(id).map(|(idx, _)| idx).collect();
        self.node_mut(parent)?.children.retain(|&c| c != id);
        for idx in doomed {
            self.arena.remove(idx);
        }
        Ok(())
    }

    /// Move a node (keeping its name) to the end of `new_parent`'s children.
    #[instrument(level = "trace", skip(self))]
    pub fn move_to(&mut self, id: NodeId, new_parent: NodeId) -> DomainResult<()> {
        let old_parent = match self.node(id)?.parent {
            Some(parent) => parent,
            None => return Err(DomainError::RootOperation(ROOT_PATH.to_string())),
        };
        self.node(new_parent)?;
        if self.is_in_subtree(new_parent, id) {
            return Err(DomainError::InvalidMove {
                node: self.path(id)?,
                target: self.path(new_parent)?,
            });
        }
        let name = self.node(id)?.name.clone();
        if old_parent != new_parent && self.child(new_parent, &name).is_some() {
            return Err(DomainError::ChildExists {
                parent: self.path(new_parent)?,
                name,
            });
        }
        self.node_mut(old_parent)?.children.retain(|&c| c != id);
        self.node_mut(new_parent)?.children.push(id);
        self.node_mut(id)?.parent = Some(new_parent);
        Ok(())
    }

    /// Reorder `name` to sit immediately before `before`, or last when `before` is None.
    #[instrument(level = "trace", skip(self))]
    pub fn order_before(&mut self, parent: NodeId, name: &str, before: Option<&str>) -> DomainResult<()> {
        let parent_path = self.path(parent)?;
        let moving = self
            .child(parent, name)
            .ok_or_else(|| DomainError::NodeNotFound(join_path(&parent_path, name)))?;
        if before == Some(name) {
            return Ok(());
        }
        let anchor = match before {
            Some(before) => Some(
                self.child(parent, before)
                    .ok_or_else(|| DomainError::NodeNotFound(join_path(&parent_path, before)))?,
            ),
            None => None,
        };
        let children = &mut self.node_mut(parent)?.children;
        children.retain(|&c| c != moving);
        match anchor.and_then(|a| children.iter().position(|&c| c == a)) {
            Some(pos) => children.insert(pos, moving),
            None => children.push(moving),
        }
        trace!("ordered {} before {:?} in {}", name, before, parent_path);
        Ok(())
    }

    /// First free child name: `hint`, then `hint0`, `hint1`, ...
    pub fn unique_child_name(&self, parent: NodeId, hint: &str) -> String {
        if self.child(parent, hint).is_none() {
            return hint.to_string();
        }
        (0..)
            .map(|i| format!("{hint}{i}"))
            .find(|candidate| self.child(parent, candidate).is_none())
            .unwrap_or_else(|| hint.to_string())
    }

    fn is_in_subtree(&self, candidate: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(candidate);
        while let Some(idx) = current {
            if idx == ancestor {
                return true;
            }
            current = self.parent(idx);
        }
        false
    }

    /// Pre-order iteration over the subtree rooted at `id`.
    pub fn iter_subtree(&self, id: NodeId) -> TreeIterator<'_> {
        TreeIterator::new(self, id)
    }

    pub fn depth(&self) -> usize {
        self.calculate_depth(self.root)
    }

    fn calculate_depth(&self, node_idx: NodeId) -> usize {
        if let Some(node) = self.get_node(node_idx) {
            1 + node
                .children
                .iter()
                .map(|&child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }

    /// Render the subtree at `id` for display.
    pub fn to_tree_string(&self, id: NodeId) -> Tree<String> {
        let label = match self.get_node(id) {
            Some(node) => {
                let name = if node.parent.is_none() { ROOT_PATH } else { node.name.as_str() };
                match node.resource_type() {
                    Some(rt) => format!("{name} [{rt}]"),
                    None => name.to_string(),
                }
            }
            None => "<removed>".to_string(),
        };
        let leaves: Vec<_> = self
            .get_node(id)
            .map(|n| n.children.iter().map(|&c| self.to_tree_string(c)).collect())
            .unwrap_or_default();
        Tree::new(label).with_leaves(leaves)
    }
}

impl fmt::Display for ContentTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_tree_string(self.root))
    }
}

pub struct TreeIterator<'a> {
    tree: &'a ContentTree,
    stack: Vec<NodeId>,
}

impl<'a> TreeIterator<'a> {
    fn new(tree: &'a ContentTree, start: NodeId) -> Self {
        let mut stack = Vec::new();
        if tree.contains(start) {
            stack.push(start);
        }
        Self { tree, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (NodeId, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.tree.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}
