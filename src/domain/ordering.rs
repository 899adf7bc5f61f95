//! Sibling position capture and restore around a rewrite.
//!
//! Rewrites usually append their result at the end of the parent's child list.
//! An [`OrderingToken`] taken before the rewrite puts the result back where the
//! original node was.

use tracing::{instrument, trace};

use crate::domain::arena::{ContentTree, NodeId};
use crate::domain::error::{DomainError, DomainResult};

/// Required sibling position of one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderingToken {
    /// Parent does not keep its children ordered.
    NonOrderable,
    /// Node must be the first child.
    First,
    /// Node must immediately follow the named sibling.
    Middle(String),
}

impl OrderingToken {
    /// Snapshot the current position of `node` among its siblings.
    ///
    /// The root and children of non-orderable parents yield [`OrderingToken::NonOrderable`].
    pub fn capture(tree: &ContentTree, node: NodeId) -> DomainResult<Self> {
        let name = tree.name(node)?.to_string();
        let parent = match tree.parent(node) {
            Some(parent) if tree.is_orderable(parent) => parent,
            _ => return Ok(OrderingToken::NonOrderable),
        };
        let siblings = tree.child_names(parent)?;
        let position = siblings
            .iter()
            .position(|s| *s == name)
            .ok_or_else(|| DomainError::NodeNotFound(name.clone()))?;
        Ok(match position {
            0 => OrderingToken::First,
            n => OrderingToken::Middle(siblings[n - 1].clone()),
        })
    }

    /// Move `node` back to the captured position, judged against the current siblings.
    #[instrument(level = "trace", skip(tree))]
    pub fn apply(&self, tree: &mut ContentTree, node: NodeId) -> DomainResult<()> {
        if *self == OrderingToken::NonOrderable {
            return Ok(());
        }
        let parent = match tree.parent(node) {
            Some(parent) if tree.is_orderable(parent) => parent,
            _ => return Ok(()),
        };
        let name = tree.name(node)?.to_string();
        let siblings = tree.child_names(parent)?;

        match self {
            OrderingToken::NonOrderable => Ok(()),
            OrderingToken::First => match siblings.first() {
                Some(first) if *first != name => {
                    trace!("restoring {} as first child", name);
                    tree.order_before(parent, &name, Some(first.as_str()))
                }
                _ => Ok(()),
            },
            OrderingToken::Middle(previous) => {
                let Some(pos) = siblings.iter().position(|s| s == previous) else {
                    // previous sibling is gone, keep wherever the rewrite left us
                    return Ok(());
                };
                match siblings.get(pos + 1) {
                    Some(next) if *next == name => Ok(()),
                    Some(next) => {
                        trace!("restoring {} after {}", name, previous);
                        tree.order_before(parent, &name, Some(next.as_str()))
                    }
                    None => tree.order_before(parent, &name, None),
                }
            }
        }
    }
}
