//! Swaps one structural type tag for another.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::error_ext::DomainResultExt;
use crate::application::rule::{FinalPaths, RewriteRule};
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{ContentTree, NodeId, PN_RESOURCE_TYPE};
use crate::infrastructure::traits::{type_chain_contains, TypeResolver};

pub struct ReplaceTypeRule {
    id: String,
    priority: i32,
    from: String,
    to: String,
    resolver: Arc<dyn TypeResolver>,
}

impl std::fmt::Debug for ReplaceTypeRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplaceTypeRule")
            .field("id", &self.id)
            .field("from", &self.from)
            .field("to", &self.to)
            .finish()
    }
}

impl ReplaceTypeRule {
    pub fn new(
        id: impl Into<String>,
        priority: Option<i32>,
        from: impl Into<String>,
        to: impl Into<String>,
        resolver: Arc<dyn TypeResolver>,
    ) -> ApplicationResult<Self> {
        let (from, to) = (from.into(), to.into());
        if from.trim().is_empty() {
            return Err(ApplicationError::configuration("from", "source type is required"));
        }
        if to.trim().is_empty() {
            return Err(ApplicationError::configuration("to", "target type is required"));
        }
        Ok(Self {
            id: id.into(),
            priority: priority.unwrap_or(i32::MAX),
            from,
            to,
            resolver,
        })
    }

    fn reaches_source(&self, type_tag: &str) -> bool {
        type_chain_contains(self.resolver.as_ref(), type_tag, &self.from)
    }
}

impl RewriteRule for ReplaceTypeRule {
    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> String {
        format!("ReplaceTypeRule ('{}' => '{}')", self.from, self.to)
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn matches(&self, tree: &ContentTree, node: NodeId) -> ApplicationResult<bool> {
        Ok(tree
            .resource_type(node)
            .is_some_and(|rt| self.reaches_source(rt)))
    }

    #[instrument(level = "debug", skip(self, tree, _final_paths))]
    fn apply_to(
        &self,
        tree: &mut ContentTree,
        node: NodeId,
        _final_paths: &mut FinalPaths,
    ) -> ApplicationResult<Option<NodeId>> {
        let path = tree.path(node)?;
        tree.set_property(node, PN_RESOURCE_TYPE, self.to.as_str())
            .rewrite_context(&path)?;
        debug!("{} now {}", path, self.to);
        Ok(Some(node))
    }

    fn find_matches(&self, tree: &ContentTree, root: NodeId) -> BTreeSet<String> {
        tree.iter_subtree(root)
            .filter(|(_, node)| node.resource_type().is_some_and(|rt| self.reaches_source(rt)))
            .filter_map(|(id, _)| tree.path(id).ok())
            .collect()
    }

    fn has_pattern(&self, type_tags: &[&str]) -> bool {
        type_tags.iter().any(|&t| t == self.from || t == self.to)
    }
}
