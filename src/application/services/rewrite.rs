//! Rewrite service
//!
//! Resolves rule ids through the registry and runs them against one node
//! (shallow) or a whole subtree (deep).

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::error_ext::DomainResultExt;
use crate::application::registry::RuleRegistry;
use crate::application::rewriter::TreeRewriter;
use crate::application::rule::FinalPaths;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{ContentTree, DomainError, NodeId, OrderingToken};

/// Service for applying registered rules to content trees.
pub struct RewriteService {
    registry: Arc<RuleRegistry>,
    rewriter: TreeRewriter,
}

impl RewriteService {
    pub fn new(registry: Arc<RuleRegistry>) -> Self {
        Self {
            registry,
            rewriter: TreeRewriter::new(),
        }
    }

    pub fn registry(&self) -> &Arc<RuleRegistry> {
        &self.registry
    }

    fn locate(tree: &ContentTree, path: &str) -> ApplicationResult<NodeId> {
        tree.find(path).ok_or_else(|| ApplicationError::Rewrite {
            path: path.to_string(),
            source: DomainError::NodeNotFound(path.to_string()),
        })
    }

    /// Offer the node at `path` to each requested rule in priority order.
    ///
    /// Each matching rule receives the result of the previous one. The final node
    /// is put back at the original sibling position. Returns whether any rule applied.
    #[instrument(level = "debug", skip(self, tree))]
    pub fn apply(&self, tree: &mut ContentTree, path: &str, rule_ids: &[&str]) -> ApplicationResult<bool> {
        let rules = self.registry.resolve(rule_ids);
        let node = Self::locate(tree, path)?;
        let token = OrderingToken::capture(tree, node).rewrite_context(path)?;

        let mut current = Some(node);
        let mut applied = false;
        for rule in &rules {
            let Some(node) = current else { break };
            if rule.matches(tree, node)? {
                debug!("applying {} to {}", rule.id(), path);
                current = rule.apply_to(tree, node, &mut FinalPaths::new())?;
                applied = true;
            }
        }

        if let Some(node) = current {
            token.apply(tree, node).rewrite_context(path)?;
        }
        Ok(applied)
    }

    /// Run the recursive rewriter over the subtree at `path`.
    #[instrument(level = "debug", skip(self, tree))]
    pub fn apply_deep(
        &self,
        tree: &mut ContentTree,
        path: &str,
        rule_ids: &[&str],
    ) -> ApplicationResult<Option<NodeId>> {
        let rules = self.registry.resolve(rule_ids);
        let node = Self::locate(tree, path)?;
        let result = self.rewriter.process(tree, node, &rules)?;
        info!("rewrote {} with {} rule(s)", path, rules.len());
        Ok(result)
    }

    /// Union of the candidate paths every requested rule finds below `path`.
    pub fn find_matches(
        &self,
        tree: &ContentTree,
        path: &str,
        rule_ids: &[&str],
    ) -> ApplicationResult<BTreeSet<String>> {
        let node = Self::locate(tree, path)?;
        Ok(self
            .registry
            .resolve(rule_ids)
            .iter()
            .flat_map(|rule| rule.find_matches(tree, node))
            .collect())
    }

    /// Whether any requested rule consumes or produces one of `type_tags`.
    pub fn has_pattern(&self, rule_ids: &[&str], type_tags: &[&str]) -> bool {
        self.registry
            .resolve(rule_ids)
            .iter()
            .any(|rule| rule.has_pattern(type_tags))
    }
}
