//! Recursive rewrite engine.
//!
//! Walks a subtree top-down, hands each node to the first matching rule and
//! continues below whatever node the rule left in its place.

use std::sync::Arc;

use tracing::{debug, instrument, trace};

use crate::application::error_ext::DomainResultExt;
use crate::application::rule::{FinalPaths, RewriteRule};
use crate::application::ApplicationResult;
use crate::domain::{ContentTree, NodeId, OrderingToken};

/// Depth-first, pre-order rewriter over an ordered rule list.
#[derive(Debug, Default, Clone, Copy)]
pub struct TreeRewriter;

impl TreeRewriter {
    pub fn new() -> Self {
        Self
    }

    /// Rewrite the subtree at `root` with a fresh set of final paths.
    ///
    /// Rules are tried in ascending priority; equal priorities keep slice order.
    /// Returns the node standing at the root's position afterwards, None if a
    /// rule removed it.
    pub fn process(
        &self,
        tree: &mut ContentTree,
        root: NodeId,
        rules: &[Arc<dyn RewriteRule>],
    ) -> ApplicationResult<Option<NodeId>> {
        let mut final_paths = FinalPaths::new();
        self.process_with_final_paths(tree, root, rules, &mut final_paths)
    }

    /// Like [`TreeRewriter::process`] but records into (and honours) a caller-owned set.
    #[instrument(level = "debug", skip_all)]
    pub fn process_with_final_paths(
        &self,
        tree: &mut ContentTree,
        root: NodeId,
        rules: &[Arc<dyn RewriteRule>],
        final_paths: &mut FinalPaths,
    ) -> ApplicationResult<Option<NodeId>> {
        let mut ordered = rules.to_vec();
        ordered.sort_by_key(|rule| rule.priority());
        let result = self.visit(tree, root, &ordered, final_paths)?;
        debug!("rewrite pass done, {} final path(s)", final_paths.len());
        Ok(result)
    }

    fn visit(
        &self,
        tree: &mut ContentTree,
        node: NodeId,
        rules: &[Arc<dyn RewriteRule>],
        final_paths: &mut FinalPaths,
    ) -> ApplicationResult<Option<NodeId>> {
        let path = tree.path(node)?;
        if final_paths.contains(&path) {
            trace!("skipping final path {}", path);
            return Ok(Some(node));
        }

        let mut current = Some(node);
        for rule in rules {
            if !rule.matches(tree, node)? {
                continue;
            }
            debug!("rule {} matched {}", rule.id(), path);
            let token = OrderingToken::capture(tree, node).rewrite_context(&path)?;
            current = rule.apply_to(tree, node, final_paths)?;
            if let Some(result) = current {
                token.apply(tree, result).rewrite_context(&path)?;
                final_paths.insert(tree.path(result).rewrite_context(&path)?);
            }
            break;
        }

        let Some(result) = current else {
            return Ok(None);
        };
        let parent_path = tree.path(result).rewrite_context(&path)?;
        for name in tree.child_names(result).rewrite_context(&parent_path)? {
            // siblings may have been moved or removed by earlier rewrites
            if let Some(child) = tree.child(result, &name) {
                self.visit(tree, child, rules, final_paths)?;
            }
        }
        Ok(Some(result))
    }
}
