//! Rewrite rule contract

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use crate::application::ApplicationResult;
use crate::domain::{ContentTree, NodeId};

/// Paths excluded from rule matching for the rest of one rewrite pass.
pub type FinalPaths = HashSet<String>;

/// A pluggable structural rewrite.
///
/// Rules carry only their construction-time configuration; all per-call state
/// lives in the tree and in the [`FinalPaths`] handed to [`RewriteRule::apply_to`].
pub trait RewriteRule: Send + Sync {
    /// Stable identifier used by the registry.
    fn id(&self) -> &str;

    /// Human readable summary of what the rule does.
    fn title(&self) -> String;

    /// Lower runs first.
    fn priority(&self) -> i32;

    /// Whether the rule wants to rewrite `node`.
    fn matches(&self, tree: &ContentTree, node: NodeId) -> ApplicationResult<bool>;

    /// Rewrite `node` and return the node now standing at its position.
    ///
    /// Returns None when the node was removed without replacement. Rules may add
    /// paths of nodes they created to `final_paths`.
    fn apply_to(
        &self,
        tree: &mut ContentTree,
        node: NodeId,
        final_paths: &mut FinalPaths,
    ) -> ApplicationResult<Option<NodeId>>;

    /// Paths in the subtree at `root` (root included) this rule would consider.
    ///
    /// Never mutates the tree.
    fn find_matches(&self, tree: &ContentTree, root: NodeId) -> BTreeSet<String>;

    /// Whether any of `type_tags` is a type this rule consumes or produces.
    fn has_pattern(&self, type_tags: &[&str]) -> bool;
}

impl fmt::Debug for dyn RewriteRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RewriteRule")
            .field("id", &self.id())
            .field("priority", &self.priority())
            .finish()
    }
}
