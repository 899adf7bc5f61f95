//! Integration tests for the recursive rewrite engine.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use modernize::application::{
    ApplicationError, ApplicationResult, FinalPaths, RewriteRule, TreeRewriter,
};
use modernize::domain::{ContentTree, DomainError, NodeId, TreeBuilder, NT_UNSTRUCTURED};
use modernize::util::testing;

const ORDERED: &str = r#"{
    "ordered": {
        "simple": { "sling:resourceType": "legacy/simple" },
        "mapProperties": { "sling:resourceType": "legacy/map", "inner": {} },
        "rewriteProperties": { "sling:resourceType": "legacy/rewrite" },
        "rewriteMapChildren": {
            "sling:resourceType": "legacy/children",
            "items": { "one": {}, "two": {} }
        }
    }
}"#;

fn ordered() -> ContentTree {
    testing::init_test_setup();
    TreeBuilder::new().from_json_str(ORDERED).unwrap()
}

/// Matches every node and returns it unchanged.
#[derive(Default)]
struct NoOpRule {
    matched: AtomicUsize,
    applied: AtomicUsize,
}

impl RewriteRule for NoOpRule {
    fn id(&self) -> &str {
        "noop"
    }
    fn title(&self) -> String {
        "no-op".into()
    }
    fn priority(&self) -> i32 {
        0
    }
    fn matches(&self, _: &ContentTree, _: NodeId) -> ApplicationResult<bool> {
        self.matched.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
    fn apply_to(
        &self,
        _: &mut ContentTree,
        node: NodeId,
        _: &mut FinalPaths,
    ) -> ApplicationResult<Option<NodeId>> {
        self.applied.fetch_add(1, Ordering::SeqCst);
        Ok(Some(node))
    }
    fn find_matches(&self, _: &ContentTree, _: NodeId) -> BTreeSet<String> {
        BTreeSet::new()
    }
    fn has_pattern(&self, _: &[&str]) -> bool {
        false
    }
}

/// Records every path it is asked about; marks `target` final when applied.
struct FinalizingRule {
    target: String,
    seen: Mutex<Vec<String>>,
}

impl FinalizingRule {
    fn new(target: &str) -> Self {
        Self {
            target: target.to_string(),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn times_seen(&self, path: &str) -> usize {
        self.seen.lock().unwrap().iter().filter(|p| *p == path).count()
    }
}

impl RewriteRule for FinalizingRule {
    fn id(&self) -> &str {
        "finalizing"
    }
    fn title(&self) -> String {
        "finalizing".into()
    }
    fn priority(&self) -> i32 {
        0
    }
    fn matches(&self, tree: &ContentTree, node: NodeId) -> ApplicationResult<bool> {
        let path = tree.path(node)?;
        self.seen.lock().unwrap().push(path.clone());
        Ok(path == self.target)
    }
    fn apply_to(
        &self,
        tree: &mut ContentTree,
        node: NodeId,
        final_paths: &mut FinalPaths,
    ) -> ApplicationResult<Option<NodeId>> {
        final_paths.insert(tree.path(node)?);
        Ok(Some(node))
    }
    fn find_matches(&self, _: &ContentTree, _: NodeId) -> BTreeSet<String> {
        BTreeSet::new()
    }
    fn has_pattern(&self, _: &[&str]) -> bool {
        false
    }
}

/// Replaces nodes of one type with a fresh node appended to the parent.
struct ReplacingRule {
    resource_type: String,
}

impl RewriteRule for ReplacingRule {
    fn id(&self) -> &str {
        "replacing"
    }
    fn title(&self) -> String {
        "replacing".into()
    }
    fn priority(&self) -> i32 {
        0
    }
    fn matches(&self, tree: &ContentTree, node: NodeId) -> ApplicationResult<bool> {
        Ok(tree.resource_type(node) == Some(self.resource_type.as_str()))
    }
    fn apply_to(
        &self,
        tree: &mut ContentTree,
        node: NodeId,
        _: &mut FinalPaths,
    ) -> ApplicationResult<Option<NodeId>> {
        let parent = tree.parent(node).unwrap();
        let name = format!("{}-new", tree.name(node)?);
        tree.remove(node)?;
        let replacement = tree.add_child(parent, &name, NT_UNSTRUCTURED)?;
        tree.set_property(replacement, "sling:resourceType", "modern/type")?;
        Ok(Some(replacement))
    }
    fn find_matches(&self, _: &ContentTree, _: NodeId) -> BTreeSet<String> {
        BTreeSet::new()
    }
    fn has_pattern(&self, _: &[&str]) -> bool {
        false
    }
}

/// Removes matching nodes, or fails on them.
struct DroppingRule {
    fail: bool,
}

impl RewriteRule for DroppingRule {
    fn id(&self) -> &str {
        "dropping"
    }
    fn title(&self) -> String {
        "dropping".into()
    }
    fn priority(&self) -> i32 {
        0
    }
    fn matches(&self, tree: &ContentTree, node: NodeId) -> ApplicationResult<bool> {
        Ok(tree.resource_type(node) == Some("legacy/map"))
    }
    fn apply_to(
        &self,
        tree: &mut ContentTree,
        node: NodeId,
        _: &mut FinalPaths,
    ) -> ApplicationResult<Option<NodeId>> {
        let path = tree.path(node)?;
        if self.fail {
            return Err(ApplicationError::Rewrite {
                path: path.clone(),
                source: DomainError::NodeNotFound(path),
            });
        }
        tree.remove(node)?;
        Ok(None)
    }
    fn find_matches(&self, _: &ContentTree, _: NodeId) -> BTreeSet<String> {
        BTreeSet::new()
    }
    fn has_pattern(&self, _: &[&str]) -> bool {
        false
    }
}

/// Matches every node and stamps it with its own id.
struct StampingRule {
    id: &'static str,
    priority: i32,
}

impl RewriteRule for StampingRule {
    fn id(&self) -> &str {
        self.id
    }
    fn title(&self) -> String {
        self.id.into()
    }
    fn priority(&self) -> i32 {
        self.priority
    }
    fn matches(&self, _: &ContentTree, _: NodeId) -> ApplicationResult<bool> {
        Ok(true)
    }
    fn apply_to(
        &self,
        tree: &mut ContentTree,
        node: NodeId,
        _: &mut FinalPaths,
    ) -> ApplicationResult<Option<NodeId>> {
        tree.set_property(node, "rewrittenBy", self.id)?;
        Ok(Some(node))
    }
    fn find_matches(&self, _: &ContentTree, _: NodeId) -> BTreeSet<String> {
        BTreeSet::new()
    }
    fn has_pattern(&self, _: &[&str]) -> bool {
        false
    }
}

#[test]
fn given_always_matching_rule_when_processing_then_each_node_is_offered_once() {
    // Arrange: 9 nodes including the subtree root
    let mut tree = ordered();
    let root = tree.find("/ordered").unwrap();
    let rule = Arc::new(NoOpRule::default());
    let rules: Vec<Arc<dyn RewriteRule>> = vec![rule.clone()];

    // Act
    let result = TreeRewriter::new().process(&mut tree, root, &rules).unwrap();

    // Assert
    assert_eq!(result, Some(root));
    assert_eq!(rule.matched.load(Ordering::SeqCst), 9);
    assert_eq!(rule.applied.load(Ordering::SeqCst), 9);
}

#[test]
fn given_no_matching_rule_when_processing_then_order_is_preserved() {
    // Arrange
    let mut tree = ordered();
    let root = tree.find("/ordered").unwrap();
    let rules: Vec<Arc<dyn RewriteRule>> = vec![Arc::new(ReplacingRule {
        resource_type: "nothing/here".into(),
    })];

    // Act
    TreeRewriter::new().process(&mut tree, root, &rules).unwrap();

    // Assert
    assert_eq!(
        tree.child_names(root).unwrap(),
        vec!["simple", "mapProperties", "rewriteProperties", "rewriteMapChildren"]
    );
}

#[test]
fn given_rule_marking_final_when_processing_then_target_is_matched_once() {
    // Arrange
    let mut tree = ordered();
    let root = tree.find("/ordered").unwrap();
    let rule = Arc::new(FinalizingRule::new("/ordered/mapProperties"));
    let rules: Vec<Arc<dyn RewriteRule>> = vec![rule.clone()];

    // Act
    TreeRewriter::new().process(&mut tree, root, &rules).unwrap();

    // Assert
    assert_eq!(rule.times_seen("/ordered/mapProperties"), 1);
}

#[test]
fn given_shared_final_paths_when_processing_twice_then_final_path_is_not_rematched() {
    // Arrange
    let mut tree = ordered();
    let root = tree.find("/ordered").unwrap();
    let target = tree.find("/ordered/mapProperties").unwrap();
    let rule = Arc::new(FinalizingRule::new("/ordered/mapProperties"));
    let rules: Vec<Arc<dyn RewriteRule>> = vec![rule.clone()];
    let rewriter = TreeRewriter::new();
    let mut final_paths = FinalPaths::new();

    // Act
    rewriter
        .process_with_final_paths(&mut tree, root, &rules, &mut final_paths)
        .unwrap();
    rewriter
        .process_with_final_paths(&mut tree, target, &rules, &mut final_paths)
        .unwrap();

    // Assert: neither the final node nor its subtree is visited again
    assert!(final_paths.contains("/ordered/mapProperties"));
    assert_eq!(rule.times_seen("/ordered/mapProperties"), 1);
    assert_eq!(rule.times_seen("/ordered/mapProperties/inner"), 1);
}

#[test]
fn given_rule_appending_replacement_when_processing_then_replacement_takes_original_slot() {
    // Arrange
    let mut tree = ordered();
    let root = tree.find("/ordered").unwrap();
    let rules: Vec<Arc<dyn RewriteRule>> = vec![Arc::new(ReplacingRule {
        resource_type: "legacy/map".into(),
    })];

    // Act
    TreeRewriter::new().process(&mut tree, root, &rules).unwrap();

    // Assert
    assert_eq!(
        tree.child_names(root).unwrap(),
        vec![
            "simple",
            "mapProperties-new",
            "rewriteProperties",
            "rewriteMapChildren"
        ]
    );
}

#[test]
fn given_first_child_replaced_when_processing_then_replacement_stays_first() {
    let mut tree = ordered();
    let root = tree.find("/ordered").unwrap();
    let rules: Vec<Arc<dyn RewriteRule>> = vec![Arc::new(ReplacingRule {
        resource_type: "legacy/simple".into(),
    })];

    TreeRewriter::new().process(&mut tree, root, &rules).unwrap();

    assert_eq!(
        tree.child_names(root).unwrap()[0],
        "simple-new",
        "replacement keeps first position"
    );
}

#[test]
fn given_rule_removing_node_when_processing_then_siblings_are_still_visited() {
    // Arrange
    let mut tree = ordered();
    let root = tree.find("/ordered").unwrap();
    let dropping: Arc<dyn RewriteRule> = Arc::new(DroppingRule { fail: false });
    let noop = Arc::new(NoOpRule::default());
    let rules: Vec<Arc<dyn RewriteRule>> = vec![dropping, noop.clone()];

    // Act
    TreeRewriter::new().process(&mut tree, root, &rules).unwrap();

    // Assert: mapProperties and its child are gone, 7 nodes remain offered to noop
    assert!(tree.find("/ordered/mapProperties").is_none());
    assert_eq!(noop.applied.load(Ordering::SeqCst), 7);
}

#[test]
fn given_failing_rule_when_processing_then_error_propagates_with_path() {
    let mut tree = ordered();
    let root = tree.find("/ordered").unwrap();
    let rules: Vec<Arc<dyn RewriteRule>> = vec![Arc::new(DroppingRule { fail: true })];

    let err = TreeRewriter::new()
        .process(&mut tree, root, &rules)
        .unwrap_err();

    assert_eq!(err.path(), Some("/ordered/mapProperties"));
}

#[test]
fn given_root_removed_by_rule_when_processing_then_returns_none() {
    let mut tree = ordered();
    let target = tree.find("/ordered/mapProperties").unwrap();
    let rules: Vec<Arc<dyn RewriteRule>> = vec![Arc::new(DroppingRule { fail: false })];

    let result = TreeRewriter::new().process(&mut tree, target, &rules).unwrap();

    assert_eq!(result, None);
}

#[test]
fn given_rules_out_of_priority_order_when_processing_then_lowest_priority_wins() {
    // Arrange
    let mut tree = ordered();
    let root = tree.find("/ordered").unwrap();
    let rules: Vec<Arc<dyn RewriteRule>> = vec![
        Arc::new(StampingRule { id: "late", priority: 20 }),
        Arc::new(StampingRule { id: "early", priority: 10 }),
        Arc::new(StampingRule { id: "tied", priority: 10 }),
    ];

    // Act
    TreeRewriter::new().process(&mut tree, root, &rules).unwrap();

    // Assert
    for path in ["/ordered", "/ordered/simple", "/ordered/rewriteMapChildren/items/one"] {
        let node = tree.find(path).unwrap();
        assert_eq!(
            tree.property(node, "rewrittenBy").and_then(|v| v.as_str()),
            Some("early"),
            "{path}"
        );
    }
}
