//! Registry of rewrite rules, resolved by id in priority order.

use std::sync::{Arc, RwLock};

use tracing::{debug, instrument, warn};

use crate::application::rule::RewriteRule;

/// Holds the currently registered rule instances.
///
/// Registration order breaks priority ties.
#[derive(Default)]
pub struct RuleRegistry {
    rules: RwLock<Vec<Arc<dyn RewriteRule>>>,
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &self.list_rules())
            .finish()
    }
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule, replacing any rule with the same id.
    #[instrument(level = "debug", skip_all, fields(id = rule.id()))]
    pub fn register(&self, rule: Arc<dyn RewriteRule>) {
        let mut rules = self.write();
        if let Some(pos) = rules.iter().position(|r| r.id() == rule.id()) {
            debug!("replacing rule {}", rule.id());
            rules[pos] = rule;
        } else {
            rules.push(rule);
        }
    }

    /// Remove a rule, returning it if it was registered.
    pub fn unregister(&self, id: &str) -> Option<Arc<dyn RewriteRule>> {
        let mut rules = self.write();
        let pos = rules.iter().position(|r| r.id() == id)?;
        Some(rules.remove(pos))
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn RewriteRule>> {
        self.read().iter().find(|r| r.id() == id).cloned()
    }

    /// Registered rule ids in registration order.
    pub fn list_rules(&self) -> Vec<String> {
        self.read().iter().map(|r| r.id().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Rules named in `ids`, lowest priority first.
    ///
    /// Unknown ids are dropped; request order does not matter.
    #[instrument(level = "debug", skip(self))]
    pub fn resolve<S: AsRef<str> + std::fmt::Debug>(&self, ids: &[S]) -> Vec<Arc<dyn RewriteRule>> {
        let rules = self.read();
        let mut resolved: Vec<_> = rules
            .iter()
            .filter(|r| ids.iter().any(|id| id.as_ref() == r.id()))
            .cloned()
            .collect();
        if resolved.len() < ids.len() {
            debug!("{} requested rule(s) not registered", ids.len() - resolved.len());
        }
        // stable: ties keep registration order
        resolved.sort_by_key(|r| r.priority());
        resolved
    }

    /// All registered rules, lowest priority first.
    pub fn all(&self) -> Vec<Arc<dyn RewriteRule>> {
        let mut rules = self.read().clone();
        rules.sort_by_key(|r| r.priority());
        rules
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<Arc<dyn RewriteRule>>> {
        self.rules.read().unwrap_or_else(|poisoned| {
            warn!("rule registry lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Arc<dyn RewriteRule>>> {
        self.rules.write().unwrap_or_else(|poisoned| {
            warn!("rule registry lock poisoned, recovering");
            poisoned.into_inner()
        })
    }
}
