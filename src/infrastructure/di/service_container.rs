//! Service container for dependency injection
//!
//! Wires the type resolver, rule registry and rewrite service from settings.

use std::sync::Arc;

use tracing::debug;

use crate::application::services::RewriteService;
use crate::application::{ApplicationResult, RuleRegistry};
use crate::config::Settings;
use crate::domain::TreeBuilder;
use crate::infrastructure::traits::TypeResolver;

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Type-hierarchy resolver shared by all rules
    pub resolver: Arc<dyn TypeResolver>,

    /// Registry holding the configured rules
    pub registry: Arc<RuleRegistry>,

    /// Shallow and deep rewrite entry points
    pub rewrite: RewriteService,
}

impl std::fmt::Debug for ServiceContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContainer")
            .field("settings", &self.settings)
            .field("registry", &self.registry)
            .finish()
    }
}

impl ServiceContainer {
    /// Create a container resolving types through the configured hierarchy.
    ///
    /// Fails if any configured rule is invalid.
    pub fn new(settings: Settings) -> ApplicationResult<Self> {
        let resolver = Arc::new(settings.type_hierarchy());
        Self::with_deps(settings, resolver)
    }

    /// Create a service container with a custom resolver (for testing).
    pub fn with_deps(settings: Settings, resolver: Arc<dyn TypeResolver>) -> ApplicationResult<Self> {
        let settings = Arc::new(settings);
        let registry = Arc::new(RuleRegistry::new());
        for rule in settings.build_rules(resolver.clone())? {
            debug!("registering {}", rule.title());
            registry.register(rule);
        }
        let rewrite = RewriteService::new(registry.clone());

        Ok(Self {
            settings,
            resolver,
            registry,
            rewrite,
        })
    }

    /// Tree builder honouring the configured orderable types.
    pub fn tree_builder(&self) -> TreeBuilder {
        TreeBuilder::new().with_orderable_types(self.settings.orderable_types.iter().cloned())
    }
}
