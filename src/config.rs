//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/modernize/modernize.toml`
//! 3. Local config: `<dir>/.modernize.toml`
//! 4. Environment variables: `MODERNIZE_*` prefix

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use config::{Config, ConfigError, Environment, Map};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::rules::{ColumnControlOptions, ColumnControlRule, ColumnMode, ReplaceTypeRule};
use crate::application::{ApplicationError, ApplicationResult, RewriteRule};
use crate::domain::NT_UNSTRUCTURED;
use crate::infrastructure::traits::{TypeHierarchy, TypeResolver};

/// One configured rule, tagged by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleDefinition {
    ColumnControl {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        priority: Option<i32>,
        /// Marker type, defaults to the foundation column control
        #[serde(default, skip_serializing_if = "Option::is_none")]
        column_control_type: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        container_type: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        layout: Option<String>,
        #[serde(default)]
        column_widths: Vec<String>,
        #[serde(default)]
        mode: ColumnMode,
    },
    ReplaceType {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        priority: Option<i32>,
        from: String,
        to: String,
    },
}

impl RuleDefinition {
    pub fn id(&self) -> &str {
        match self {
            RuleDefinition::ColumnControl { id, .. } | RuleDefinition::ReplaceType { id, .. } => id,
        }
    }

    /// Validate and instantiate the rule.
    ///
    /// `default_priority` applies when the definition sets none.
    pub fn build(
        &self,
        resolver: Arc<dyn TypeResolver>,
        default_priority: Option<i32>,
    ) -> ApplicationResult<Arc<dyn RewriteRule>> {
        match self {
            RuleDefinition::ColumnControl {
                id,
                priority,
                column_control_type,
                container_type,
                layout,
                column_widths,
                mode,
            } => {
                let options = ColumnControlOptions {
                    id: id.clone(),
                    priority: priority.or(default_priority),
                    column_control_type: column_control_type.clone(),
                    container_type: container_type.clone(),
                    layout: layout.clone(),
                    column_widths: column_widths.clone(),
                    mode: *mode,
                };
                Ok(Arc::new(ColumnControlRule::new(options, resolver)?))
            }
            RuleDefinition::ReplaceType {
                id,
                priority,
                from,
                to,
            } => Ok(Arc::new(ReplaceTypeRule::new(
                id.clone(),
                priority.or(default_priority),
                from.clone(),
                to.clone(),
                resolver,
            )?)),
        }
    }
}

/// Raw settings for intermediate parsing (None means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub type_hierarchy: Option<BTreeMap<String, String>>,
    pub orderable_types: Option<Vec<String>>,
    pub default_priority: Option<i32>,
    pub rules: Option<Vec<RuleDefinition>>,
}

/// Unified configuration for modernize.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Priority for rules that do not set one (None: lowest possible)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_priority: Option<i32>,
    /// Primary types whose children are orderable
    pub orderable_types: Vec<String>,
    /// Type tag to parent type tag
    pub type_hierarchy: BTreeMap<String, String>,
    /// Configured rules in registration order
    pub rules: Vec<RuleDefinition>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_priority: None,
            orderable_types: vec![NT_UNSTRUCTURED.to_string()],
            type_hierarchy: BTreeMap::new(),
            rules: Vec::new(),
        }
    }
}

/// Get the XDG config directory for modernize.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "modernize").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("modernize.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".modernize.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// Union of `base` and `overlay`; `!item` in the overlay removes an inherited item.
pub fn merge_array(base: &[String], overlay: &[String]) -> Vec<String> {
    let mut result: Vec<String> = base.to_vec();
    for pattern in overlay {
        if let Some(negated) = pattern.strip_prefix('!') {
            result.retain(|item| item != negated);
        } else if !result.contains(pattern) {
            result.push(pattern.clone());
        }
    }
    result
}

impl Settings {
    /// Parse a complete settings document.
    pub fn from_toml_str(content: &str) -> Result<Self, ApplicationError> {
        let raw: RawSettings = toml::from_str(content).map_err(|e| ApplicationError::Config {
            message: format!("parse settings: {e}"),
        })?;
        Ok(Self::default().apply_global(&raw))
    }

    /// Apply global config onto defaults: every specified field REPLACES.
    fn apply_global(&self, global: &RawSettings) -> Self {
        Self {
            default_priority: global.default_priority.or(self.default_priority),
            orderable_types: global
                .orderable_types
                .clone()
                .unwrap_or_else(|| self.orderable_types.clone()),
            type_hierarchy: global
                .type_hierarchy
                .clone()
                .unwrap_or_else(|| self.type_hierarchy.clone()),
            rules: global.rules.clone().unwrap_or_else(|| self.rules.clone()),
        }
    }

    /// Merge local config onto self.
    ///
    /// - Hierarchy entries overlay the base entries
    /// - Orderable types union, with `!type` removal
    /// - Rules replace the base rule with the same id, new ids are appended
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        let mut type_hierarchy = self.type_hierarchy.clone();
        if let Some(entries) = &overlay.type_hierarchy {
            type_hierarchy.extend(entries.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        let mut rules = self.rules.clone();
        for rule in overlay.rules.iter().flatten() {
            match rules.iter_mut().find(|r| r.id() == rule.id()) {
                Some(existing) => *existing = rule.clone(),
                None => rules.push(rule.clone()),
            }
        }

        Self {
            default_priority: overlay.default_priority.or(self.default_priority),
            orderable_types: overlay
                .orderable_types
                .as_ref()
                .map(|o| merge_array(&self.orderable_types, o))
                .unwrap_or_else(|| self.orderable_types.clone()),
            type_hierarchy,
            rules,
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory holding a `.modernize.toml`
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        Self::load_with(global_config_path().as_deref(), local_dir, None)
    }

    /// Load settings from an explicit global file and environment.
    ///
    /// `env` replaces the process environment when given.
    pub fn load_with(
        global_path: Option<&Path>,
        local_dir: Option<&Path>,
        env: Option<Map<String, String>>,
    ) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_path.filter(|p| p.exists()) {
            debug!("loading global config {}", global_path.display());
            current = current.apply_global(&load_raw_settings(global_path)?);
        }

        if let Some(dir) = local_dir {
            current = current.merge_file(&local_config_path(dir))?;
        }

        Self::apply_env_overrides(current, env)
    }

    /// Merge a local config file if it exists.
    pub fn merge_file(&self, path: &Path) -> Result<Self, ApplicationError> {
        if !path.exists() {
            return Ok(self.clone());
        }
        debug!("merging local config {}", path.display());
        Ok(self.merge_with(&load_raw_settings(path)?))
    }

    /// Apply MODERNIZE_* environment variables as explicit overrides.
    fn apply_env_overrides(
        mut settings: Self,
        env: Option<Map<String, String>>,
    ) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("MODERNIZE")
                    .separator("__")
                    .source(env),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("default_priority") {
            let priority = val.trim().parse::<i32>().map_err(|e| ApplicationError::Config {
                message: format!("MODERNIZE_DEFAULT_PRIORITY '{val}': {e}"),
            })?;
            settings.default_priority = Some(priority);
        }
        if let Ok(val) = config.get_string("orderable_types") {
            settings.orderable_types = val
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }

        Ok(settings)
    }

    /// Type resolver backed by the configured hierarchy.
    pub fn type_hierarchy(&self) -> TypeHierarchy {
        self.type_hierarchy
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }

    /// Build every configured rule, failing on the first invalid one.
    pub fn build_rules(&self, resolver: Arc<dyn TypeResolver>) -> ApplicationResult<Vec<Arc<dyn RewriteRule>>> {
        let mut seen = HashSet::new();
        let mut rules = Vec::with_capacity(self.rules.len());
        for definition in &self.rules {
            if !seen.insert(definition.id()) {
                return Err(ApplicationError::configuration(
                    "rules",
                    format!("duplicate rule id: {}", definition.id()),
                ));
            }
            rules.push(definition.build(resolver.clone(), self.default_priority)?);
        }
        Ok(rules)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# modernize configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/modernize/modernize.toml  (defines your baseline)
#   Local:  <dir>/.modernize.toml               (project-specific additions)
#   Env:    MODERNIZE_* environment variables   (explicit overrides)

# Priority for rules without one (lower runs first)
# default_priority = 100

# Primary types whose children keep their order (use "!type" locally to remove)
# orderable_types = ["nt:unstructured"]

[type_hierarchy]
# "mysite/components/grid" = "wcm/foundation/components/responsivegrid"

# [[rules]]
# kind = "column_control"
# id = "two-columns"
# layout = "2;cq-colctrl-lt0"
# container_type = "mysite/components/container"
# column_widths = ["default=[6,6]", "phone=[12,12]"]
# mode = "containers"   # or "reflow"

# [[rules]]
# kind = "replace_type"
# id = "text"
# from = "foundation/components/text"
# to = "core/wcm/components/text/v2/text"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
