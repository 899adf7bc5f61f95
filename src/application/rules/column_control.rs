//! Rewrites legacy column controls into a responsive grid or into containers.

use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::application::error_ext::DomainResultExt;
use crate::application::rule::{FinalPaths, RewriteRule};
use crate::application::rules::column_layout::{ColumnLayout, ColumnPartition};
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{ContentTree, LayoutConfig, NodeId, NT_UNSTRUCTURED, PN_RESOURCE_TYPE};
use crate::infrastructure::traits::{type_chain_contains, TypeResolver};

pub const RESPONSIVE_GRID_BASE_TYPE: &str = "wcm/foundation/components/responsivegrid";
pub const PARSYS_BASE_TYPE: &str = "foundation/components/parsys";
pub const DEFAULT_COLUMN_CONTROL_TYPE: &str = "foundation/components/parsys/colctrl";
pub const NN_CONTAINER_HINT: &str = "container";

/// Target structure of a column-control rewrite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnMode {
    /// One container per column
    #[default]
    Containers,
    /// All column content flattened into the grid itself
    Reflow,
}

/// Unvalidated column-control settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnControlOptions {
    pub id: String,
    pub priority: Option<i32>,
    pub column_control_type: Option<String>,
    pub container_type: Option<String>,
    pub layout: Option<String>,
    pub column_widths: Vec<String>,
    pub mode: ColumnMode,
}

/// Column-control rewrite rule.
///
/// Matches responsive grids holding a leading column marker with the configured
/// layout value.
pub struct ColumnControlRule {
    id: String,
    priority: i32,
    mode: ColumnMode,
    container_type: Option<String>,
    columns: ColumnLayout,
    resolver: Arc<dyn TypeResolver>,
}

impl std::fmt::Debug for ColumnControlRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnControlRule")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("mode", &self.mode)
            .field("layout", &self.columns.layout())
            .finish()
    }
}

impl ColumnControlRule {
    /// Validate `options` and build the rule.
    pub fn new(options: ColumnControlOptions, resolver: Arc<dyn TypeResolver>) -> ApplicationResult<Self> {
        let marker_type = options
            .column_control_type
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_COLUMN_CONTROL_TYPE.to_string());

        let container_type = options.container_type.filter(|t| !t.trim().is_empty());
        if options.mode == ColumnMode::Containers && container_type.is_none() {
            return Err(ApplicationError::configuration(
                "container_type",
                "container type is required when the conversion mode is containers",
            ));
        }

        let layout = options
            .layout
            .filter(|l| !l.trim().is_empty())
            .ok_or_else(|| ApplicationError::configuration("layout", "layout value is required"))?;
        let columns = parse_column_count(&layout)?;

        if options.column_widths.is_empty() {
            return Err(ApplicationError::configuration(
                "column_widths",
                "column widths are required",
            ));
        }
        let widths = LayoutConfig::parse(columns, &options.column_widths)?;

        Ok(Self {
            id: options.id,
            priority: options.priority.unwrap_or(i32::MAX),
            mode: options.mode,
            container_type,
            columns: ColumnLayout::new(marker_type, layout, widths),
            resolver,
        })
    }

    pub fn mode(&self) -> ColumnMode {
        self.mode
    }

    pub fn column_layout(&self) -> &ColumnLayout {
        &self.columns
    }

    fn is_grid(&self, tree: &ContentTree, node: NodeId) -> bool {
        tree.resource_type(node)
            .is_some_and(|rt| type_chain_contains(self.resolver.as_ref(), rt, RESPONSIVE_GRID_BASE_TYPE))
    }

    /// Flatten all column content into `root`, stamping each item with its column metadata.
    #[instrument(level = "debug", skip_all)]
    fn reflow(&self, tree: &mut ContentTree, root: NodeId, path: &str) -> ApplicationResult<NodeId> {
        let Some(partition) = self.columns.partition(tree, root).rewrite_context(path)? else {
            return Ok(root);
        };
        let ColumnPartition {
            leading,
            leading_markers,
            leading_marker,
            columns,
            breaks,
            trailing,
            remainder,
        } = partition;

        let trailing_markers = remainder.iter().filter(|name| !trailing.contains(name));
        for marker in leading_markers
            .iter()
            .chain(std::iter::once(&leading_marker))
            .chain(&breaks)
            .chain(trailing_markers)
        {
            if let Some(id) = tree.child(root, marker) {
                tree.remove(id).rewrite_context(path)?;
            }
        }

        let mut queues: Vec<VecDeque<String>> = columns.into_iter().map(VecDeque::from).collect();
        let mut order = leading;
        let mut offset = false;
        let mut newline = false;
        while queues.iter().any(|q| !q.is_empty()) {
            for (column, queue) in queues.iter_mut().enumerate() {
                let Some(name) = queue.pop_front() else {
                    if column == 0 {
                        offset = true;
                    } else {
                        newline = true;
                    }
                    continue;
                };
                if let Some(item) = tree.child(root, &name) {
                    self.columns
                        .add_responsive_configuration(tree, item, column, newline, offset)
                        .rewrite_context(path)?;
                }
                order.push(name);
                offset = false;
                newline = false;
            }
        }
        order.extend(trailing);

        for name in &order {
            tree.order_before(root, name, None).rewrite_context(path)?;
        }
        debug!("reflowed {} item(s) into {}", order.len(), path);
        Ok(root)
    }

    /// Replace each column with a container holding its content.
    #[instrument(level = "debug", skip_all)]
    fn split(
        &self,
        tree: &mut ContentTree,
        root: NodeId,
        path: &str,
        final_paths: &mut FinalPaths,
    ) -> ApplicationResult<NodeId> {
        let Some(partition) = self.columns.partition(tree, root).rewrite_context(path)? else {
            return Ok(root);
        };
        let container_type = self.container_type.as_deref().unwrap_or_default();

        if let Some(marker) = tree.child(root, &partition.leading_marker) {
            tree.remove(marker).rewrite_context(path)?;
        }

        for (column, content) in partition.columns.iter().enumerate() {
            let name = tree.unique_child_name(root, NN_CONTAINER_HINT);
            let container = tree.add_child(root, &name, NT_UNSTRUCTURED).rewrite_context(path)?;
            tree.set_property(container, PN_RESOURCE_TYPE, container_type)
                .rewrite_context(path)?;
            self.columns
                .add_responsive_configuration(tree, container, column, false, false)
                .rewrite_context(path)?;
            final_paths.insert(tree.path(container).rewrite_context(path)?);

            for child_name in content {
                if let Some(child) = tree.child(root, child_name) {
                    tree.move_to(child, container).rewrite_context(path)?;
                }
            }
            if let Some(marker) = partition
                .breaks
                .get(column)
                .and_then(|name| tree.child(root, name))
            {
                tree.remove(marker).rewrite_context(path)?;
            }
        }

        for name in &partition.remainder {
            tree.order_before(root, name, None).rewrite_context(path)?;
        }
        debug!(
            "split {} into {} container(s)",
            path,
            partition.columns.len()
        );
        Ok(root)
    }
}

/// Column count is the integer before the first `;` of the layout value.
fn parse_column_count(layout: &str) -> ApplicationResult<usize> {
    let prefix = layout.split(';').next().unwrap_or_default().trim();
    match prefix.parse::<usize>() {
        Ok(0) => Err(ApplicationError::configuration(
            "layout",
            format!("layout declares zero columns: {layout}"),
        )),
        Ok(columns) => Ok(columns),
        Err(_) => Err(ApplicationError::configuration(
            "layout",
            format!("unknown format of layout: {layout}"),
        )),
    }
}

impl RewriteRule for ColumnControlRule {
    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> String {
        format!(
            "ColumnControlRewriteRule ('{}' => {})",
            self.columns.layout(),
            self.columns.widths()
        )
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn matches(&self, tree: &ContentTree, node: NodeId) -> ApplicationResult<bool> {
        if !self.is_grid(tree, node) {
            return Ok(false);
        }
        Ok(self.columns.find_leading_marker(tree, node).is_some())
    }

    #[instrument(level = "debug", skip(self, tree, final_paths))]
    fn apply_to(
        &self,
        tree: &mut ContentTree,
        node: NodeId,
        final_paths: &mut FinalPaths,
    ) -> ApplicationResult<Option<NodeId>> {
        let path = tree.path(node)?;
        let result = match self.mode {
            ColumnMode::Reflow => self.reflow(tree, node, &path)?,
            ColumnMode::Containers => self.split(tree, node, &path, final_paths)?,
        };
        Ok(Some(result))
    }

    fn find_matches(&self, tree: &ContentTree, root: NodeId) -> BTreeSet<String> {
        tree.iter_subtree(root)
            .filter(|(_, node)| {
                node.resource_type().is_some_and(|rt| {
                    rt == PARSYS_BASE_TYPE
                        || type_chain_contains(self.resolver.as_ref(), rt, RESPONSIVE_GRID_BASE_TYPE)
                })
            })
            .filter_map(|(id, _)| tree.path(id).ok())
            .collect()
    }

    fn has_pattern(&self, type_tags: &[&str]) -> bool {
        type_tags.iter().any(|&t| {
            t == RESPONSIVE_GRID_BASE_TYPE
                || t == PARSYS_BASE_TYPE
                || self.container_type.as_deref() == Some(t)
        })
    }
}
