//! Column marker detection, column partitioning and responsive metadata.

use tracing::trace;

use crate::domain::{ContentTree, DomainResult, LayoutConfig, NodeId, NT_UNSTRUCTURED};

pub const PN_LAYOUT: &str = "layout";
pub const PN_WIDTH: &str = "width";
pub const PN_OFFSET: &str = "offset";
pub const PN_BEHAVIOR: &str = "behavior";
pub const BEHAVIOR_NEWLINE: &str = "newline";
pub const NN_RESPONSIVE_CONFIG: &str = "cq:responsive";

/// Children of a column-control node, split at the column markers.
///
/// All entries are child names captured before any mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnPartition {
    /// Non-marker children before the leading marker
    pub leading: Vec<String>,
    /// Stray markers before the leading marker
    pub leading_markers: Vec<String>,
    /// The leading marker itself
    pub leading_marker: String,
    /// Content of each column, in order
    pub columns: Vec<Vec<String>>,
    /// Markers that closed a column run
    pub breaks: Vec<String>,
    /// Non-marker children after the last column run
    pub trailing: Vec<String>,
    /// Every child after the last column run, markers included, in original order
    pub remainder: Vec<String>,
}

/// Marker type and width table of one legacy column layout.
#[derive(Debug, Clone)]
pub struct ColumnLayout {
    marker_type: String,
    layout: String,
    widths: LayoutConfig,
}

impl ColumnLayout {
    pub fn new(marker_type: impl Into<String>, layout: impl Into<String>, widths: LayoutConfig) -> Self {
        Self {
            marker_type: marker_type.into(),
            layout: layout.into(),
            widths,
        }
    }

    pub fn marker_type(&self) -> &str {
        &self.marker_type
    }

    pub fn layout(&self) -> &str {
        &self.layout
    }

    pub fn widths(&self) -> &LayoutConfig {
        &self.widths
    }

    pub fn column_count(&self) -> usize {
        self.widths.column_count()
    }

    /// Any node of the marker type is a column break.
    pub fn is_marker(&self, tree: &ContentTree, node: NodeId) -> bool {
        tree.resource_type(node) == Some(self.marker_type.as_str())
    }

    /// A marker that also carries this layout's `layout` value.
    pub fn is_leading_marker(&self, tree: &ContentTree, node: NodeId) -> bool {
        self.is_marker(tree, node)
            && tree
                .property(node, PN_LAYOUT)
                .and_then(|v| v.as_str())
                .is_some_and(|layout| layout == self.layout)
    }

    /// First child of `parent` that opens this layout.
    pub fn find_leading_marker(&self, tree: &ContentTree, parent: NodeId) -> Option<NodeId> {
        tree.children(parent)
            .ok()?
            .iter()
            .copied()
            .find(|&child| self.is_leading_marker(tree, child))
    }

    /// Split the children of `parent` around the leading marker.
    ///
    /// Returns None if there is no leading marker.
    pub fn partition(&self, tree: &ContentTree, parent: NodeId) -> DomainResult<Option<ColumnPartition>> {
        let children = tree.children(parent)?.to_vec();
        let Some(start) = children
            .iter()
            .position(|&child| self.is_leading_marker(tree, child))
        else {
            return Ok(None);
        };

        let mut partition = ColumnPartition {
            leading_marker: tree.name(children[start])?.to_string(),
            ..Default::default()
        };
        for &child in &children[..start] {
            let name = tree.name(child)?.to_string();
            if self.is_marker(tree, child) {
                partition.leading_markers.push(name);
            } else {
                partition.leading.push(name);
            }
        }

        let mut rest = children[start + 1..].iter().copied();
        for _ in 0..self.column_count() {
            let mut column = Vec::new();
            for child in rest.by_ref() {
                let name = tree.name(child)?.to_string();
                if self.is_marker(tree, child) {
                    partition.breaks.push(name);
                    break;
                }
                column.push(name);
            }
            partition.columns.push(column);
        }
        for child in rest {
            let name = tree.name(child)?.to_string();
            if !self.is_marker(tree, child) {
                partition.trailing.push(name.clone());
            }
            partition.remainder.push(name);
        }
        trace!(
            "partitioned {} column(s), {} trailing",
            partition.columns.len(),
            partition.trailing.len()
        );
        Ok(Some(partition))
    }

    /// Write width/offset/newline metadata for column `column` onto `node`.
    ///
    /// Offset is the width of all preceding columns, only when `offset` is set.
    pub fn add_responsive_configuration(
        &self,
        tree: &mut ContentTree,
        node: NodeId,
        column: usize,
        newline: bool,
        offset: bool,
    ) -> DomainResult<()> {
        let responsive = match tree.child(node, NN_RESPONSIVE_CONFIG) {
            Some(existing) => existing,
            None => tree.add_child(node, NN_RESPONSIVE_CONFIG, NT_UNSTRUCTURED)?,
        };
        let breakpoints: Vec<String> = self.widths.breakpoints().map(str::to_string).collect();
        for breakpoint in breakpoints {
            let entry = match tree.child(responsive, &breakpoint) {
                Some(existing) => existing,
                None => tree.add_child(responsive, &breakpoint, NT_UNSTRUCTURED)?,
            };
            let width = self.widths.width_of(&breakpoint, column).unwrap_or(0);
            let offset_width = if offset && column > 0 {
                self.widths.cumulative_width(&breakpoint, column).unwrap_or(0)
            } else {
                0
            };
            tree.set_property(entry, PN_WIDTH, width.to_string())?;
            tree.set_property(entry, PN_OFFSET, offset_width.to_string())?;
            if newline {
                tree.set_property(entry, PN_BEHAVIOR, BEHAVIOR_NEWLINE)?;
            } else {
                tree.remove_property(entry, PN_BEHAVIOR)?;
            }
        }
        Ok(())
    }
}
