//! Column width table of one legacy layout, keyed by responsive breakpoint.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use itertools::Itertools;
use regex::Regex;

use crate::domain::error::LayoutError;

fn definition_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\w+)=\[([^\]]*)\]$").unwrap_or_else(|e| panic!("invalid width regex: {e}"))
    })
}

/// Parsed and validated `name=[w1,...,wN]` width definitions.
///
/// Every breakpoint holds exactly `column_count` widths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutConfig {
    columns: usize,
    widths: BTreeMap<String, Vec<u64>>,
}

impl LayoutConfig {
    /// Parse width definitions for a layout with `columns` columns.
    ///
    /// A single bad definition fails the whole table. A breakpoint defined twice
    /// keeps the last definition.
    pub fn parse<S: AsRef<str>>(columns: usize, definitions: &[S]) -> Result<Self, LayoutError> {
        let mut widths = BTreeMap::new();
        for definition in definitions {
            let definition = definition.as_ref().trim();
            let captures =
                definition_regex()
                    .captures(definition)
                    .ok_or_else(|| LayoutError::InvalidFormat {
                        definition: definition.to_string(),
                    })?;
            let name = &captures[1];
            let tokens: Vec<&str> = captures[2].split(',').map(str::trim).collect();
            if tokens.len() != columns {
                return Err(LayoutError::ColumnCountMismatch {
                    definition: definition.to_string(),
                    expected: columns,
                    found: tokens.len(),
                });
            }
            let parsed = tokens
                .iter()
                .map(|token| {
                    token.parse::<u64>().map_err(|_| LayoutError::NonNumericWidth {
                        definition: definition.to_string(),
                        token: token.to_string(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            if checked_sum(&parsed).is_none() {
                return Err(LayoutError::WidthOverflow {
                    definition: definition.to_string(),
                });
            }
            widths.insert(name.to_string(), parsed);
        }
        Ok(Self { columns, widths })
    }

    pub fn column_count(&self) -> usize {
        self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.widths.is_empty()
    }

    /// Breakpoint names in sorted order.
    pub fn breakpoints(&self) -> impl Iterator<Item = &str> {
        self.widths.keys().map(String::as_str)
    }

    pub fn widths(&self, breakpoint: &str) -> Option<&[u64]> {
        self.widths.get(breakpoint).map(Vec::as_slice)
    }

    pub fn width_of(&self, breakpoint: &str, column: usize) -> Option<u64> {
        self.widths.get(breakpoint)?.get(column).copied()
    }

    /// Sum of the widths of columns `0..before`.
    pub fn cumulative_width(&self, breakpoint: &str, before: usize) -> Option<u64> {
        let widths = self.widths.get(breakpoint)?;
        if before > widths.len() {
            return None;
        }
        checked_sum(&widths[..before])
    }
}

fn checked_sum(widths: &[u64]) -> Option<u64> {
    widths.iter().try_fold(0u64, |acc, &w| acc.checked_add(w))
}

impl fmt::Display for LayoutConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formatted = self
            .widths
            .iter()
            .map(|(name, widths)| format!("{}=[{}]", name, widths.iter().join(",")))
            .join(", ");
        write!(f, "{formatted}")
    }
}
