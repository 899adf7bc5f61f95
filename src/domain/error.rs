//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent failures of the content tree primitives.
/// These are independent of how rules use the tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("child already exists: {name} under {parent}")]
    ChildExists { parent: String, name: String },

    #[error("invalid node name: '{0}'")]
    InvalidName(String),

    #[error("operation not allowed on the root node: {0}")]
    RootOperation(String),

    #[error("cannot move {node} below itself ({target})")]
    InvalidMove { node: String, target: String },

    #[error("invalid tree document: {message}")]
    InvalidDocument { message: String },
}

/// Errors raised while parsing a column width table.
///
/// Every variant carries the offending definition verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("invalid format for width configuration: {definition}")]
    InvalidFormat { definition: String },

    #[error("number of columns ({found}) doesn't match layout format ({expected}) in: {definition}")]
    ColumnCountMismatch {
        definition: String,
        expected: usize,
        found: usize,
    },

    #[error("column widths must be non-negative integers, got '{token}' in: {definition}")]
    NonNumericWidth { definition: String, token: String },

    #[error("column widths overflow when summed in: {definition}")]
    WidthOverflow { definition: String },
}

/// Result type for tree operations.
pub type DomainResult<T> = Result<T, DomainError>;
