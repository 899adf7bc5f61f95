//! Error conversion helpers for tree operations inside rules
//!
//! Provides an extension trait for attaching the node path to tree failures.

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::DomainResult;

/// Extension trait for converting `DomainResult` to `ApplicationResult` with context.
pub trait DomainResultExt<T> {
    /// Wrap a tree failure as a rewrite error on `path`.
    ///
    /// # Example
    /// ```ignore
    /// tree.remove(marker).rewrite_context(&path)?;
    /// ```
    fn rewrite_context(self, path: &str) -> ApplicationResult<T>;
}

impl<T> DomainResultExt<T> for DomainResult<T> {
    fn rewrite_context(self, path: &str) -> ApplicationResult<T> {
        self.map_err(|source| ApplicationError::Rewrite {
            path: path.to_string(),
            source,
        })
    }
}
