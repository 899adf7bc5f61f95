//! Application layer: rules, engine and services
//!
//! This layer drives the domain tree and depends on boundary traits.

pub mod error;
pub mod error_ext;
pub mod registry;
pub mod rewriter;
pub mod rule;
pub mod rules;
pub mod services;

pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::DomainResultExt;
pub use registry::RuleRegistry;
pub use rewriter::TreeRewriter;
pub use rule::{FinalPaths, RewriteRule};
