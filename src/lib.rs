//! Rule-driven rewriting of hierarchical content trees.
//!
//! Legacy column-control structures are turned into responsive grids or into
//! discrete containers while keeping sibling order intact.
//!
//! Layers:
//! - [`domain`]: content tree, ordering tokens, column width tables
//! - [`application`]: rule contract, registry, rewrite engine, concrete rules
//! - [`infrastructure`]: type-hierarchy boundary, service wiring
//! - [`config`]: layered settings describing the configured rules

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod util;

pub use application::{
    ApplicationError, ApplicationResult, FinalPaths, RewriteRule, RuleRegistry, TreeRewriter,
};
pub use domain::{ContentTree, LayoutConfig, NodeId, OrderingToken, TreeBuilder};
