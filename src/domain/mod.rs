//! Domain layer: content tree, ordering and layout primitives
//!
//! This layer is independent of external concerns (no rules, no config loading).

pub mod arena;
pub mod builder;
pub mod entities;
pub mod error;
pub mod layout;
pub mod ordering;

pub use arena::{ContentTree, NodeId, TreeNode};
pub use builder::TreeBuilder;
pub use entities::*;
pub use error::{DomainError, DomainResult, LayoutError};
pub use layout::LayoutConfig;
pub use ordering::OrderingToken;
