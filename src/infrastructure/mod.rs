//! Infrastructure layer: boundary traits and DI container
//!
//! This layer implements the type-hierarchy boundary and wires up services.

pub mod di;
pub mod traits;

pub use di::ServiceContainer;
pub use traits::{type_chain_contains, TypeHierarchy, TypeResolver};
