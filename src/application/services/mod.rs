//! Application services
//!
//! Concrete service implementations that orchestrate the rewrite engine.
//! Services depend on the rule registry and boundary traits (TypeResolver)
//! but are themselves concrete structs, not traits.

mod rewrite;

pub use rewrite::RewriteService;
