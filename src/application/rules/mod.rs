//! Concrete rewrite rules

pub mod column_control;
pub mod column_layout;
pub mod replace_type;

pub use column_control::{ColumnControlOptions, ColumnControlRule, ColumnMode};
pub use column_layout::{ColumnLayout, ColumnPartition};
pub use replace_type::ReplaceTypeRule;
