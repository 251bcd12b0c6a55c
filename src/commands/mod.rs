//! CLI command implementations.
//!
//! Each command family is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod entities;
pub mod models;
pub mod series;
pub mod utils;

// Re-export main command functions
pub use entities::{execute_merge, execute_rollup, validate_merge_args, validate_rollup_args};
pub use models::{ChainInput, FlattenArgs, JoinArgs, MergeArgs, RollupArgs};
pub use series::{execute_flatten, execute_join, validate_flatten_args, validate_join_args};
pub use utils::{display_schema, display_version, validate_output_file};
