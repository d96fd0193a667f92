//! Output for a synthesized topology.
//!
//! - [`terminal`] - Plan table and summary with colors
//! - [`plan_file`] - JSON plan file for the reconciler

mod plan_file;
mod terminal;

pub use plan_file::{default_plan_file, write_plan};
pub use terminal::{format_field, format_operation_row, print_plan, print_summary};
