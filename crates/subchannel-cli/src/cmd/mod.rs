//! Subcommand entry points

pub mod completions;
pub mod filter;
