//! One module per CLI subcommand.

pub mod completions;
pub mod edit;
pub mod setup;
pub mod show;
