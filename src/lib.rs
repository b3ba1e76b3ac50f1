//! scopewalk: scope analysis, renaming and constant evaluation over ESTree
//! JSON trees.
//!
//! The binary is a thin front door over [`scopewalk_traverse`]: it loads a
//! tree, runs one command and prints a JSON response. The command functions
//! live in [`cli`] so they can be exercised without the binary.

pub mod cli;
pub mod config;
pub mod error;
pub mod output;

pub use error::{CliError, OutputErrorCode};
