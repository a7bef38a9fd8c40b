//! Command-line interface for artist-sync.
//!
//! This module provides CLI commands for running a catalog sync, looking
//! names up in the catalog and managing local artist records.

mod commands;

pub use commands::{Cli, Commands, run_command};
