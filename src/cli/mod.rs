//! CLI module for workload - command-line interface.
//!
//! Provides the argument definitions and the console report of visits.

pub mod commands;
pub mod report;

pub use commands::Cli;
