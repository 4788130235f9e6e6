//! Harvest API client CLI library.
//!
//! This crate provides the CLI interface for the `hx` binary.

mod cli;
pub mod commands;
mod config;
pub mod print;

pub use cli::{Cli, Commands, OutputFormat};
pub use config::Config;
