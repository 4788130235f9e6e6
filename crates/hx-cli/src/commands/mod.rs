//! CLI subcommand implementations.

pub mod account;
pub mod clients;
pub mod migrate;
pub mod projects;
pub mod tasks;
pub mod time_entries;
pub mod users;
