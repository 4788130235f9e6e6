//! Users command.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use hx_api::{ActiveFilter, Harvest, Transport};
use hx_core::User;
use serde_json::Value;

use crate::OutputFormat;
use crate::print::{user_line, write_json, write_lines};

#[derive(Debug, Args)]
pub struct UsersArgs {
    /// Output format.
    #[arg(short, long, value_enum, default_value_t)]
    pub format: OutputFormat,

    /// Filter by status.
    #[arg(short, long, value_enum, default_value_t)]
    pub active: ActiveFilter,
}

pub async fn run<W: Write, T: Transport>(
    writer: &mut W,
    harvest: &Harvest<T>,
    args: &UsersArgs,
) -> Result<()> {
    match args.format {
        OutputFormat::Text => {
            let users: Vec<User> = harvest
                .users(args.active)
                .await
                .context("failed to list users")?;
            write_lines(writer, &users, user_line)
        }
        OutputFormat::Json => {
            let users: Vec<Value> = harvest
                .users(args.active)
                .await
                .context("failed to list users")?;
            write_json(writer, &users)
        }
    }
}
