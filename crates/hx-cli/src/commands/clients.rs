//! Clients command.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use hx_api::{ActiveFilter, Harvest, Transport};
use hx_core::Client;
use serde_json::Value;

use crate::OutputFormat;
use crate::print::{client_line, write_json, write_lines};

#[derive(Debug, Args)]
pub struct ClientsArgs {
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
    args: &ClientsArgs,
) -> Result<()> {
    match args.format {
        OutputFormat::Text => {
            let clients: Vec<Client> = harvest
                .clients(args.active)
                .await
                .context("failed to list clients")?;
            write_lines(writer, &clients, client_line)
        }
        OutputFormat::Json => {
            let clients: Vec<Value> = harvest
                .clients(args.active)
                .await
                .context("failed to list clients")?;
            write_json(writer, &clients)
        }
    }
}
