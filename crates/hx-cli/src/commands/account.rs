//! Account-level commands: connectivity check and company settings.

use std::io::Write;

use anyhow::{Context, Result};
use hx_api::{Harvest, Transport};
use serde_json::Value;

use crate::print::write_json;

/// Prints the authenticated user, proving the credentials work.
pub async fn check<W: Write, T: Transport>(writer: &mut W, harvest: &Harvest<T>) -> Result<()> {
    let user: Value = harvest
        .check()
        .await
        .context("failed to authenticate with Harvest")?;
    tracing::info!(user = %user["id"], "Harvest authentication succeeded");
    write_json(writer, &user)
}

pub async fn company<W: Write, T: Transport>(writer: &mut W, harvest: &Harvest<T>) -> Result<()> {
    let company: Value = harvest
        .company()
        .await
        .context("failed to fetch company")?;
    write_json(writer, &company)
}
