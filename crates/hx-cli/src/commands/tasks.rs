//! Task assignments command.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use hx_api::{Harvest, Transport};
use hx_core::{ProjectId, TaskAssignment};
use serde_json::Value;

use crate::OutputFormat;
use crate::print::{task_line, write_json, write_lines};

#[derive(Debug, Args)]
pub struct TasksArgs {
    /// Output format.
    #[arg(short, long, value_enum, default_value_t)]
    pub format: OutputFormat,

    /// Only list tasks assigned to this project.
    #[arg(short, long)]
    pub project_id: Option<ProjectId>,
}

pub async fn run<W: Write, T: Transport>(
    writer: &mut W,
    harvest: &Harvest<T>,
    args: &TasksArgs,
) -> Result<()> {
    match args.format {
        OutputFormat::Text => {
            let assignments: Vec<TaskAssignment> = harvest
                .task_assignments(args.project_id)
                .await
                .context("failed to list task assignments")?;
            write_lines(writer, &assignments, task_line)
        }
        OutputFormat::Json => {
            let assignments: Vec<Value> = harvest
                .task_assignments(args.project_id)
                .await
                .context("failed to list task assignments")?;
            write_json(writer, &assignments)
        }
    }
}
