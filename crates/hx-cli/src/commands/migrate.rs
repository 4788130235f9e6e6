//! Bulk migration of time entries between project/task pairings.
//!
//! This module implements `hx migrate`, which moves every entry booked against
//! a source project/task to a destination project/task, then re-queries the
//! source to confirm nothing is left behind.

use std::fmt;
use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Args;
use hx_api::{Harvest, MigrationError, Transport};
use hx_core::{MigrationPlan, MigrationProgress, Pairing, ProjectId, TaskId, TimeEntry};

use crate::print::time_entry_line;

#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Source project.
    #[arg(long)]
    pub from_project: ProjectId,

    /// Source task.
    #[arg(long)]
    pub from_task: TaskId,

    /// Destination project.
    #[arg(long)]
    pub to_project: ProjectId,

    /// Destination task.
    #[arg(long)]
    pub to_task: TaskId,

    /// Text to add to each migrated entry's notes.
    #[arg(short, long)]
    pub note_append: Option<String>,

    /// List the entries that would be migrated without changing them.
    #[arg(long)]
    pub dry_run: bool,
}

impl MigrateArgs {
    fn plan(&self) -> MigrationPlan {
        let plan = MigrationPlan::new(
            Pairing::new(self.from_project, self.from_task),
            Pairing::new(self.to_project, self.to_task),
        );
        match &self.note_append {
            Some(note) => plan.with_note_append(note.clone()),
            None => plan,
        }
    }
}

/// Writes progress lines as the migration runs.
///
/// Progress callbacks cannot fail, so the first write error is kept and
/// reported once the migration returns.
struct ProgressPrinter<'w, W: Write> {
    writer: &'w mut W,
    plan: &'w MigrationPlan,
    error: Option<io::Error>,
}

impl<W: Write> ProgressPrinter<'_, W> {
    fn line(&mut self, args: fmt::Arguments<'_>) {
        if self.error.is_none() {
            if let Err(err) = writeln!(self.writer, "{args}") {
                self.error = Some(err);
            }
        }
    }
}

impl<W: Write> MigrationProgress for ProgressPrinter<'_, W> {
    fn selected(&mut self, batch: &[TimeEntry]) {
        let plan = self.plan;
        self.line(format_args!(
            "Migrating {} time entries from project {} task {} to project {} task {}",
            batch.len(),
            plan.from.project,
            plan.from.task,
            plan.to.project,
            plan.to.task
        ));
    }

    fn migrated(&mut self, entry: &TimeEntry) {
        self.line(format_args!("Time entry {} updated", entry.id));
    }

    fn verifying(&mut self) {
        self.line(format_args!(
            "Checking that there aren't remaining entries, hold on..."
        ));
    }
}

pub async fn run<W: Write, T: Transport>(
    writer: &mut W,
    harvest: &Harvest<T>,
    args: &MigrateArgs,
) -> Result<()> {
    let plan = args.plan();

    if args.dry_run {
        let batch = hx_api::select_batch(harvest, &plan)
            .await
            .context("failed to select time entries")?;
        writeln!(
            writer,
            "Dry run: {} time entries would be migrated",
            batch.len()
        )?;
        for entry in &batch {
            writeln!(writer, "{}", time_entry_line(entry))?;
        }
        return Ok(());
    }

    let mut printer = ProgressPrinter {
        writer,
        plan: &plan,
        error: None,
    };
    let outcome = hx_api::migrate(harvest, &plan, &mut printer).await;
    let ProgressPrinter { writer, error, .. } = printer;

    let report = match outcome {
        Ok(report) => report,
        Err(err) => {
            if let Some(write_err) = &error {
                tracing::warn!(error = %write_err, "failed to write migration progress");
            }
            if let Err(write_err) = write_partial_summary(writer, &err) {
                tracing::warn!(error = %write_err, "failed to write migration summary");
            }
            return Err(err).context("time entry migration aborted");
        }
    };
    if let Some(err) = error {
        return Err(err).context("failed to write migration progress");
    }

    if report.is_complete() {
        writeln!(writer, "All entries migrated!")?;
    } else {
        writeln!(
            writer,
            "{} entries were not migrated, run the command again:",
            report.remaining.len()
        )?;
        for entry in &report.remaining {
            writeln!(writer, "{}", time_entry_line(entry))?;
        }
    }
    Ok(())
}

fn write_partial_summary<W: Write>(writer: &mut W, err: &MigrationError) -> Result<()> {
    let migrated = err.migrated();
    if migrated.is_empty() {
        writeln!(writer, "No time entries were migrated.")?;
    } else {
        let ids = migrated
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(
            writer,
            "Migrated {} time entries before the failure: {ids}",
            migrated.len()
        )?;
    }
    Ok(())
}
