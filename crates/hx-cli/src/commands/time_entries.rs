//! Time entry listing, lookup and single-entry update commands.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use hx_api::{Harvest, Transport};
use hx_core::{ProjectId, TaskId, TimeEntry, TimeEntryId, TimeEntryUpdate, UserId};
use serde_json::Value;

use crate::OutputFormat;
use crate::print::{time_entry_line, write_json, write_lines};

#[derive(Debug, Args)]
pub struct TimeEntriesArgs {
    /// Output format.
    #[arg(short, long, value_enum, default_value_t)]
    pub format: OutputFormat,

    /// Identifier of the project.
    #[arg(short, long)]
    pub project_id: ProjectId,

    /// Only show entries booked against this task.
    #[arg(long)]
    pub task_id: Option<TaskId>,

    /// Only show entries of this user.
    #[arg(long)]
    pub user_id: Option<UserId>,
}

#[derive(Debug, Args)]
pub struct TimeEntryArgs {
    /// Output format.
    #[arg(short, long, value_enum, default_value_t)]
    pub format: OutputFormat,

    /// Identifier of the time entry.
    #[arg(short = 'e', long)]
    pub time_entry_id: TimeEntryId,
}

#[derive(Debug, Args)]
pub struct UpdateTimeEntryArgs {
    /// Identifier of the time entry to modify.
    #[arg(short = 'e', long)]
    pub time_entry_id: TimeEntryId,

    /// Destination project.
    #[arg(short, long)]
    pub project_id: ProjectId,

    /// Destination task.
    #[arg(long)]
    pub task_id: TaskId,

    /// Replacement notes; existing notes are kept when omitted.
    #[arg(short, long)]
    pub notes: Option<String>,
}

pub async fn list<W: Write, T: Transport>(
    writer: &mut W,
    harvest: &Harvest<T>,
    args: &TimeEntriesArgs,
) -> Result<()> {
    let context = || format!("failed to list time entries of project {}", args.project_id);
    // The endpoint has no task filter.
    match args.format {
        OutputFormat::Text => {
            let mut entries: Vec<TimeEntry> = harvest
                .time_entries(args.project_id, args.user_id)
                .await
                .with_context(context)?;
            if let Some(task_id) = args.task_id {
                entries.retain(|entry| entry.task.id == task_id);
            }
            write_lines(writer, &entries, time_entry_line)
        }
        OutputFormat::Json => {
            let mut entries: Vec<Value> = harvest
                .time_entries(args.project_id, args.user_id)
                .await
                .with_context(context)?;
            if let Some(task_id) = args.task_id {
                entries.retain(|entry| entry["task"]["id"] == task_id.get());
            }
            write_json(writer, &entries)
        }
    }
}

pub async fn show<W: Write, T: Transport>(
    writer: &mut W,
    harvest: &Harvest<T>,
    args: &TimeEntryArgs,
) -> Result<()> {
    let context = || format!("failed to fetch time entry {}", args.time_entry_id);
    match args.format {
        OutputFormat::Text => {
            let entry: TimeEntry = harvest
                .time_entry(args.time_entry_id)
                .await
                .with_context(context)?;
            writeln!(writer, "{}", time_entry_line(&entry))?;
            Ok(())
        }
        OutputFormat::Json => {
            let entry: Value = harvest
                .time_entry(args.time_entry_id)
                .await
                .with_context(context)?;
            write_json(writer, &entry)
        }
    }
}

pub async fn update<W: Write, T: Transport>(
    writer: &mut W,
    harvest: &Harvest<T>,
    args: &UpdateTimeEntryArgs,
) -> Result<()> {
    let update = TimeEntryUpdate {
        project_id: args.project_id,
        task_id: args.task_id,
        notes: args.notes.clone(),
    };
    let entry: Value = harvest
        .update_time_entry(args.time_entry_id, &update)
        .await
        .with_context(|| format!("failed to update time entry {}", args.time_entry_id))?;
    write_json(writer, &entry)
}

#[cfg(test)]
mod tests {
    use hx_api::testing::FakeTimeEntries;
    use insta::assert_snapshot;

    use super::*;

    fn fake() -> FakeTimeEntries {
        FakeTimeEntries::new(vec![
            FakeTimeEntries::entry(1, 10, 5, Some("kickoff")),
            FakeTimeEntries::entry(2, 10, 6, None),
            FakeTimeEntries::entry(3, 11, 5, None),
            FakeTimeEntries::entry(4, 10, 5, None),
        ])
    }

    #[tokio::test]
    async fn list_filters_by_task_client_side() {
        let harvest = Harvest::new(fake());
        let args = TimeEntriesArgs {
            format: OutputFormat::Text,
            project_id: ProjectId::new(10).unwrap(),
            task_id: Some(TaskId::new(5).unwrap()),
            user_id: None,
        };

        let mut output = Vec::new();
        list(&mut output, &harvest, &args).await.unwrap();

        let request = &harvest.transport().requests()[0];
        assert_eq!(request.params["project_id"], "10");
        assert!(!request.params.contains_key("task_id"));
        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        [1] - [Kim Allen      ] - [5 Task 5              ] [2024-05-06] [ 1.25] kickoff
        [4] - [Kim Allen      ] - [5 Task 5              ] [2024-05-06] [ 1.25]
        ");
    }

    #[tokio::test]
    async fn list_json_filters_raw_entries_by_task() {
        let harvest = Harvest::new(fake());
        let args = TimeEntriesArgs {
            format: OutputFormat::Json,
            project_id: ProjectId::new(10).unwrap(),
            task_id: Some(TaskId::new(6).unwrap()),
            user_id: None,
        };

        let mut output = Vec::new();
        list(&mut output, &harvest, &args).await.unwrap();

        let printed: Value = serde_json::from_slice(&output).unwrap();
        let entries = printed.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["id"], 2);
        // Payload fields without a typed counterpart are kept.
        assert_eq!(entries[0]["task"]["name"], "Task 6");
        assert!(entries[0].get("client").is_none());
    }

    #[tokio::test]
    async fn show_renders_single_entry_as_text() {
        let harvest = Harvest::new(fake());
        let args = TimeEntryArgs {
            format: OutputFormat::Text,
            time_entry_id: TimeEntryId::new(1).unwrap(),
        };

        let mut output = Vec::new();
        show(&mut output, &harvest, &args).await.unwrap();

        assert_snapshot!(
            String::from_utf8(output).unwrap(),
            @"[1] - [Kim Allen      ] - [5 Task 5              ] [2024-05-06] [ 1.25] kickoff"
        );
    }

    #[tokio::test]
    async fn show_renders_single_entry_as_json_object() {
        let harvest = Harvest::new(fake());
        let args = TimeEntryArgs {
            format: OutputFormat::Json,
            time_entry_id: TimeEntryId::new(2).unwrap(),
        };

        let mut output = Vec::new();
        show(&mut output, &harvest, &args).await.unwrap();

        let printed: Value = serde_json::from_slice(&output).unwrap();
        assert!(printed.is_object());
        assert_eq!(printed["id"], 2);
        assert_eq!(printed["task"]["id"], 6);
        assert_eq!(printed["is_locked"], false);
    }

    #[tokio::test]
    async fn update_moves_entry_and_replaces_notes() {
        let harvest = Harvest::new(fake());
        let args = UpdateTimeEntryArgs {
            time_entry_id: TimeEntryId::new(3).unwrap(),
            project_id: ProjectId::new(20).unwrap(),
            task_id: TaskId::new(7).unwrap(),
            notes: Some("rebooked".to_string()),
        };

        let mut output = Vec::new();
        update(&mut output, &harvest, &args).await.unwrap();

        let printed: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(printed["project"]["id"], 20);
        assert_eq!(printed["task"]["id"], 7);
        assert_eq!(printed["notes"], "rebooked");
    }

    #[tokio::test]
    async fn update_of_locked_entry_fails() {
        let harvest = Harvest::new(fake().fail_update(3));
        let args = UpdateTimeEntryArgs {
            time_entry_id: TimeEntryId::new(3).unwrap(),
            project_id: ProjectId::new(20).unwrap(),
            task_id: TaskId::new(7).unwrap(),
            notes: None,
        };

        let mut output = Vec::new();
        let err = update(&mut output, &harvest, &args).await.unwrap_err();

        assert_eq!(err.to_string(), "failed to update time entry 3");
        assert!(format!("{err:#}").contains("Entry is locked"));
    }
}
