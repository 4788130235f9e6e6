//! Line-oriented rendering of Harvest records.

use std::io::Write;

use anyhow::Result;
use hx_core::{Client, Project, TaskAssignment, TimeEntry, User};
use serde::Serialize;

const CLIENT_MAX_CHARS: usize = 17;

fn inactive_marker(is_active: bool) -> &'static str {
    if is_active { "" } else { "[inactive]" }
}

/// Truncates by characters, not bytes, appending "..." when shortened.
fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    } else {
        text.to_string()
    }
}

pub fn client_line(client: &Client) -> String {
    format!(
        "[{}] {} {}",
        client.id,
        client.name,
        inactive_marker(client.is_active)
    )
    .trim_end()
    .to_string()
}

pub fn project_line(project: &Project) -> String {
    let client = project
        .client
        .as_ref()
        .map(|client| truncate(&client.name, CLIENT_MAX_CHARS))
        .unwrap_or_default();
    format!(
        "[{}] [{client:<20}] {} {}",
        project.id,
        project.name,
        inactive_marker(project.is_active)
    )
    .trim_end()
    .to_string()
}

pub fn task_line(assignment: &TaskAssignment) -> String {
    format!(
        "[{}] {} {}",
        assignment.task.id,
        assignment.task.name,
        inactive_marker(assignment.is_active)
    )
    .trim_end()
    .to_string()
}

pub fn user_line(user: &User) -> String {
    let admin = if user.is_administrator() { "[admin]" } else { "" };
    format!(
        "[{}] - {:<15} - {admin} - {}",
        user.id,
        user.full_name(),
        inactive_marker(user.is_active)
    )
    .trim_end()
    .to_string()
}

pub fn time_entry_line(entry: &TimeEntry) -> String {
    format!(
        "[{}] - [{:<15}] - [{} {:<20}] [{}] [{:>5.2}] {}",
        entry.id,
        entry.user.name,
        entry.task.id,
        entry.task.name,
        entry.spent_date,
        entry.hours,
        entry.notes()
    )
    .trim_end()
    .to_string()
}

/// Writes `records` one line each.
pub fn write_lines<W: Write, R>(
    writer: &mut W,
    records: &[R],
    line: impl Fn(&R) -> String,
) -> Result<()> {
    for record in records {
        writeln!(writer, "{}", line(record))?;
    }
    Ok(())
}

/// Writes a value as pretty JSON followed by a newline.
pub fn write_json<W: Write, T: Serialize + ?Sized>(writer: &mut W, value: &T) -> Result<()> {
    writeln!(writer, "{}", serde_json::to_string_pretty(value)?)?;
    Ok(())
}
