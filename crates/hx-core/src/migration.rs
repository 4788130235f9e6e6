//! Planning for bulk time-entry migrations.
//!
//! A migration moves every time entry booked against one project/task pair
//! to another pair. The network side lives in `hx-api`; this module holds the
//! rules that decide which entries move and what their notes become.

use crate::records::{TimeEntry, TimeEntryUpdate};
use crate::types::{ProjectId, TaskId, TimeEntryId};

/// A project/task pair that time can be booked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pairing {
    pub project: ProjectId,
    pub task: TaskId,
}

impl Pairing {
    pub const fn new(project: ProjectId, task: TaskId) -> Self {
        Self { project, task }
    }
}

/// Source, destination and note annotation of a migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationPlan {
    pub from: Pairing,
    pub to: Pairing,
    pub note_append: Option<String>,
}

impl MigrationPlan {
    pub const fn new(from: Pairing, to: Pairing) -> Self {
        Self {
            from,
            to,
            note_append: None,
        }
    }

    /// Sets the text appended to each migrated entry's notes.
    #[must_use]
    pub fn with_note_append(mut self, note_append: impl Into<String>) -> Self {
        self.note_append = Some(note_append.into());
        self
    }

    /// Keeps the entries booked against the source task, in their original order.
    ///
    /// Entries are expected to be pre-filtered by source project on the server;
    /// Harvest has no task filter on the time entries endpoint.
    pub fn select(&self, entries: Vec<TimeEntry>) -> Vec<TimeEntry> {
        entries
            .into_iter()
            .filter(|entry| entry.task.id == self.from.task)
            .collect()
    }

    /// The partial update that moves `entry` to the destination pairing.
    pub fn update_for(&self, entry: &TimeEntry) -> TimeEntryUpdate {
        TimeEntryUpdate {
            project_id: self.to.project,
            task_id: self.to.task,
            notes: self
                .note_append
                .as_deref()
                .map(|suffix| append_note(entry.notes(), suffix)),
        }
    }
}

/// Appends `suffix` to existing notes, separated by `" - "`.
///
/// Empty notes are replaced by the suffix alone.
pub fn append_note(existing: &str, suffix: &str) -> String {
    if existing.is_empty() {
        suffix.to_string()
    } else {
        format!("{existing} - {suffix}")
    }
}

/// Outcome of a migration that ran to the end.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MigrationReport {
    /// Entries updated, in the order they were updated.
    pub migrated: Vec<TimeEntryId>,
    /// Entries still booked against the source pairing after verification.
    pub remaining: Vec<TimeEntry>,
}

impl MigrationReport {
    /// True when verification found nothing left to move.
    pub fn is_complete(&self) -> bool {
        self.remaining.is_empty()
    }
}

/// Receives progress notifications while a migration runs.
///
/// All methods default to doing nothing; `()` is a silent sink.
pub trait MigrationProgress {
    /// The batch selected for migration, before any update is sent.
    fn selected(&mut self, _batch: &[TimeEntry]) {}

    /// An entry was updated; `entry` is the record as returned by the server.
    fn migrated(&mut self, _entry: &TimeEntry) {}

    /// All updates were sent and verification is starting.
    fn verifying(&mut self) {}
}

impl MigrationProgress for () {}
