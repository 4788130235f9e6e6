//! Core domain types for the Harvest API client.
//!
//! This crate contains the pieces that do not touch the network:
//! - Validated identifiers for Harvest resources
//! - Typed records decoded from API payloads
//! - Migration plans: batch selection and the note-append rule

pub mod migration;
pub mod records;
mod types;

pub use migration::{MigrationPlan, MigrationProgress, MigrationReport, Pairing, append_note};
pub use records::{
    Client, ClientRef, Company, Project, ProjectRef, Task, TaskAssignment, TimeEntry,
    TimeEntryUpdate, User, UserRef,
};
pub use types::{ClientId, ProjectId, TaskId, TimeEntryId, UserId, ValidationError};
