//! Typed Harvest records.
//!
//! Payloads are decoded into these once, at the API boundary. Fields the
//! client never reads are not modelled; unknown fields are ignored.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ClientId, ProjectId, TaskId, TimeEntryId, UserId};

/// The account's company settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub name: String,
    #[serde(default)]
    pub base_uri: Option<String>,
    #[serde(default)]
    pub full_domain: Option<String>,
    pub is_active: bool,
    #[serde(default)]
    pub week_start_day: Option<String>,
    #[serde(default)]
    pub time_format: Option<String>,
    #[serde(default)]
    pub clock: Option<String>,
    #[serde(default)]
    pub plan_type: Option<String>,
}

/// A client of the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub is_active: bool,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Client summary embedded in projects and time entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRef {
    pub id: ClientId,
    pub name: String,
    #[serde(default)]
    pub currency: Option<String>,
}

/// A project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    pub is_active: bool,
    #[serde(default)]
    pub is_billable: bool,
    #[serde(default)]
    pub client: Option<ClientRef>,
}

/// Project summary embedded in task assignments and time entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
}

/// A task, as referenced from assignments and time entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
}

/// A task assigned to a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskAssignment {
    pub id: i64,
    pub is_active: bool,
    #[serde(default)]
    pub billable: Option<bool>,
    pub task: Task,
    #[serde(default)]
    pub project: Option<ProjectRef>,
}

/// A user of the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    pub is_active: bool,
    /// Legacy flag; newer accounts report roles in `access_roles` instead.
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub access_roles: Vec<String>,
}

impl User {
    /// First and last name joined by a space.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Whether the user administers the account.
    pub fn is_administrator(&self) -> bool {
        self.is_admin || self.access_roles.iter().any(|role| role == "administrator")
    }
}

/// User summary embedded in time entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: UserId,
    pub name: String,
}

/// A tracked block of time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: TimeEntryId,
    pub spent_date: NaiveDate,
    pub hours: f64,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_locked: bool,
    pub user: UserRef,
    pub project: ProjectRef,
    pub task: Task,
    #[serde(default)]
    pub client: Option<ClientRef>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TimeEntry {
    /// The entry's notes, empty when Harvest reports none.
    pub fn notes(&self) -> &str {
        self.notes.as_deref().unwrap_or_default()
    }
}

/// Fields changed by a partial update of a time entry.
///
/// Fields not listed here are left untouched on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeEntryUpdate {
    pub project_id: ProjectId,
    pub task_id: TaskId,
    /// Replacement notes; `None` leaves the notes as they are.
    pub notes: Option<String>,
}
