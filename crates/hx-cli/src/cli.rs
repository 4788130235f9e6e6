//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::commands::clients::ClientsArgs;
use crate::commands::migrate::MigrateArgs;
use crate::commands::projects::{ProjectArgs, ProjectsArgs};
use crate::commands::tasks::TasksArgs;
use crate::commands::time_entries::{TimeEntriesArgs, TimeEntryArgs, UpdateTimeEntryArgs};
use crate::commands::users::UsersArgs;

/// Harvest time tracking from the command line.
///
/// Lists clients, projects, users, tasks and time entries, and moves time
/// entries between projects and tasks in bulk.
#[derive(Debug, Parser)]
#[command(name = "hx", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Harvest personal access token (overrides `HARVEST_TOKEN`).
    #[arg(short, long)]
    pub token: Option<String>,

    /// Harvest account ID (overrides `HARVEST_ID`).
    #[arg(short, long)]
    pub account_id: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check connectivity with Harvest and show the authenticated user.
    Check,

    /// Show company settings.
    Company,

    /// List clients.
    Clients(ClientsArgs),

    /// List users.
    Users(UsersArgs),

    /// List projects.
    Projects(ProjectsArgs),

    /// Show a single project.
    Project(ProjectArgs),

    /// List task assignments.
    Tasks(TasksArgs),

    /// List time entries of a project.
    TimeEntries(TimeEntriesArgs),

    /// Show a single time entry.
    TimeEntry(TimeEntryArgs),

    /// Move a time entry to another project and task.
    UpdateTimeEntry(UpdateTimeEntryArgs),

    /// Move every time entry of a project/task to another project/task.
    #[command(alias = "update-all-time-entries")]
    Migrate(MigrateArgs),
}

/// Output format for listing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One line per record.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}
