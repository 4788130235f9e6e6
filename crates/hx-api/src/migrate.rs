//! Bulk migration of time entries between project/task pairings.
//!
//! The workflow is not atomic. Updates are sent one by one and the first
//! failure stops the run; entries updated before it stay updated. Running the
//! same plan again only touches entries that still match the source pairing.

use hx_core::{MigrationPlan, MigrationProgress, MigrationReport, TimeEntry, TimeEntryId};
use thiserror::Error;

use crate::client::Harvest;
use crate::error::ApiError;
use crate::transport::Transport;

/// Migration failures, each with the entries already moved.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The source entries could not be fetched; nothing was changed.
    #[error("failed to select time entries: {0}")]
    Select(#[source] ApiError),
    /// An update was rejected; later entries were not attempted.
    #[error("failed to update time entry {entry} after migrating {} entries: {source}", .migrated.len())]
    Apply {
        entry: TimeEntryId,
        migrated: Vec<TimeEntryId>,
        #[source]
        source: ApiError,
    },
    /// All updates were sent but the verification query failed.
    #[error("failed to verify migration of {} entries: {source}", .migrated.len())]
    Verify {
        migrated: Vec<TimeEntryId>,
        #[source]
        source: ApiError,
    },
}

impl MigrationError {
    /// Entries updated before the failure.
    pub fn migrated(&self) -> &[TimeEntryId] {
        match self {
            Self::Select(_) => &[],
            Self::Apply { migrated, .. } | Self::Verify { migrated, .. } => migrated,
        }
    }
}

/// Fetches the entries currently booked against the plan's source pairing.
pub async fn select_batch<T: Transport>(
    harvest: &Harvest<T>,
    plan: &MigrationPlan,
) -> Result<Vec<TimeEntry>, ApiError> {
    let entries = harvest
        .time_entries::<TimeEntry>(plan.from.project, None)
        .await?;
    Ok(plan.select(entries))
}

/// Moves every entry matching `plan.from` to `plan.to`, then verifies.
///
/// Verification re-queries the source pairing; entries it still finds are
/// returned in [`MigrationReport::remaining`].
pub async fn migrate<T, P>(
    harvest: &Harvest<T>,
    plan: &MigrationPlan,
    progress: &mut P,
) -> Result<MigrationReport, MigrationError>
where
    T: Transport,
    P: MigrationProgress + ?Sized,
{
    let batch = select_batch(harvest, plan)
        .await
        .map_err(MigrationError::Select)?;
    tracing::info!(
        count = batch.len(),
        from_project = %plan.from.project,
        from_task = %plan.from.task,
        "selected time entries for migration"
    );
    progress.selected(&batch);

    let mut migrated = Vec::with_capacity(batch.len());
    for entry in &batch {
        let update = plan.update_for(entry);
        match harvest
            .update_time_entry::<TimeEntry>(entry.id, &update)
            .await
        {
            Ok(updated) => {
                tracing::debug!(entry = %entry.id, "time entry migrated");
                progress.migrated(&updated);
                migrated.push(entry.id);
            }
            Err(source) => {
                tracing::warn!(entry = %entry.id, migrated = migrated.len(), "migration aborted");
                return Err(MigrationError::Apply {
                    entry: entry.id,
                    migrated,
                    source,
                });
            }
        }
    }

    progress.verifying();
    let remaining = match select_batch(harvest, plan).await {
        Ok(remaining) => remaining,
        Err(source) => return Err(MigrationError::Verify { migrated, source }),
    };
    if !remaining.is_empty() {
        tracing::warn!(count = remaining.len(), "time entries still match the source pairing");
    }

    Ok(MigrationReport {
        migrated,
        remaining,
    })
}
