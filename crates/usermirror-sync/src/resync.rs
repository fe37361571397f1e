use std::fmt;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use usermirror_core::{SyncError, UserRecord, UserSource};

use crate::UserIndex;

/// Result of syncing one user during a resync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOutcome {
    pub user_id: String,
    pub email: String,
    /// `None` when the user was written to the index.
    pub error: Option<String>,
}

impl RecordOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Counts over a whole resync. `succeeded + failed == total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl SyncSummary {
    fn record(&mut self, outcome: &RecordOutcome) {
        self.total += 1;
        if outcome.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }
}

impl fmt::Display for SyncSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} users synced ({} failed)",
            self.succeeded, self.total, self.failed
        )
    }
}

/// Summary plus one outcome per user, in the order the store returned them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResyncReport {
    pub summary: SyncSummary,
    pub outcomes: Vec<RecordOutcome>,
}

impl ResyncReport {
    pub fn failures(&self) -> impl Iterator<Item = &RecordOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}

/// Re-mirrors every user of the primary store into the index.
///
/// Users are synced by a bounded pool of `concurrency` in-flight upserts
/// (1 means one after another). A failing user is recorded and the run
/// goes on.
pub struct ResyncDriver {
    source: Arc<dyn UserSource>,
    users: Arc<UserIndex>,
    concurrency: usize,
}

impl ResyncDriver {
    pub fn new(source: Arc<dyn UserSource>, users: Arc<UserIndex>) -> Self {
        Self {
            source,
            users,
            concurrency: 1,
        }
    }

    /// Values below 1 are raised to 1.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Sync every user. Only a failure to read the primary store is an `Err`.
    pub async fn resync_all(&self) -> Result<ResyncReport, SyncError> {
        let records = self.source.find_all().await.map_err(|e| {
            tracing::error!("failed to read users from the primary store: {e}");
            e
        })?;
        tracing::info!(
            "resyncing {} user(s) into '{}'",
            records.len(),
            self.users.collection()
        );

        // Concurrent upserts must find the collection already created.
        if let Err(e) = self.users.ensure_collection().await {
            tracing::warn!("could not prepare '{}': {e}", self.users.collection());
        }

        let outcomes: Vec<RecordOutcome> = stream::iter(records)
            .map(|user| self.sync_one(user))
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut summary = SyncSummary::default();
        for outcome in &outcomes {
            summary.record(outcome);
        }
        tracing::info!("resync finished: {summary}");

        Ok(ResyncReport { summary, outcomes })
    }

    async fn sync_one(&self, user: UserRecord) -> RecordOutcome {
        let error = match self.users.upsert(&user).await {
            Ok(()) => {
                tracing::debug!("synced user {} ({})", user.email, user.id);
                None
            }
            Err(e) => {
                tracing::warn!("failed to sync user {} ({}): {e}", user.email, user.id);
                Some(e.to_string())
            }
        };
        RecordOutcome {
            user_id: user.id,
            email: user.email,
            error,
        }
    }
}
