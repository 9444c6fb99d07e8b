//! Retention sweep: drop long-closed internships and the applications that depend on them.
//!
//! - Due when `lastCleanup` is absent, unparsable, or older than the interval
//! - Keeps an internship if it is active OR was created after the cutoff
//! - Keeps an application only if its internship survived
//! - Records outside the schema are judged on their raw `status`, `createdAt`
//!   and `internshipId`, and written back untouched when kept
//! - Internships, applications and the new `lastCleanup` are committed in one
//!   `set_many`; on failure nothing is written and the next start retries

use crate::adapters::persistence::{Collection, CollectionStore, StorageKey};
use crate::domain::{Application, DomainError, Internship, InternshipStatus};
use crate::ports::Clock;
use chrono::{DateTime, Months, TimeDelta, Utc};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info};

pub const DEFAULT_CLEANUP_INTERVAL_DAYS: i64 = 7;
pub const DEFAULT_RETENTION_MONTHS: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Minimum time between two sweeps.
    pub cleanup_interval: TimeDelta,
    /// Closed internships older than this many calendar months are removed.
    pub closed_retention: Months,
}

impl RetentionPolicy {
    pub fn new(cleanup_interval_days: i64, retention_months: u32) -> Self {
        Self {
            cleanup_interval: TimeDelta::days(cleanup_interval_days),
            closed_retention: Months::new(retention_months),
        }
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_CLEANUP_INTERVAL_DAYS, DEFAULT_RETENTION_MONTHS)
    }
}

/// Outcome of one sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub swept_at: DateTime<Utc>,
    pub internships_kept: usize,
    pub internships_removed: usize,
    pub applications_kept: usize,
    pub applications_removed: usize,
}

pub struct RetentionSweeper {
    store: CollectionStore,
    clock: Arc<dyn Clock>,
    policy: RetentionPolicy,
}

impl RetentionSweeper {
    pub fn new(store: CollectionStore, clock: Arc<dyn Clock>, policy: RetentionPolicy) -> Self {
        Self {
            store,
            clock,
            policy,
        }
    }

    /// Instant of the last completed sweep (millisecond epoch string in storage).
    pub async fn last_cleanup(&self) -> Option<DateTime<Utc>> {
        let raw = self.store.read_scalar(StorageKey::LastCleanup).await?;
        let millis: i64 = raw.trim().parse().ok()?;
        DateTime::from_timestamp_millis(millis)
    }

    pub async fn is_due(&self) -> bool {
        match self.last_cleanup().await {
            None => true,
            Some(last) => self.clock.now() - last > self.policy.cleanup_interval,
        }
    }

    /// Sweep if due. Errors are logged and swallowed.
    pub async fn run_if_due(&self) -> Option<SweepReport> {
        if !self.is_due().await {
            debug!("retention sweep not due");
            return None;
        }
        match self.sweep().await {
            Ok(report) => Some(report),
            Err(e) => {
                error!(error = %e, "retention sweep failed, nothing was removed");
                None
            }
        }
    }

    pub async fn sweep(&self) -> Result<SweepReport, DomainError> {
        let now = self.clock.now();
        let cutoff = now
            .checked_sub_months(self.policy.closed_retention)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let mut internships: Collection<Internship> = self.store.load(StorageKey::Internships).await;
        let total_internships = internships.len();
        internships.retain(
            |i| i.status == InternshipStatus::Active || i.created_at > cutoff,
            |raw| keep_raw_internship(raw, cutoff),
        );
        let surviving: HashSet<&str> = internships.ids().collect();

        let mut applications: Collection<Application> =
            self.store.load(StorageKey::Applications).await;
        let total_applications = applications.len();
        applications.retain(
            |a| surviving.contains(a.internship_id.as_str()),
            |raw| {
                raw.get("internshipId")
                    .and_then(Value::as_str)
                    .is_some_and(|id| surviving.contains(id))
            },
        );

        self.store
            .commit(vec![
                CollectionStore::stage(StorageKey::Internships, &internships)?,
                CollectionStore::stage(StorageKey::Applications, &applications)?,
                CollectionStore::stage_scalar(
                    StorageKey::LastCleanup,
                    now.timestamp_millis().to_string(),
                ),
            ])
            .await?;

        let report = SweepReport {
            swept_at: now,
            internships_kept: internships.len(),
            internships_removed: total_internships - internships.len(),
            applications_kept: applications.len(),
            applications_removed: total_applications - applications.len(),
        };
        info!(
            internships_removed = report.internships_removed,
            applications_removed = report.applications_removed,
            cutoff = %cutoff,
            "retention sweep complete"
        );
        Ok(report)
    }
}

/// Same rule for a record outside the schema: an active ("open") status or a
/// `createdAt` after the cutoff keeps it. An unreadable `createdAt` is not recent.
fn keep_raw_internship(raw: &Value, cutoff: DateTime<Utc>) -> bool {
    let status = raw.get("status").and_then(Value::as_str);
    if status.is_some_and(|s| s.parse::<InternshipStatus>().ok() == Some(InternshipStatus::Active)) {
        return true;
    }
    raw.get("createdAt")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .is_some_and(|created| created.with_timezone(&Utc) > cutoff)
}
