use tracing::{error, info};

use crate::model::issue::{IssuePatch, TrackedIssue};
use crate::model::record::{CanonicalRecord, DONE_STATUS, IN_PROGRESS_STATUS};
use crate::store::{IssueStore, StoreError};
use crate::util::time::{adjusted_now, now_in_target_offset, to_target_offset};

/// What the reconciler did with one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Inserted,
    Updated,
}

/// Batch counts: records inserted, updated, and skipped on store failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchCounts {
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
}

pub struct Reconciler<'a> {
    store: &'a dyn IssueStore,
}

impl<'a> Reconciler<'a> {
    pub fn new(store: &'a dyn IssueStore) -> Self {
        Self { store }
    }

    /// Reconcile a batch in order. A store failure for one record is logged
    /// and the rest of the batch still runs.
    pub async fn reconcile_all(&self, records: &[CanonicalRecord]) -> BatchCounts {
        let mut counts = BatchCounts::default();
        for record in records {
            match self.reconcile(record).await {
                Ok(Outcome::Inserted) => counts.inserted += 1,
                Ok(Outcome::Updated) => counts.updated += 1,
                Err(err) => {
                    error!(issue_number = record.issue_number, %err, "reconciliation failed");
                    counts.skipped += 1;
                }
            }
        }
        counts
    }

    /// Read-then-write merge for a single record. Not-found routes to the
    /// insert path; any store error bubbles up to the batch loop.
    pub async fn reconcile(&self, record: &CanonicalRecord) -> Result<Outcome, StoreError> {
        match self.store.read_by_number(record.issue_number).await? {
            None => {
                let issue = build_insert(record);
                self.store.insert(&issue).await?;
                info!(
                    issue_number = record.issue_number,
                    status = %record.status,
                    "inserted issue"
                );
                Ok(Outcome::Inserted)
            }
            Some(existing) => {
                let patch = build_patch(record, &existing);
                self.store
                    .update_by_number(record.issue_number, &patch)
                    .await?;
                info!(
                    issue_number = record.issue_number,
                    status_changed = patch.status.is_some(),
                    "updated issue"
                );
                Ok(Outcome::Updated)
            }
        }
    }
}

/// Full row for a first-seen issue. `updated_at` is stamped unconditionally;
/// there is no prior status to compare against.
fn build_insert(record: &CanonicalRecord) -> TrackedIssue {
    let now = now_in_target_offset();
    let created_at = record
        .source_created_at
        .map(to_target_offset)
        .unwrap_or(now);

    TrackedIssue {
        issue_number: record.issue_number,
        title: record.title.clone(),
        url: record.url.clone(),
        assignees: record.assignees.clone(),
        status: record.status.clone(),
        priority: record.priority.clone(),
        issue_type: record.issue_type.clone(),
        created_by: record.created_by.clone(),
        app_name: record.app_name.clone(),
        build_type: record.build_type.clone(),
        build_version: record.build_version.clone(),
        device_type: record.device_type.clone(),
        timeline: record.timeline.clone(),
        created_at,
        updated_at: now,
        start_time: (record.status == IN_PROGRESS_STATUS).then(adjusted_now),
        end_time: (record.status == DONE_STATUS).then(adjusted_now),
    }
}

/// Partial row for an already-tracked issue. Lifecycle timestamps fire on the
/// unset check, not on a transition edge: a prior run that observed the
/// status but failed to persist the timestamp gets a second chance here.
fn build_patch(record: &CanonicalRecord, existing: &TrackedIssue) -> IssuePatch {
    let status_changed = existing.status != record.status;

    IssuePatch {
        title: record.title.clone(),
        url: record.url.clone(),
        assignees: record.assignees.clone(),
        priority: record.priority.clone(),
        issue_type: record.issue_type.clone(),
        created_by: record.created_by.clone(),
        app_name: record.app_name.clone(),
        build_type: record.build_type.clone(),
        build_version: record.build_version.clone(),
        device_type: record.device_type.clone(),
        timeline: record.timeline.clone(),
        // Overwritten every run from the source creation instant.
        created_at: record
            .source_created_at
            .map(to_target_offset)
            .unwrap_or(existing.created_at),
        status: status_changed.then(|| record.status.clone()),
        updated_at: status_changed.then(now_in_target_offset),
        start_time: (record.status == IN_PROGRESS_STATUS && existing.start_time.is_none())
            .then(adjusted_now),
        end_time: (record.status == DONE_STATUS && existing.end_time.is_none())
            .then(adjusted_now),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::model::record::CanonicalRecord;

    /// In-memory store that applies writes, so successive reconciliations
    /// observe the state left behind by earlier ones.
    #[derive(Default)]
    struct MockStore {
        rows: Mutex<HashMap<u64, TrackedIssue>>,
        patches: Mutex<Vec<(u64, IssuePatch)>>,
        fail_reads_for: HashSet<u64>,
    }

    impl MockStore {
        fn failing_reads_for(numbers: &[u64]) -> Self {
            Self {
                fail_reads_for: numbers.iter().copied().collect(),
                ..Self::default()
            }
        }

        fn row(&self, number: u64) -> TrackedIssue {
            self.rows.lock().unwrap().get(&number).cloned().unwrap()
        }

        fn last_patch(&self, number: u64) -> IssuePatch {
            self.patches
                .lock()
                .unwrap()
                .iter()
                .rev()
                .find(|(n, _)| *n == number)
                .map(|(_, p)| p.clone())
                .unwrap()
        }

        fn apply(&self, number: u64, patch: &IssuePatch) {
            let mut rows = self.rows.lock().unwrap();
            if let Some(row) = rows.get_mut(&number) {
                row.title = patch.title.clone();
                row.url = patch.url.clone();
                row.assignees = patch.assignees.clone();
                row.priority = patch.priority.clone();
                row.issue_type = patch.issue_type.clone();
                row.created_by = patch.created_by.clone();
                row.app_name = patch.app_name.clone();
                row.build_type = patch.build_type.clone();
                row.build_version = patch.build_version.clone();
                row.device_type = patch.device_type.clone();
                row.timeline = patch.timeline.clone();
                row.created_at = patch.created_at;
                if let Some(status) = &patch.status {
                    row.status = status.clone();
                }
                if let Some(updated_at) = patch.updated_at {
                    row.updated_at = updated_at;
                }
                if let Some(start_time) = patch.start_time {
                    row.start_time = Some(start_time);
                }
                if let Some(end_time) = patch.end_time {
                    row.end_time = Some(end_time);
                }
            }
        }
    }

    #[async_trait]
    impl IssueStore for MockStore {
        async fn read_by_number(
            &self,
            issue_number: u64,
        ) -> Result<Option<TrackedIssue>, StoreError> {
            if self.fail_reads_for.contains(&issue_number) {
                return Err(StoreError::Http {
                    status: 500,
                    body: "read failed".into(),
                });
            }
            Ok(self.rows.lock().unwrap().get(&issue_number).cloned())
        }

        async fn insert(&self, issue: &TrackedIssue) -> Result<(), StoreError> {
            self.rows
                .lock()
                .unwrap()
                .insert(issue.issue_number, issue.clone());
            Ok(())
        }

        async fn update_by_number(
            &self,
            issue_number: u64,
            patch: &IssuePatch,
        ) -> Result<(), StoreError> {
            self.patches
                .lock()
                .unwrap()
                .push((issue_number, patch.clone()));
            self.apply(issue_number, patch);
            Ok(())
        }
    }

    fn mk_record(number: u64, status: &str) -> CanonicalRecord {
        CanonicalRecord {
            issue_number: number,
            title: format!("Issue {number}"),
            url: format!("https://github.com/acme/app/issues/{number}"),
            assignees: vec!["alice".into()],
            status: status.into(),
            priority: "No Priority".into(),
            issue_type: "Bug".into(),
            created_by: "bob".into(),
            app_name: "Unknown".into(),
            build_type: "Unknown".into(),
            build_version: "Unknown".into(),
            device_type: "Unknown".into(),
            timeline: "Unknown".into(),
            source_created_at: Some("2024-01-01T00:00:00Z".parse().unwrap()),
        }
    }

    #[tokio::test]
    async fn first_sync_inserts_with_start_time_for_in_progress() {
        let store = MockStore::default();
        let reconciler = Reconciler::new(&store);

        let outcome = reconciler
            .reconcile(&mk_record(42, IN_PROGRESS_STATUS))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Inserted);

        let row = store.row(42);
        assert_eq!(row.status, IN_PROGRESS_STATUS);
        assert!(row.start_time.is_some());
        assert!(row.end_time.is_none());
        // created_at carries the normalized source instant, not "now".
        assert_eq!(row.created_at.to_rfc3339(), "2024-01-01T05:30:00+05:30");
    }

    #[tokio::test]
    async fn insert_without_lifecycle_status_leaves_timestamps_unset() {
        let store = MockStore::default();
        let reconciler = Reconciler::new(&store);

        reconciler.reconcile(&mk_record(42, "Todo")).await.unwrap();

        let row = store.row(42);
        assert!(row.start_time.is_none());
        assert!(row.end_time.is_none());
    }

    #[tokio::test]
    async fn unchanged_status_update_touches_neither_status_nor_timestamps() {
        let store = MockStore::default();
        let reconciler = Reconciler::new(&store);
        let record = mk_record(42, IN_PROGRESS_STATUS);

        reconciler.reconcile(&record).await.unwrap();
        let after_first = store.row(42);

        let outcome = reconciler.reconcile(&record).await.unwrap();
        assert_eq!(outcome, Outcome::Updated);

        let patch = store.last_patch(42);
        assert!(patch.status.is_none());
        assert!(patch.updated_at.is_none());
        assert!(patch.start_time.is_none());
        assert!(patch.end_time.is_none());

        let after_second = store.row(42);
        assert_eq!(after_second.updated_at, after_first.updated_at);
        assert_eq!(after_second.start_time, after_first.start_time);
    }

    #[tokio::test]
    async fn done_after_in_progress_sets_end_time_and_keeps_start_time() {
        let store = MockStore::default();
        let reconciler = Reconciler::new(&store);

        reconciler
            .reconcile(&mk_record(42, IN_PROGRESS_STATUS))
            .await
            .unwrap();
        let start_time = store.row(42).start_time;

        reconciler
            .reconcile(&mk_record(42, IN_PROGRESS_STATUS))
            .await
            .unwrap();
        reconciler
            .reconcile(&mk_record(42, DONE_STATUS))
            .await
            .unwrap();

        let patch = store.last_patch(42);
        assert_eq!(patch.status.as_deref(), Some(DONE_STATUS));
        assert!(patch.updated_at.is_some());
        assert!(patch.end_time.is_some());
        assert!(patch.start_time.is_none());

        let row = store.row(42);
        assert_eq!(row.start_time, start_time);
        assert!(row.end_time.is_some());
    }

    #[tokio::test]
    async fn lifecycle_timestamps_never_move_once_set() {
        let store = MockStore::default();
        let reconciler = Reconciler::new(&store);

        reconciler
            .reconcile(&mk_record(42, DONE_STATUS))
            .await
            .unwrap();
        let first_end = store.row(42).end_time;

        // Reopened and finished again: end_time must not move.
        reconciler
            .reconcile(&mk_record(42, IN_PROGRESS_STATUS))
            .await
            .unwrap();
        reconciler
            .reconcile(&mk_record(42, DONE_STATUS))
            .await
            .unwrap();

        assert_eq!(store.row(42).end_time, first_end);
    }

    #[tokio::test]
    async fn start_time_backfills_when_missing_despite_unchanged_status() {
        // A prior partial run stored the in-progress status but not the
        // timestamp. The unset check fires even though the status is equal.
        let store = MockStore::default();
        let reconciler = Reconciler::new(&store);

        reconciler.reconcile(&mk_record(42, "Todo")).await.unwrap();
        {
            let mut rows = store.rows.lock().unwrap();
            rows.get_mut(&42).unwrap().status = IN_PROGRESS_STATUS.into();
        }

        reconciler
            .reconcile(&mk_record(42, IN_PROGRESS_STATUS))
            .await
            .unwrap();

        let patch = store.last_patch(42);
        assert!(patch.status.is_none());
        assert!(patch.start_time.is_some());
    }

    #[tokio::test]
    async fn done_without_prior_in_progress_still_sets_end_time() {
        let store = MockStore::default();
        let reconciler = Reconciler::new(&store);

        reconciler.reconcile(&mk_record(42, "Todo")).await.unwrap();
        reconciler
            .reconcile(&mk_record(42, DONE_STATUS))
            .await
            .unwrap();

        let row = store.row(42);
        assert!(row.start_time.is_none());
        assert!(row.end_time.is_some());
    }

    #[tokio::test]
    async fn store_failure_skips_the_record_and_continues() {
        let store = MockStore::failing_reads_for(&[2]);
        let reconciler = Reconciler::new(&store);

        let records = vec![
            mk_record(1, "Todo"),
            mk_record(2, "Todo"),
            mk_record(3, "Todo"),
        ];
        let counts = reconciler.reconcile_all(&records).await;

        assert_eq!(counts.inserted, 2);
        assert_eq!(counts.updated, 0);
        assert_eq!(counts.skipped, 1);
        let rows = store.rows.lock().unwrap();
        assert!(rows.contains_key(&1));
        assert!(!rows.contains_key(&2));
        assert!(rows.contains_key(&3));
    }

    #[tokio::test]
    async fn repeated_batches_are_idempotent() {
        let store = MockStore::default();
        let reconciler = Reconciler::new(&store);
        let records = vec![
            mk_record(1, IN_PROGRESS_STATUS),
            mk_record(2, DONE_STATUS),
            mk_record(3, "Todo"),
        ];

        let first = reconciler.reconcile_all(&records).await;
        assert_eq!(first.inserted, 3);
        let snapshot: Vec<_> = (1..=3).map(|n| store.row(n)).collect();

        let second = reconciler.reconcile_all(&records).await;
        assert_eq!(second.inserted, 0);
        assert_eq!(second.updated, 3);

        for (n, before) in (1..=3).zip(snapshot) {
            let after = store.row(n);
            assert_eq!(after.status, before.status);
            assert_eq!(after.updated_at, before.updated_at);
            assert_eq!(after.start_time, before.start_time);
            assert_eq!(after.end_time, before.end_time);
        }
    }
}
