//! Sync orchestrator
//!
//! One batch pass over the tracked-and-linked issues: fetch each external
//! issue, derive and persist its mirror state, then run the bulk discovery
//! sub-pass and close the run ledger row. Per-issue failures are isolated;
//! a single bad issue never aborts the run.
//!
//! Execution is sequential by design: tracked issues are visited in
//! `(external number asc, internal id asc)` order every run, so two runs
//! over the same external snapshot persist identical mirror fields.

use crate::github::IssueClient;
use crate::model::{
    DiscoveredIssue, ExternalIssue, ExternalIssueRef, IssueSyncState, MirrorStatus, StatusSource,
    SyncIssueError, TrackedIssue,
};
use crate::status::{bound_snapshot, classify, extract_status, DEFAULT_SNAPSHOT_BUDGET};
use crate::store::MirrorStore;
use crate::sync::{RunOutcome, SyncRunLedger};
use crate::{MirrorSyncError, Result};
use std::collections::HashSet;
use tracing::{error, info, warn};

/// Default page size for the bulk discovery search
const DEFAULT_DISCOVERY_PAGE: u32 = 100;

/// Options for a sync pass
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Organization or user owning the mirrored repository
    pub owner: String,

    /// Repository the tracked issues are linked against
    pub repo: String,

    /// Byte budget for persisted status snapshots
    pub snapshot_budget: usize,

    /// Maximum hits requested from the discovery search
    pub discovery_page: u32,
}

impl SyncOptions {
    /// Options for one repository with default budgets
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            snapshot_budget: DEFAULT_SNAPSHOT_BUDGET,
            discovery_page: DEFAULT_DISCOVERY_PAGE,
        }
    }

    /// Override the snapshot byte budget
    pub fn with_snapshot_budget(mut self, bytes: usize) -> Self {
        self.snapshot_budget = bytes;
        self
    }

    /// Override the discovery page size
    pub fn with_discovery_page(mut self, first: u32) -> Self {
        self.discovery_page = first;
        self
    }
}

/// Counts reported by one sync pass
///
/// `synced` counts applied writes; it diverges from `attempted` only when a
/// persistence failure aborts the run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Linked issues processed
    pub attempted: u32,

    /// External fetches that succeeded
    pub fetch_ok: u32,

    /// External fetches that failed (isolated, run continues)
    pub fetch_failed: u32,

    /// Issue-state writes applied
    pub synced: u32,

    /// Issues found by the discovery search
    pub total_found: u32,

    /// Discovery snapshots upserted
    pub upserted: u32,
}

/// Batch reconciliation engine
pub struct SyncOrchestrator<'a> {
    client: &'a dyn IssueClient,
    store: &'a dyn MirrorStore,
    ledger: &'a dyn SyncRunLedger,
    options: SyncOptions,
}

impl<'a> SyncOrchestrator<'a> {
    /// Create an orchestrator over the given collaborators
    pub fn new(
        client: &'a dyn IssueClient,
        store: &'a dyn MirrorStore,
        ledger: &'a dyn SyncRunLedger,
        options: SyncOptions,
    ) -> Self {
        Self {
            client,
            store,
            ledger,
            options,
        }
    }

    /// Run one full sync pass
    ///
    /// Brings every tracked-and-linked issue's mirror state current, then
    /// runs the bulk discovery sub-pass, and writes one ledger row for the
    /// invocation. Issues without an external link are out of scope.
    pub async fn run_sync(
        &self,
        tracked: &[TrackedIssue],
        search_query: &str,
    ) -> Result<SyncReport> {
        let query = search_query.trim();
        if query.is_empty() {
            return Err(MirrorSyncError::Validation(
                "search query must not be empty".to_string(),
            ));
        }

        let run_id = self.ledger.create_run(query)?;
        info!(run_id, tracked = tracked.len(), "Starting sync run");

        let mut report = SyncReport::default();

        let linked = sorted_linked(tracked);
        let linked_numbers: HashSet<u64> = linked.iter().map(|(number, _)| *number).collect();

        for (number, issue) in &linked {
            report.attempted += 1;

            let issue_ref =
                ExternalIssueRef::new(&self.options.owner, &self.options.repo, *number);

            let derived = match self.client.get_issue(&issue_ref).await {
                Ok(external) => {
                    report.fetch_ok += 1;
                    self.mirror_state(issue, *number, &external)
                }
                Err(e) => {
                    report.fetch_failed += 1;
                    warn!(issue = %issue_ref, error = %e, "Issue fetch failed, continuing");
                    Ok(error_state(issue, *number, &e))
                }
            };

            let state = match derived {
                Ok(state) => state,
                Err(e) => {
                    self.close_failed(run_id, &report, &e);
                    return Err(e);
                }
            };

            if let Err(e) = self.store.save_issue_state(&state) {
                self.close_failed(run_id, &report, &e);
                return Err(e);
            }
            report.synced += 1;
        }

        // Discovery runs second: when both passes touch the same issue in
        // one run, the discovery snapshot is the later write.
        let full_repo = format!("{}/{}", self.options.owner, self.options.repo);
        match self
            .client
            .search_issues(query, self.options.discovery_page)
            .await
        {
            Ok(found) => {
                report.total_found = found.len() as u32;
                for external in &found {
                    if external.repo == full_repo && linked_numbers.contains(&external.number) {
                        continue;
                    }
                    let snapshot = DiscoveredIssue::from_external(external);
                    if let Err(e) = self.store.upsert_discovered(&snapshot) {
                        self.close_failed(run_id, &report, &e);
                        return Err(e);
                    }
                    report.upserted += 1;
                }
            }
            Err(e) => {
                error!(run_id, error = %e, "Discovery search failed, run marked failed");
                self.close_failed(run_id, &report, &e);
                return Err(e);
            }
        }

        self.ledger.update_run(
            run_id,
            &RunOutcome::success(report.total_found as u64, report.upserted as u64),
        )?;

        info!(
            run_id,
            attempted = report.attempted,
            fetch_ok = report.fetch_ok,
            fetch_failed = report.fetch_failed,
            total_found = report.total_found,
            upserted = report.upserted,
            "Sync run complete"
        );

        Ok(report)
    }

    /// Derive the persisted mirror state for one successfully fetched issue
    fn mirror_state(
        &self,
        issue: &TrackedIssue,
        number: u64,
        external: &ExternalIssue,
    ) -> Result<IssueSyncState> {
        let signal = extract_status(
            external.project_status.as_deref(),
            &external.labels,
            external.state,
        );
        let classified = signal.as_ref().and_then(|s| classify(&s.raw));

        // A "done" reading backed only by the closed-state fallback stays
        // Unknown: cancelled or abandoned issues must not mirror as
        // completed.
        let mirror_status = match (&signal, classified) {
            (Some(signal), Some(MirrorStatus::Done))
                if signal.source == StatusSource::State =>
            {
                MirrorStatus::Unknown
            }
            (_, Some(status)) => status,
            _ => MirrorStatus::Unknown,
        };

        let snapshot = bound_snapshot(
            external.state,
            &external.labels,
            &external.updated_at,
            external.closed_at.as_deref(),
            self.options.snapshot_budget,
        )?;

        Ok(IssueSyncState {
            issue_id: issue.id.clone(),
            external_number: number,
            mirror_status,
            status_raw_snapshot: Some(snapshot),
            status_source: signal.map(|s| s.source),
            status_updated_at: Some(external.updated_at.clone()),
            last_sync_at: chrono::Utc::now().to_rfc3339(),
            sync_error: None,
        })
    }

    /// Mark the ledger row failed; a ledger write failure here is logged
    /// rather than masking the original error
    fn close_failed(&self, run_id: i64, report: &SyncReport, err: &MirrorSyncError) {
        let outcome = RunOutcome::failed(
            report.total_found as u64,
            report.upserted as u64,
            err.sanitized_message(),
        );
        if let Err(ledger_err) = self.ledger.update_run(run_id, &outcome) {
            warn!(run_id, error = %ledger_err, "Failed to close ledger row for failed run");
        }
    }
}

/// Tracked issues with an external link, in the fixed processing order:
/// external number ascending, then internal id ascending
fn sorted_linked(tracked: &[TrackedIssue]) -> Vec<(u64, &TrackedIssue)> {
    let mut linked: Vec<(u64, &TrackedIssue)> = tracked
        .iter()
        .filter_map(|issue| issue.external_number.map(|number| (number, issue)))
        .collect();
    linked.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.id.cmp(&b.1.id)));
    linked
}

/// Error-state row for an issue whose fetch failed
fn error_state(issue: &TrackedIssue, number: u64, err: &MirrorSyncError) -> IssueSyncState {
    IssueSyncState {
        issue_id: issue.id.clone(),
        external_number: number,
        mirror_status: MirrorStatus::Error,
        status_raw_snapshot: None,
        status_source: None,
        status_updated_at: None,
        last_sync_at: chrono::Utc::now().to_rfc3339(),
        sync_error: Some(SyncIssueError {
            code: err.code().to_string(),
            message: err.sanitized_message(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::testing::{make_issue, ScriptedClient};
    use crate::model::{IssueId, IssueState};
    use crate::store::{MirrorStore, SqliteStore, StoreConfig};
    use crate::sync::{RunStatus, SyncRunLedger};
    use tempfile::TempDir;

    const QUERY: &str = "repo:acme/delivery label:mirrored";

    fn open_store(dir: &TempDir) -> SqliteStore {
        SqliteStore::new(StoreConfig::at(dir.path().join("mirror.db"))).unwrap()
    }

    fn options() -> SyncOptions {
        SyncOptions::new("acme", "delivery")
    }

    fn labeled_issue(number: u64, state: IssueState, labels: &[&str]) -> ExternalIssue {
        let mut issue = make_issue(number, &format!("Issue {}", number), None);
        issue.state = state;
        issue.labels = labels.iter().map(|s| s.to_string()).collect();
        if state == IssueState::Closed {
            issue.closed_at = Some("2026-03-02T08:00:00Z".to_string());
        }
        issue
    }

    #[test]
    fn test_processing_order_is_number_then_id() {
        let tracked = vec![
            TrackedIssue::linked("B", 10),
            TrackedIssue::linked("A", 2),
            TrackedIssue::linked("C", 2),
            TrackedIssue::unlinked("D"),
        ];

        let order: Vec<(u64, &str)> = sorted_linked(&tracked)
            .into_iter()
            .map(|(number, issue)| (number, issue.id.as_str()))
            .collect();

        assert_eq!(order, vec![(2, "A"), (2, "C"), (10, "B")]);
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected_without_effects() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let client = ScriptedClient::default();
        let orchestrator = SyncOrchestrator::new(&client, &store, &store, options());

        let err = orchestrator.run_sync(&[], "   ").await.unwrap_err();
        assert_eq!(err.code(), "validation");
        assert!(store.list_runs(10).unwrap().is_empty());
        assert!(client.recorded_calls().is_empty());
    }

    #[tokio::test]
    async fn test_label_signal_mirrors_in_progress() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let client = ScriptedClient::default()
            .with_issue(labeled_issue(2, IssueState::Open, &["status: in progress"]));
        let orchestrator = SyncOrchestrator::new(&client, &store, &store, options());

        let report = orchestrator
            .run_sync(&[TrackedIssue::linked("A", 2)], QUERY)
            .await
            .unwrap();

        assert_eq!(report.attempted, 1);
        assert_eq!(report.fetch_ok, 1);
        assert_eq!(report.synced, 1);

        let state = store.load_issue_state(&IssueId::new("A")).unwrap().unwrap();
        assert_eq!(state.mirror_status, MirrorStatus::InProgress);
        assert_eq!(state.status_source, Some(StatusSource::Label));
        assert!(state.status_raw_snapshot.is_some());
        assert_eq!(state.sync_error, None);
    }

    #[tokio::test]
    async fn test_explicit_done_label_mirrors_done() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let client = ScriptedClient::default()
            .with_issue(labeled_issue(3, IssueState::Closed, &["status: done"]));
        let orchestrator = SyncOrchestrator::new(&client, &store, &store, options());

        orchestrator
            .run_sync(&[TrackedIssue::linked("A", 3)], QUERY)
            .await
            .unwrap();

        let state = store.load_issue_state(&IssueId::new("A")).unwrap().unwrap();
        assert_eq!(state.mirror_status, MirrorStatus::Done);
        assert_eq!(state.status_source, Some(StatusSource::Label));
    }

    #[tokio::test]
    async fn test_closed_without_done_signal_stays_unknown() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let client =
            ScriptedClient::default().with_issue(labeled_issue(4, IssueState::Closed, &["bug"]));
        let orchestrator = SyncOrchestrator::new(&client, &store, &store, options());

        orchestrator
            .run_sync(&[TrackedIssue::linked("A", 4)], QUERY)
            .await
            .unwrap();

        let state = store.load_issue_state(&IssueId::new("A")).unwrap().unwrap();
        // Fail-closed: never Done from the bare closed state
        assert_eq!(state.mirror_status, MirrorStatus::Unknown);
        assert_eq!(state.status_source, Some(StatusSource::State));
        assert!(state.status_raw_snapshot.is_some());
    }

    #[tokio::test]
    async fn test_project_field_signal_mirrors_project_source() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let mut issue = labeled_issue(5, IssueState::Open, &[]);
        issue.project_status = Some("Blocked".to_string());
        let client = ScriptedClient::default().with_issue(issue);
        let orchestrator = SyncOrchestrator::new(&client, &store, &store, options());

        orchestrator
            .run_sync(&[TrackedIssue::linked("A", 5)], QUERY)
            .await
            .unwrap();

        let state = store.load_issue_state(&IssueId::new("A")).unwrap().unwrap();
        assert_eq!(state.mirror_status, MirrorStatus::Hold);
        assert_eq!(state.status_source, Some(StatusSource::Project));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_isolated() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let client = ScriptedClient::default()
            .with_issue(labeled_issue(2, IssueState::Open, &["status: ready"]))
            .with_failing_number(10);
        let orchestrator = SyncOrchestrator::new(&client, &store, &store, options());

        let report = orchestrator
            .run_sync(
                &[TrackedIssue::linked("A", 2), TrackedIssue::linked("B", 10)],
                QUERY,
            )
            .await
            .unwrap();

        assert_eq!(report.attempted, 2);
        assert_eq!(report.fetch_ok, 1);
        assert_eq!(report.fetch_failed, 1);
        assert_eq!(report.synced, 2);

        let failed = store.load_issue_state(&IssueId::new("B")).unwrap().unwrap();
        assert_eq!(failed.mirror_status, MirrorStatus::Error);
        assert_eq!(failed.status_raw_snapshot, None);
        assert_eq!(failed.status_source, None);
        let sync_error = failed.sync_error.unwrap();
        assert_eq!(sync_error.code, "integration");
        assert!(!sync_error.message.is_empty());

        // The healthy issue still synced and the run closed as a success
        let healthy = store.load_issue_state(&IssueId::new("A")).unwrap().unwrap();
        assert_eq!(healthy.mirror_status, MirrorStatus::Open);
        assert_eq!(store.list_runs(1).unwrap()[0].status, RunStatus::Success);
    }

    #[tokio::test]
    async fn test_discovery_upserts_unlinked_only() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let client = ScriptedClient::default()
            .with_issue(labeled_issue(2, IssueState::Open, &[]))
            .with_search_results(vec![
                labeled_issue(2, IssueState::Open, &[]),
                labeled_issue(77, IssueState::Open, &[]),
            ]);
        let orchestrator = SyncOrchestrator::new(&client, &store, &store, options());

        let report = orchestrator
            .run_sync(&[TrackedIssue::linked("A", 2)], QUERY)
            .await
            .unwrap();

        assert_eq!(report.total_found, 2);
        assert_eq!(report.upserted, 1);

        let discovered = store.list_discovered().unwrap();
        assert_eq!(discovered.len(), 1);
        assert_eq!(discovered[0].number, 77);

        let run = &store.list_runs(1).unwrap()[0];
        assert_eq!(run.status, RunStatus::Success);
        assert_eq!(run.total_count, 2);
        assert_eq!(run.upserted_count, 1);
    }

    #[tokio::test]
    async fn test_search_outage_fails_run_but_keeps_issue_writes() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let client = ScriptedClient::default()
            .with_issue(labeled_issue(2, IssueState::Open, &["status: in progress"]))
            .with_search_failure();
        let orchestrator = SyncOrchestrator::new(&client, &store, &store, options());

        let err = orchestrator
            .run_sync(&[TrackedIssue::linked("A", 2)], QUERY)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "integration");

        // Committed per-issue write stands; ledger row is failed, no upserts
        let state = store.load_issue_state(&IssueId::new("A")).unwrap().unwrap();
        assert_eq!(state.mirror_status, MirrorStatus::InProgress);

        let run = &store.list_runs(1).unwrap()[0];
        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.upserted_count, 0);
        assert!(run.error.is_some());
    }

    #[tokio::test]
    async fn test_unlinked_issues_are_out_of_scope() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let client = ScriptedClient::default();
        let orchestrator = SyncOrchestrator::new(&client, &store, &store, options());

        let report = orchestrator
            .run_sync(&[TrackedIssue::unlinked("A")], QUERY)
            .await
            .unwrap();

        assert_eq!(report.attempted, 0);
        assert_eq!(report.synced, 0);
    }

    #[tokio::test]
    async fn test_mirror_fields_are_deterministic_across_runs() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let client = ScriptedClient::default().with_issue(labeled_issue(
            6,
            IssueState::Closed,
            &["status: done", "bug"],
        ));
        let orchestrator = SyncOrchestrator::new(&client, &store, &store, options());
        let tracked = [TrackedIssue::linked("A", 6)];

        orchestrator.run_sync(&tracked, QUERY).await.unwrap();
        let first = store.load_issue_state(&IssueId::new("A")).unwrap().unwrap();

        orchestrator.run_sync(&tracked, QUERY).await.unwrap();
        let second = store.load_issue_state(&IssueId::new("A")).unwrap().unwrap();

        // Only last_sync_at may legitimately differ between runs
        assert_eq!(first.mirror_status, second.mirror_status);
        assert_eq!(first.status_raw_snapshot, second.status_raw_snapshot);
        assert_eq!(first.status_source, second.status_source);
        assert_eq!(first.status_updated_at, second.status_updated_at);
    }
}
