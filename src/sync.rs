use anyhow::Result;
use tracing::{debug, error, info};

use crate::board::{self, PageFetcher};
use crate::config::Config;
use crate::projector;
use crate::reconciler::Reconciler;
use crate::store::IssueStore;

/// Per-project result counts, logged once the project finishes.
#[derive(Debug, Clone, Copy)]
pub struct SyncSummary {
    pub project_number: u32,
    pub fetched: usize,
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
}

pub struct SyncRunner {
    config: Config,
    fetcher: Box<dyn PageFetcher>,
    store: Box<dyn IssueStore>,
}

impl SyncRunner {
    pub fn new(config: Config, fetcher: Box<dyn PageFetcher>, store: Box<dyn IssueStore>) -> Self {
        Self {
            config,
            fetcher,
            store,
        }
    }

    /// Sync every configured project in order. With a single project any
    /// failure aborts the run; with several, later projects still run and
    /// the exit status reflects the primary (first) project only.
    pub async fn run(&self) -> Result<()> {
        let projects = &self.config.github.projects;
        let mut primary_failure: Option<anyhow::Error> = None;

        for (idx, &project_number) in projects.iter().enumerate() {
            match self.sync_project(project_number).await {
                Ok(summary) => {
                    info!(
                        project = summary.project_number,
                        fetched = summary.fetched,
                        inserted = summary.inserted,
                        updated = summary.updated,
                        skipped = summary.skipped,
                        "project sync complete"
                    );
                }
                Err(err) => {
                    error!(project = project_number, %err, "project sync failed");
                    if projects.len() == 1 {
                        return Err(err);
                    }
                    if idx == 0 {
                        primary_failure = Some(err);
                    }
                }
            }
        }

        match primary_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn sync_project(&self, project_number: u32) -> Result<SyncSummary> {
        let items = board::fetch_all_items(self.fetcher.as_ref(), project_number).await?;
        let fetched = items.len();

        let records: Vec<_> = items
            .iter()
            .map(projector::project)
            .filter(|record| {
                if record.issue_number == 0 {
                    // Draft items carry no issue content, so no natural key.
                    debug!(title = %record.title, "skipping item without issue number");
                    false
                } else {
                    true
                }
            })
            .collect();

        let counts = Reconciler::new(self.store.as_ref())
            .reconcile_all(&records)
            .await;

        Ok(SyncSummary {
            project_number,
            fetched,
            inserted: counts.inserted,
            updated: counts.updated,
            skipped: counts.skipped,
        })
    }
}
