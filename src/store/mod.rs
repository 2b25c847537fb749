pub mod postgrest;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::issue::{IssuePatch, TrackedIssue};

/// Destination store failure. Not-found is not an error: reads surface it as
/// Ok(None) so the reconciler can route it to the insert path.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("store returned http {status}: {body}")]
    Http { status: u16, body: String },
}

#[async_trait]
pub trait IssueStore: Send + Sync {
    async fn read_by_number(&self, issue_number: u64) -> Result<Option<TrackedIssue>, StoreError>;
    async fn insert(&self, issue: &TrackedIssue) -> Result<(), StoreError>;
    async fn update_by_number(
        &self,
        issue_number: u64,
        patch: &IssuePatch,
    ) -> Result<(), StoreError>;
}
