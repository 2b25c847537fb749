use async_trait::async_trait;

use super::{IssueStore, StoreError};
use crate::config::StoreConfig;
use crate::model::issue::{IssuePatch, TrackedIssue};

/// Issue store backed by a PostgREST endpoint. One row per issue number.
pub struct PostgrestStore {
    base_url: String,
    api_key: String,
    table: String,
    client: reqwest::Client,
}

impl PostgrestStore {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            table: config.table.clone(),
            client: reqwest::Client::new(),
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(StoreError::Http {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl IssueStore for PostgrestStore {
    async fn read_by_number(&self, issue_number: u64) -> Result<Option<TrackedIssue>, StoreError> {
        let resp = self
            .client
            .get(self.table_url())
            .query(&[
                ("select", "*".to_string()),
                ("issue_number", format!("eq.{issue_number}")),
                ("limit", "1".to_string()),
            ])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let resp = Self::check_status(resp).await?;
        let mut rows: Vec<TrackedIssue> = resp.json().await?;
        // An empty result set is the expected not-found outcome.
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.remove(0))
        })
    }

    async fn insert(&self, issue: &TrackedIssue) -> Result<(), StoreError> {
        let resp = self
            .client
            .post(self.table_url())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
            .json(issue)
            .send()
            .await?;
        Self::check_status(resp).await?;
        Ok(())
    }

    async fn update_by_number(
        &self,
        issue_number: u64,
        patch: &IssuePatch,
    ) -> Result<(), StoreError> {
        let resp = self
            .client
            .patch(self.table_url())
            .query(&[("issue_number", format!("eq.{issue_number}"))])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
            .json(patch)
            .send()
            .await?;
        Self::check_status(resp).await?;
        Ok(())
    }
}
