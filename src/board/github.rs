use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{ItemPage, PageFetcher};
use crate::model::source_item::{FieldPayload, FieldValue, IssueContent, SourceItem};

/// Items requested per page. The API caps this at 100.
const PAGE_SIZE: u32 = 100;

const ITEMS_QUERY: &str = r#"
query($org: String!, $project: Int!, $pageSize: Int!, $cursor: String) {
  organization(login: $org) {
    projectV2(number: $project) {
      items(first: $pageSize, after: $cursor) {
        pageInfo { hasNextPage endCursor }
        nodes {
          id
          fieldValues(first: 50) {
            nodes {
              ... on ProjectV2ItemFieldTextValue {
                text
                field { ... on ProjectV2FieldCommon { name } }
              }
              ... on ProjectV2ItemFieldSingleSelectValue {
                name
                field { ... on ProjectV2FieldCommon { name } }
              }
              ... on ProjectV2ItemFieldDateValue {
                date
                field { ... on ProjectV2FieldCommon { name } }
              }
            }
          }
          content {
            ... on Issue {
              title
              number
              url
              createdAt
              assignees(first: 20) { nodes { login } }
            }
          }
        }
      }
    }
  }
}"#;

pub struct GitHubBoardClient {
    token: String,
    org: String,
    client: reqwest::Client,
}

impl GitHubBoardClient {
    pub fn new(token: String, org: String) -> Self {
        Self {
            token,
            org,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct GqlResponse {
    data: Option<GqlData>,
    #[serde(default)]
    errors: Vec<GqlError>,
}

#[derive(Deserialize)]
struct GqlError {
    message: String,
}

#[derive(Deserialize)]
struct GqlData {
    organization: Option<Organization>,
}

#[derive(Deserialize)]
struct Organization {
    #[serde(rename = "projectV2")]
    project_v2: Option<Project>,
}

#[derive(Deserialize)]
struct Project {
    items: ItemConnection,
}

#[derive(Deserialize)]
struct ItemConnection {
    #[serde(rename = "pageInfo")]
    page_info: PageInfo,
    nodes: Vec<ItemNode>,
}

#[derive(Deserialize)]
struct PageInfo {
    #[serde(rename = "hasNextPage")]
    has_next_page: bool,
    #[serde(rename = "endCursor")]
    end_cursor: Option<String>,
}

#[derive(Deserialize)]
struct ItemNode {
    id: String,
    #[serde(rename = "fieldValues")]
    field_values: FieldValueConnection,
    content: Option<ContentNode>,
}

#[derive(Deserialize)]
struct FieldValueConnection {
    nodes: Vec<FieldValueNode>,
}

/// A field value node carries at most one of text/name/date depending on its
/// concrete type; nodes of unrecognized types decode with none set.
#[derive(Deserialize, Default)]
#[serde(default)]
struct FieldValueNode {
    text: Option<String>,
    name: Option<String>,
    date: Option<String>,
    field: Option<FieldRef>,
}

#[derive(Deserialize)]
struct FieldRef {
    name: Option<String>,
}

/// Empty for draft items and pull requests, which the inline fragment skips.
#[derive(Deserialize)]
struct ContentNode {
    title: Option<String>,
    number: Option<u64>,
    url: Option<String>,
    #[serde(rename = "createdAt")]
    created_at: Option<DateTime<Utc>>,
    assignees: Option<AssigneeConnection>,
}

#[derive(Deserialize)]
struct AssigneeConnection {
    nodes: Vec<Assignee>,
}

#[derive(Deserialize)]
struct Assignee {
    login: String,
}

/// Value precedence when a node carries more than one candidate: text, then
/// select label, then date. Nodes with no recognizable value or field name
/// are dropped.
fn into_field_value(node: FieldValueNode) -> Option<FieldValue> {
    let field_name = node.field.and_then(|f| f.name)?;
    let payload = if let Some(text) = node.text {
        FieldPayload::Text(text)
    } else if let Some(name) = node.name {
        FieldPayload::SingleSelect(name)
    } else if let Some(date) = node.date {
        FieldPayload::Date(date)
    } else {
        return None;
    };
    Some(FieldValue {
        field_name,
        payload,
    })
}

fn into_content(node: ContentNode) -> Option<IssueContent> {
    // No issue number means no natural key: draft or pull request content.
    let number = node.number?;
    Some(IssueContent {
        title: node.title.unwrap_or_default(),
        number,
        url: node.url.unwrap_or_default(),
        created_at: node.created_at,
        assignees: node
            .assignees
            .map(|a| a.nodes.into_iter().map(|n| n.login).collect())
            .unwrap_or_default(),
    })
}

fn into_source_item(node: ItemNode) -> SourceItem {
    SourceItem {
        item_id: node.id,
        fields: node
            .field_values
            .nodes
            .into_iter()
            .filter_map(into_field_value)
            .collect(),
        content: node.content.and_then(into_content),
    }
}

#[async_trait]
impl PageFetcher for GitHubBoardClient {
    async fn fetch_page(&self, project_number: u32, cursor: Option<&str>) -> Result<ItemPage> {
        let body = serde_json::json!({
            "query": ITEMS_QUERY,
            "variables": {
                "org": self.org,
                "project": project_number,
                "pageSize": PAGE_SIZE,
                "cursor": cursor,
            },
        });

        let resp = self
            .client
            .post("https://api.github.com/graphql")
            .bearer_auth(&self.token)
            .header("User-Agent", "boardsync")
            .json(&body)
            .send()
            .await
            .context("GitHub GraphQL request failed")?;

        let gql: GqlResponse = resp
            .json()
            .await
            .context("Failed to parse GitHub response")?;

        if let Some(err) = gql.errors.first() {
            anyhow::bail!("GitHub GraphQL error: {}", err.message);
        }

        let connection = gql
            .data
            .and_then(|d| d.organization)
            .and_then(|o| o.project_v2)
            .map(|p| p.items)
            .context("No project in GitHub response")?;

        let items = connection.nodes.into_iter().map(into_source_item).collect();

        let next_cursor = if connection.page_info.has_next_page {
            connection.page_info.end_cursor
        } else {
            None
        };

        Ok(ItemPage { items, next_cursor })
    }
}
