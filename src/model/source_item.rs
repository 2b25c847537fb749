use chrono::{DateTime, Utc};

/// One unit from the project board: dynamically named field values plus
/// optional issue content. Draft items have no content.
#[derive(Debug, Clone)]
pub struct SourceItem {
    pub item_id: String,
    pub fields: Vec<FieldValue>,
    pub content: Option<IssueContent>,
}

/// A board field with exactly one typed payload.
#[derive(Debug, Clone)]
pub struct FieldValue {
    pub field_name: String,
    pub payload: FieldPayload,
}

#[derive(Debug, Clone)]
pub enum FieldPayload {
    Text(String),
    SingleSelect(String),
    Date(String),
}

impl FieldPayload {
    pub fn as_str(&self) -> &str {
        match self {
            FieldPayload::Text(s) | FieldPayload::SingleSelect(s) | FieldPayload::Date(s) => s,
        }
    }
}

/// Issue metadata attached to a board item.
#[derive(Debug, Clone)]
pub struct IssueContent {
    pub title: String,
    /// Issue number: the natural key correlating board items with the store.
    pub number: u64,
    pub url: String,
    pub created_at: Option<DateTime<Utc>>,
    pub assignees: Vec<String>,
}
