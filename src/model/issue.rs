use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Persisted destination record: the canonical fields plus engine-owned
/// lifecycle timestamps. All timestamps are stored in the fixed +05:30 offset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedIssue {
    pub issue_number: u64,
    pub title: String,
    pub url: String,
    pub assignees: Vec<String>,
    pub status: String,
    pub priority: String,
    pub issue_type: String,
    pub created_by: String,
    pub app_name: String,
    pub build_type: String,
    pub build_version: String,
    pub device_type: String,
    pub timeline: String,
    pub created_at: DateTime<FixedOffset>,
    /// Advances only when the stored status changes value.
    pub updated_at: DateTime<FixedOffset>,
    /// Set once, on first observation of the in-progress status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<FixedOffset>>,
    /// Set once, on first observation of the done status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<FixedOffset>>,
}

/// Partial update payload for an already-tracked issue. Optional fields are
/// serialized only when the reconciler decided they should change.
#[derive(Debug, Clone, Serialize)]
pub struct IssuePatch {
    pub title: String,
    pub url: String,
    pub assignees: Vec<String>,
    pub priority: String,
    pub issue_type: String,
    pub created_by: String,
    pub app_name: String,
    pub build_type: String,
    pub build_version: String,
    pub device_type: String,
    pub timeline: String,
    pub created_at: DateTime<FixedOffset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<FixedOffset>>,
}
