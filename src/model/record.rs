use chrono::{DateTime, Utc};

/// Status labels that trigger one-time lifecycle timestamp capture.
pub const IN_PROGRESS_STATUS: &str = "In progress";
pub const DONE_STATUS: &str = "Done";

/// Placeholder assignee when an item has no content or an empty assignee list.
pub const UNASSIGNED: &str = "Unassigned";

/// The custom board fields the projector recognizes. Anything else on the
/// board is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldLabel {
    Status,
    Priority,
    IssueType,
    CreatedBy,
    AppName,
    BuildType,
    BuildVersion,
    DeviceType,
    Timeline,
}

impl FieldLabel {
    /// Field name as it appears on the board, matched ignoring case.
    pub fn board_name(self) -> &'static str {
        match self {
            FieldLabel::Status => "Status",
            FieldLabel::Priority => "Priority",
            FieldLabel::IssueType => "Issue Type",
            FieldLabel::CreatedBy => "Created By",
            FieldLabel::AppName => "App Name",
            FieldLabel::BuildType => "Build Type",
            FieldLabel::BuildVersion => "Build Version",
            FieldLabel::DeviceType => "Device Type",
            FieldLabel::Timeline => "Timeline",
        }
    }

    /// Sentinel stored when the board carries no value for this field.
    pub fn default_value(self) -> &'static str {
        match self {
            FieldLabel::Status => "No Status",
            FieldLabel::Priority => "No Priority",
            _ => "Unknown",
        }
    }
}

/// Fixed-shape projection of a SourceItem, ready for reconciliation. Every
/// slot is populated; missing source data is filled with sentinels.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRecord {
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
    /// Creation instant from the issue content; None for items without content.
    pub source_created_at: Option<DateTime<Utc>>,
}
