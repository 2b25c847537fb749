use std::collections::HashMap;

use crate::model::record::{CanonicalRecord, FieldLabel, UNASSIGNED};
use crate::model::source_item::SourceItem;

/// Case-insensitive field lookup, resolved once per item. The first value
/// wins when the source repeats a field name.
struct FieldBag(HashMap<String, String>);

impl FieldBag {
    fn from_item(item: &SourceItem) -> Self {
        let mut map = HashMap::new();
        for field in &item.fields {
            map.entry(field.field_name.to_lowercase())
                .or_insert_with(|| field.payload.as_str().to_string());
        }
        FieldBag(map)
    }

    fn resolve(&self, label: FieldLabel) -> String {
        self.0
            .get(&label.board_name().to_lowercase())
            .cloned()
            .unwrap_or_else(|| label.default_value().to_string())
    }
}

/// Project one board item into the canonical record shape. Total over any
/// item: missing content or fields fall back to the documented sentinels.
///
/// The title is taken from the issue content, never from a board field named
/// "Title".
pub fn project(item: &SourceItem) -> CanonicalRecord {
    let bag = FieldBag::from_item(item);
    let content = item.content.as_ref();

    let assignees = match content {
        Some(content) if !content.assignees.is_empty() => content.assignees.clone(),
        _ => vec![UNASSIGNED.to_string()],
    };

    CanonicalRecord {
        issue_number: content.map(|c| c.number).unwrap_or(0),
        title: content
            .map(|c| c.title.clone())
            .unwrap_or_else(|| "Untitled".to_string()),
        url: content.map(|c| c.url.clone()).unwrap_or_default(),
        assignees,
        status: bag.resolve(FieldLabel::Status),
        priority: bag.resolve(FieldLabel::Priority),
        issue_type: bag.resolve(FieldLabel::IssueType),
        created_by: bag.resolve(FieldLabel::CreatedBy),
        app_name: bag.resolve(FieldLabel::AppName),
        build_type: bag.resolve(FieldLabel::BuildType),
        build_version: bag.resolve(FieldLabel::BuildVersion),
        device_type: bag.resolve(FieldLabel::DeviceType),
        timeline: bag.resolve(FieldLabel::Timeline),
        source_created_at: content.and_then(|c| c.created_at),
    }
}
