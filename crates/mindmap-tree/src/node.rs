//! Node entity, field patches and change history

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Opaque node identifier. Generated once, never reused or reassigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Workflow status of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Idea,
    Todo,
    InProgress,
    Tracking,
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::Idea,
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::Tracking,
        TaskStatus::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idea => "idea",
            Self::Todo => "todo",
            Self::InProgress => "in-progress",
            Self::Tracking => "tracking",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown status '{}'", s))
    }
}

/// Fields whose changes are recorded in a node's history and compared by
/// the version diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackedField {
    Text,
    Status,
    IsImportant,
    IsUrgent,
    DueDate,
    Note,
}

impl TrackedField {
    pub const ALL: [TrackedField; 6] = [
        TrackedField::Text,
        TrackedField::Status,
        TrackedField::IsImportant,
        TrackedField::IsUrgent,
        TrackedField::DueDate,
        TrackedField::Note,
    ];

    /// Name as it appears in persisted content.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Status => "status",
            Self::IsImportant => "isImportant",
            Self::IsUrgent => "isUrgent",
            Self::DueDate => "dueDate",
            Self::Note => "note",
        }
    }
}

impl fmt::Display for TrackedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded field change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub timestamp: i64,
    pub field: String,
    pub old_value: Value,
    pub new_value: Value,
}

/// A single task in the tree, without its children.
///
/// Structure (parent, child order) lives in the owning [`crate::Tree`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub is_important: bool,
    #[serde(default)]
    pub is_urgent: bool,
    #[serde(
        default,
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default = "expanded_by_default")]
    pub is_expanded: bool,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

fn expanded_by_default() -> bool {
    true
}

// Older writers store a cleared date picker as ""
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

impl Node {
    /// Create a detached node with a fresh id, status Idea and empty history.
    pub fn new(text: impl Into<String>) -> Self {
        let now = now_millis();
        Self {
            id: NodeId::generate(),
            text: text.into(),
            status: TaskStatus::Idea,
            is_important: false,
            is_urgent: false,
            due_date: None,
            note: None,
            is_expanded: true,
            created_at: now,
            updated_at: now,
            history: Vec::new(),
        }
    }

    /// Text is semantically empty when blank or whitespace-only.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn field_value(&self, field: TrackedField) -> Value {
        match field {
            TrackedField::Text => Value::from(self.text.clone()),
            TrackedField::Status => Value::from(self.status.as_str()),
            TrackedField::IsImportant => Value::from(self.is_important),
            TrackedField::IsUrgent => Value::from(self.is_urgent),
            TrackedField::DueDate => self
                .due_date
                .map(|d| Value::from(d.format("%Y-%m-%d").to_string()))
                .unwrap_or(Value::Null),
            TrackedField::Note => self.note.clone().map(Value::from).unwrap_or(Value::Null),
        }
    }

    /// Tracked fields whose values differ between `self` and `other`.
    pub fn changed_fields(&self, other: &Node) -> Vec<TrackedField> {
        TrackedField::ALL
            .into_iter()
            .filter(|field| match field {
                TrackedField::Text => self.text != other.text,
                TrackedField::Status => self.status != other.status,
                TrackedField::IsImportant => self.is_important != other.is_important,
                TrackedField::IsUrgent => self.is_urgent != other.is_urgent,
                TrackedField::DueDate => self.due_date != other.due_date,
                TrackedField::Note => self.note != other.note,
            })
            .collect()
    }

    /// Apply a patch, appending one history entry per tracked field that
    /// actually changed. Returns whether anything changed.
    pub fn apply(&mut self, patch: &NodePatch, now: i64) -> bool {
        let before = self.clone();

        if let Some(text) = &patch.text {
            self.text = text.clone();
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(flag) = patch.is_important {
            self.is_important = flag;
        }
        if let Some(flag) = patch.is_urgent {
            self.is_urgent = flag;
        }
        if let Some(due) = patch.due_date {
            self.due_date = due;
        }
        if let Some(note) = &patch.note {
            self.note = note.clone();
        }

        let changed = before.changed_fields(self);
        for field in &changed {
            self.history.push(HistoryEntry {
                timestamp: now,
                field: field.as_str().to_string(),
                old_value: before.field_value(*field),
                new_value: self.field_value(*field),
            });
        }

        let mut touched = !changed.is_empty();
        if let Some(expanded) = patch.is_expanded
            && expanded != self.is_expanded
        {
            self.is_expanded = expanded;
            touched = true;
        }

        if touched {
            self.updated_at = now;
        }
        touched
    }
}

/// Partial field set for [`crate::Tree::update`].
///
/// `due_date` and `note` use `Some(None)` to clear the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    pub text: Option<String>,
    pub status: Option<TaskStatus>,
    pub is_important: Option<bool>,
    pub is_urgent: Option<bool>,
    pub due_date: Option<Option<NaiveDate>>,
    pub note: Option<Option<String>>,
    pub is_expanded: Option<bool>,
}

impl NodePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn important(mut self, flag: bool) -> Self {
        self.is_important = Some(flag);
        self
    }

    pub fn urgent(mut self, flag: bool) -> Self {
        self.is_urgent = Some(flag);
        self
    }

    pub fn due(mut self, date: NaiveDate) -> Self {
        self.due_date = Some(Some(date));
        self
    }

    pub fn clear_due(mut self) -> Self {
        self.due_date = Some(None);
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(Some(note.into()));
        self
    }

    pub fn clear_note(mut self) -> Self {
        self.note = Some(None);
        self
    }

    pub fn expanded(mut self, flag: bool) -> Self {
        self.is_expanded = Some(flag);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn new_node_defaults() {
        let node = Node::new("Plan quarter");
        assert_eq!(node.status, TaskStatus::Idea);
        assert!(node.is_expanded);
        assert!(node.history.is_empty());
        assert_eq!(node.created_at, node.updated_at);
        assert_ne!(Node::new("a").id, Node::new("a").id);
    }

    #[rstest]
    #[case("", true)]
    #[case("   \t", true)]
    #[case(" x ", false)]
    fn blank_text(#[case] text: &str, #[case] blank: bool) {
        assert_eq!(Node::new(text).is_blank(), blank);
    }

    #[rstest]
    #[case(TaskStatus::Idea, "idea")]
    #[case(TaskStatus::InProgress, "in-progress")]
    #[case(TaskStatus::Done, "done")]
    fn status_names_round_trip(#[case] status: TaskStatus, #[case] name: &str) {
        assert_eq!(status.as_str(), name);
        assert_eq!(name.parse::<TaskStatus>().unwrap(), status);
        assert_eq!(serde_json::to_value(status).unwrap(), json!(name));
    }

    #[test]
    fn apply_records_one_entry_per_changed_field() {
        let mut node = Node::new("Draft");
        let patch = NodePatch::new()
            .text("Final")
            .status(TaskStatus::Todo)
            .important(false) // unchanged, no entry
            .expanded(false); // untracked

        assert!(node.apply(&patch, 42));

        let fields: Vec<&str> = node.history.iter().map(|h| h.field.as_str()).collect();
        assert_eq!(fields, vec!["text", "status"]);
        assert_eq!(node.history[0].old_value, json!("Draft"));
        assert_eq!(node.history[0].new_value, json!("Final"));
        assert_eq!(node.history[1].new_value, json!("todo"));
        assert_eq!(node.updated_at, 42);
        assert!(!node.is_expanded);
    }

    #[test]
    fn apply_noop_patch_leaves_node_untouched() {
        let mut node = Node::new("Same");
        let before = node.clone();

        assert!(!node.apply(&NodePatch::new().text("Same"), 99));
        assert_eq!(node, before);
    }

    #[test]
    fn clearing_due_date_records_null() {
        let mut node = Node::new("Pay invoice");
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        node.apply(&NodePatch::new().due(date), 1);
        node.apply(&NodePatch::new().clear_due(), 2);

        assert_eq!(node.due_date, None);
        assert_eq!(node.history.len(), 2);
        assert_eq!(node.history[1].old_value, json!("2024-05-01"));
        assert_eq!(node.history[1].new_value, Value::Null);
    }

    #[test]
    fn blank_due_date_deserializes_as_none() {
        let node: Node = serde_json::from_value(json!({
            "id": "a1",
            "text": "x",
            "status": "todo",
            "isImportant": false,
            "isUrgent": true,
            "dueDate": "",
            "children": [],
            "isExpanded": true,
            "createdAt": 5
        }))
        .unwrap();

        assert_eq!(node.due_date, None);
        assert!(node.history.is_empty());
        assert!(node.is_urgent);
    }

    #[test]
    fn malformed_due_date_is_rejected() {
        let result: Result<Node, _> = serde_json::from_value(json!({
            "id": "a1",
            "dueDate": "next tuesday"
        }));
        assert!(result.is_err());
    }
}
