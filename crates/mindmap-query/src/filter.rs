//! Node predicates and ancestor closure

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, Utc};
use mindmap_tree::{Node, NodeId, TaskStatus, Tree};
use serde::{Deserialize, Serialize};

/// A filter value that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind} filter '{value}'")]
pub struct ParseFilterError {
    pub kind: &'static str,
    pub value: String,
}

/// Primary filter dimension: a due-date window or an exact status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BaseFilter {
    #[default]
    All,
    /// Due date equals today.
    DueToday,
    /// Due date before today and not done.
    Overdue,
    /// Due date after today.
    PlannedFuture,
    Status(TaskStatus),
}

impl BaseFilter {
    /// Whether `node` passes this filter on `today`. Date filters never
    /// match a node without a due date.
    pub fn matches(&self, node: &Node, today: NaiveDate) -> bool {
        match self {
            Self::All => true,
            Self::DueToday => node.due_date.is_some_and(|due| due == today),
            Self::Overdue => {
                node.due_date.is_some_and(|due| due < today) && node.status != TaskStatus::Done
            }
            Self::PlannedFuture => node.due_date.is_some_and(|due| due > today),
            Self::Status(status) => node.status == *status,
        }
    }
}

impl fmt::Display for BaseFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::DueToday => f.write_str("today"),
            Self::Overdue => f.write_str("overdue"),
            Self::PlannedFuture => f.write_str("planned"),
            Self::Status(status) => f.write_str(status.as_str()),
        }
    }
}

impl FromStr for BaseFilter {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "today" => Ok(Self::DueToday),
            "overdue" => Ok(Self::Overdue),
            "planned" => Ok(Self::PlannedFuture),
            other => other
                .parse::<TaskStatus>()
                .map(Self::Status)
                .map_err(|_| ParseFilterError {
                    kind: "base",
                    value: s.to_string(),
                }),
        }
    }
}

/// Priority label. Several may be selected; any one admits a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PriorityFilter {
    Important,
    Urgent,
    /// Important and urgent at once.
    Both,
}

impl PriorityFilter {
    pub fn matches(&self, node: &Node) -> bool {
        match self {
            Self::Important => node.is_important,
            Self::Urgent => node.is_urgent,
            Self::Both => node.is_important && node.is_urgent,
        }
    }
}

impl fmt::Display for PriorityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Important => "important",
            Self::Urgent => "urgent",
            Self::Both => "both",
        })
    }
}

impl FromStr for PriorityFilter {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "important" => Ok(Self::Important),
            "urgent" => Ok(Self::Urgent),
            "both" => Ok(Self::Both),
            _ => Err(ParseFilterError {
                kind: "priority",
                value: s.to_string(),
            }),
        }
    }
}

/// Today's calendar date in UTC.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Base filter AND (no priorities selected OR any selected priority).
pub fn matches(
    node: &Node,
    base: BaseFilter,
    priorities: &BTreeSet<PriorityFilter>,
    today: NaiveDate,
) -> bool {
    base.matches(node, today)
        && (priorities.is_empty() || priorities.iter().any(|priority| priority.matches(node)))
}

/// Ids of every matching node plus all of their ancestors.
pub fn visible_ids(
    tree: &Tree,
    base: BaseFilter,
    priorities: &BTreeSet<PriorityFilter>,
    today: NaiveDate,
) -> HashSet<NodeId> {
    let mut visible = HashSet::new();
    for node in tree.flatten() {
        if !matches(node, base, priorities, today) {
            continue;
        }
        if !visible.insert(node.id.clone()) {
            continue;
        }
        for ancestor in tree.ancestors(&node.id) {
            // An already visible ancestor has its own chain in the set
            if !visible.insert(ancestor.id.clone()) {
                break;
            }
        }
    }
    tracing::debug!(
        base = %base,
        priorities = priorities.len(),
        visible = visible.len(),
        "Computed visible set"
    );
    visible
}

/// Both filter dimensions as selected by a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub base: BaseFilter,
    pub priorities: BTreeSet<PriorityFilter>,
}

impl FilterState {
    pub fn new(base: BaseFilter) -> Self {
        Self {
            base,
            priorities: BTreeSet::new(),
        }
    }

    pub fn with_priority(mut self, priority: PriorityFilter) -> Self {
        self.priorities.insert(priority);
        self
    }

    /// Add the priority if absent, remove it otherwise.
    pub fn toggle_priority(&mut self, priority: PriorityFilter) {
        if !self.priorities.remove(&priority) {
            self.priorities.insert(priority);
        }
    }

    /// True when neither dimension restricts anything.
    pub fn is_unfiltered(&self) -> bool {
        self.base == BaseFilter::All && self.priorities.is_empty()
    }

    pub fn matches(&self, node: &Node, today: NaiveDate) -> bool {
        matches(node, self.base, &self.priorities, today)
    }

    pub fn visible_ids(&self, tree: &Tree, today: NaiveDate) -> HashSet<NodeId> {
        visible_ids(tree, self.base, &self.priorities, today)
    }
}
