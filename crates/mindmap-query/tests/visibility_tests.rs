//! Filtering the sample plan end to end

use std::collections::{BTreeSet, HashSet};

use mindmap_query::{BaseFilter, FilterState, PriorityFilter, visible_ids};
use mindmap_test_utils::{date, sample_tree};
use mindmap_tree::{NodeId, TaskStatus};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn labels(ids: &HashSet<NodeId>, names: &std::collections::HashMap<String, NodeId>) -> BTreeSet<String> {
    names
        .iter()
        .filter(|(_, id)| ids.contains(*id))
        .map(|(label, _)| label.clone())
        .collect()
}

#[rstest]
#[case(BaseFilter::DueToday, &["Operations", "Hiring"])]
#[case(BaseFilter::Overdue, &["Operations", "Hiring", "Screen CVs"])]
#[case(BaseFilter::PlannedFuture, &["Operations", "Budget"])]
#[case(BaseFilter::Status(TaskStatus::Tracking), &["Operations", "Budget", "Q3 review"])]
#[case(BaseFilter::Status(TaskStatus::Done), &["Operations", "Hiring", "Offer"])]
fn base_filters_on_sample_plan(#[case] base: BaseFilter, #[case] expected: &[&str]) {
    let (tree, ids) = sample_tree();

    let visible = visible_ids(&tree, base, &BTreeSet::new(), date("2024-06-15"));

    let expected: BTreeSet<String> = expected.iter().map(|s| s.to_string()).collect();
    assert_eq!(labels(&visible, &ids), expected);
}

#[test]
fn root_is_visible_whenever_a_descendant_matches() {
    let (tree, _) = sample_tree();
    for status in TaskStatus::ALL {
        let visible = FilterState::new(BaseFilter::Status(status)).visible_ids(&tree, date("2024-06-15"));
        let direct = tree.flatten().iter().any(|n| n.status == status);
        assert_eq!(visible.contains(tree.root_id()), direct, "status {status}");
    }
}

#[test]
fn priority_and_base_combine() {
    let (tree, ids) = sample_tree();
    let state = FilterState::new(BaseFilter::PlannedFuture).with_priority(PriorityFilter::Important);

    let visible = state.visible_ids(&tree, date("2024-06-15"));

    // Budget is planned but only urgent
    assert!(visible.is_empty(), "unexpected: {:?}", labels(&visible, &ids));

    let state = state.with_priority(PriorityFilter::Urgent);
    let visible = state.visible_ids(&tree, date("2024-06-15"));
    let expected: BTreeSet<String> = ["Operations", "Budget"].iter().map(|s| s.to_string()).collect();
    assert_eq!(labels(&visible, &ids), expected);
}

#[test]
fn unfiltered_state_shows_everything() {
    let (tree, _) = sample_tree();
    let visible = FilterState::default().visible_ids(&tree, date("2024-06-15"));
    assert_eq!(visible.len(), tree.node_count());
}
