//! Read-only commands: show, status and search

use std::collections::BTreeSet;

use chrono::{Local, NaiveDate, TimeZone};
use colored::Colorize;
use mindmap_query::{BaseFilter, FilterState, PriorityFilter, breadcrumb, search, today};
use mindmap_tree::{NodeId, TaskStatus};
use serde::Serialize;

use super::render::{Selection, print_outline, status_label};
use crate::context::Context;
use crate::error::Result;

/// One visible node in `show --json` output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VisibleNode<'a> {
    id: &'a NodeId,
    text: &'a str,
    status: TaskStatus,
    is_important: bool,
    is_urgent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_date: Option<NaiveDate>,
    depth: usize,
    /// False for ancestors shown only to keep a match reachable.
    matches: bool,
}

pub fn run_show(
    context: &Context,
    base: BaseFilter,
    priorities: &[PriorityFilter],
    day: Option<NaiveDate>,
    json: bool,
) -> Result<()> {
    let document = context.load_document()?;
    let tree = &document.root;
    let day = day.unwrap_or_else(today);
    let filter = FilterState {
        base,
        priorities: priorities.iter().copied().collect::<BTreeSet<_>>(),
    };
    let visible = filter.visible_ids(tree, day);

    if json {
        let nodes: Vec<VisibleNode<'_>> = tree
            .flatten()
            .into_iter()
            .filter(|node| visible.contains(&node.id))
            .map(|node| VisibleNode {
                id: &node.id,
                text: &node.text,
                status: node.status,
                is_important: node.is_important,
                is_urgent: node.is_urgent,
                due_date: node.due_date,
                depth: tree.depth(&node.id).unwrap_or(0),
                matches: filter.matches(node, day),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&nodes)?);
        return Ok(());
    }

    if filter.is_unfiltered() {
        print_outline(tree, &Selection::everything());
        return Ok(());
    }

    if visible.is_empty() {
        println!("{}", "No tasks match the current filter.".dimmed());
        return Ok(());
    }
    let matched = |node: &mindmap_tree::Node| filter.matches(node, day);
    print_outline(
        tree,
        &Selection {
            visible: Some(&visible),
            matched: Some(&matched),
        },
    );
    Ok(())
}

pub fn run_status(context: &Context, json: bool) -> Result<()> {
    let document = context.load_document()?;
    let tree = &document.root;
    let counts = tree.status_counts();
    let versions = context.version_store().all_versions()?;
    let last_saved = format_millis(document.last_saved);

    if json {
        let by_status: serde_json::Map<String, serde_json::Value> = TaskStatus::ALL
            .iter()
            .map(|status| {
                let count = counts.get(status).copied().unwrap_or(0);
                (status.as_str().to_string(), count.into())
            })
            .collect();
        let output = serde_json::json!({
            "file": context.file.as_str(),
            "root": &tree.root().text,
            "nodes": tree.node_count(),
            "status": by_status,
            "lastSaved": document.last_saved,
            "versions": versions.len(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}: {}", "File".bold(), context.file.as_str().cyan());
    println!("{}: {}", "Root".bold(), tree.root().text);
    println!("{}: {}", "Last saved".bold(), last_saved);
    println!("{}: {}", "Tasks".bold(), tree.node_count());
    for status in TaskStatus::ALL {
        let count = counts.get(&status).copied().unwrap_or(0);
        if count > 0 {
            println!("  {:<12} {}", status_label(status), count);
        }
    }
    println!("{}: {}", "Versions".bold(), versions.len());
    Ok(())
}

pub fn run_search(context: &Context, query: &str) -> Result<()> {
    let document = context.load_document()?;
    let tree = &document.root;
    let found = search(tree, query);

    if found.is_empty() {
        println!("{}", format!("No tasks match '{}'", query).dimmed());
        return Ok(());
    }
    for node in found {
        let path = breadcrumb(tree, &node.id).unwrap_or_default();
        println!("{}  [{}] {}", node.id.as_str().dimmed(), status_label(node.status), path);
    }
    Ok(())
}

/// Local wall-clock rendering of a millisecond timestamp.
pub(crate) fn format_millis(millis: i64) -> String {
    if millis <= 0 {
        return "never".to_string();
    }
    match Local.timestamp_millis_opt(millis).single() {
        Some(time) => time.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => millis.to_string(),
    }
}
