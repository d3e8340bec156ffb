//! Version history commands

use std::path::Path;

use colored::Colorize;
use mindmap_fs::NormalizedPath;
use mindmap_versions::{ExportMetadata, SaveType, VersionSnapshot, diff};
use serde::Serialize;

use super::render::{Selection, print_outline};
use crate::context::{Context, resolve_version};
use crate::error::{CliError, Result};

#[derive(Debug, Serialize)]
struct VersionRow {
    id: String,
    #[serde(flatten)]
    metadata: ExportMetadata,
}

fn save_type_label(save_type: SaveType) -> colored::ColoredString {
    match save_type {
        SaveType::Manual => save_type.as_str().green(),
        SaveType::Auto => save_type.as_str().normal(),
        SaveType::ConflictLocal | SaveType::ConflictRemote => save_type.as_str().yellow(),
    }
}

fn summary(snapshot: &VersionSnapshot) -> String {
    snapshot.change_summary.major_changes.join(", ")
}

pub fn run_versions_list(context: &Context, json: bool) -> Result<()> {
    let versions = context.version_store().all_versions()?;

    if json {
        let rows: Vec<VersionRow> = versions
            .iter()
            .map(|v| VersionRow {
                id: v.id.clone(),
                metadata: v.to_export().version,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if versions.is_empty() {
        println!("{}", "No saved versions.".dimmed());
        return Ok(());
    }
    for version in &versions {
        println!(
            "{}  {}  {:<15}  {:>4} tasks  {}  {}",
            version.id.cyan(),
            version.date(),
            save_type_label(version.save_type),
            version.node_count,
            version.device_name.dimmed(),
            summary(version)
        );
    }
    Ok(())
}

pub fn run_versions_show(context: &Context, id: &str) -> Result<()> {
    let versions = context.version_store();
    let snapshot = resolve_version(&versions, id)?;

    println!("{}: {}", "Version".bold(), snapshot.id.cyan());
    println!("{}: {}", "Saved".bold(), snapshot.date());
    println!("{}: {}", "Type".bold(), save_type_label(snapshot.save_type));
    println!("{}: {}", "Device".bold(), snapshot.device_name);
    if let Some(file_name) = &snapshot.file_name {
        println!("{}: {}", "File".bold(), file_name);
    }
    println!("{}: {}", "Changes".bold(), summary(&snapshot));

    if let Ok(current) = context.load_document() {
        let against = diff(Some(&snapshot.data), &current.root);
        println!(
            "{}: {}",
            "Since then".bold(),
            against.major_changes.join(", ")
        );
    }
    println!();
    print_outline(&snapshot.data, &Selection::everything());
    Ok(())
}

pub fn run_versions_export(context: &Context, id: &str, out: &Path) -> Result<()> {
    let versions = context.version_store();
    let snapshot = resolve_version(&versions, id)?;
    let path = versions.export_to(&snapshot, &NormalizedPath::new(out))?;
    println!("{} Exported to {}", "OK".green().bold(), path.as_str().cyan());
    Ok(())
}

/// Restoring is a local edit followed by a manual save.
pub async fn run_versions_restore(context: &Context, id: &str) -> Result<()> {
    let mut coordinator = context.open().await?;
    let snapshot = resolve_version(coordinator.versions(), id)?;
    coordinator.restore_version(&snapshot.id)?;
    coordinator.save().await?;
    println!(
        "{} Restored version from {} ({} tasks)",
        "OK".green().bold(),
        snapshot.date(),
        snapshot.node_count
    );
    Ok(())
}

pub fn run_versions_delete(context: &Context, id: &str) -> Result<()> {
    let versions = context.version_store();
    let snapshot = resolve_version(&versions, id)?;
    if !versions.delete_version(&snapshot.id)? {
        return Err(CliError::user(format!("No version matches '{}'", id)));
    }
    println!("{} Deleted {}", "OK".green().bold(), snapshot.id.cyan());
    Ok(())
}

pub fn run_versions_clear(context: &Context) -> Result<()> {
    let versions = context.version_store();
    let count = versions.all_versions()?.len();
    versions.clear_all_versions()?;
    println!("{} Deleted {} version(s)", "OK".green().bold(), count);
    Ok(())
}
