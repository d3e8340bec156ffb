//! Two devices editing one shared document file.
//!
//! Each device has its own key-value store, version history and clock;
//! the only thing they share is the file.

use std::sync::Arc;
use std::time::Duration;

use mindmap_fs::{JsonKvStore, KvStore};
use mindmap_query::{BaseFilter, FilterState};
use mindmap_sync::{
    Coordinator, KvHandleStore, LocalFile, ManualClock, MemoryFile, MemoryHandleStore, PathPicker,
    PollOutcome, SaveOutcome, Settings, SyncService,
};
use mindmap_test_utils::{date, sample_tree};
use mindmap_tree::{Document, Node, NodePatch, TaskStatus, Tree};
use mindmap_versions::{DeviceIdentity, DirectoryBackend, SaveType, VersionStore};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

struct Device {
    coordinator: Coordinator,
    clock: Arc<ManualClock>,
}

impl Device {
    /// A device keeping its state under `<temp>/<name>/`.
    fn new(temp: &TempDir, name: &str, start: i64) -> Self {
        let dir = temp.path().join(name);
        let kv: Arc<dyn KvStore> = Arc::new(JsonKvStore::new(dir.join("state.json")));
        let versions = VersionStore::new(
            DirectoryBackend::new(dir.join("versions")),
            DeviceIdentity::new(format!("device-{}", name), format!("Test - {}", name)),
        );
        let clock = Arc::new(ManualClock::new(start));
        let coordinator = Coordinator::new(
            Document::new(Tree::default(), 0),
            versions,
            kv.clone(),
            Arc::new(KvHandleStore::new(kv)),
            clock.clone(),
        );
        Self { coordinator, clock }
    }

    fn count(&self, save_type: SaveType) -> usize {
        self.coordinator
            .versions()
            .all_versions()
            .unwrap()
            .iter()
            .filter(|v| v.save_type == save_type)
            .count()
    }
}

/// Give coarse file system timestamps room to move between writes.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

#[tokio::test]
async fn edits_travel_between_devices_through_the_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("shared").join("plan.json");
    let (tree, ids) = sample_tree();

    let mut laptop = Device::new(&temp, "laptop", 1_000);
    laptop.coordinator.replace_tree(tree.clone());
    let saved = laptop
        .coordinator
        .save_with(&PathPicker::new(path.as_path()))
        .await
        .unwrap();
    assert_eq!(saved, SaveOutcome::Saved);

    let mut desktop = Device::new(&temp, "desktop", 1_500);
    desktop
        .coordinator
        .open(Arc::new(LocalFile::new(path.as_path())))
        .await
        .unwrap();
    assert_eq!(desktop.coordinator.tree(), &tree);
    assert_eq!(desktop.coordinator.last_saved(), 1_000);

    // The laptop reopens the offer and saves
    settle().await;
    laptop.clock.set(2_000);
    laptop
        .coordinator
        .edit(|t| t.update(&ids["Offer"], &NodePatch::new().status(TaskStatus::Todo)));
    laptop.coordinator.save().await.unwrap();

    // Meanwhile the desktop renamed a task without saving
    desktop
        .coordinator
        .edit(|t| t.update(&ids["Offsite"], &NodePatch::new().text("Offsite in Lisbon")));
    let desktop_draft = desktop.coordinator.tree().clone();

    assert_eq!(desktop.coordinator.poll().await.unwrap(), PollOutcome::Reconciled);
    assert_eq!(desktop.coordinator.tree(), laptop.coordinator.tree());
    assert!(!desktop.coordinator.is_dirty());
    assert_eq!(desktop.count(SaveType::ConflictLocal), 1);
    assert_eq!(desktop.count(SaveType::ConflictRemote), 1);
    let kept = desktop
        .coordinator
        .versions()
        .all_versions()
        .unwrap()
        .into_iter()
        .find(|v| v.save_type == SaveType::ConflictLocal)
        .unwrap();
    assert_eq!(kept.data, desktop_draft);

    // The desktop reapplies its rename and saves; the laptop picks it up
    settle().await;
    desktop.clock.set(3_000);
    desktop.coordinator.restore_version(&kept.id).unwrap();
    desktop
        .coordinator
        .edit(|t| t.update(&ids["Offer"], &NodePatch::new().status(TaskStatus::Todo)));
    desktop.coordinator.save().await.unwrap();

    assert_eq!(laptop.coordinator.poll().await.unwrap(), PollOutcome::Reconciled);
    let merged = laptop.coordinator.tree();
    assert_eq!(merged.get(&ids["Offsite"]).unwrap().text, "Offsite in Lisbon");
    assert_eq!(merged.get(&ids["Offer"]).unwrap().status, TaskStatus::Todo);
    assert_eq!(laptop.coordinator.last_saved(), 3_000);

    // Nothing new until someone writes again
    assert_eq!(laptop.coordinator.poll().await.unwrap(), PollOutcome::Unchanged);

    // Both histories live on disk, one file per snapshot
    let laptop_versions = std::fs::read_dir(temp.path().join("laptop").join("versions")).unwrap().count();
    assert_eq!(laptop_versions, laptop.coordinator.versions().all_versions().unwrap().len());
}

#[tokio::test]
async fn filters_see_the_reconciled_tree() {
    let file = MemoryFile::new("plan.json");
    let (tree, ids) = sample_tree();
    file.put(Document::new(tree, 100).to_json_pretty().unwrap(), 1);

    let mut phone = Coordinator::new(
        Document::new(Tree::default(), 0),
        VersionStore::in_memory(DeviceIdentity::new("device-phone", "Test - phone")),
        Arc::new(mindmap_fs::MemoryKvStore::new()),
        Arc::new(MemoryHandleStore::new()),
        Arc::new(ManualClock::new(150)),
    );
    phone.open(Arc::new(file.clone())).await.unwrap();

    let overdue = FilterState::new(BaseFilter::Overdue);
    let before = overdue.visible_ids(phone.tree(), date("2024-06-15"));
    assert!(before.contains(&ids["Screen CVs"]));

    // Another device finished screening
    let remote = phone
        .tree()
        .clone()
        .update(&ids["Screen CVs"], &NodePatch::new().status(TaskStatus::Done));
    file.put(Document::new(remote, 200).to_json_pretty().unwrap(), 2);
    assert_eq!(phone.poll().await.unwrap(), PollOutcome::Reconciled);

    let after = overdue.visible_ids(phone.tree(), date("2024-06-15"));
    assert!(after.is_empty());
}

#[tokio::test(start_paused = true)]
async fn running_services_converge_on_the_next_poll() {
    let file = MemoryFile::new("plan.json");
    let (tree, ids) = sample_tree();
    file.put(Document::new(tree, 100).to_json_pretty().unwrap(), 1);

    let start = |name: &str, now: i64| {
        Coordinator::new(
            Document::new(Tree::default(), 0),
            VersionStore::in_memory(DeviceIdentity::new(format!("device-{}", name), name)),
            Arc::new(mindmap_fs::MemoryKvStore::new()),
            Arc::new(MemoryHandleStore::new()),
            Arc::new(ManualClock::new(now)),
        )
    };
    let settings = Settings::default();
    let laptop = SyncService::start(start("laptop", 1_000), &settings);
    let desktop = SyncService::start(start("desktop", 900), &settings);
    laptop.handle().open(Arc::new(file.clone())).await.unwrap();
    desktop.handle().open(Arc::new(file.clone())).await.unwrap();

    let root = ids["Operations"].clone();
    laptop
        .handle()
        .edit(move |t| t.add_child(&root, Node::new("Quarterly report")))
        .await
        .unwrap();
    laptop.handle().save().await.unwrap();

    tokio::time::sleep(settings.poll_interval() + Duration::from_secs(1)).await;

    let laptop_state = laptop.handle().state().await.unwrap();
    let desktop_state = desktop.handle().state().await.unwrap();
    assert_eq!(desktop_state.tree, laptop_state.tree);
    assert_eq!(desktop_state.last_saved, 1_000);
    assert_eq!(desktop_state.tree.node_count(), 8);

    let desktop = desktop.shutdown().await.unwrap();
    laptop.shutdown().await.unwrap();
    assert_eq!(
        desktop
            .versions()
            .all_versions()
            .unwrap()
            .iter()
            .filter(|v| v.save_type == SaveType::ConflictRemote)
            .count(),
        1
    );
}
