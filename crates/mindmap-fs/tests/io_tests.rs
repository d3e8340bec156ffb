use mindmap_fs::{NormalizedPath, io};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_write_atomic_creates_file_and_parents() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("nested/dir/tasks.json"));

    io::write_atomic(&path, b"{}").unwrap();

    let content = fs::read_to_string(path.to_native()).unwrap();
    assert_eq!(content, "{}");
}

#[test]
fn test_write_atomic_overwrites_without_leftover_temp() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("tasks.json");
    fs::write(&file_path, "original").unwrap();

    let path = NormalizedPath::new(&file_path);
    io::write_text(&path, "updated").unwrap();

    assert_eq!(fs::read_to_string(&file_path).unwrap(), "updated");
    let leftovers: Vec<_> = fs::read_dir(temp.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty(), "temp files left behind: {:?}", leftovers);
}

#[test]
fn test_read_text_nonexistent_file() {
    let path = NormalizedPath::new("/nonexistent/mindmap/file.json");
    let result = io::read_text(&path);
    assert!(result.is_err());
}

#[test]
fn test_modified_millis_is_recent() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("tasks.json"));
    io::write_text(&path, "x").unwrap();

    let modified = io::modified_millis(&path).unwrap();
    assert!(modified > 1_600_000_000_000, "unexpected mtime {}", modified);
}

#[test]
fn test_modified_millis_missing_file_errors() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("missing.json"));
    assert!(io::modified_millis(&path).is_err());
}
