//! Reading and writing single JSON documents.
//!
//! Every overwrite of an existing document first copies the old bytes to a
//! backup sibling. Backups are best-effort: a failed copy is logged and the
//! write goes ahead.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{StoreError, StoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backup {
    /// `<path>.backup-<unix millis>`, one per overwrite.
    Timestamped,
    /// A single `<path>.backup`, replaced on every overwrite.
    Single,
}

pub fn read<T: DeserializeOwned>(path: &Path) -> StoreResult<T> {
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => StoreError::NotFound(path.display().to_string()),
        _ => StoreError::io(path, e),
    })?;
    serde_json::from_slice(&bytes).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Like [`read`], but a missing file yields `default`. Parse errors still surface.
pub fn read_or<T: DeserializeOwned>(path: &Path, default: T) -> StoreResult<T> {
    match read(path) {
        Err(StoreError::NotFound(_)) => Ok(default),
        other => other,
    }
}

pub fn write<T: Serialize + ?Sized>(path: &Path, value: &T) -> StoreResult<()> {
    write_with(path, value, Backup::Timestamped)
}

pub fn write_with_single_backup<T: Serialize + ?Sized>(path: &Path, value: &T) -> StoreResult<()> {
    write_with(path, value, Backup::Single)
}

pub fn write_with<T: Serialize + ?Sized>(path: &Path, value: &T, backup: Backup) -> StoreResult<()> {
    let mut body = serde_json::to_string_pretty(value).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    body.push('\n');

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }

    if path.exists() {
        match backup_file(path, backup) {
            Ok(backup_path) => debug!(path = %path.display(), backup = %backup_path.display(), "backed up document"),
            Err(e) => warn!(path = %path.display(), error = %e, "backup failed; writing anyway"),
        }
    }

    atomic_write(path, body.as_bytes()).map_err(|e| StoreError::io(path, e))
}

/// Writes `default` unless the file already exists.
pub fn create_if_absent<T: Serialize + ?Sized>(path: &Path, default: &T) -> StoreResult<()> {
    if path.exists() {
        return Ok(());
    }
    write(path, default)
}

fn backup_file(path: &Path, backup: Backup) -> std::io::Result<PathBuf> {
    let backup_path = match backup {
        Backup::Single => sibling(path, "backup"),
        Backup::Timestamped => {
            let mut millis = chrono::Utc::now().timestamp_millis();
            loop {
                let candidate = sibling(path, &format!("backup-{millis}"));
                if !candidate.exists() {
                    break candidate;
                }
                millis += 1;
            }
        }
    };
    fs::copy(path, &backup_path)?;
    Ok(backup_path)
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

/// Write to a temp sibling, fsync, then rename over the target.
fn atomic_write(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp_path = sibling(path, "tmp");
    let mut file = fs::File::create(&tmp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    fs::rename(&tmp_path, path)
}

/// Names of the non-hidden subdirectories of `dir`, sorted. A missing `dir` has none.
pub fn list_subdirs(dir: &Path) -> StoreResult<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| StoreError::io(dir, e.into()))?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            continue;
        }
        names.push(name);
    }
    Ok(names)
}

/// Recursively removes `dir`. Succeeds when it is already gone.
pub fn remove_dir_all_if_exists(dir: &Path) -> StoreResult<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StoreError::io(dir, e)),
    }
}

/// `{...existing, ...patch}`: top-level keys of `patch` replace those of `existing` wholesale.
pub fn shallow_merge(existing: Value, patch: Value) -> StoreResult<Value> {
    let mut merged: Map<String, Value> = match existing {
        Value::Object(map) => map,
        _ => return Err(StoreError::Validation("stored document is not an object".into())),
    };
    let Value::Object(patch) = patch else {
        return Err(StoreError::Validation("update body must be a JSON object".into()));
    };
    merged.extend(patch);
    Ok(Value::Object(merged))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn backups(dir: &Path) -> Vec<PathBuf> {
        let mut found: Vec<_> = fs::read_dir(dir)
            .unwrap()
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.to_string_lossy().contains(".backup"))
            .collect();
        found.sort();
        found
    }

    #[test]
    fn write_formats_with_two_spaces_and_newline() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/doc.json");
        write(&path, &json!({"a": [1]})).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "{\n  \"a\": [\n    1\n  ]\n}\n");
        assert!(backups(path.parent().unwrap()).is_empty());
    }

    #[test]
    fn overwrite_leaves_one_backup_with_old_content() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("doc.json");
        write(&path, &json!({"v": 1})).unwrap();
        let before = fs::read(&path).unwrap();

        write(&path, &json!({"v": 2})).unwrap();

        let found = backups(temp_dir.path());
        assert_eq!(found.len(), 1);
        assert!(found[0].to_string_lossy().contains("doc.json.backup-"));
        assert_eq!(fs::read(&found[0]).unwrap(), before);
        let now: Value = read(&path).unwrap();
        assert_eq!(now, json!({"v": 2}));
    }

    #[test]
    fn rapid_overwrites_never_reuse_a_backup_name() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("doc.json");
        for v in 0..4 {
            write(&path, &json!({ "v": v })).unwrap();
        }
        assert_eq!(backups(temp_dir.path()).len(), 3);
    }

    #[test]
    fn single_backup_is_replaced() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        write(&path, &json!({"v": 1})).unwrap();
        write_with_single_backup(&path, &json!({"v": 2})).unwrap();
        write_with_single_backup(&path, &json!({"v": 3})).unwrap();

        let found = backups(temp_dir.path());
        assert_eq!(found, vec![temp_dir.path().join("config.json.backup")]);
        let backed_up: Value = read(&found[0]).unwrap();
        assert_eq!(backed_up, json!({"v": 2}));
    }

    #[test]
    fn failed_backup_does_not_block_the_write() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        write(&path, &json!({"v": 1})).unwrap();
        // A directory in the backup's place makes the copy fail.
        fs::create_dir(temp_dir.path().join("config.json.backup")).unwrap();

        write_with_single_backup(&path, &json!({"v": 2})).unwrap();

        let now: Value = read(&path).unwrap();
        assert_eq!(now, json!({"v": 2}));
        assert!(temp_dir.path().join("config.json.backup").is_dir());
    }

    #[test]
    fn read_distinguishes_missing_and_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.json");
        assert!(matches!(read::<Value>(&missing), Err(StoreError::NotFound(_))));

        let corrupt = temp_dir.path().join("corrupt.json");
        fs::write(&corrupt, "{ nope").unwrap();
        assert!(matches!(read::<Value>(&corrupt), Err(StoreError::Parse { .. })));
        assert!(matches!(read_or(&corrupt, json!([])), Err(StoreError::Parse { .. })));
        assert_eq!(read_or(&missing, json!([])).unwrap(), json!([]));
    }

    #[test]
    fn create_if_absent_keeps_existing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("articles.json");
        create_if_absent(&path, &json!([])).unwrap();
        write(&path, &json!([{"id": "a"}])).unwrap();
        create_if_absent(&path, &json!([])).unwrap();
        let value: Value = read(&path).unwrap();
        assert_eq!(value, json!([{"id": "a"}]));
    }

    #[test]
    fn lists_only_visible_subdirectories() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["b", "a", ".hidden"] {
            fs::create_dir(temp_dir.path().join(name)).unwrap();
        }
        fs::write(temp_dir.path().join("file.json"), "{}").unwrap();
        assert_eq!(list_subdirs(temp_dir.path()).unwrap(), vec!["a", "b"]);
        assert!(list_subdirs(&temp_dir.path().join("nope")).unwrap().is_empty());
    }

    #[test]
    fn merge_replaces_arrays_wholesale() {
        let merged = shallow_merge(
            json!({"personas": ["customer", "accountant"], "name": "A", "nested": {"x": 1, "y": 2}}),
            json!({"personas": ["partner"], "nested": {"x": 3}}),
        )
        .unwrap();
        assert_eq!(
            merged,
            json!({"personas": ["partner"], "name": "A", "nested": {"x": 3}})
        );
        assert!(shallow_merge(json!({}), json!([1])).is_err());
    }
}
