//! JSON File History Store
//!
//! Implements HistoryStore as a pretty-printed JSON array on disk.

use crate::domain::entities::HistoryEntry;
use crate::domain::ports::HistoryStore;
use anyhow::Context;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

/// JSON-file-backed history store.
///
/// A missing, unreadable, or corrupt file loads as an empty history so a
/// damaged file never blocks a lookup. A corrupt file is moved to
/// `<path>.corrupt` before the next append writes a fresh one.
pub struct JsonFileHistoryStore {
    path: PathBuf,
    /// Serializes read-modify-write in `append`
    write_lock: Mutex<()>,
}

impl JsonFileHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where a corrupt history file is moved before it is replaced.
    pub fn corrupt_backup_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".corrupt");
        PathBuf::from(name)
    }

    /// Read the file. Missing or unreadable files count as empty;
    /// content that fails to parse is reported as an error.
    fn read_entries(&self) -> Result<Vec<HistoryEntry>, serde_json::Error> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                tracing::warn!("failed to read history {}: {}", self.path.display(), e);
                return Ok(Vec::new());
            }
        };

        serde_json::from_str(&data)
    }
}

impl HistoryStore for JsonFileHistoryStore {
    fn load(&self) -> anyhow::Result<Vec<HistoryEntry>> {
        Ok(self.read_entries().unwrap_or_else(|e| {
            tracing::warn!("ignoring corrupt history {}: {}", self.path.display(), e);
            Vec::new()
        }))
    }

    fn append(&self, entry: HistoryEntry) -> anyhow::Result<()> {
        let _guard = self.write_lock.lock();

        let mut entries = match self.read_entries() {
            Ok(entries) => entries,
            Err(e) => {
                let backup = self.corrupt_backup_path();
                std::fs::rename(&self.path, &backup).with_context(|| {
                    format!("failed to set aside corrupt history {}", self.path.display())
                })?;
                tracing::warn!(
                    "corrupt history {} moved to {}: {}",
                    self.path.display(),
                    backup.display(),
                    e
                );
                Vec::new()
            }
        };
        entries.push(entry);

        let json = serde_json::to_string_pretty(&entries)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("failed to write history {}", self.path.display()))?;

        tracing::debug!("history now has {} entries", entries.len());
        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(ip: &str, city: Option<&str>) -> HistoryEntry {
        HistoryEntry {
            timestamp: "2024-05-01 12:00:00".to_string(),
            ip: ip.to_string(),
            city: city.map(str::to_string),
            country: Some("PL".to_string()),
            region: None,
            postal: None,
            timezone: None,
            org: None,
            loc: Some("52.2,21.0".to_string()),
        }
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileHistoryStore::new(dir.path().join("history.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_append_and_load_preserve_order() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileHistoryStore::new(dir.path().join("history.json"));

        store.append(entry("203.0.113.5", Some("Warsaw"))).unwrap();
        store.append(entry("198.51.100.7", None)).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].ip, "203.0.113.5");
        assert_eq!(loaded[1].ip, "198.51.100.7");
        assert_eq!(loaded[1].city, None);
    }

    #[test]
    fn test_file_is_pretty_json_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        let store = JsonFileHistoryStore::new(&path);

        store.append(entry("203.0.113.5", Some("Kraków"))).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.starts_with('['));
        assert!(raw.contains('\n'));
        // Non-ASCII stays readable
        assert!(raw.contains("Kraków"));

        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[0]["timestamp"], "2024-05-01 12:00:00");
        assert_eq!(value[0]["loc"], "52.2,21.0");
        assert!(value[0].get("org").is_none());
    }

    #[test]
    fn test_corrupt_file_loads_empty_and_is_replaced() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = JsonFileHistoryStore::new(&path);

        assert!(store.load().unwrap().is_empty());

        store.append(entry("203.0.113.5", None)).unwrap();
        assert_eq!(store.load().unwrap().len(), 1);

        // The damaged content is kept aside rather than lost
        let backup = dir.path().join("history.json.corrupt");
        assert_eq!(store.corrupt_backup_path(), backup);
        assert_eq!(std::fs::read_to_string(&backup).unwrap(), "{ not json");
    }

    #[test]
    fn test_valid_history_leaves_no_backup() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileHistoryStore::new(dir.path().join("history.json"));

        store.append(entry("203.0.113.5", None)).unwrap();
        store.append(entry("198.51.100.7", None)).unwrap();

        assert!(!store.corrupt_backup_path().exists());
    }

    #[test]
    fn test_reads_entries_written_elsewhere() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(
            &path,
            r#"[{"timestamp":"2023-12-31 23:59:59","ip":"203.0.113.5","city":"Gdańsk","country":"PL","region":"Pomerania","postal":"80-001","timezone":"Europe/Warsaw","org":"AS1"}]"#,
        )
        .unwrap();
        let store = JsonFileHistoryStore::new(&path);

        let loaded = store.load().unwrap();
        assert_eq!(loaded[0].city.as_deref(), Some("Gdańsk"));
        assert_eq!(loaded[0].loc, None);
    }

    #[test]
    fn test_append_to_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileHistoryStore::new(dir.path().join("nope").join("history.json"));
        assert!(store.append(entry("203.0.113.5", None)).is_err());
    }
}
