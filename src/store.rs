//! File-backed story store.
//!
//! One JSON document per story under the configured stories directory,
//! named `<id>.json`. This is a plain key-to-record collaborator: no
//! locking, no transactions, last write wins.

use crate::story::{StoryRecord, is_valid_slug};
use anyhow::{Context, Result, anyhow};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct StoryStore {
    root: PathBuf,
}

impl StoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn record_path(&self, id: &str) -> Result<PathBuf> {
        if !is_valid_slug(id) {
            return Err(anyhow!(
                "invalid story id {id:?}: expected lowercase letters, digits and hyphens"
            ));
        }
        Ok(self.root.join(format!("{id}.json")))
    }

    /// Load one story by id.
    pub fn get(&self, id: &str) -> Result<StoryRecord> {
        let path = self.record_path(id)?;
        let data = fs::read_to_string(&path)
            .with_context(|| format!("story {id:?} not found at {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("story file {} is not a valid record", path.display()))
    }

    /// List every readable story, sorted by id. Unreadable or malformed
    /// files are skipped with a warning so one bad file cannot hide the
    /// rest of the library.
    pub fn list(&self) -> Result<Vec<StoryRecord>> {
        let mut records = Vec::new();
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(records),
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("could not read stories directory {}", self.root.display())
                });
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match fs::read_to_string(&path)
                .map_err(anyhow::Error::from)
                .and_then(|data| serde_json::from_str::<StoryRecord>(&data).map_err(Into::into))
            {
                Ok(record) => records.push(record),
                Err(err) => {
                    warn!(path = %path.display(), "Skipping unreadable story file: {err}");
                }
            }
        }

        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }

    /// Persist a story, replacing any previous record with the same id.
    pub fn put(&self, record: &StoryRecord) -> Result<()> {
        let path = self.record_path(&record.id)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("could not create {}", parent.display()))?;
        }
        let data = serde_json::to_string_pretty(record).context("could not serialize story")?;
        fs::write(&path, data).with_context(|| format!("could not write {}", path.display()))?;
        debug!(id = %record.id, path = %path.display(), "Stored story");
        Ok(())
    }

    /// Delete a story by id; missing stories are an error the caller can
    /// surface.
    pub fn delete(&self, id: &str) -> Result<()> {
        let path = self.record_path(id)?;
        fs::remove_file(&path)
            .with_context(|| format!("story {id:?} not found at {}", path.display()))?;
        debug!(id, "Deleted story");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile_story;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_store(label: &str) -> StoryStore {
        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time should be after epoch")
            .as_nanos();
        StoryStore::new(std::env::temp_dir().join(format!("tense-tales-{label}-{nonce}")))
    }

    fn sample_record(id: &str) -> StoryRecord {
        let source = format!(
            "---\nid: \"{id}\"\ntitle: \"Sample\"\n---\n\n## One\nShe [\"ran\", \"runs\"] far.\n"
        );
        compile_story(&source).record
    }

    #[test]
    fn put_get_roundtrip_preserves_the_record() {
        let store = temp_store("roundtrip");
        let record = sample_record("sample-tale");

        store.put(&record).expect("put should succeed");
        let loaded = store.get("sample-tale").expect("get should succeed");
        assert_eq!(loaded, record);

        let _ = fs::remove_dir_all(store.root);
    }

    #[test]
    fn list_skips_malformed_files_and_sorts_by_id() {
        let store = temp_store("list");
        store.put(&sample_record("b-tale")).expect("put b");
        store.put(&sample_record("a-tale")).expect("put a");
        fs::write(store.root.join("broken.json"), "{ not json").expect("write junk");
        fs::write(store.root.join("notes.txt"), "ignored").expect("write txt");

        let listed = store.list().expect("list should succeed");
        let ids: Vec<_> = listed.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a-tale", "b-tale"]);

        let _ = fs::remove_dir_all(store.root);
    }

    #[test]
    fn list_of_missing_directory_is_empty() {
        let store = temp_store("missing");
        assert!(store.list().expect("list should succeed").is_empty());
    }

    #[test]
    fn delete_removes_the_record() {
        let store = temp_store("delete");
        store.put(&sample_record("gone-soon")).expect("put");
        store.delete("gone-soon").expect("delete should succeed");
        assert!(store.get("gone-soon").is_err());
        assert!(store.delete("gone-soon").is_err());

        let _ = fs::remove_dir_all(store.root);
    }

    #[test]
    fn invalid_ids_never_touch_the_filesystem() {
        let store = temp_store("invalid");
        assert!(store.get("../escape").is_err());
        assert!(store.delete("UPPER").is_err());
    }
}
