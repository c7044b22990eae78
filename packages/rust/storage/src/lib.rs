//! Historical store: the latest known record per monitored publication.
//!
//! The [`HistoricalStore`] is a JSON object on disk keyed by
//! `"<Institution>_<Publication>"`. It is read once at startup, updated in
//! memory after each successful extraction, and written back in full.
//!
//! **Durability rules:**
//! - Loading never fails: a missing or unreadable file yields an empty store,
//!   and a single unreadable record is skipped rather than dropping the rest.
//! - Saving writes a sibling temp file and renames it over the target, so a
//!   crash mid-write leaves the previous file intact.
//! - Records are replaced whole and never deleted.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use pubwatch_shared::{PublicationRecord, PubwatchError, Result};
use tracing::{debug, error, info, warn};

/// Key → latest record, in stable key order.
pub type RecordMap = BTreeMap<String, PublicationRecord>;

/// Primary storage handle for publication records.
#[derive(Debug)]
pub struct HistoricalStore {
    path: PathBuf,
    records: RecordMap,
}

impl HistoricalStore {
    /// Load the store from `path`. Missing or unreadable files start empty.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let records = if path.exists() {
            match read_records(&path) {
                Ok(records) => records,
                Err(e) => {
                    error!(
                        path = %path.display(),
                        error = %e,
                        "failed to load historical data, starting empty"
                    );
                    RecordMap::new()
                }
            }
        } else {
            debug!(path = %path.display(), "no historical data file yet");
            RecordMap::new()
        };

        info!(records = records.len(), "historical data loaded");
        Self { path, records }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Latest record for `key`, if any crawl has succeeded for it.
    pub fn get(&self, key: &str) -> Option<&PublicationRecord> {
        self.records.get(key)
    }

    /// Replace the record for `key`.
    pub fn update(&mut self, key: impl Into<String>, record: PublicationRecord) {
        let key = key.into();
        if self.records.insert(key.clone(), record).is_some() {
            debug!(%key, "record replaced");
        } else {
            debug!(%key, "record created");
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &PublicationRecord)> {
        self.records.iter()
    }

    /// Persist the full mapping as pretty-printed UTF-8 JSON.
    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.records)
            .map_err(|e| PubwatchError::Storage(format!("failed to serialize records: {e}")))?;

        write_atomic(&self.path, &json)?;

        info!(records = self.records.len(), path = %self.path.display(), "historical data saved");
        Ok(())
    }
}

/// Write `content` to a hidden sibling temp file, then rename it over `path`.
///
/// Parent directories are created. On failure the temp file is removed and
/// any previous file at `path` is left untouched.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| PubwatchError::io(parent, e))?;
    }

    let temp = temp_path(path);
    if let Err(e) = std::fs::write(&temp, content) {
        let _ = std::fs::remove_file(&temp);
        return Err(PubwatchError::io(&temp, e));
    }

    if let Err(e) = std::fs::rename(&temp, path) {
        let _ = std::fs::remove_file(&temp);
        return Err(PubwatchError::io(path, e));
    }

    debug!(bytes = content.len(), path = %path.display(), "file written");
    Ok(())
}

/// Read and parse the JSON mapping at `path`.
///
/// A record that does not parse is skipped with a warning; the rest of the
/// mapping is kept.
fn read_records(path: &Path) -> Result<RecordMap> {
    let content = std::fs::read_to_string(path).map_err(|e| PubwatchError::io(path, e))?;
    if content.trim().is_empty() {
        warn!(path = %path.display(), "historical data file is empty");
        return Ok(RecordMap::new());
    }

    let raw: BTreeMap<String, serde_json::Value> = serde_json::from_str(&content)
        .map_err(|e| PubwatchError::Storage(format!("invalid JSON in {}: {e}", path.display())))?;

    let mut records = RecordMap::new();
    for (key, value) in raw {
        match serde_json::from_value::<PublicationRecord>(value) {
            Ok(record) => {
                records.insert(key, record);
            }
            Err(e) => warn!(%key, error = %e, "skipping unreadable record"),
        }
    }
    Ok(records)
}

/// `data.json` → `.data.json.tmp` in the same directory.
fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "store".into());
    path.with_file_name(format!(".{name}.tmp"))
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;
    use pubwatch_shared::record_key;
    use uuid::Uuid;

    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pw-store-test-{}", Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn record(institution: &str, publication: &str, title: &str) -> PublicationRecord {
        PublicationRecord {
            institution: institution.into(),
            publication: publication.into(),
            frequency: "Quarterly".into(),
            predicted_next: "3 months later (estimated)".into(),
            last_published: "June 2025".into(),
            last_title: title.into(),
            last_year_same_period: Some("2024-09-17".into()),
            last_crawled: DateTime::parse_from_rfc3339("2025-07-01T07:00:03.250+02:00").unwrap(),
            source_url: "https://www.bde.es/wbe/en/publicaciones/".into(),
        }
    }

    #[test]
    fn missing_file_starts_empty() {
        let dir = temp_dir();
        let store = HistoricalStore::load(dir.join("publications_data.json"));
        assert!(store.is_empty());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = temp_dir();
        let path = dir.join("publications_data.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = HistoricalStore::load(&path);
        assert!(store.is_empty());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn save_then_load_roundtrip_preserves_non_ascii() {
        let dir = temp_dir();
        let path = dir.join("publications_data.json");

        let mut store = HistoricalStore::load(&path);
        let a = record(
            "Banco de España",
            "Proyecciones macroeconómicas",
            "Informe trimestral, junio",
        );
        let b = record(
            "Banque de France",
            "Macroeconomic Projections",
            "Projections macroéconomiques",
        );
        store.update(a.key(), a.clone());
        store.update(b.key(), b.clone());
        store.save().unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("Banco de España"));
        assert!(raw.contains("Projections macroéconomiques"));
        assert!(!raw.contains("\\u00"));

        let reloaded = HistoricalStore::load(&path);
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get(&a.key()), Some(&a));
        assert_eq!(reloaded.get(&b.key()), Some(&b));

        // Saving the reloaded store reproduces the file byte for byte.
        reloaded.save().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), raw);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn update_replaces_whole_record() {
        let dir = temp_dir();
        let mut store = HistoricalStore::load(dir.join("data.json"));
        let key = record_key("OECD", "Interim Economic Outlook");

        store.update(key.clone(), record("OECD", "Interim Economic Outlook", "first"));
        let mut second = record("OECD", "Interim Economic Outlook", "second");
        second.last_year_same_period = None;
        store.update(key.clone(), second.clone());

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&key), Some(&second));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn save_leaves_no_temp_file_and_creates_parents() {
        let dir = temp_dir();
        let path = dir.join("nested").join("publications_data.json");
        let mut store = HistoricalStore::load(&path);
        let r = record("EBA", "ESEP", "EBA ESEP Report 2025");
        store.update(r.key(), r);
        store.save().unwrap();

        assert!(path.exists());
        assert!(!temp_path(&path).exists());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn reads_timestamps_with_microseconds() {
        let dir = temp_dir();
        let path = dir.join("publications_data.json");
        let json = r#"{
  "EBA_ESEP": {
    "institution": "EBA",
    "publication": "ESEP",
    "frequency": "Annual",
    "predicted_next": "same period next year",
    "last_published": "July 2024",
    "last_title": "EBA ESEP Report 2024",
    "last_year_same_period": "",
    "last_crawled": "2025-07-01T07:00:02.123456+02:00",
    "source_url": "https://www.eba.europa.eu/"
  }
}"#;
        std::fs::write(&path, json).unwrap();
        let store = HistoricalStore::load(&path);
        let rec = store.get("EBA_ESEP").expect("record");
        assert_eq!(rec.last_published, "July 2024");
        assert_eq!(rec.last_year_same_period.as_deref(), Some(""));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn null_fields_and_bad_records_do_not_drop_the_store() {
        let dir = temp_dir();
        let path = dir.join("publications_data.json");
        let json = r#"{
  "EBA_ESEP": {
    "institution": "EBA",
    "publication": "ESEP",
    "frequency": "Annual",
    "predicted_next": "same period next year",
    "last_published": "July 2024",
    "last_title": "EBA ESEP Report 2024",
    "last_year_same_period": null,
    "last_crawled": "2025-07-01T07:00:02+02:00",
    "source_url": "https://www.eba.europa.eu/"
  },
  "OECD_Interim Economic Outlook": {
    "institution": "OECD",
    "publication": "Interim Economic Outlook",
    "frequency": "Irregular",
    "predicted_next": "September 2025",
    "last_published": null,
    "last_title": "OECD Interim Economic Outlook",
    "last_year_same_period": null,
    "last_crawled": "2025-07-01T07:00:09+02:00",
    "source_url": "https://www.oecd.org/en/publications/"
  },
  "Broken_Record": {
    "institution": "Broken",
    "last_crawled": "not a timestamp"
  }
}"#;
        std::fs::write(&path, json).unwrap();

        let store = HistoricalStore::load(&path);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("EBA_ESEP").unwrap().last_published, "July 2024");
        let oecd = store.get("OECD_Interim Economic Outlook").unwrap();
        assert_eq!(oecd.last_published, "");
        assert!(store.get("Broken_Record").is_none());

        // Saving keeps both readable records.
        store.save().unwrap();
        assert_eq!(HistoricalStore::load(&path).len(), 2);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn failed_rename_keeps_target_and_removes_temp() {
        let dir = temp_dir();
        // A non-empty directory cannot be replaced by a file.
        let target = dir.join("index.html");
        std::fs::create_dir_all(target.join("occupied")).unwrap();

        let err = write_atomic(&target, "<html></html>").unwrap_err();
        assert!(matches!(err, PubwatchError::Io { .. }));
        assert!(target.join("occupied").is_dir());
        assert!(!temp_path(&target).exists());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn write_atomic_replaces_existing_file() {
        let dir = temp_dir();
        let target = dir.join("index.html");
        std::fs::write(&target, "old").unwrap();

        write_atomic(&target, "new").unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "new");
        assert!(!temp_path(&target).exists());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn temp_path_is_hidden_sibling() {
        let p = temp_path(Path::new("/var/lib/pubwatch/publications_data.json"));
        assert_eq!(p, PathBuf::from("/var/lib/pubwatch/.publications_data.json.tmp"));
    }
}
