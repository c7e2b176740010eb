use chrono::{DateTime, Local};
use parking_lot::Mutex;
use std::{fs, path::PathBuf};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::models::HistoryRecord;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history io error: {0}")] Io(String),
    #[error("history is corrupted: {0}")] Parse(String),
}

/// Local, file-backed history slot: one JSON array of [`HistoryRecord`]s.
pub struct HistoryStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    pub fn load(&self) -> Result<Vec<HistoryRecord>, HistoryError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path).map_err(|e| HistoryError::Io(e.to_string()))?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|e| HistoryError::Parse(e.to_string()))
    }

    pub fn append(&self, record: HistoryRecord) -> Result<(), HistoryError> {
        let _guard = self.write_lock.lock();
        let mut records = self.load()?;
        records.push(record);
        self.save(&records)?;
        info!("🗂️ History now holds {} records", records.len());
        Ok(())
    }

    pub fn clear(&self) -> Result<(), HistoryError> {
        let _guard = self.write_lock.lock();
        self.save(&[])?;
        info!("🧹 History cleared");
        Ok(())
    }

    fn save(&self, records: &[HistoryRecord]) -> Result<(), HistoryError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| HistoryError::Io(e.to_string()))?;
        }
        let content = serde_json::to_string_pretty(records).map_err(|e| HistoryError::Io(e.to_string()))?;
        fs::write(&self.path, content).map_err(|e| HistoryError::Io(e.to_string()))
    }
}

impl HistoryRecord {
    pub fn new(image: impl Into<String>, at: DateTime<Local>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            date: at.format("%Y-%m-%d %H:%M").to_string(),
            image: image.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn temp_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("tryon-history-{}-{}.json", tag, Uuid::new_v4()))
    }

    #[test]
    fn missing_or_blank_file_is_empty() {
        let path = temp_path("blank");
        let store = HistoryStore::new(&path);
        assert!(store.load().unwrap().is_empty());

        fs::write(&path, "   \n").unwrap();
        assert!(store.load().unwrap().is_empty());
        fs::remove_file(&path).ok();
    }

    #[test]
    fn append_then_clear() {
        let path = temp_path("roundtrip");
        let store = HistoryStore::new(&path);
        let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();

        store.append(HistoryRecord::new("data:image/png;base64,AAAA", at)).unwrap();
        store.append(HistoryRecord::new("https://cdn.example.com/look.png", at)).unwrap();

        let records = store.load().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, "2024-03-09 14:05");
        assert_eq!(records[1].image, "https://cdn.example.com/look.png");
        assert_ne!(records[0].id, records[1].id);

        store.clear().unwrap();
        assert!(store.load().unwrap().is_empty());
        fs::remove_file(&path).ok();
    }

    #[test]
    fn corrupted_file_reports_parse_error() {
        let path = temp_path("corrupt");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(HistoryStore::new(&path).load(), Err(HistoryError::Parse(_))));
        fs::remove_file(&path).ok();
    }
}
