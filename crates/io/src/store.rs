// Durable project storage: a SQLite key-value table holding JSON payloads.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use accession_ai::AiResults;
use accession_engine::sheet::Sheet;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

// Well-known keys
const KEY_SHEET: &str = "sheet";
const KEY_PROJECT_NAME: &str = "project-name";
const KEY_AI_RESULTS: &str = "ai-results";
const KEY_IMAGES_DIR: &str = "images";
const KEY_SAVED_AT: &str = "saved_at";
const KEY_FORMAT_VERSION: &str = "format_version";

/// Error type for store operations.
#[derive(Debug)]
pub enum StoreError {
    /// Database error
    Db(String),
    /// JSON (de)serialization error
    Json(String),
    /// No usable data directory on this host
    NoDataDir,
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Db(msg) => write!(f, "Database error: {}", msg),
            StoreError::Json(msg) => write!(f, "Serialization error: {}", msg),
            StoreError::NoDataDir => write!(f, "Could not determine a data directory"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Db(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Json(e.to_string())
    }
}

/// The project's durable key-value store.
///
/// The connection sits behind a mutex so a store can be shared with the
/// autosave timer thread.
pub struct ProjectStore {
    conn: Mutex<Connection>,
}

impl ProjectStore {
    /// Open (or create) a store at the given path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Db(e.to_string()))?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        conn.execute(
            "INSERT OR IGNORE INTO kv (key, value) VALUES (?1, ?2)",
            params![KEY_FORMAT_VERSION, crate::STORE_FORMAT_VERSION.to_string()],
        )?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Open the per-user default store under the data directory.
    pub fn open_default() -> Result<Self, StoreError> {
        let path = default_store_path().ok_or(StoreError::NoDataDir)?;
        Self::open(&path)
    }

    /// In-memory store, for tests and dry runs.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set_raw(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// True if a sheet has been stored (fast existence probe).
    pub fn project_exists(&self) -> Result<bool, StoreError> {
        Ok(self.get_raw(KEY_SHEET)?.is_some())
    }

    pub fn get_sheet(&self) -> Result<Option<Sheet>, StoreError> {
        match self.get_raw(KEY_SHEET)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Write the sheet and stamp the save time.
    pub fn set_sheet(&self, sheet: &Sheet) -> Result<(), StoreError> {
        let json = serde_json::to_string(sheet)?;
        self.set_raw(KEY_SHEET, &json)?;
        self.set_raw(KEY_SAVED_AT, &chrono::Utc::now().to_rfc3339())
    }

    pub fn project_name(&self) -> Result<Option<String>, StoreError> {
        self.get_raw(KEY_PROJECT_NAME)
    }

    pub fn set_project_name(&self, name: &str) -> Result<(), StoreError> {
        self.set_raw(KEY_PROJECT_NAME, name)
    }

    pub fn ai_results(&self) -> Result<Option<AiResults>, StoreError> {
        match self.get_raw(KEY_AI_RESULTS)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub fn set_ai_results(&self, results: &AiResults) -> Result<(), StoreError> {
        let json = serde_json::to_string(results)?;
        self.set_raw(KEY_AI_RESULTS, &json)
    }

    pub fn images_dir(&self) -> Result<Option<PathBuf>, StoreError> {
        Ok(self.get_raw(KEY_IMAGES_DIR)?.map(PathBuf::from))
    }

    pub fn set_images_dir(&self, dir: &Path) -> Result<(), StoreError> {
        self.set_raw(KEY_IMAGES_DIR, &dir.to_string_lossy())
    }

    /// Last successful save time, if any.
    pub fn saved_at(&self) -> Result<Option<String>, StoreError> {
        self.get_raw(KEY_SAVED_AT)
    }

    /// Remove the project: sheet and project name. AI results and the image
    /// directory pointer survive so a re-created project can reuse them.
    pub fn clear_project(&self) -> Result<(), StoreError> {
        self.delete(KEY_SHEET)?;
        self.delete(KEY_PROJECT_NAME)
    }
}

/// `<data dir>/accession/project.db`
pub fn default_store_path() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("accession").join("project.db"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use accession_engine::cell::CellValue;
    use accession_engine::field::Field;
    use accession_engine::sheet::Row;
    use tempfile::tempdir;

    fn sample_sheet() -> Sheet {
        let mut sheet = Sheet::new(vec![Field::new("file"), Field::new("title")]);
        let mut row = Row::default();
        row.insert("file".into(), CellValue::Text("scan.tif".into()));
        row.insert("title".into(), CellValue::Text("A scan".into()));
        sheet.rows.push(Arc::new(row));
        sheet.images.push(("scan.tif".into(), PathBuf::from("/tmp/scan.tif")));
        sheet
    }

    #[test]
    fn test_sheet_roundtrip_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("project.db");

        {
            let store = ProjectStore::open(&path).unwrap();
            assert!(!store.project_exists().unwrap());
            store.set_sheet(&sample_sheet()).unwrap();
            store.set_project_name("Estate negatives").unwrap();
        }

        let store = ProjectStore::open(&path).unwrap();
        assert!(store.project_exists().unwrap());
        let sheet = store.get_sheet().unwrap().unwrap();
        assert_eq!(sheet.fields.len(), 2);
        assert_eq!(sheet.value(0, "title"), CellValue::Text("A scan".into()));
        assert_eq!(sheet.images[0].0, "scan.tif");
        assert_eq!(store.project_name().unwrap().as_deref(), Some("Estate negatives"));
        assert!(store.saved_at().unwrap().is_some());
    }

    #[test]
    fn test_clear_project() {
        let store = ProjectStore::open_in_memory().unwrap();
        store.set_sheet(&sample_sheet()).unwrap();
        store.set_project_name("x").unwrap();
        store.set_images_dir(Path::new("/imgs")).unwrap();

        store.clear_project().unwrap();
        assert!(!store.project_exists().unwrap());
        assert!(store.project_name().unwrap().is_none());
        // image directory pointer survives
        assert_eq!(store.images_dir().unwrap(), Some(PathBuf::from("/imgs")));
    }

    #[test]
    fn test_ai_results_roundtrip() {
        use accession_ai::{ImageMetadata, ImageResponse};

        let store = ProjectStore::open_in_memory().unwrap();
        let mut results = AiResults::new();
        results.insert(
            "scan.tif".into(),
            ImageResponse {
                is_done: true,
                metadata: ImageMetadata { title: "A scan".into(), ..Default::default() },
                questions: Vec::new(),
            },
        );
        store.set_ai_results(&results).unwrap();
        let back = store.ai_results().unwrap().unwrap();
        assert_eq!(back["scan.tif"].metadata.title, "A scan");
    }

    #[test]
    fn test_set_sheet_overwrites() {
        let store = ProjectStore::open_in_memory().unwrap();
        store.set_sheet(&sample_sheet()).unwrap();

        let updated = sample_sheet().edit_cell(0, "title", "Renamed".into()).unwrap();
        store.set_sheet(&updated).unwrap();

        let back = store.get_sheet().unwrap().unwrap();
        assert_eq!(back.value(0, "title"), CellValue::Text("Renamed".into()));
    }
}
