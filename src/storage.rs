use anyhow::{Context, Result};
use chrono::Utc;
use rand::Rng;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};

use crate::models::Application;

/// Key the whole board is stored under.
pub const STORAGE_KEY: &str = "interview_ace_jobs";

/// Synchronous string key-value store.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

// --- SQLite-backed store ---

pub struct SqliteStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create data directory: {}", parent.display())
                })?;
            }
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open store at {}", path.display()))?;
        let store = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        store.init()?;
        Ok(store)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
            path: None,
        };
        store.init()?;
        Ok(store)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn default_path() -> PathBuf {
        // Use XDG data directory or fallback
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "jobboard") {
            proj_dirs.data_dir().join("jobboard.db")
        } else {
            PathBuf::from("jobboard.db")
        }
    }

    fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()
            .with_context(|| format!("Failed to read key '{}'", key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .with_context(|| format!("Failed to write key '{}'", key))?;
        Ok(())
    }
}

// --- In-memory store ---

#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: std::collections::HashMap<String, String>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// --- Persistence adapter ---

/// Writes and reads the full application list as one JSON array under
/// [`STORAGE_KEY`]. Failures are logged and swallowed in both directions.
pub struct Storage<S> {
    store: S,
}

impl<S: KeyValueStore> Storage<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    #[cfg(test)]
    pub fn into_store(self) -> S {
        self.store
    }

    pub fn save(&mut self, records: &[Application]) {
        if let Err(e) = self.try_save(records) {
            tracing::error!(error = %format!("{:#}", e), "Error saving jobs to storage");
        }
    }

    fn try_save(&mut self, records: &[Application]) -> Result<()> {
        let json = serde_json::to_string(records).context("Failed to serialize applications")?;
        self.store.set(STORAGE_KEY, &json)?;
        tracing::debug!(count = records.len(), bytes = json.len(), "Saved applications");
        Ok(())
    }

    pub fn load(&self) -> Vec<Application> {
        match self.try_load() {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(error = %format!("{:#}", e), "Error loading jobs from storage");
                Vec::new()
            }
        }
    }

    fn try_load(&self) -> Result<Vec<Application>> {
        let Some(raw) = self.store.get(STORAGE_KEY)? else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&raw).context("Stored applications are not a valid JSON array")
    }

    pub fn new_identifier(&self) -> String {
        new_identifier()
    }
}

/// Millisecond timestamp plus a random suffix, both base 36.
pub fn new_identifier() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let suffix: u64 = rand::thread_rng().r#gen();
    format!("{}{}", to_base36(millis), to_base36(suffix))
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}
