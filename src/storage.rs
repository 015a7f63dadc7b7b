use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use rusqlite::{Connection, OptionalExtension, params};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Key under which the rejected group names live, as a JSON array of strings.
pub const BLOCKED_GROUPS_KEY: &str = "blockedGroups";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("no data directory available on this device")]
    NoDataDir,

    #[error("could not create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("local storage: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("malformed value under {key}: {source}")]
    Malformed {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

pub fn default_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("com", "example", "NoticeBoard")?;
    Some(proj.data_dir().join("local.sqlite"))
}

/// On-device key/value storage. Values never leave this machine.
pub struct LocalStore {
    conn: Connection,
}

impl LocalStore {
    pub fn open_default() -> Result<Self, StorageError> {
        let path = default_path().ok_or(StorageError::NoDataDir)?;
        Self::open(&path)
    }

    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| StorageError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS local_storage (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(Self { conn })
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let now: DateTime<Utc> = Utc::now();
        self.conn.execute(
            r#"
            INSERT INTO local_storage (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value=excluded.value,
                updated_at=excluded.updated_at
            "#,
            params![key, value, now],
        )?;
        Ok(())
    }

    /// Blocked groups, empty when nothing has been rejected yet.
    pub fn blocked_groups(&self) -> Result<Vec<String>, StorageError> {
        match self.get(BLOCKED_GROUPS_KEY)? {
            Some(raw) => serde_json::from_str(&raw).map_err(|source| StorageError::Malformed {
                key: BLOCKED_GROUPS_KEY.to_string(),
                source,
            }),
            None => Ok(Vec::new()),
        }
    }

    /// Overwrite the whole blocked list.
    pub fn save_blocked_groups(&self, groups: &[String]) -> Result<(), StorageError> {
        let raw = serde_json::to_string(groups).map_err(|source| StorageError::Malformed {
            key: BLOCKED_GROUPS_KEY.to_string(),
            source,
        })?;
        self.set(BLOCKED_GROUPS_KEY, &raw)
    }
}
