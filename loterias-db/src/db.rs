use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use thiserror::Error;
use tracing::debug;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS kv (
    key         TEXT PRIMARY KEY,
    value       TEXT NOT NULL,
    updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
);
";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Cuota de almacenamiento excedida al escribir '{key}': {size} bytes (límite {limit})")]
    QuotaExceeded {
        key: String,
        size: usize,
        limit: usize,
    },

    #[error("Error SQLite: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Almacén clave-valor de blobs JSON.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("loterias.db");
    path
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("No se pudo crear el directorio {:?}", parent))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("No se pudo abrir la base {:?}", path))?;
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Falló la migración")?;
    Ok(())
}

pub struct SqliteStore {
    conn: Connection,
    quota_bytes: Option<usize>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = open_db(path)?;
        migrate(&conn)?;
        debug!(?path, "almacén SQLite abierto");
        Ok(Self { conn, quota_bytes: None })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        migrate(&conn)?;
        Ok(Self { conn, quota_bytes: None })
    }

    pub fn with_quota(mut self, quota_bytes: usize) -> Self {
        self.quota_bytes = Some(quota_bytes);
        self
    }

    pub fn count_keys(&self) -> Result<u32> {
        let count: u32 = self.conn.query_row("SELECT COUNT(*) FROM kv", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Bytes ocupados por todas las claves excepto `key`.
    fn used_bytes_except(&self, key: &str) -> Result<usize, StoreError> {
        let used: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(LENGTH(CAST(value AS BLOB))), 0) FROM kv WHERE key != ?1",
            [key],
            |row| row.get(0),
        )?;
        Ok(used.max(0) as usize)
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if let Some(limit) = self.quota_bytes {
            let size = self.used_bytes_except(key)? + value.len();
            if size > limit {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                    size,
                    limit,
                });
            }
        }
        self.conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            rusqlite::params![key, value],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }
}

/// Almacén en memoria, para pruebas y sesiones efímeras.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(mut self, quota_bytes: usize) -> Self {
        self.quota_bytes = Some(quota_bytes);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if let Some(limit) = self.quota_bytes {
            let used: usize = self
                .entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(_, v)| v.len())
                .sum();
            let size = used + value.len();
            if size > limit {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                    size,
                    limit,
                });
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}
