/*!
 * Persistent translation cache backed by SQLite.
 *
 * The on-disk store mirrors the in-memory cache's keying: one row per
 * (normalized source text, target language, backend id). It is loaded into
 * the in-memory cache at pipeline start and flushed at pipeline end; the
 * pipeline itself never touches the database mid-run.
 */

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::Utc;
use log::{debug, info};
use rusqlite::{params, Connection};
use sha2::{Digest, Sha256};

use super::cache::{CacheKey, TranslationCache};

/// Default store filename
const DEFAULT_STORE_FILENAME: &str = "pagelift-cache.db";

/// Default store directory name under the user's data directory
const DEFAULT_STORE_DIRNAME: &str = "pagelift";

/// Persistent cache store with thread-safe connection access
#[derive(Clone)]
pub struct CacheStore {
    /// Path to the database file
    db_path: PathBuf,
    /// Thread-safe connection wrapped in Arc<Mutex>
    connection: Arc<Mutex<Connection>>,
}

impl CacheStore {
    /// Open (or create) a store at the default location
    pub fn open_default() -> Result<Self> {
        let db_path = Self::default_store_path()?;
        Self::open(&db_path)
    }

    /// Open (or create) a store at the specified path
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create cache directory: {:?}", parent))?;
        }

        info!("Opening translation cache store at: {:?}", db_path);

        let conn = Connection::open(&db_path)
            .with_context(|| format!("Failed to open cache store: {:?}", db_path))?;
        Self::initialize_schema(&conn)?;

        Ok(Self {
            db_path,
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory store (for testing)
    pub fn open_in_memory() -> Result<Self> {
        debug!("Creating in-memory cache store");
        let conn = Connection::open_in_memory().context("Failed to create in-memory store")?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            db_path: PathBuf::from(":memory:"),
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Default store path under the user's data directory
    pub fn default_store_path() -> Result<PathBuf> {
        let base_dir = dirs::data_local_dir()
            .or_else(dirs::data_dir)
            .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("share")))
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;

        Ok(base_dir.join(DEFAULT_STORE_DIRNAME).join(DEFAULT_STORE_FILENAME))
    }

    /// The database file path
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn initialize_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS translations (
                key_hash        TEXT PRIMARY KEY,
                source_text     TEXT NOT NULL,
                target_language TEXT NOT NULL,
                backend_id      TEXT NOT NULL,
                translated      TEXT NOT NULL,
                created_at      TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_translations_lang
                ON translations (target_language);",
        )
        .context("Failed to initialize cache store schema")?;
        Ok(())
    }

    /// Load every persisted entry into the in-memory cache.
    ///
    /// Returns the number of entries loaded.
    pub fn load_into(&self, cache: &TranslationCache) -> Result<usize> {
        let conn = self
            .connection
            .lock()
            .map_err(|e| anyhow::anyhow!("Failed to acquire store lock: {}", e))?;

        let mut stmt = conn
            .prepare("SELECT source_text, target_language, backend_id, translated FROM translations")
            .context("Failed to prepare cache load query")?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .context("Failed to query cache entries")?;

        let mut loaded = 0usize;
        for row in rows {
            let (source_text, target_language, backend_id, translated) =
                row.context("Failed to read cache row")?;
            cache.store(
                CacheKey::new(&source_text, &target_language, &backend_id),
                &translated,
            );
            loaded += 1;
        }

        info!("Loaded {} cached translation(s) from {:?}", loaded, self.db_path);
        Ok(loaded)
    }

    /// Flush the in-memory cache to disk.
    ///
    /// Writes are idempotent upserts; identical keys overwrite.
    pub fn flush(&self, cache: &TranslationCache) -> Result<usize> {
        let entries = cache.entries();
        if entries.is_empty() {
            return Ok(0);
        }

        let mut conn = self
            .connection
            .lock()
            .map_err(|e| anyhow::anyhow!("Failed to acquire store lock: {}", e))?;

        let now = Utc::now().to_rfc3339();
        let tx = conn.transaction().context("Failed to begin flush transaction")?;
        let mut written = 0usize;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO translations
                        (key_hash, source_text, target_language, backend_id, translated, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     ON CONFLICT(key_hash) DO UPDATE SET
                        translated = excluded.translated,
                        created_at = excluded.created_at",
                )
                .context("Failed to prepare flush statement")?;

            for (key, translated) in entries {
                stmt.execute(params![
                    key_hash(&key),
                    key.source_text,
                    key.target_language,
                    key.backend_id,
                    translated,
                    now,
                ])
                .context("Failed to flush cache entry")?;
                written += 1;
            }
        }
        tx.commit().context("Failed to commit flush transaction")?;

        info!("Flushed {} translation(s) to {:?}", written, self.db_path);
        Ok(written)
    }
}

/// Stable primary key: SHA-256 over the three key components.
///
/// Hashing keeps arbitrarily long source texts out of the index.
fn key_hash(key: &CacheKey) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.source_text.as_bytes());
    hasher.update([0u8]);
    hasher.update(key.target_language.as_bytes());
    hasher.update([0u8]);
    hasher.update(key.backend_id.as_bytes());
    format!("{:x}", hasher.finalize())
}
