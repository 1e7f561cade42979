use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use sha2::{Digest, Sha256};
use std::{
    collections::HashMap,
    fs,
    path::Path,
    sync::{Mutex, RwLock},
};

use crate::{
    classify::{Classification, CodeType},
    ranges::{CODE_RANGES, CodeRange},
};

const FINGERPRINT_KEY: &str = "range_table_fingerprint";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub code_type: CodeType,
    pub code: String,
}

/// Memo of finished lookups. The range table never changes at runtime, so
/// entries live as long as the cache and a racing duplicate `put` is harmless.
pub trait ClassificationCache: Send + Sync {
    fn get(&self, key: &CacheKey) -> Option<Classification>;
    fn put(&self, key: CacheKey, value: Classification);
}

#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<CacheKey, Classification>>,
}

impl ClassificationCache for MemoryCache {
    fn get(&self, key: &CacheKey) -> Option<Classification> {
        self.entries.read().ok()?.get(key).cloned()
    }

    fn put(&self, key: CacheKey, value: Classification) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key, value);
        }
    }
}

/// SHA-256 over every band in table order. Any edit to a bound or label
/// changes it.
pub fn table_fingerprint(table: &[CodeRange]) -> String {
    let mut hasher = Sha256::new();
    for range in table {
        for field in [
            range.low,
            range.high,
            range.category,
            range.subcategory,
            range.description,
        ] {
            hasher.update(field.as_bytes());
            hasher.update(b"\x1f");
        }
        hasher.update(b"\x1e");
    }
    format!("{:x}", hasher.finalize())
}

/// Classification memo kept in SQLite so it survives restarts. Rows are
/// tied to the fingerprint of the table that produced them; opening against
/// a different table drops them.
pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_for_table(path, CODE_RANGES)
    }

    pub fn open_for_table(path: &Path, table: &[CodeRange]) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed creating cache dir {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed opening cache DB {}", path.display()))?;
        Self::init(conn, table)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed opening in-memory cache DB")?;
        Self::init(conn, CODE_RANGES)
    }

    fn init(conn: Connection, table: &[CodeRange]) -> Result<Self> {
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            CREATE TABLE IF NOT EXISTS classification_cache (
                code_type TEXT NOT NULL,
                code TEXT NOT NULL,
                category TEXT NOT NULL,
                subcategory TEXT NOT NULL,
                description TEXT NOT NULL,
                cached_at_unix INTEGER NOT NULL,
                PRIMARY KEY (code_type, code)
            );
            CREATE TABLE IF NOT EXISTS cache_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )
        .context("Failed initializing classification cache schema")?;
        Self::discard_if_stale(&conn, &table_fingerprint(table))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn discard_if_stale(conn: &Connection, fingerprint: &str) -> Result<()> {
        let stored: Option<String> = conn
            .query_row(
                "SELECT value FROM cache_meta WHERE key = ?1",
                params![FINGERPRINT_KEY],
                |row| row.get(0),
            )
            .optional()
            .context("Failed reading classification cache fingerprint")?;
        if stored.as_deref() == Some(fingerprint) {
            return Ok(());
        }

        let dropped = conn
            .execute("DELETE FROM classification_cache", [])
            .context("Failed clearing stale classification cache")?;
        if dropped > 0 {
            tracing::info!("Range table changed; dropped {dropped} cached classifications");
        }
        conn.execute(
            "INSERT OR REPLACE INTO cache_meta (key, value) VALUES (?1, ?2)",
            params![FINGERPRINT_KEY, fingerprint],
        )
        .context("Failed storing classification cache fingerprint")?;
        Ok(())
    }

    fn try_get(&self, key: &CacheKey) -> Result<Option<Classification>> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow::anyhow!("classification cache lock poisoned"))?;
        let mut stmt = conn
            .prepare_cached(
                "SELECT category, subcategory, description FROM classification_cache
                 WHERE code_type = ?1 AND code = ?2
                 LIMIT 1",
            )
            .context("Failed preparing classification cache lookup statement")?;
        stmt.query_row(params![key.code_type.as_str(), key.code], |row| {
            Ok(Classification {
                category: row.get(0)?,
                subcategory: row.get(1)?,
                description: row.get(2)?,
            })
        })
        .optional()
        .with_context(|| format!("Failed classification cache lookup for {}", key.code))
    }

    fn try_put(&self, key: &CacheKey, value: &Classification) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow::anyhow!("classification cache lock poisoned"))?;
        conn.execute(
            "
            INSERT OR REPLACE INTO classification_cache (
                code_type,
                code,
                category,
                subcategory,
                description,
                cached_at_unix
            )
            VALUES (?1, ?2, ?3, ?4, ?5, strftime('%s', 'now'))
            ",
            params![
                key.code_type.as_str(),
                key.code,
                value.category,
                value.subcategory,
                value.description,
            ],
        )
        .with_context(|| format!("Failed inserting classification cache row for {}", key.code))?;
        Ok(())
    }
}

impl ClassificationCache for SqliteCache {
    fn get(&self, key: &CacheKey) -> Option<Classification> {
        match self.try_get(key) {
            Ok(hit) => hit,
            Err(err) => {
                tracing::warn!("Treating classification cache read as a miss: {err:#}");
                None
            }
        }
    }

    fn put(&self, key: CacheKey, value: Classification) {
        if let Err(err) = self.try_put(&key, &value) {
            tracing::warn!("Dropping classification cache write: {err:#}");
        }
    }
}

/// Cache backend chosen on the command line: SQLite when a path is given,
/// otherwise process memory.
pub fn open_cache(cache_db: Option<&Path>) -> Result<Box<dyn ClassificationCache>> {
    match cache_db {
        Some(path) => {
            tracing::info!("Using classification cache {}", path.display());
            Ok(Box::new(SqliteCache::open(path)?))
        }
        None => Ok(Box::new(MemoryCache::default())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Classifier;

    fn key(code_type: CodeType, code: &str) -> CacheKey {
        CacheKey {
            code_type,
            code: code.to_string(),
        }
    }

    #[test]
    fn memory_cache_round_trips_and_separates_families() {
        let cache = MemoryCache::default();
        assert_eq!(cache.get(&key(CodeType::Cpt, "99213")), None);

        cache.put(key(CodeType::Cpt, "99213"), Classification::unknown());
        assert_eq!(
            cache.get(&key(CodeType::Cpt, "99213")),
            Some(Classification::unknown())
        );
        assert_eq!(cache.get(&key(CodeType::Pla, "99213")), None);
    }

    #[test]
    fn sqlite_cache_replaces_existing_rows() {
        let cache = SqliteCache::open_in_memory().expect("open cache");
        let k = key(CodeType::Hcpcs, "G0101");
        cache.put(k.clone(), Classification::unknown());
        let updated = Classification {
            category: "HCPCS Level II".to_string(),
            subcategory: "Procedures and Professional Services".to_string(),
            description: "Temporary procedures and professional services".to_string(),
        };
        cache.put(k.clone(), updated.clone());
        assert_eq!(cache.get(&k), Some(updated));
        assert_eq!(cache.get(&key(CodeType::Hcpcs, "G0102")), None);
    }

    #[test]
    fn sqlite_cache_persists_across_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("cache").join("codes.sqlite");

        let classifier = Classifier::with_cache(Box::new(SqliteCache::open(&path).expect("open")));
        let first = classifier.classify("A0428");
        assert_eq!(classifier.table_scans(), 1);
        drop(classifier);

        let reopened =
            Classifier::with_cache(Box::new(SqliteCache::open(&path).expect("reopen")));
        assert_eq!(reopened.classify("A0428"), first);
        assert_eq!(reopened.table_scans(), 0);
    }

    static BEFORE: &[CodeRange] = &[CodeRange {
        low: "A0000",
        high: "A0999",
        category: "Old",
        subcategory: "Old",
        description: "old band",
    }];

    static AFTER: &[CodeRange] = &[CodeRange {
        low: "A0000",
        high: "A0999",
        category: "New",
        subcategory: "New",
        description: "new band",
    }];

    #[test]
    fn fingerprint_tracks_table_contents() {
        assert_eq!(table_fingerprint(BEFORE), table_fingerprint(BEFORE));
        assert_ne!(table_fingerprint(BEFORE), table_fingerprint(AFTER));
        assert_ne!(table_fingerprint(BEFORE), table_fingerprint(CODE_RANGES));
    }

    #[test]
    fn changed_table_invalidates_persisted_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("codes.sqlite");

        let old = Classifier::with_parts(
            BEFORE,
            Box::new(SqliteCache::open_for_table(&path, BEFORE).expect("open")),
        );
        assert_eq!(old.classify("A0428").category, "Old");
        assert!(old.classify("B4000").is_unknown());
        drop(old);

        let same = Classifier::with_parts(
            BEFORE,
            Box::new(SqliteCache::open_for_table(&path, BEFORE).expect("reopen")),
        );
        assert_eq!(same.classify("A0428").category, "Old");
        assert_eq!(same.table_scans(), 0);
        drop(same);

        let new = Classifier::with_parts(
            AFTER,
            Box::new(SqliteCache::open_for_table(&path, AFTER).expect("reopen")),
        );
        assert_eq!(new.classify("A0428").category, "New");
        assert_eq!(new.table_scans(), 1);
    }

    #[test]
    fn open_cache_defaults_to_memory() {
        let cache = open_cache(None).expect("memory cache");
        cache.put(key(CodeType::Cpt, "00120"), Classification::unknown());
        assert!(cache.get(&key(CodeType::Cpt, "00120")).is_some());
    }
}
