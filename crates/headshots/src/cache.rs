use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// `player name → image URL` lookup table. Entries never expire.
#[derive(Clone)]
pub struct HeadshotCache {
    conn: Arc<Mutex<Connection>>,
}

impl HeadshotCache {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).ok();
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("open headshot db {}", path.display()))?;
        conn.pragma_update(None, "journal_mode", "WAL").ok();
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory().context("open in-memory headshot db")?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS headshots (
                name       TEXT PRIMARY KEY,
                url        TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .context("init headshot schema")?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow::anyhow!("headshot db mutex poisoned"))?;
        f(&conn)
    }

    pub fn get(&self, name: &str) -> Result<Option<String>> {
        self.with_conn(|c| {
            c.query_row("SELECT url FROM headshots WHERE name = ?1", params![name], |r| r.get(0))
                .optional()
                .context("query headshot")
        })
    }

    pub fn put(&self, name: &str, url: &str) -> Result<()> {
        self.with_conn(|c| {
            c.execute(
                "INSERT INTO headshots (name, url, created_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(name) DO UPDATE SET url = excluded.url",
                params![name, url, Utc::now().to_rfc3339()],
            )
            .context("upsert headshot")?;
            Ok(())
        })
    }

    pub fn all(&self) -> Result<BTreeMap<String, String>> {
        self.with_conn(|c| {
            let mut stmt = c.prepare("SELECT name, url FROM headshots")?;
            let rows = stmt.query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)))?;
            let mut out = BTreeMap::new();
            for row in rows {
                let (name, url) = row?;
                out.insert(name, url);
            }
            Ok(out)
        })
    }

    pub fn len(&self) -> Result<usize> {
        self.with_conn(|c| {
            let n: i64 = c.query_row("SELECT COUNT(*) FROM headshots", [], |r| r.get(0))?;
            Ok(n as usize)
        })
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Import a flat `{ "Player Name": "https://..." }` object. Non-string and blank
    /// values are skipped. Returns the number of rows written.
    pub fn import_mapping(&self, mapping: &Value) -> Result<usize> {
        let obj = mapping
            .as_object()
            .context("headshot mapping must be a JSON object")?;

        let mut conn = self
            .conn
            .lock()
            .map_err(|_| anyhow::anyhow!("headshot db mutex poisoned"))?;
        let tx = conn.transaction()?;
        let now = Utc::now().to_rfc3339();
        let mut written = 0;
        for (name, url) in obj {
            let Some(url) = url.as_str().map(str::trim).filter(|u| !u.is_empty()) else {
                continue;
            };
            tx.execute(
                "INSERT INTO headshots (name, url, created_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(name) DO UPDATE SET url = excluded.url",
                params![name.trim(), url, now],
            )?;
            written += 1;
        }
        tx.commit()?;
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn put_get_and_overwrite() {
        let cache = HeadshotCache::open_in_memory().unwrap();
        assert_eq!(cache.get("Josh Allen").unwrap(), None);

        cache.put("Josh Allen", "https://img/a.png").unwrap();
        cache.put("Josh Allen", "https://img/b.png").unwrap();
        assert_eq!(cache.get("Josh Allen").unwrap().as_deref(), Some("https://img/b.png"));
        assert_eq!(cache.len().unwrap(), 1);
    }

    #[test]
    fn imports_flat_mapping() {
        let cache = HeadshotCache::open_in_memory().unwrap();
        let n = cache
            .import_mapping(&json!({
                "Patrick Mahomes": "https://img/pm.png",
                "Blank": "  ",
                "Broken": 5
            }))
            .unwrap();
        assert_eq!(n, 1);

        let all = cache.all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all["Patrick Mahomes"], "https://img/pm.png");
        assert!(cache.import_mapping(&json!(["x"])).is_err());
    }
}
