use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::{Bet, BetBook, BetStore, DeleteMatcher, InsertOutcome, StoreError};

/// Pretty-printed JSON file. Read-modify-write runs under an in-process mutex and an
/// exclusive lock on `<file>.lock`, and lands via temp-file rename.
pub struct JsonFileStore {
    path: PathBuf,
    cap: usize,
    guard: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>, cap: usize) -> Self {
        Self {
            path: path.into(),
            cap: cap.max(1),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(path: &Path) -> PathBuf {
        let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".lock");
        path.with_file_name(name)
    }

    fn open_lock(path: &Path) -> Result<fd_lock::RwLock<fs::File>, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let f = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(Self::lock_path(path))?;
        Ok(fd_lock::RwLock::new(f))
    }

    fn read_book(path: &Path) -> Result<BetBook, StoreError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BetBook::new()),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(BetBook::new());
        }
        let value: serde_json::Value = serde_json::from_str(&raw)?;
        Ok(BetBook::from_value(value))
    }

    fn write_book(path: &Path, book: &BetBook) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(book)?;
        let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        tmp_name.push(".tmp");
        let tmp = path.with_file_name(tmp_name);
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Run `f` against the current book under both locks; persist when it reports a change.
    async fn modify<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut BetBook) -> Result<(T, bool), StoreError> + Send + 'static,
    {
        let _guard = self.guard.lock().await;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || -> Result<T, StoreError> {
            let mut lock = Self::open_lock(&path)?;
            let _write = lock.write()?;
            let mut book = Self::read_book(&path)?;
            let (out, dirty) = f(&mut book)?;
            if dirty {
                Self::write_book(&path, &book)?;
                debug!("bets file rewritten: {} bets", book.total());
            }
            Ok(out)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

#[async_trait]
impl BetStore for JsonFileStore {
    async fn load(&self) -> Result<BetBook, StoreError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || -> Result<BetBook, StoreError> {
            let lock = Self::open_lock(&path)?;
            let _read = lock.read()?;
            Self::read_book(&path)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }

    async fn insert(&self, bet: Bet) -> Result<InsertOutcome, StoreError> {
        let cap = self.cap;
        self.modify(move |book| {
            let evicted = book.insert_newest(bet.clone(), cap).len();
            Ok((InsertOutcome { bet, evicted }, true))
        })
        .await
    }

    async fn remove(
        &self,
        sport: &str,
        category: &str,
        matcher: &DeleteMatcher,
    ) -> Result<usize, StoreError> {
        let (sport, category, matcher) = (sport.to_string(), category.to_string(), matcher.clone());
        self.modify(move |book| {
            let removed = book.remove_matching(&sport, &category, &matcher)?;
            Ok((removed, removed > 0))
        })
        .await
    }

    fn backend(&self) -> &'static str {
        "file"
    }
}
