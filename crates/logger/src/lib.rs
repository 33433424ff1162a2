/// Futures Tracker — Logger
/// JSONL audit event stream, one file per UTC day

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub struct EventLogger {
    log_dir: PathBuf,
    // serializes appends from concurrent request handlers
    write_lock: Mutex<()>,
}

impl EventLogger {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        let dir = log_dir.into();
        fs::create_dir_all(&dir).ok();
        Self { log_dir: dir, write_lock: Mutex::new(()) }
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn log<T: Serialize>(&self, event: &T) -> Result<()> {
        let date  = Utc::now().format("%Y-%m-%d").to_string();
        let path  = self.log_dir.join(format!("{date}.jsonl"));
        let line  = serde_json::to_string(event)?;
        let _guard = self.write_lock.lock().unwrap_or_else(|p| p.into_inner());
        let mut f = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(f, "{line}")?;
        Ok(())
    }

    /// Log and swallow the error; audit logging never fails a request.
    pub fn emit<T: Serialize>(&self, event: &T) {
        if let Err(e) = self.log(event) {
            tracing::warn!("event log write failed: {}", e);
        }
    }
}

pub fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

// ── Event types ───────────────────────────────────────────────────────────────

#[derive(Serialize, Debug)]
pub struct BetCreatedEvent {
    pub ts:            String,
    pub event:         &'static str,   // "BET_CREATED"
    pub id:            String,
    pub sport:         String,
    pub category:      String,
    pub selection:     String,
    pub odds_american: String,
    pub book:          String,
    pub evicted:       usize,
}

#[derive(Serialize, Debug)]
pub struct BetDeletedEvent {
    pub ts:       String,
    pub event:    &'static str,   // "BET_DELETED"
    pub sport:    String,
    pub category: String,
    pub matcher:  String,         // "id" | "fields"
    pub removed:  usize,
}

#[derive(Serialize, Debug)]
pub struct HeadshotLookupEvent {
    pub ts:     String,
    pub event:  &'static str,   // "HEADSHOT_LOOKUP"
    pub name:   String,
    pub found:  bool,
    pub cached: bool,
    pub url:    Option<String>,
}

#[derive(Serialize, Debug)]
pub struct SnapEvent {
    pub ts:          String,
    pub event:       &'static str,   // "SNAP"
    pub url:         String,
    pub selector:    Option<String>,
    pub ok:          bool,
    pub bytes:       usize,
    pub elapsed_ms:  u128,
    pub error:       Option<String>,
}

#[derive(Serialize, Debug)]
pub struct InteractionEvent {
    pub ts:       String,
    pub event:    &'static str,   // "INTERACTION"
    pub kind:     u8,
    pub command:  Option<String>,
    pub response: u8,
}

#[derive(Serialize, Debug)]
pub struct DiscordDeliveryEvent {
    pub ts:      String,
    pub event:   &'static str,   // "DISCORD_DELIVERY"
    pub target:  String,         // "interaction" | "channel"
    pub ok:      bool,
    pub detail:  String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_one_json_line_per_event() {
        let dir = std::env::temp_dir().join(format!("logger-test-{}", std::process::id()));
        let logger = EventLogger::new(&dir);

        for removed in [1usize, 0] {
            logger.emit(&BetDeletedEvent {
                ts: now_iso(),
                event: "BET_DELETED",
                sport: "NFL".into(),
                category: "Awards".into(),
                matcher: "id".into(),
                removed,
            });
        }

        let date = Utc::now().format("%Y-%m-%d").to_string();
        let raw = fs::read_to_string(dir.join(format!("{date}.jsonl"))).unwrap();
        let lines: Vec<&str> = raw.lines().collect();
        assert!(lines.len() >= 2);
        let last: serde_json::Value = serde_json::from_str(lines[lines.len() - 1]).unwrap();
        assert_eq!(last["event"], "BET_DELETED");
        assert_eq!(last["removed"], 0);

        fs::remove_dir_all(&dir).ok();
    }
}
