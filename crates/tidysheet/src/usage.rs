//! Per-session daily run counter. Informational only: nothing here refuses a
//! request, the caller decides what to show when a session is exhausted.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageStatus {
    pub used: u32,
    pub limit: u32,
    pub remaining: u32,
    pub exhausted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlock_url: Option<String>,
}

#[derive(Debug, Clone, Copy)]
struct UsageEntry {
    count: u32,
    day: NaiveDate,
}

#[derive(Debug)]
pub struct UsageLedger {
    limit: u32,
    unlock_url: String,
    entries: Mutex<HashMap<String, UsageEntry>>,
}

impl UsageLedger {
    pub fn new(limit: u32, unlock_url: impl Into<String>) -> Self {
        Self {
            limit,
            unlock_url: unlock_url.into(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub async fn peek(&self, key: &str, today: NaiveDate) -> UsageStatus {
        let entries = self.entries.lock().await;
        let used = entries
            .get(key)
            .filter(|entry| entry.day == today)
            .map_or(0, |entry| entry.count);
        self.status(used)
    }

    /// Record one successful run. A key last seen on another day starts over at zero.
    pub async fn increment(&self, key: &str, today: NaiveDate) -> UsageStatus {
        let mut entries = self.entries.lock().await;
        let entry = entries
            .entry(key.to_string())
            .or_insert(UsageEntry { count: 0, day: today });
        if entry.day != today {
            *entry = UsageEntry { count: 0, day: today };
        }
        entry.count = entry.count.saturating_add(1);
        let used = entry.count;
        drop(entries);
        self.status(used)
    }

    /// Status of a session that has not run anything today.
    pub fn fresh(&self) -> UsageStatus {
        self.status(0)
    }

    fn status(&self, used: u32) -> UsageStatus {
        let exhausted = used >= self.limit;
        UsageStatus {
            used,
            limit: self.limit,
            remaining: self.limit.saturating_sub(used),
            exhausted,
            unlock_url: exhausted.then(|| self.unlock_url.clone()),
        }
    }
}
