//! Usage-frequency store
//!
//! The only state that survives across completion invocations. The ranking
//! engine reads counts through [`UsageStore`]; the engine façade increments
//! them when a candidate is accepted — never on cancelled or abandoned
//! requests.
use crate::types::{CompletionError, CompletionResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;
use tracing::debug;

/// Read/increment interface the ranking engine depends on
pub trait UsageStore {
    /// Record one acceptance of the candidate with this usage key.
    fn increment(&self, key: &str);

    /// Accumulated acceptance count for a usage key.
    fn count_of(&self, key: &str) -> u64;
}

/// One accumulated usage record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    pub key: String,
    pub count: u64,
    /// Timestamp of the most recent acceptance.
    pub last_used: DateTime<Utc>,
}

impl UsageRecord {
    fn new(key: String) -> Self {
        Self {
            key,
            count: 1,
            last_used: Utc::now(),
        }
    }

    fn touch(&mut self) {
        self.count += 1;
        self.last_used = Utc::now();
    }
}

/// In-memory usage history with optional JSON persistence
pub struct UsageHistory {
    records: RwLock<HashMap<String, UsageRecord>>,
    path: Option<PathBuf>,
}

impl UsageHistory {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            path: None,
        }
    }

    /// History that can be saved to and loaded from `path`.
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            path: Some(path),
        }
    }

    /// Load persisted records, merging over anything already in memory.
    pub fn load(&self) -> CompletionResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if !path.exists() {
            return Ok(());
        }
        let content = std::fs::read_to_string(path)?;
        let loaded: Vec<UsageRecord> = serde_json::from_str(&content)?;
        let mut records = self.write_lock()?;
        for record in loaded {
            records.insert(record.key.clone(), record);
        }
        Ok(())
    }

    /// Persist all records as JSON.
    pub fn save(&self) -> CompletionResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let records = self.read_lock()?;
        let mut all: Vec<&UsageRecord> = records.values().collect();
        all.sort_by(|a, b| a.key.cmp(&b.key));
        let content = serde_json::to_string_pretty(&all)?;
        std::fs::write(path, content)?;
        debug!(path = %path.display(), count = all.len(), "usage history saved");
        Ok(())
    }

    /// Forget everything.
    pub fn clear(&self) -> CompletionResult<()> {
        self.write_lock()?.clear();
        Ok(())
    }

    /// All records, unordered.
    pub fn records(&self) -> CompletionResult<Vec<UsageRecord>> {
        Ok(self.read_lock()?.values().cloned().collect())
    }

    fn read_lock(
        &self,
    ) -> CompletionResult<std::sync::RwLockReadGuard<'_, HashMap<String, UsageRecord>>> {
        self.records
            .read()
            .map_err(|_| CompletionError::Internal("usage history lock poisoned".to_string()))
    }

    fn write_lock(
        &self,
    ) -> CompletionResult<std::sync::RwLockWriteGuard<'_, HashMap<String, UsageRecord>>> {
        self.records
            .write()
            .map_err(|_| CompletionError::Internal("usage history lock poisoned".to_string()))
    }
}

impl UsageStore for UsageHistory {
    fn increment(&self, key: &str) {
        // A poisoned lock loses the increment; ranking input is advisory.
        if let Ok(mut records) = self.records.write() {
            records
                .entry(key.to_string())
                .and_modify(UsageRecord::touch)
                .or_insert_with(|| UsageRecord::new(key.to_string()));
        }
    }

    fn count_of(&self, key: &str) -> u64 {
        self.records
            .read()
            .ok()
            .and_then(|records| records.get(key).map(|r| r.count))
            .unwrap_or(0)
    }
}

impl Default for UsageHistory {
    fn default() -> Self {
        Self::new()
    }
}
