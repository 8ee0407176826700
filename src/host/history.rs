use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{KvStore, KvStoreExt, keys};

// --- Watch History ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub name: String,
    pub season: u32,
    pub episode: u32,
    pub timestamp: DateTime<Utc>,
    pub url: String,
}

/// Last-seen position per show, newest wins. The list UI rendering it lives
/// outside the engine; this is just the record-keeping.
#[derive(Default)]
pub struct WatchHistory {
    entries: HashMap<String, HistoryEntry>,
}

impl WatchHistory {
    pub fn load(store: &dyn KvStore) -> Self {
        WatchHistory {
            entries: store.get_typed(keys::HISTORY).unwrap_or_default(),
        }
    }

    pub fn get(&self, show_id: &str) -> Option<&HistoryEntry> {
        self.entries.get(show_id)
    }

    pub fn record(&mut self, show_id: &str, entry: HistoryEntry, store: &dyn KvStore) {
        log::info!(
            "History: {} S{}E{}",
            entry.name,
            entry.season,
            entry.episode
        );
        self.entries.insert(show_id.to_string(), entry);
        store.put_typed(keys::HISTORY, &self.entries);
    }

    pub fn remove(&mut self, show_id: &str, store: &dyn KvStore) {
        if self.entries.remove(show_id).is_some() {
            store.put_typed(keys::HISTORY, &self.entries);
        }
    }
}
