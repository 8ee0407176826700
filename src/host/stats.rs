use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::config::WATCH_TIME_RETENTION_DAYS;
use crate::store::{KvStore, KvStoreExt, keys};

// --- Watch-Time Ledger ---

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShowTime {
    pub time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DayEntry {
    pub total: f64,
    #[serde(default)]
    pub shows: HashMap<String, ShowTime>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatchTimeStats {
    pub today: f64,
    pub yesterday: f64,
    pub week: f64,
}

/// Accrues watched seconds per calendar day with a per-show breakdown.
/// Days age out after 30 days; the ledger never grows unbounded.
#[derive(Default)]
pub struct WatchTimeLedger {
    days: BTreeMap<String, DayEntry>,
}

fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

impl WatchTimeLedger {
    pub fn load(store: &dyn KvStore) -> Self {
        WatchTimeLedger {
            days: store.get_typed(keys::WATCH_TIME).unwrap_or_default(),
        }
    }

    pub fn add(
        &mut self,
        seconds: f64,
        show: Option<(&str, Option<&str>)>,
        today: NaiveDate,
        store: &dyn KvStore,
    ) {
        if seconds <= 0.0 {
            return;
        }

        let entry = self.days.entry(date_key(today)).or_default();
        entry.total += seconds;
        if let Some((show_id, name)) = show {
            let show_entry = entry.shows.entry(show_id.to_string()).or_default();
            show_entry.time += seconds;
            if show_entry.name.is_none() {
                show_entry.name = name.map(str::to_string);
            }
        }

        let cutoff = date_key(today - Duration::days(WATCH_TIME_RETENTION_DAYS));
        self.days.retain(|date, _| *date >= cutoff);

        store.put_typed(keys::WATCH_TIME, &self.days);
    }

    pub fn stats(&self, today: NaiveDate) -> WatchTimeStats {
        let week_start = date_key(today - Duration::days(7));
        let week = self
            .days
            .range(week_start..)
            .map(|(_, entry)| entry.total)
            .sum();
        WatchTimeStats {
            today: self.day_total(today),
            yesterday: self.day_total(today - Duration::days(1)),
            week,
        }
    }

    pub fn today_shows(&self, today: NaiveDate) -> Option<&HashMap<String, ShowTime>> {
        self.days.get(&date_key(today)).map(|entry| &entry.shows)
    }

    fn day_total(&self, date: NaiveDate) -> f64 {
        self.days.get(&date_key(date)).map_or(0.0, |e| e.total)
    }
}
