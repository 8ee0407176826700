use serde::{Deserialize, Serialize};

use crate::config;
use crate::store::{KvStore, KvStoreExt};

// --- Skip Policy ---

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SkipMode {
    Percent,
    AbsoluteSecondsRemaining,
}

/// Immutable snapshot of one advance rule for a single decision evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkipPolicy {
    pub mode: SkipMode,
    pub threshold: f64,
}

// --- User Settings ---

/// Everything the user can tune. Thresholds are clamped here, on load and on
/// save, so downstream decision code can trust its inputs unconditionally.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub auto_next: bool,
    pub auto_season: bool,
    pub skip_credits: bool,
    pub skip_seconds: f64,
    pub trigger_percent: f64,
    pub show_notifications: bool,
    pub auto_play: bool,
    pub auto_play_count: u32,
    pub auto_play_delay: u32,
    pub adaptive_skip: bool,
    pub track_watch_time: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            auto_next: true,
            auto_season: false,
            skip_credits: true,
            skip_seconds: 30.0,
            trigger_percent: 99.0,
            show_notifications: true,
            auto_play: false,
            auto_play_count: 0,
            auto_play_delay: 5,
            adaptive_skip: true,
            track_watch_time: true,
        }
    }
}

macro_rules! load_field {
    ($settings:ident, $store:ident, $key:literal, $field:ident) => {
        if let Some(v) = $store.get_typed($key) {
            $settings.$field = v;
        }
    };
}

impl Settings {
    /// Load one field per key, missing keys keeping their defaults, then
    /// clamp. Each context loads its own copy at startup.
    pub fn load(store: &dyn KvStore) -> Self {
        let mut s = Settings::default();
        load_field!(s, store, "autoNext", auto_next);
        load_field!(s, store, "autoSeason", auto_season);
        load_field!(s, store, "skipCredits", skip_credits);
        load_field!(s, store, "skipSeconds", skip_seconds);
        load_field!(s, store, "triggerPercent", trigger_percent);
        load_field!(s, store, "showNotifications", show_notifications);
        load_field!(s, store, "autoPlay", auto_play);
        load_field!(s, store, "autoPlayCount", auto_play_count);
        load_field!(s, store, "autoPlayDelay", auto_play_delay);
        load_field!(s, store, "adaptiveSkip", adaptive_skip);
        load_field!(s, store, "trackWatchTime", track_watch_time);
        s.clamp();
        s
    }

    pub fn save(&self, store: &dyn KvStore) {
        let mut clamped = self.clone();
        clamped.clamp();
        store.put_typed("autoNext", &clamped.auto_next);
        store.put_typed("autoSeason", &clamped.auto_season);
        store.put_typed("skipCredits", &clamped.skip_credits);
        store.put_typed("skipSeconds", &clamped.skip_seconds);
        store.put_typed("triggerPercent", &clamped.trigger_percent);
        store.put_typed("showNotifications", &clamped.show_notifications);
        store.put_typed("autoPlay", &clamped.auto_play);
        store.put_typed("autoPlayCount", &clamped.auto_play_count);
        store.put_typed("autoPlayDelay", &clamped.auto_play_delay);
        store.put_typed("adaptiveSkip", &clamped.adaptive_skip);
        store.put_typed("trackWatchTime", &clamped.track_watch_time);
    }

    fn clamp(&mut self) {
        self.trigger_percent = self
            .trigger_percent
            .clamp(config::TRIGGER_PERCENT_MIN, config::TRIGGER_PERCENT_MAX);
        self.skip_seconds = self
            .skip_seconds
            .clamp(config::SKIP_SECONDS_MIN, config::SKIP_SECONDS_MAX);
        self.auto_play_delay = self
            .auto_play_delay
            .clamp(config::AUTO_PLAY_DELAY_MIN, config::AUTO_PLAY_DELAY_MAX);
    }

    /// Credit-skip rule: fire when little enough of the episode remains.
    pub fn credits_policy(&self) -> SkipPolicy {
        SkipPolicy {
            mode: SkipMode::AbsoluteSecondsRemaining,
            threshold: self.skip_seconds,
        }
    }

    /// Fallback rule: fire once played percentage crosses the trigger.
    pub fn percent_policy(&self) -> SkipPolicy {
        SkipPolicy {
            mode: SkipMode::Percent,
            threshold: self.trigger_percent,
        }
    }
}
