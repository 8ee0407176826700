use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config;
use crate::store::{KvStore, KvStoreExt, keys};

// --- Adaptive Credits Memory ---
//
// Every advance carries how many seconds were left when the trigger fired.
// Per show, that converges on the actual credits length, which beats a
// one-size-fits-all skip threshold.

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreditsProfile {
    pub seconds: u32,
    pub samples: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_name: Option<String>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Default)]
pub struct CreditsMemory {
    profiles: HashMap<String, CreditsProfile>,
}

impl CreditsMemory {
    pub fn load(store: &dyn KvStore) -> Self {
        CreditsMemory {
            profiles: store.get_typed(keys::CREDITS).unwrap_or_default(),
        }
    }

    pub fn profile(&self, show_id: &str) -> Option<&CreditsProfile> {
        self.profiles.get(show_id)
    }

    /// Fold one observation into the show's running average. Observations
    /// outside the plausible credits range are measurement noise (seeking,
    /// stalls) and are discarded. The sample count caps so old shows keep
    /// adapting when an episode format changes.
    pub fn record(
        &mut self,
        show_id: &str,
        seconds: f64,
        show_name: Option<String>,
        now: DateTime<Utc>,
        store: &dyn KvStore,
    ) {
        if !(config::CREDITS_SAMPLE_MIN_SECS..=config::CREDITS_SAMPLE_MAX_SECS).contains(&seconds)
        {
            log::debug!(
                "Discarding implausible credits sample {:.0}s for show '{}'",
                seconds,
                show_id
            );
            return;
        }

        let profile = match self.profiles.get(show_id) {
            Some(existing) => {
                let samples = existing.samples.max(1);
                let averaged = ((existing.seconds as f64 * samples as f64 + seconds)
                    / (samples as f64 + 1.0))
                    .round() as u32;
                CreditsProfile {
                    seconds: averaged,
                    samples: (samples + 1).min(config::CREDITS_MAX_SAMPLES),
                    show_name: show_name.or_else(|| existing.show_name.clone()),
                    last_updated: now,
                }
            }
            None => CreditsProfile {
                seconds: seconds.round() as u32,
                samples: 1,
                show_name,
                last_updated: now,
            },
        };
        log::info!(
            "Credits length for show '{}': {}s ({} samples)",
            show_id,
            profile.seconds,
            profile.samples
        );
        self.profiles.insert(show_id.to_string(), profile);
        store.put_typed(keys::CREDITS, &self.profiles);
    }

    /// The skip threshold to use for a show: the learned average when
    /// adaptive skip is on and a profile exists, the configured default
    /// otherwise.
    pub fn effective_skip_seconds(&self, show_id: &str, default: f64, adaptive: bool) -> f64 {
        if !adaptive {
            return default;
        }
        match self.profiles.get(show_id) {
            Some(profile) => profile.seconds as f64,
            None => default,
        }
    }
}
