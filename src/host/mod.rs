use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};

use crate::config;
use crate::messaging::{Endpoint, Envelope, Message, Messenger, TrustGate};
use crate::notify::Notifier;
use crate::page::HostPage;
use crate::settings::Settings;
use crate::store::{KvStore, KvStoreExt, keys};

pub mod advancer;
pub mod credits;
pub mod history;
pub mod stats;

use advancer::RetryingEpisodeAdvancer;
use credits::CreditsMemory;
use history::{HistoryEntry, WatchHistory};
use stats::WatchTimeLedger;

// --- Host Context ---
//
// Runs in the outer document that owns the episode/season selectors. Mostly
// reactive: it sits on the inbound queue and acts on what the player frame
// reports. An in-flight advance (with its settle delays and retries) runs to
// completion before the next message is looked at; there is no cancellation
// path other than teardown.

pub struct HostContext {
    page: Box<dyn HostPage>,
    store: Arc<dyn KvStore>,
    notifier: Box<dyn Notifier>,
    settings: Settings,
    trust: TrustGate,
    outbound: Messenger,
    inbound: mpsc::Receiver<Envelope>,
    advancer: RetryingEpisodeAdvancer,
    credits: CreditsMemory,
    ledger: WatchTimeLedger,
    history: WatchHistory,
    autoplay_remaining: u32,
}

impl HostContext {
    pub fn new(
        page: Box<dyn HostPage>,
        store: Arc<dyn KvStore>,
        notifier: Box<dyn Notifier>,
        trust: TrustGate,
        endpoint: Endpoint,
    ) -> Self {
        let settings = Settings::load(&*store);
        let credits = CreditsMemory::load(&*store);
        let ledger = WatchTimeLedger::load(&*store);
        let history = WatchHistory::load(&*store);
        let autoplay_remaining = store.get_typed(keys::AUTOPLAY_REMAINING).unwrap_or(0);
        HostContext {
            page,
            store,
            notifier,
            settings,
            trust,
            outbound: endpoint.outbound,
            inbound: endpoint.inbound,
            advancer: RetryingEpisodeAdvancer::new(),
            credits,
            ledger,
            history,
            autoplay_remaining,
        }
    }

    pub async fn run(mut self, mut shutdown: oneshot::Receiver<()>) {
        log::info!(
            "Host context: starting (autoNext: {}, autoSeason: {}, autoPlay remaining: {})",
            self.settings.auto_next,
            self.settings.auto_season,
            self.autoplay_remaining
        );

        // The page fills its selectors well after load; record the starting
        // position once they are likely there.
        let settle = tokio::time::sleep(Duration::from_millis(config::HOST_STARTUP_SETTLE_MS));
        tokio::select! {
            _ = &mut shutdown => {
                log::info!("Host context: shutdown during startup settle");
                return;
            }
            _ = settle => {}
        }
        self.record_current_position();
        if let Some(show_id) = self.page.show_id() {
            let effective = self.credits.effective_skip_seconds(
                &show_id,
                self.settings.skip_seconds,
                self.settings.adaptive_skip,
            );
            log::debug!(
                "Credits skip for show '{}': {:.0}s{}",
                show_id,
                effective,
                if self.credits.profile(&show_id).is_some() {
                    " (learned)"
                } else {
                    " (default)"
                }
            );
        }

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    log::info!("Host context: shutdown requested");
                    break;
                }
                maybe = self.inbound.recv() => {
                    match maybe {
                        Some(envelope) => self.handle_envelope(envelope).await,
                        None => {
                            log::info!("Host context: message channel closed; stopping");
                            break;
                        }
                    }
                }
            }
        }
        log::info!("Host context: stopped");
    }

    pub(crate) async fn handle_envelope(&mut self, envelope: Envelope) {
        if !self.trust.accept(&envelope.origin) {
            log::trace!("Host context: dropping message from '{}'", envelope.origin);
            return;
        }
        match envelope.message {
            Message::AdvanceRequest { remaining_seconds } => {
                log::info!("Advance signal from player (remaining: {:?})", remaining_seconds);
                self.outbound.send(Message::AdvanceAck);
                self.handle_advance_request(remaining_seconds).await;
            }
            Message::WatchTime { seconds } => {
                if self.settings.track_watch_time {
                    let show_id = self.page.show_id();
                    let title = self.page.show_title();
                    self.ledger.add(
                        seconds,
                        show_id.as_deref().map(|id| (id, title.as_deref())),
                        Utc::now().date_naive(),
                        &*self.store,
                    );
                }
            }
            Message::AutoPlayDone => {
                log::info!("Player confirmed auto-play");
                if self.settings.show_notifications {
                    self.notifier.success("Playback started");
                }
            }
            other => {
                log::trace!("Host context: ignoring {:?}", other);
            }
        }
    }

    async fn handle_advance_request(&mut self, remaining_seconds: Option<f64>) {
        if !self.settings.auto_next {
            log::debug!("Auto-advance disabled; ignoring request");
            return;
        }

        if let Some(remaining) = remaining_seconds {
            if self.settings.adaptive_skip {
                if let Some(show_id) = self.page.show_id() {
                    self.credits.record(
                        &show_id,
                        remaining,
                        self.page.show_title(),
                        Utc::now(),
                        &*self.store,
                    );
                }
            }
        }

        let advanced = self
            .advancer
            .advance(&*self.page, self.settings.auto_season, &*self.notifier)
            .await;
        if advanced {
            self.record_current_position();
            self.maybe_send_autoplay();
        }
    }

    /// Persist where the user currently is, by the menus' 1-based ordinals.
    pub(crate) fn record_current_position(&mut self) {
        let Some(show_id) = self.page.show_id() else {
            log::debug!("No show id on this page; skipping history");
            return;
        };
        let season = self
            .page
            .season_menu()
            .and_then(|menu| menu.active_ordinal())
            .unwrap_or(1) as u32;
        let episode = self
            .page
            .episode_menu()
            .and_then(|menu| menu.active_ordinal())
            .unwrap_or(1) as u32;
        let entry = HistoryEntry {
            name: self
                .page
                .show_title()
                .unwrap_or_else(|| "Unknown show".to_string()),
            season,
            episode,
            timestamp: Utc::now(),
            url: self.page.page_url(),
        };
        self.history.record(&show_id, entry, &*self.store);
    }

    fn maybe_send_autoplay(&mut self) {
        if !self.settings.auto_play {
            return;
        }
        if self.autoplay_remaining == 0 {
            log::debug!("Auto-play budget exhausted");
            return;
        }
        self.autoplay_remaining -= 1;
        self.store
            .put_typed(keys::AUTOPLAY_REMAINING, &self.autoplay_remaining);

        log::info!(
            "Sending auto-play command ({} episodes left in budget)",
            self.autoplay_remaining
        );
        if self.settings.show_notifications {
            self.notifier.info(&format!(
                "Auto-start in {}s ({} left)",
                self.settings.auto_play_delay, self.autoplay_remaining
            ));
        }
        self.outbound.send(Message::AutoPlay {
            delay_seconds: self.settings.auto_play_delay,
        });
    }
}
