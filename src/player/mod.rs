use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, oneshot};

use crate::config;
use crate::messaging::{Endpoint, Envelope, Message, Messenger, TrustGate};
use crate::notify::Notifier;
use crate::page::{PlayerPage, TransportEvent};
use crate::settings::Settings;
use crate::store::KvStore;

pub mod decider;
pub mod sampler;
pub mod trigger;
pub mod volume;

use trigger::TriggerGate;
use volume::VolumeReconciler;

// --- Player Context ---
//
// Runs inside the frame that owns the video element. Single-threaded by
// construction: one select loop interleaves inbound messages, transport
// events and interval ticks, each handled to completion.

pub struct PlayerContext {
    page: Box<dyn PlayerPage>,
    store: Arc<dyn KvStore>,
    notifier: Box<dyn Notifier>,
    settings: Settings,
    trust: TrustGate,
    outbound: Messenger,
    inbound: mpsc::Receiver<Envelope>,
    transport_rx: mpsc::Receiver<TransportEvent>,
    trigger: TriggerGate,
    reconciler: VolumeReconciler,
    awaiting_ack: bool,
    autoplay_at: Option<Instant>,
    last_watch_report: Instant,
}

impl PlayerContext {
    pub fn new(
        page: Box<dyn PlayerPage>,
        store: Arc<dyn KvStore>,
        notifier: Box<dyn Notifier>,
        trust: TrustGate,
        endpoint: Endpoint,
        transport_rx: mpsc::Receiver<TransportEvent>,
    ) -> Self {
        let settings = Settings::load(&*store);
        let reconciler = VolumeReconciler::new(&*store);
        PlayerContext {
            page,
            store,
            notifier,
            settings,
            trust,
            outbound: endpoint.outbound,
            inbound: endpoint.inbound,
            transport_rx,
            trigger: TriggerGate::new(),
            reconciler,
            awaiting_ack: false,
            autoplay_at: None,
            last_watch_report: Instant::now(),
        }
    }

    pub async fn run(mut self, mut shutdown: oneshot::Receiver<()>) {
        log::info!(
            "Player context: starting (autoNext: {}, skipCredits: {}, trigger: {}%)",
            self.settings.auto_next,
            self.settings.skip_credits,
            self.settings.trigger_percent
        );

        let mut poll = tokio::time::interval(Duration::from_millis(
            config::PROGRESS_POLL_INTERVAL_MS,
        ));
        let mut volume_tick = tokio::time::interval(Duration::from_millis(
            config::VOLUME_CHECK_INTERVAL_MS,
        ));
        let mut watch_tick = tokio::time::interval(Duration::from_millis(
            config::WATCH_TIME_REPORT_INTERVAL_MS,
        ));
        let mut status_tick =
            tokio::time::interval(Duration::from_millis(config::STATUS_LOG_INTERVAL_MS));
        let mut transport_open = true;

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    log::info!("Player context: shutdown requested");
                    break;
                }
                maybe = self.inbound.recv() => {
                    match maybe {
                        Some(envelope) => self.handle_envelope(envelope),
                        None => {
                            log::info!("Player context: message channel closed; stopping");
                            break;
                        }
                    }
                }
                maybe = self.transport_rx.recv(), if transport_open => {
                    match maybe {
                        Some(event) => self.handle_transport_event(event),
                        None => {
                            // The embedder dropped its feed; keep the
                            // interval-based checks running regardless.
                            log::debug!("Player context: transport event feed closed");
                            transport_open = false;
                        }
                    }
                }
                _ = poll.tick() => self.on_poll_tick(),
                _ = volume_tick.tick() => self.on_volume_tick(),
                _ = watch_tick.tick() => self.on_watch_tick(),
                _ = status_tick.tick() => self.on_status_tick(),
            }
        }
        log::info!("Player context: stopped");
    }

    pub(crate) fn handle_envelope(&mut self, envelope: Envelope) {
        if !self.trust.accept(&envelope.origin) {
            log::trace!("Player context: dropping message from '{}'", envelope.origin);
            return;
        }
        match envelope.message {
            Message::AdvanceAck => {
                if self.awaiting_ack {
                    log::debug!("Advance request acknowledged by host");
                    self.awaiting_ack = false;
                }
            }
            Message::AutoPlay { delay_seconds } => {
                log::info!("Auto-play command received, starting in {}s", delay_seconds);
                self.autoplay_at = Some(Instant::now() + Duration::from_secs(delay_seconds as u64));
            }
            other => {
                // Host-bound kinds echoing around are harmless.
                log::trace!("Player context: ignoring {:?}", other);
            }
        }
    }

    pub(crate) fn handle_transport_event(&mut self, event: TransportEvent) {
        let now = Instant::now();
        match event {
            TransportEvent::VolumeChanged { level, muted } => {
                self.reconciler
                    .on_volume_changed(level, muted, now, &*self.store);
            }
            TransportEvent::MutePressed => {
                if self.reconciler.on_mute_pressed(now, &*self.page, &*self.store) {
                    self.announce_restored();
                }
            }
            TransportEvent::ControlsMutated => {
                if self.reconciler.check_and_restore(now, &*self.page) {
                    self.announce_restored();
                }
            }
        }
    }

    pub(crate) fn on_poll_tick(&mut self) {
        let now = Instant::now();
        self.trigger.tick(now);
        self.reconciler.try_bind(now, &*self.page, &*self.store);
        if self.reconciler.poll(now, &*self.page) {
            self.announce_restored();
        }
        self.run_autoplay_countdown(now);
        self.evaluate_advance(now);
    }

    fn evaluate_advance(&mut self, now: Instant) {
        let Some(sample) = sampler::sample(&*self.page) else {
            return;
        };
        let enabled = self.settings.auto_next;
        let credits_hit = decider::should_advance(
            sample,
            self.settings.credits_policy(),
            enabled && self.settings.skip_credits,
        );
        let percent_hit = decider::should_advance(sample, self.settings.percent_policy(), enabled);

        if (credits_hit || percent_hit) && self.trigger.try_fire(now) {
            let remaining = sample.remaining();
            if credits_hit {
                log::info!("{:.0}s remaining - skipping credits", remaining);
            } else {
                log::info!("Reached {:.1}% - advancing", sample.percent());
            }
            self.outbound.send(Message::AdvanceRequest {
                remaining_seconds: Some(remaining),
            });
            self.awaiting_ack = true;
        }
    }

    fn run_autoplay_countdown(&mut self, now: Instant) {
        let Some(at) = self.autoplay_at else {
            return;
        };
        if now < at {
            return;
        }
        self.autoplay_at = None;
        if self.page.press_play() {
            log::info!("Auto-play: playback resumed");
        } else {
            log::info!("Auto-play: already playing or play control missing");
        }
        self.outbound.send(Message::AutoPlayDone);
    }

    fn on_volume_tick(&mut self) {
        let now = Instant::now();
        if self.reconciler.check_and_restore(now, &*self.page) {
            self.announce_restored();
        }
    }

    fn on_watch_tick(&mut self) {
        let elapsed = self.last_watch_report.elapsed().as_secs_f64();
        self.last_watch_report = Instant::now();
        if self.settings.track_watch_time && self.page.is_playing() {
            self.outbound.send(Message::WatchTime { seconds: elapsed });
        }
    }

    fn on_status_tick(&self) {
        if let Some(sample) = sampler::sample(&*self.page) {
            if sample.percent() < self.settings.trigger_percent {
                log::info!(
                    "Progress: {:.1}% | ~{:.0}s remaining",
                    sample.percent(),
                    sample.remaining()
                );
            }
        }
    }

    fn announce_restored(&self) {
        if !self.settings.show_notifications {
            return;
        }
        if let Some(desired) = self.reconciler.desired() {
            self.notifier
                .info(&format!("Volume {:.0}%", desired * 100.0));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::link;
    use crate::notify::LogNotifier;
    use crate::page::{RawProgress, VolumeReading};
    use crate::store::MemoryStore;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubPlayerPage {
        progress: Mutex<Option<RawProgress>>,
        play_presses: Mutex<u32>,
    }

    impl PlayerPage for StubPlayerPage {
        fn read_progress(&self) -> Option<RawProgress> {
            self.progress.lock().unwrap().clone()
        }
        fn read_volume(&self) -> Option<VolumeReading> {
            Some(VolumeReading {
                level: 0.5,
                muted: false,
            })
        }
        fn apply_volume(&self, _level: f64, _muted: bool) {}
        fn is_playing(&self) -> bool {
            true
        }
        fn press_play(&self) -> bool {
            *self.play_presses.lock().unwrap() += 1;
            true
        }
    }

    fn context() -> (PlayerContext, crate::messaging::Endpoint) {
        let (player_ep, host_ep) = link("https://stloadi.live", "https://wparty.net");
        let (_tx, transport_rx) = mpsc::channel(8);
        let ctx = PlayerContext::new(
            Box::new(StubPlayerPage::default()),
            Arc::new(MemoryStore::new()),
            Box::new(LogNotifier),
            TrustGate::default(),
            player_ep,
            transport_rx,
        );
        (ctx, host_ep)
    }

    #[test]
    fn untrusted_envelope_changes_nothing() {
        let (mut ctx, _host_ep) = context();
        ctx.awaiting_ack = true;

        ctx.handle_envelope(Envelope {
            origin: "https://evil.example".into(),
            message: Message::AdvanceAck,
        });
        assert!(ctx.awaiting_ack);

        ctx.handle_envelope(Envelope {
            origin: "https://wparty.net".into(),
            message: Message::AdvanceAck,
        });
        assert!(!ctx.awaiting_ack);
    }

    #[test]
    fn poll_near_end_sends_exactly_one_request() {
        let (mut ctx, mut host_ep) = context();
        let page = StubPlayerPage::default();
        *page.progress.lock().unwrap() = Some(RawProgress {
            value: 1185.0,
            max: 1200.0,
            current_label: None,
            total_label: None,
        });
        ctx.page = Box::new(page);

        for _ in 0..5 {
            ctx.on_poll_tick();
        }

        let mut requests = 0;
        while let Ok(envelope) = host_ep.inbound.try_recv() {
            if matches!(envelope.message, Message::AdvanceRequest { .. }) {
                requests += 1;
            }
        }
        assert_eq!(requests, 1);
        assert!(ctx.awaiting_ack);
    }

    #[test]
    fn autoplay_command_arms_countdown_and_reports_done() {
        let (mut ctx, mut host_ep) = context();
        ctx.handle_envelope(Envelope {
            origin: "https://wparty.net".into(),
            message: Message::AutoPlay { delay_seconds: 0 },
        });
        assert!(ctx.autoplay_at.is_some());

        ctx.run_autoplay_countdown(Instant::now() + Duration::from_millis(1));
        assert!(ctx.autoplay_at.is_none());
        let envelope = host_ep.inbound.try_recv().unwrap();
        assert_eq!(envelope.message, Message::AutoPlayDone);
    }
}
