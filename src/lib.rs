pub mod config;
pub mod errors;
pub mod host;
pub mod messaging;
pub mod notify;
pub mod page;
pub mod player;
pub mod settings;
pub mod store;

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use host::HostContext;
use messaging::TrustGate;
use notify::Notifier;
use page::{HostPage, PlayerPage, TransportEvent};
use player::PlayerContext;
use store::KvStore;

/// Initialize the log backend. Safe to call more than once; later calls are
/// no-ops.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

// --- Engine Wiring ---

pub struct EngineOptions {
    pub player_origin: String,
    pub host_origin: String,
    pub trusted_origins: Vec<String>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            player_origin: "https://stloadi.live".to_string(),
            host_origin: "https://wparty.net".to_string(),
            trusted_origins: config::DEFAULT_TRUSTED_ORIGINS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Running engine: two context threads and the feed for native transport
/// events. `shutdown` tears both contexts down and joins them; merely
/// dropping the handle signals them too (the shutdown channels close) but
/// does not wait.
pub struct EngineHandle {
    transport_tx: mpsc::Sender<TransportEvent>,
    player_shutdown: oneshot::Sender<()>,
    host_shutdown: oneshot::Sender<()>,
    player_thread: std::thread::JoinHandle<()>,
    host_thread: std::thread::JoinHandle<()>,
}

impl EngineHandle {
    /// Sender the embedder's DOM listeners push transport events into.
    pub fn transport_events(&self) -> mpsc::Sender<TransportEvent> {
        self.transport_tx.clone()
    }

    /// Tear both contexts down and wait for their loops to finish. This is
    /// the only cancellation path; in-flight work inside a context runs to
    /// completion first.
    pub fn shutdown(self) {
        log::info!("Engine: shutting down contexts");
        let _ = self.player_shutdown.send(());
        let _ = self.host_shutdown.send(());
        if self.player_thread.join().is_err() {
            log::error!("Player context thread panicked");
        }
        if self.host_thread.join().is_err() {
            log::error!("Host context thread panicked");
        }
        log::info!("Engine: stopped");
    }
}

/// Spawn both contexts, each on its own thread with a single-threaded
/// runtime. The two sides of the page are isolated processes that share
/// nothing but the message channel.
pub fn start(
    options: EngineOptions,
    player_page: Box<dyn PlayerPage>,
    host_page: Box<dyn HostPage>,
    store: Arc<dyn KvStore>,
    player_notifier: Box<dyn Notifier>,
    host_notifier: Box<dyn Notifier>,
) -> EngineHandle {
    let trust = TrustGate::new(&options.trusted_origins);
    let (player_endpoint, host_endpoint) =
        messaging::link(&options.player_origin, &options.host_origin);
    let (transport_tx, transport_rx) = mpsc::channel(config::TRANSPORT_EVENT_CHAN_SIZE);
    let (player_shutdown, player_shutdown_rx) = oneshot::channel();
    let (host_shutdown, host_shutdown_rx) = oneshot::channel();

    let player_ctx = PlayerContext::new(
        player_page,
        store.clone(),
        player_notifier,
        trust.clone(),
        player_endpoint,
        transport_rx,
    );
    let host_ctx = HostContext::new(host_page, store, host_notifier, trust, host_endpoint);

    let player_thread =
        std::thread::spawn(move || run_context("Player", player_ctx.run(player_shutdown_rx)));
    let host_thread =
        std::thread::spawn(move || run_context("Host", host_ctx.run(host_shutdown_rx)));

    EngineHandle {
        transport_tx,
        player_shutdown,
        host_shutdown,
        player_thread,
        host_thread,
    }
}

fn run_context<F: Future<Output = ()>>(name: &str, task: F) {
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            log::error!("{} context: failed to build runtime: {}", name, e);
            return;
        }
    };
    rt.block_on(task);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::link;
    use crate::notify::LogNotifier;
    use crate::page::{MenuSnapshot, RawProgress, VolumeReading};
    use crate::store::MemoryStore;
    use std::sync::Mutex;
    use std::time::Duration;

    struct PlayerInner {
        progress: Mutex<RawProgress>,
    }

    #[derive(Clone)]
    struct SharedPlayerPage(Arc<PlayerInner>);

    impl PlayerPage for SharedPlayerPage {
        fn read_progress(&self) -> Option<RawProgress> {
            Some(self.0.progress.lock().unwrap().clone())
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
            true
        }
    }

    struct HostInner {
        episodes: Mutex<MenuSnapshot>,
        activations: Mutex<Vec<usize>>,
    }

    #[derive(Clone)]
    struct SharedHostPage(Arc<HostInner>);

    impl HostPage for SharedHostPage {
        fn episode_menu(&self) -> Option<MenuSnapshot> {
            Some(self.0.episodes.lock().unwrap().clone())
        }
        fn open_episode_menu(&self) -> bool {
            true
        }
        fn activate_episode(&self, index: usize) -> bool {
            self.0.activations.lock().unwrap().push(index);
            self.0.episodes.lock().unwrap().active = Some(index);
            true
        }
        fn season_menu(&self) -> Option<MenuSnapshot> {
            None
        }
        fn open_season_menu(&self) -> bool {
            false
        }
        fn activate_season(&self, _index: usize) -> bool {
            false
        }
        fn show_id(&self) -> Option<String> {
            Some("42".into())
        }
        fn show_title(&self) -> Option<String> {
            Some("Test Show".into())
        }
        fn page_url(&self) -> String {
            "https://wparty.net/42".into()
        }
    }

    /// Full pipeline over real channels: the decider stays true on every
    /// poll tick near the end of the episode, yet exactly one advance
    /// happens on the host side.
    #[tokio::test(start_paused = true)]
    async fn advances_exactly_once_end_to_end() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let player_page = SharedPlayerPage(Arc::new(PlayerInner {
            progress: Mutex::new(RawProgress {
                value: 1185.0,
                max: 1200.0,
                current_label: None,
                total_label: None,
            }),
        }));
        let host_page = SharedHostPage(Arc::new(HostInner {
            episodes: Mutex::new(MenuSnapshot {
                labels: vec!["E1".into(), "E2".into(), "E3".into()],
                active: Some(0),
            }),
            activations: Mutex::new(Vec::new()),
        }));

        let (player_ep, host_ep) = link("https://stloadi.live", "https://wparty.net");
        let (_transport_tx, transport_rx) = mpsc::channel(8);
        let (player_sd_tx, player_sd_rx) = oneshot::channel();
        let (host_sd_tx, host_sd_rx) = oneshot::channel();

        let player_ctx = PlayerContext::new(
            Box::new(player_page.clone()),
            store.clone(),
            Box::new(LogNotifier),
            TrustGate::default(),
            player_ep,
            transport_rx,
        );
        let host_ctx = HostContext::new(
            Box::new(host_page.clone()),
            store,
            Box::new(LogNotifier),
            TrustGate::default(),
            host_ep,
        );

        // The contexts are single-threaded (!Send) by design, so drive them
        // on a LocalSet rather than the multi-thread-capable tokio::spawn.
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async move {
                let player_task = tokio::task::spawn_local(player_ctx.run(player_sd_rx));
                let host_task = tokio::task::spawn_local(host_ctx.run(host_sd_rx));

                // A dozen virtual seconds of polling; the cooldown outlasts it.
                tokio::time::sleep(Duration::from_secs(12)).await;

                let _ = player_sd_tx.send(());
                let _ = host_sd_tx.send(());
                player_task.await.unwrap();
                host_task.await.unwrap();
            })
            .await;

        assert_eq!(*host_page.0.activations.lock().unwrap(), vec![1]);
    }

    #[test]
    fn engine_starts_and_shuts_down_cleanly() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let player_page = SharedPlayerPage(Arc::new(PlayerInner {
            progress: Mutex::new(RawProgress {
                value: 0.0,
                max: 1200.0,
                current_label: None,
                total_label: None,
            }),
        }));
        let host_page = SharedHostPage(Arc::new(HostInner {
            episodes: Mutex::new(MenuSnapshot {
                labels: vec!["E1".into()],
                active: Some(0),
            }),
            activations: Mutex::new(Vec::new()),
        }));

        let handle = start(
            EngineOptions::default(),
            Box::new(player_page),
            Box::new(host_page),
            store,
            Box::new(LogNotifier),
            Box::new(LogNotifier),
        );
        let feed = handle.transport_events();
        let _ = feed.try_send(TransportEvent::ControlsMutated);
        handle.shutdown();
    }
}
