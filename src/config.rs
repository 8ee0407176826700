// --- Player Context Constants ---
pub const PROGRESS_POLL_INTERVAL_MS: u64 = 1_000;
pub const WATCH_TIME_REPORT_INTERVAL_MS: u64 = 10_000;
pub const STATUS_LOG_INTERVAL_MS: u64 = 30_000;

/// One advance signal per episode ending; the gate re-arms after this window.
pub const TRIGGER_COOLDOWN_SECS: u64 = 15;

// --- Volume Reconciler Constants ---
pub const VOLUME_CHECK_INTERVAL_MS: u64 = 2_500;
/// Drift below this is slider quantization noise, not a reset.
pub const VOLUME_EPSILON: f64 = 0.02;
/// Levels at or under this count as a collapse to silence.
pub const VOLUME_COLLAPSE_LEVEL: f64 = 0.005;
/// How long our own writes stay invisible to the change listeners. Long
/// enough for the host page's debounced handlers to settle, short enough not
/// to swallow a real user adjustment arriving right after.
pub const VOLUME_APPLY_GUARD_MS: u64 = 400;
/// Delay before reacting to a suspicious collapse-to-zero notification.
pub const VOLUME_COLLAPSE_DEBOUNCE_MS: u64 = 800;

// --- Host Context Constants ---
/// Host-page dropdown menus render asynchronously after a click.
pub const MENU_SETTLE_MS: u64 = 500;
pub const SEASON_SETTLE_MS: u64 = 1_000;
pub const MAX_ADVANCE_ATTEMPTS: u32 = 3;
pub const ADVANCE_RETRY_BACKOFF_MS: u64 = 1_000;
/// The host page populates its selectors well after document load.
pub const HOST_STARTUP_SETTLE_MS: u64 = 2_000;

// --- Settings Clamps ---
pub const TRIGGER_PERCENT_MIN: f64 = 50.0;
pub const TRIGGER_PERCENT_MAX: f64 = 99.0;
pub const SKIP_SECONDS_MIN: f64 = 10.0;
pub const SKIP_SECONDS_MAX: f64 = 300.0;
pub const AUTO_PLAY_DELAY_MIN: u32 = 1;
pub const AUTO_PLAY_DELAY_MAX: u32 = 30;

// --- Adaptive Credits Memory ---
pub const CREDITS_SAMPLE_MIN_SECS: f64 = 5.0;
pub const CREDITS_SAMPLE_MAX_SECS: f64 = 300.0;
pub const CREDITS_MAX_SAMPLES: u32 = 10;

// --- Watch Time Ledger ---
pub const WATCH_TIME_RETENTION_DAYS: i64 = 30;

// --- Messaging ---
pub const MESSAGE_CHAN_SIZE: usize = 32;
pub const TRANSPORT_EVENT_CHAN_SIZE: usize = 64;

/// Origins allowed to speak to either context. Exact host or subdomain.
pub const DEFAULT_TRUSTED_ORIGINS: &[&str] = &["wparty.net", "stloadi.live"];
