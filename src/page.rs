// --- Page Adapter Seam ---
//
// Everything the engine knows about the host page's markup comes through
// these traits. The selectors behind them are volatile and page-specific;
// keeping them out of the engine lets every coordination path run against a
// fake in tests.

/// Raw read of the transport's position indicator. `value`/`max` come from
/// the indicator itself; the optional labels are the page's textual
/// current/total readouts when it renders any.
#[derive(Debug, Clone, PartialEq)]
pub struct RawProgress {
    pub value: f64,
    pub max: f64,
    pub current_label: Option<String>,
    pub total_label: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeReading {
    pub level: f64,
    pub muted: bool,
}

/// Ordered sibling list (episodes or seasons) with at most one active item.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuSnapshot {
    pub labels: Vec<String>,
    pub active: Option<usize>,
}

impl MenuSnapshot {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// 1-based position of the active item, the way it is persisted.
    pub fn active_ordinal(&self) -> Option<usize> {
        self.active.map(|i| i + 1)
    }

    pub fn active_is_last(&self) -> bool {
        match self.active {
            Some(i) => i + 1 == self.labels.len(),
            None => false,
        }
    }

    pub fn next_index(&self) -> Option<usize> {
        let i = self.active?;
        (i + 1 < self.labels.len()).then_some(i + 1)
    }
}

/// Native transport happenings, forwarded by the embedder's DOM listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// The transport announced a new volume state. Sent for every change,
    /// including ones this engine caused itself.
    VolumeChanged { level: f64, muted: bool },
    /// The mute toggle received a real user input event (trusted gesture
    /// only; programmatic clicks must not be forwarded here).
    MutePressed,
    /// A mutation observer saw the visual volume control change shape.
    ControlsMutated,
}

/// Player Context surface: the frame that renders the video element and its
/// native transport controls.
pub trait PlayerPage: Send {
    fn read_progress(&self) -> Option<RawProgress>;

    /// Live volume state, `None` until the control elements exist.
    fn read_volume(&self) -> Option<VolumeReading>;

    /// Single write entry point for volume. Implementations fan this out to
    /// every reachable surface: the media element's volume/muted
    /// properties, the slider's value and ARIA/text attributes, the mute
    /// button's pressed state. They also synthesize an input-style notification
    /// so the page's own reactive code observes the change.
    fn apply_volume(&self, level: f64, muted: bool);

    fn is_playing(&self) -> bool;

    /// Press the play control if currently paused. Returns whether a press
    /// happened.
    fn press_play(&self) -> bool;
}

/// Host Context surface: the outer document with episode/season selectors.
pub trait HostPage: Send {
    fn episode_menu(&self) -> Option<MenuSnapshot>;
    fn open_episode_menu(&self) -> bool;
    fn activate_episode(&self, index: usize) -> bool;

    fn season_menu(&self) -> Option<MenuSnapshot>;
    fn open_season_menu(&self) -> bool;
    fn activate_season(&self, index: usize) -> bool;

    fn show_id(&self) -> Option<String>;
    fn show_title(&self) -> Option<String>;
    fn page_url(&self) -> String;
}
