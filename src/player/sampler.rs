use crate::page::PlayerPage;

// --- Playback Progress Sampling ---

/// One observation of the transport. Recomputed every poll, never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSample {
    pub position: f64,
    pub total: f64,
}

impl PlaybackSample {
    pub fn percent(&self) -> f64 {
        self.position / self.total * 100.0
    }

    pub fn remaining(&self) -> f64 {
        self.total - self.position
    }
}

/// Read the transport's position indicator. `None` means the player is not
/// ready this tick (indicator missing or max not positive); callers skip
/// the cycle, they do not treat it as an error.
///
/// When the page renders textual time readouts they win over the indicator's
/// raw value: sliders on this player are known to report in stale units
/// right after a source switch.
pub fn sample(page: &dyn PlayerPage) -> Option<PlaybackSample> {
    let raw = page.read_progress()?;
    if raw.max <= 0.0 {
        return None;
    }

    let mut position = raw.value.max(0.0);
    let mut total = raw.max;

    if let Some(parsed) = raw.current_label.as_deref().and_then(parse_time) {
        position = parsed;
    }
    if let Some(parsed) = raw.total_label.as_deref().and_then(parse_time) {
        if parsed > 0.0 {
            total = parsed;
        }
    }

    Some(PlaybackSample { position, total })
}

/// Parse `H:MM:SS` / `MM:SS` / `SS` out of a label, tolerating whatever
/// decoration the page wraps around the digits.
pub fn parse_time(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ':')
        .collect();
    let parts: Vec<u64> = cleaned
        .split(':')
        .filter_map(|p| p.parse().ok())
        .collect();
    if parts.is_empty() {
        return None;
    }

    let mut seconds = 0u64;
    for (unit, part) in parts.iter().rev().take(3).enumerate() {
        seconds += part * 60u64.pow(unit as u32);
    }
    Some(seconds as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{RawProgress, VolumeReading};

    struct StubPage(Option<RawProgress>);

    impl PlayerPage for StubPage {
        fn read_progress(&self) -> Option<RawProgress> {
            self.0.clone()
        }
        fn read_volume(&self) -> Option<VolumeReading> {
            None
        }
        fn apply_volume(&self, _level: f64, _muted: bool) {}
        fn is_playing(&self) -> bool {
            false
        }
        fn press_play(&self) -> bool {
            false
        }
    }

    #[test]
    fn parses_label_formats() {
        assert_eq!(parse_time("12:34"), Some(754.0));
        assert_eq!(parse_time("1:02:03"), Some(3723.0));
        assert_eq!(parse_time("45"), Some(45.0));
        assert_eq!(parse_time(" 12:34 left"), Some(754.0));
        assert_eq!(parse_time("—"), None);
        assert_eq!(parse_time(""), None);
    }

    #[test]
    fn not_ready_yields_none() {
        assert_eq!(sample(&StubPage(None)), None);
        let zero_max = StubPage(Some(RawProgress {
            value: 10.0,
            max: 0.0,
            current_label: None,
            total_label: None,
        }));
        assert_eq!(sample(&zero_max), None);
    }

    #[test]
    fn indicator_values_used_without_labels() {
        let page = StubPage(Some(RawProgress {
            value: 300.0,
            max: 1200.0,
            current_label: None,
            total_label: None,
        }));
        let s = sample(&page).unwrap();
        assert_eq!(s.percent(), 25.0);
        assert_eq!(s.remaining(), 900.0);
    }

    #[test]
    fn labels_override_indicator() {
        let page = StubPage(Some(RawProgress {
            value: 50.0,
            max: 100.0,
            current_label: Some("19:00".into()),
            total_label: Some("20:00".into()),
        }));
        let s = sample(&page).unwrap();
        assert_eq!(s.position, 1140.0);
        assert_eq!(s.total, 1200.0);
    }
}
