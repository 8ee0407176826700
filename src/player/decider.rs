use super::sampler::PlaybackSample;
use crate::settings::{SkipMode, SkipPolicy};

// --- Advance Decision ---

/// Pure mapping from one progress observation to "should advance now".
/// Thresholds arrive pre-clamped from the settings layer; no validation
/// happens here. `enabled` folds together the per-policy switch and the
/// auto-advance feature as a whole; false short-circuits everything.
pub fn should_advance(sample: PlaybackSample, policy: SkipPolicy, enabled: bool) -> bool {
    if !enabled {
        return false;
    }
    match policy.mode {
        SkipMode::Percent => sample.percent() >= policy.threshold,
        SkipMode::AbsoluteSecondsRemaining => {
            let remaining = sample.remaining();
            remaining > 0.0 && remaining <= policy.threshold
        }
    }
}
