use std::time::{Duration, Instant};

use crate::config::TRIGGER_COOLDOWN_SECS;

// --- One-Shot Trigger Gate ---

#[derive(Debug, Clone, Copy, PartialEq)]
enum GateState {
    Idle,
    Fired { cooldown_until: Instant },
}

/// Gate between the advance decision and the message channel. The decider
/// stays true across many consecutive poll ticks once playback sits past the
/// threshold; this gate turns that plateau into exactly one emission, then
/// stays closed until the cooldown elapses (the transition to the next
/// episode normally reloads the frame first, resetting everything).
#[derive(Debug)]
pub struct TriggerGate {
    state: GateState,
    cooldown: Duration,
}

impl TriggerGate {
    pub fn new() -> Self {
        Self::with_cooldown(Duration::from_secs(TRIGGER_COOLDOWN_SECS))
    }

    pub fn with_cooldown(cooldown: Duration) -> Self {
        TriggerGate {
            state: GateState::Idle,
            cooldown,
        }
    }

    /// Idle → Fired, returning true exactly once per arming. While Fired,
    /// every call is a no-op returning false.
    pub fn try_fire(&mut self, now: Instant) -> bool {
        match self.state {
            GateState::Idle => {
                self.state = GateState::Fired {
                    cooldown_until: now + self.cooldown,
                };
                true
            }
            GateState::Fired { .. } => false,
        }
    }

    /// Timed reset; call once per poll tick.
    pub fn tick(&mut self, now: Instant) {
        if let GateState::Fired { cooldown_until } = self.state {
            if now >= cooldown_until {
                log::debug!("Trigger gate re-armed after cooldown");
                self.state = GateState::Idle;
            }
        }
    }

    pub fn is_fired(&self) -> bool {
        matches!(self.state, GateState::Fired { .. })
    }
}

impl Default for TriggerGate {
    fn default() -> Self {
        Self::new()
    }
}
