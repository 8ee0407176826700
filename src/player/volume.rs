use std::time::{Duration, Instant};

use crate::config;
use crate::page::PlayerPage;
use crate::store::{KvStore, KvStoreExt, keys};

// --- Volume Reconciliation ---
//
// The host page owns the native transport and periodically resets its volume
// (source switches, mid-roll transitions, its own persisted default). This
// component owns the canonical desired level, watches every channel the
// transport leaks changes through, and writes the desired level back whenever
// something else moved it. Our own writes echo back through the same
// listeners, so every detection path is gated on the `applying` guard;
// without it, correction re-triggers detection forever.

/// Bound once the volume control elements are locatable. A frame reload
/// tears the whole context down, so there is no Bound → Unbound transition.
pub struct VolumeReconciler {
    desired: Option<f64>,
    user_muted: bool,
    applying_until: Option<Instant>,
    pending_check_at: Option<Instant>,
    bound: bool,
    apply_guard: Duration,
    collapse_debounce: Duration,
}

impl VolumeReconciler {
    pub fn new(store: &dyn KvStore) -> Self {
        VolumeReconciler {
            desired: store
                .get_typed::<f64>(keys::VOLUME_DESIRED)
                .map(|v| v.clamp(0.0, 1.0)),
            user_muted: store.get_typed(keys::VOLUME_MUTED).unwrap_or(false),
            applying_until: None,
            pending_check_at: None,
            bound: false,
            apply_guard: Duration::from_millis(config::VOLUME_APPLY_GUARD_MS),
            collapse_debounce: Duration::from_millis(config::VOLUME_COLLAPSE_DEBOUNCE_MS),
        }
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }

    pub fn desired(&self) -> Option<f64> {
        self.desired
    }

    pub fn user_muted(&self) -> bool {
        self.user_muted
    }

    fn is_applying(&self, now: Instant) -> bool {
        self.applying_until.is_some_and(|until| now < until)
    }

    /// Locate the transport's volume surfaces. On the first success, either
    /// push the persisted state onto the transport or, with nothing
    /// persisted yet, adopt the transport's current level as desired rather
    /// than fighting it.
    pub fn try_bind(&mut self, now: Instant, page: &dyn PlayerPage, store: &dyn KvStore) -> bool {
        if self.bound {
            return true;
        }
        let Some(reading) = page.read_volume() else {
            return false;
        };
        self.bound = true;
        match self.desired {
            Some(desired) => {
                log::info!(
                    "Volume control bound; restoring persisted level {:.2} (muted: {})",
                    desired,
                    self.user_muted
                );
                self.apply(now, page);
            }
            None => {
                let adopted = reading.level.clamp(0.0, 1.0);
                log::info!("Volume control bound; adopting current level {:.2}", adopted);
                self.desired = Some(adopted);
                store.put_typed(keys::VOLUME_DESIRED, &adopted);
            }
        }
        true
    }

    /// Native "volume changed" notification. While we are mid-write this is
    /// our own echo and must not be read as user intent.
    pub fn on_volume_changed(
        &mut self,
        level: f64,
        muted: bool,
        now: Instant,
        store: &dyn KvStore,
    ) {
        if !self.bound {
            return;
        }
        if self.is_applying(now) {
            log::trace!("Ignoring volume notification during apply window");
            return;
        }

        if !muted && level > config::VOLUME_COLLAPSE_LEVEL {
            // A real level is the user adjusting; it becomes the new target.
            let level = level.clamp(0.0, 1.0);
            self.pending_check_at = None;
            if self
                .desired
                .is_none_or(|d| (d - level).abs() > config::VOLUME_EPSILON / 2.0)
            {
                log::debug!("User volume change observed: {:.2}", level);
                self.desired = Some(level);
                store.put_typed(keys::VOLUME_DESIRED, &level);
            }
        } else if !self.user_muted {
            // Collapsed to silence without the user asking for it. Transient
            // UI states legitimately do this mid-transition, so schedule a
            // check instead of reacting instantly.
            if self.pending_check_at.is_none() {
                log::debug!("Volume collapsed without mute intent; scheduling check");
                self.pending_check_at = Some(now + self.collapse_debounce);
            }
        }
    }

    /// Mute toggle driven by a real user input event. Flips the persisted
    /// intent; unmuting pushes the desired level straight back.
    pub fn on_mute_pressed(
        &mut self,
        now: Instant,
        page: &dyn PlayerPage,
        store: &dyn KvStore,
    ) -> bool {
        self.user_muted = !self.user_muted;
        store.put_typed(keys::VOLUME_MUTED, &self.user_muted);
        log::info!("User mute intent is now {}", self.user_muted);
        if self.user_muted {
            self.pending_check_at = None;
            false
        } else {
            self.apply(now, page)
        }
    }

    /// Run the debounced collapse check if it has come due. Called from the
    /// regular poll tick. Returns whether a restore happened.
    pub fn poll(&mut self, now: Instant, page: &dyn PlayerPage) -> bool {
        match self.pending_check_at {
            Some(at) if now >= at => {
                self.pending_check_at = None;
                self.check_and_restore(now, page)
            }
            _ => false,
        }
    }

    /// Compare the transport's live value against desired; correct drift
    /// beyond epsilon unless the user wants silence. Returns whether a
    /// restore happened. Invoked from the low-frequency interval, from
    /// control-mutation events, and from the debounced collapse path.
    pub fn check_and_restore(&mut self, now: Instant, page: &dyn PlayerPage) -> bool {
        if !self.bound || self.user_muted || self.is_applying(now) {
            return false;
        }
        let Some(desired) = self.desired else {
            return false;
        };
        let Some(reading) = page.read_volume() else {
            return false;
        };

        let drifted = reading.muted || (reading.level - desired).abs() > config::VOLUME_EPSILON;
        if !drifted {
            return false;
        }
        log::info!(
            "Volume drift detected: transport at {:.2} (muted: {}), desired {:.2}",
            reading.level,
            reading.muted,
            desired
        );
        self.apply(now, page)
    }

    /// Write the desired state to every reachable transport surface through
    /// the adapter. At most one apply is in flight: re-entry during the
    /// guard window is a no-op.
    pub fn apply(&mut self, now: Instant, page: &dyn PlayerPage) -> bool {
        if self.is_applying(now) {
            log::trace!("Apply already in flight; skipping");
            return false;
        }
        let Some(desired) = self.desired else {
            return false;
        };
        self.applying_until = Some(now + self.apply_guard);
        page.apply_volume(desired, self.user_muted);
        log::debug!(
            "Applied volume {:.2} (muted: {}) to transport",
            desired,
            self.user_muted
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{RawProgress, VolumeReading};
    use crate::store::MemoryStore;
    use std::cell::Cell;

    /// Transport stand-in the tests can reset out from under the reconciler.
    struct FakeTransport {
        level: Cell<f64>,
        muted: Cell<bool>,
        present: Cell<bool>,
        apply_calls: Cell<u32>,
    }

    impl FakeTransport {
        fn at(level: f64) -> Self {
            FakeTransport {
                level: Cell::new(level),
                muted: Cell::new(false),
                present: Cell::new(true),
                apply_calls: Cell::new(0),
            }
        }
    }

    impl PlayerPage for FakeTransport {
        fn read_progress(&self) -> Option<RawProgress> {
            None
        }
        fn read_volume(&self) -> Option<VolumeReading> {
            self.present.get().then(|| VolumeReading {
                level: self.level.get(),
                muted: self.muted.get(),
            })
        }
        fn apply_volume(&self, level: f64, muted: bool) {
            self.level.set(level);
            self.muted.set(muted);
            self.apply_calls.set(self.apply_calls.get() + 1);
        }
        fn is_playing(&self) -> bool {
            true
        }
        fn press_play(&self) -> bool {
            false
        }
    }

    fn store_with_desired(level: f64) -> MemoryStore {
        let store = MemoryStore::new();
        store.put_typed(keys::VOLUME_DESIRED, &level);
        store
    }

    #[test]
    fn binds_and_restores_persisted_level() {
        let store = store_with_desired(0.7);
        let page = FakeTransport::at(1.0);
        let mut rec = VolumeReconciler::new(&store);
        let now = Instant::now();

        assert!(rec.try_bind(now, &page, &store));
        assert_eq!(page.level.get(), 0.7);
        assert_eq!(page.apply_calls.get(), 1);
    }

    #[test]
    fn adopts_live_level_when_nothing_persisted() {
        let store = MemoryStore::new();
        let page = FakeTransport::at(0.55);
        let mut rec = VolumeReconciler::new(&store);

        rec.try_bind(Instant::now(), &page, &store);
        assert_eq!(rec.desired(), Some(0.55));
        assert_eq!(store.get_typed::<f64>(keys::VOLUME_DESIRED), Some(0.55));
        // Nothing to correct, so nothing was written.
        assert_eq!(page.apply_calls.get(), 0);
    }

    #[test]
    fn external_reset_is_restored_within_one_check() {
        let store = store_with_desired(0.7);
        let page = FakeTransport::at(0.7);
        let mut rec = VolumeReconciler::new(&store);
        let t0 = Instant::now();
        rec.try_bind(t0, &page, &store);
        let after_guard = t0 + Duration::from_secs(1);

        // Host page stomps the volume to zero.
        page.level.set(0.0);
        rec.on_volume_changed(0.0, false, after_guard, &store);
        // Debounced: not corrected on the spot.
        assert_eq!(page.level.get(), 0.0);

        // The scheduled check comes due on a later poll tick.
        let later = after_guard + Duration::from_secs(1);
        assert!(rec.poll(later, &page));
        assert_eq!(page.level.get(), 0.7);
        // Desired was never contaminated by the reset.
        assert_eq!(rec.desired(), Some(0.7));
    }

    #[test]
    fn apply_is_not_reentered_while_in_flight() {
        let store = store_with_desired(0.7);
        let page = FakeTransport::at(0.0);
        let mut rec = VolumeReconciler::new(&store);
        let t0 = Instant::now();
        rec.try_bind(t0, &page, &store); // first apply

        // Drift reported again immediately: the interval check and the
        // mutation observer both land inside the guard window.
        page.level.set(0.0);
        assert!(!rec.check_and_restore(t0 + Duration::from_millis(10), &page));
        assert!(!rec.check_and_restore(t0 + Duration::from_millis(20), &page));
        assert_eq!(page.apply_calls.get(), 1);

        // After the guard clears, correction goes through once.
        assert!(rec.check_and_restore(t0 + Duration::from_secs(1), &page));
        assert_eq!(page.apply_calls.get(), 2);
    }

    #[test]
    fn own_echo_is_not_user_intent() {
        let store = store_with_desired(0.7);
        let page = FakeTransport::at(0.2);
        let mut rec = VolumeReconciler::new(&store);
        let t0 = Instant::now();
        rec.try_bind(t0, &page, &store);

        // The transport echoes our own write back while the guard is up.
        rec.on_volume_changed(0.7, false, t0 + Duration::from_millis(50), &store);
        rec.on_volume_changed(0.0, false, t0 + Duration::from_millis(60), &store);
        assert_eq!(rec.desired(), Some(0.7));
        assert_eq!(store.get_typed::<f64>(keys::VOLUME_DESIRED), Some(0.7));
    }

    #[test]
    fn real_user_change_becomes_new_desired() {
        let store = store_with_desired(0.7);
        let page = FakeTransport::at(0.7);
        let mut rec = VolumeReconciler::new(&store);
        let t0 = Instant::now();
        rec.try_bind(t0, &page, &store);

        rec.on_volume_changed(0.4, false, t0 + Duration::from_secs(2), &store);
        assert_eq!(rec.desired(), Some(0.4));
        assert_eq!(store.get_typed::<f64>(keys::VOLUME_DESIRED), Some(0.4));
    }

    #[test]
    fn user_mute_suppresses_restore_until_unmute() {
        let store = store_with_desired(0.7);
        let page = FakeTransport::at(0.7);
        let mut rec = VolumeReconciler::new(&store);
        let t0 = Instant::now();
        rec.try_bind(t0, &page, &store);
        let t1 = t0 + Duration::from_secs(2);

        assert!(!rec.on_mute_pressed(t1, &page, &store));
        assert!(rec.user_muted());
        assert_eq!(store.get_typed::<bool>(keys::VOLUME_MUTED), Some(true));

        // Muted by intent: a zeroed transport is left alone.
        page.level.set(0.0);
        page.muted.set(true);
        assert!(!rec.check_and_restore(t1 + Duration::from_secs(3), &page));
        assert_eq!(page.level.get(), 0.0);

        // Unmute restores the desired level.
        assert!(rec.on_mute_pressed(t1 + Duration::from_secs(5), &page, &store));
        assert_eq!(page.level.get(), 0.7);
        assert!(!page.muted.get());
    }

    #[test]
    fn unbound_reconciler_does_nothing() {
        let store = store_with_desired(0.7);
        let page = FakeTransport::at(0.7);
        page.present.set(false);
        let mut rec = VolumeReconciler::new(&store);
        let now = Instant::now();

        assert!(!rec.try_bind(now, &page, &store));
        rec.on_volume_changed(0.0, false, now, &store);
        assert!(!rec.check_and_restore(now, &page));
        assert_eq!(page.apply_calls.get(), 0);
    }
}
