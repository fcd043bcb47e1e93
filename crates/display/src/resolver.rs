//! Reconciles the stored preference with the live system signal.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::{DateTime, Utc};
use serde::Serialize;

use stockdash_core::DomainResult;
use stockdash_events::{Event, EventBus, InMemoryEventBus, Subscription};

use crate::preference::{DisplayPreference, EffectiveMode};
use crate::signal::{SignalCallback, SignalSubscription, SystemSignalSource};
use crate::storage::{PREFERENCE_KEY, PreferenceStore};

/// What triggered a [`DisplayModeChanged`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeCause {
    /// `set_preference` or `cycle`.
    Preference,
    /// The system signal flipped while following the system.
    SystemSignal,
}

/// Published after every preference change and every system-signal change
/// that alters what is rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayModeChanged {
    pub preference: DisplayPreference,
    pub effective: EffectiveMode,
    pub cause: ChangeCause,
    pub occurred_at: DateTime<Utc>,
}

impl Event for DisplayModeChanged {
    fn event_type(&self) -> &'static str {
        "display.mode.changed"
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}

#[derive(Debug, Clone, Copy)]
struct ResolverState {
    preference: DisplayPreference,
    system_signal: EffectiveMode,
    /// Bumped on every signal callback; lets `initialize` detect that its
    /// sample was overtaken.
    signal_updates: u64,
}

impl ResolverState {
    fn effective(&self) -> EffectiveMode {
        self.preference.resolve(self.system_signal)
    }
}

/// State shared between the resolver and its signal callback.
///
/// The mutex is the critical section for `preference`/`system_signal`: a
/// signal callback can never interleave with `set_preference` or `cycle`.
struct Shared {
    state: Mutex<ResolverState>,
    store: Arc<dyn PreferenceStore>,
    changes: InMemoryEventBus<DisplayModeChanged>,
}

impl Shared {
    // State is plain `Copy` fields written together, so a poisoned guard still
    // holds a consistent value.
    fn lock(&self) -> MutexGuard<'_, ResolverState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply_preference(
        &self,
        state: &mut ResolverState,
        preference: DisplayPreference,
    ) -> EffectiveMode {
        state.preference = preference;

        if let Err(err) = self.store.save(PREFERENCE_KEY, preference.as_str()) {
            tracing::warn!(%preference, error = %err, "failed to persist display preference");
        }

        let effective = state.effective();
        tracing::info!(%preference, %effective, "display preference set");
        self.notify(*state, ChangeCause::Preference);
        effective
    }

    fn on_system_signal_changed(&self, prefers_dark: bool) {
        let mut state = self.lock();
        state.system_signal = EffectiveMode::from_prefers_dark(prefers_dark);
        state.signal_updates = state.signal_updates.wrapping_add(1);
        tracing::debug!(system_signal = %state.system_signal, "system signal changed");

        if state.preference == DisplayPreference::System {
            self.notify(*state, ChangeCause::SystemSignal);
        }
    }

    fn notify(&self, state: ResolverState, cause: ChangeCause) {
        let change = DisplayModeChanged {
            preference: state.preference,
            effective: state.effective(),
            cause,
            occurred_at: Utc::now(),
        };
        if let Err(err) = self.changes.publish(change) {
            tracing::warn!(?err, "failed to publish display mode change");
        }
    }
}

/// Owns the display preference and resolves it against the system signal.
///
/// Construct with [`new`](Self::new), then call [`initialize`](Self::initialize)
/// once the environment is ready. Dropping the resolver releases its signal
/// subscription.
pub struct DisplayModeResolver {
    shared: Arc<Shared>,
    source: Arc<dyn SystemSignalSource>,
    subscription: Option<SignalSubscription>,
}

impl DisplayModeResolver {
    /// Resolver in its pre-initialization state (`system` preference, light signal).
    pub fn new(store: Arc<dyn PreferenceStore>, source: Arc<dyn SystemSignalSource>) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(ResolverState {
                    preference: DisplayPreference::System,
                    system_signal: EffectiveMode::Light,
                    signal_updates: 0,
                }),
                store,
                changes: InMemoryEventBus::new(),
            }),
            source,
            subscription: None,
        }
    }

    /// Load the stored preference, sample the system signal, and start
    /// listening for signal changes. Returns the effective mode.
    ///
    /// A missing, unreadable or unrecognised stored value means `system`.
    /// Calling this again replaces the previous subscription.
    pub fn initialize(&mut self) -> EffectiveMode {
        let preference = match self.shared.store.load(PREFERENCE_KEY) {
            Ok(Some(raw)) => raw.parse::<DisplayPreference>().unwrap_or_else(|_| {
                tracing::warn!(stored = %raw, "ignoring unrecognised stored display preference");
                DisplayPreference::System
            }),
            Ok(None) => DisplayPreference::System,
            Err(err) => {
                tracing::warn!(error = %err, "failed to load display preference");
                DisplayPreference::System
            }
        };

        // Callbacks that fire from here on must already see the loaded preference.
        let updates_before = {
            let mut state = self.shared.lock();
            state.preference = preference;
            state.signal_updates
        };

        // Subscribe before sampling so a change in between is not lost.
        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        let callback: SignalCallback = Arc::new(move |prefers_dark| {
            if let Some(shared) = weak.upgrade() {
                shared.on_system_signal_changed(prefers_dark);
            }
        });
        self.subscription = Some(SignalSubscription::register(
            Arc::clone(&self.source),
            callback,
        ));

        // Sampled without the state lock: the source may hold its own lock while
        // delivering callbacks, and those take the state lock.
        let sampled = EffectiveMode::from_prefers_dark(self.source.prefers_dark());

        let mut state = self.shared.lock();
        if state.signal_updates == updates_before {
            state.system_signal = sampled;
        }
        let effective = state.effective();
        tracing::info!(%preference, system_signal = %state.system_signal, %effective, "display mode initialized");
        effective
    }

    /// Store `preference` (memory and durable slot) and notify observers.
    pub fn set_preference(&self, preference: DisplayPreference) -> EffectiveMode {
        let mut state = self.shared.lock();
        self.shared.apply_preference(&mut state, preference)
    }

    /// String entry point: rejects anything but `system`, `light` or `dark`.
    pub fn set_preference_str(&self, value: &str) -> DomainResult<EffectiveMode> {
        let preference: DisplayPreference = value.parse()?;
        Ok(self.set_preference(preference))
    }

    /// Advance `system → light → dark → system`, independent of the signal.
    pub fn cycle(&self) -> EffectiveMode {
        let mut state = self.shared.lock();
        let next = state.preference.next();
        self.shared.apply_preference(&mut state, next)
    }

    /// Environment callback; also callable directly by adapters that poll.
    ///
    /// With an explicit preference only the remembered signal changes: the
    /// effective mode stays put and nobody is notified.
    pub fn on_system_signal_changed(&self, prefers_dark: bool) {
        self.shared.on_system_signal_changed(prefers_dark);
    }

    pub fn effective_mode(&self) -> EffectiveMode {
        self.shared.lock().effective()
    }

    pub fn preference(&self) -> DisplayPreference {
        self.shared.lock().preference
    }

    pub fn system_signal(&self) -> EffectiveMode {
        self.shared.lock().system_signal
    }

    /// Receive a [`DisplayModeChanged`] for every change from now on.
    pub fn subscribe(&self) -> Subscription<DisplayModeChanged> {
        self.shared.changes.subscribe()
    }

    pub fn is_listening(&self) -> bool {
        self.subscription.is_some()
    }
}

impl core::fmt::Debug for DisplayModeResolver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = *self.shared.lock();
        f.debug_struct("DisplayModeResolver")
            .field("preference", &state.preference)
            .field("system_signal", &state.system_signal)
            .field("listening", &self.is_listening())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{ListenerId, ManualSignalSource};
    use crate::storage::{InMemoryPreferenceStore, StorageError};

    struct Harness {
        store: Arc<InMemoryPreferenceStore>,
        source: Arc<ManualSignalSource>,
        resolver: DisplayModeResolver,
    }

    fn harness(stored: Option<&str>, prefers_dark: bool) -> Harness {
        let store = Arc::new(match stored {
            Some(value) => InMemoryPreferenceStore::with_entry(PREFERENCE_KEY, value),
            None => InMemoryPreferenceStore::new(),
        });
        let source = Arc::new(ManualSignalSource::new(prefers_dark));
        let resolver = DisplayModeResolver::new(store.clone(), source.clone());
        Harness {
            store,
            source,
            resolver,
        }
    }

    fn stored(h: &Harness) -> Option<String> {
        h.store.load(PREFERENCE_KEY).unwrap()
    }

    #[test]
    fn initialize_defaults_to_system_and_samples_signal() {
        let mut h = harness(None, true);

        assert_eq!(h.resolver.initialize(), EffectiveMode::Dark);
        assert_eq!(h.resolver.preference(), DisplayPreference::System);
        assert!(h.resolver.is_listening());
        assert_eq!(h.source.listener_count(), 1);
    }

    #[test]
    fn initialize_restores_stored_preference() {
        let mut h = harness(Some("light"), true);
        assert_eq!(h.resolver.initialize(), EffectiveMode::Light);
        assert_eq!(h.resolver.preference(), DisplayPreference::Light);
    }

    #[test]
    fn initialize_ignores_garbage_in_storage() {
        let mut h = harness(Some("purple"), false);
        assert_eq!(h.resolver.initialize(), EffectiveMode::Light);
        assert_eq!(h.resolver.preference(), DisplayPreference::System);
    }

    #[test]
    fn reinitialize_keeps_a_single_listener() {
        let mut h = harness(None, false);
        h.resolver.initialize();
        h.resolver.initialize();
        assert_eq!(h.source.listener_count(), 1);
    }

    #[test]
    fn explicit_dark_wins_over_any_signal() {
        let mut h = harness(None, false);
        h.resolver.initialize();

        assert_eq!(h.resolver.set_preference(DisplayPreference::Dark), EffectiveMode::Dark);
        h.source.set_prefers_dark(true);
        h.source.set_prefers_dark(false);

        assert_eq!(h.resolver.effective_mode(), EffectiveMode::Dark);
        assert_eq!(stored(&h).as_deref(), Some("dark"));
    }

    #[test]
    fn system_preference_follows_signal_changes() {
        let mut h = harness(None, true);
        h.resolver.initialize();
        h.resolver.set_preference(DisplayPreference::System);

        h.source.set_prefers_dark(false);

        assert_eq!(h.resolver.effective_mode(), EffectiveMode::Light);
    }

    #[test]
    fn signal_change_without_user_action_notifies() {
        let mut h = harness(None, false);
        assert_eq!(h.resolver.initialize(), EffectiveMode::Light);
        let changes = h.resolver.subscribe();

        h.source.set_prefers_dark(true);

        assert_eq!(h.resolver.effective_mode(), EffectiveMode::Dark);
        let events = changes.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].effective, EffectiveMode::Dark);
        assert_eq!(events[0].cause, ChangeCause::SystemSignal);
        assert_eq!(events[0].event_type(), "display.mode.changed");
    }

    #[test]
    fn signal_change_under_explicit_preference_is_silent() {
        let mut h = harness(Some("light"), false);
        h.resolver.initialize();
        let changes = h.resolver.subscribe();

        h.resolver.on_system_signal_changed(true);

        assert_eq!(h.resolver.system_signal(), EffectiveMode::Dark);
        assert_eq!(h.resolver.effective_mode(), EffectiveMode::Light);
        assert!(changes.drain().is_empty());

        // The remembered signal is used once the user switches back to system.
        assert_eq!(h.resolver.set_preference(DisplayPreference::System), EffectiveMode::Dark);
    }

    #[test]
    fn cycle_rotates_and_persists() {
        let mut h = harness(None, true);
        h.resolver.initialize();
        let changes = h.resolver.subscribe();

        assert_eq!(h.resolver.cycle(), EffectiveMode::Light);
        assert_eq!(stored(&h).as_deref(), Some("light"));
        assert_eq!(h.resolver.cycle(), EffectiveMode::Dark);
        assert_eq!(stored(&h).as_deref(), Some("dark"));
        assert_eq!(h.resolver.cycle(), EffectiveMode::Dark);
        assert_eq!(h.resolver.preference(), DisplayPreference::System);
        assert_eq!(stored(&h).as_deref(), Some("system"));

        let prefs: Vec<_> = changes.drain().into_iter().map(|c| c.preference).collect();
        assert_eq!(
            prefs,
            vec![
                DisplayPreference::Light,
                DisplayPreference::Dark,
                DisplayPreference::System,
            ]
        );
    }

    #[test]
    fn invalid_string_preference_is_rejected_without_side_effects() {
        let mut h = harness(Some("dark"), false);
        h.resolver.initialize();

        let err = h.resolver.set_preference_str("auto").unwrap_err();

        assert!(matches!(err, stockdash_core::DomainError::InvalidPreference(_)));
        assert_eq!(h.resolver.preference(), DisplayPreference::Dark);
        assert_eq!(stored(&h).as_deref(), Some("dark"));
        assert_eq!(h.resolver.set_preference_str("light").unwrap(), EffectiveMode::Light);
    }

    #[test]
    fn preference_survives_restart() {
        let store = Arc::new(InMemoryPreferenceStore::new());
        let source = Arc::new(ManualSignalSource::new(false));

        let mut first = DisplayModeResolver::new(store.clone(), source.clone());
        first.initialize();
        first.set_preference(DisplayPreference::Dark);
        drop(first);

        let mut second = DisplayModeResolver::new(store, source.clone());
        assert_eq!(second.initialize(), EffectiveMode::Dark);
        assert_eq!(source.listener_count(), 1);
    }

    #[test]
    fn teardown_releases_subscription() {
        let mut h = harness(None, false);
        h.resolver.initialize();
        let Harness { source, resolver, .. } = h;

        drop(resolver);

        assert_eq!(source.listener_count(), 0);
        source.set_prefers_dark(true);
    }

    #[test]
    fn concurrent_signal_and_cycle_stay_consistent() {
        let mut h = harness(None, false);
        h.resolver.initialize();
        let resolver = Arc::new(h.resolver);
        let source = h.source.clone();

        let flipper = std::thread::spawn(move || {
            for i in 0..200 {
                source.set_prefers_dark(i % 2 == 0);
            }
        });
        for _ in 0..99 {
            resolver.cycle();
        }
        flipper.join().unwrap();

        // 99 cycles from system land back on system.
        assert_eq!(resolver.preference(), DisplayPreference::System);
        assert_eq!(
            resolver.effective_mode(),
            EffectiveMode::from_prefers_dark(h.source.prefers_dark())
        );
    }

    /// Store whose every read and write fails.
    struct BrokenStore;

    impl PreferenceStore for BrokenStore {
        fn load(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Poisoned)
        }

        fn save(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Poisoned)
        }
    }

    #[test]
    fn storage_failures_fall_back_and_keep_the_change_in_memory() {
        let source = Arc::new(ManualSignalSource::new(false));
        let mut resolver = DisplayModeResolver::new(Arc::new(BrokenStore), source.clone());

        assert_eq!(resolver.initialize(), EffectiveMode::Light);
        assert_eq!(resolver.preference(), DisplayPreference::System);

        let changes = resolver.subscribe();
        assert_eq!(resolver.set_preference(DisplayPreference::Dark), EffectiveMode::Dark);
        assert_eq!(resolver.preference(), DisplayPreference::Dark);

        let published = changes.drain();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].preference, DisplayPreference::Dark);
        assert_eq!(published[0].effective, EffectiveMode::Dark);

        assert_eq!(resolver.cycle(), EffectiveMode::Light);
        assert_eq!(resolver.preference(), DisplayPreference::System);
    }

    /// Source that reports a stale value but delivers a fresh one to each
    /// callback the moment it is registered.
    struct EagerSource {
        stale: bool,
        fresh: bool,
        registry: ManualSignalSource,
    }

    impl SystemSignalSource for EagerSource {
        fn prefers_dark(&self) -> bool {
            self.stale
        }

        fn subscribe(&self, callback: SignalCallback) -> ListenerId {
            callback(self.fresh);
            self.registry.subscribe(callback)
        }

        fn unsubscribe(&self, id: ListenerId) {
            self.registry.unsubscribe(id);
        }
    }

    #[test]
    fn signal_during_initialize_sees_loaded_preference_and_is_kept() {
        let store = Arc::new(InMemoryPreferenceStore::with_entry(PREFERENCE_KEY, "light"));
        let source = Arc::new(EagerSource {
            stale: false,
            fresh: true,
            registry: ManualSignalSource::new(false),
        });
        let mut resolver = DisplayModeResolver::new(store, source);
        let changes = resolver.subscribe();

        assert_eq!(resolver.initialize(), EffectiveMode::Light);

        // Explicit preference: the early signal is remembered but not announced.
        assert!(changes.drain().is_empty());
        assert_eq!(resolver.system_signal(), EffectiveMode::Dark);

        resolver.set_preference(DisplayPreference::System);
        assert_eq!(resolver.effective_mode(), EffectiveMode::Dark);
    }

    /// Source that holds its own lock while delivering callbacks, and delivers
    /// pending changes when queried.
    struct LockingSource {
        pending: Mutex<Option<bool>>,
        registry: ManualSignalSource,
    }

    impl SystemSignalSource for LockingSource {
        fn prefers_dark(&self) -> bool {
            let mut pending = self.pending.lock().unwrap();
            if let Some(value) = pending.take() {
                self.registry.set_prefers_dark(value);
            }
            self.registry.prefers_dark()
        }

        fn subscribe(&self, callback: SignalCallback) -> ListenerId {
            let _guard = self.pending.lock().unwrap();
            self.registry.subscribe(callback)
        }

        fn unsubscribe(&self, id: ListenerId) {
            let _guard = self.pending.lock().unwrap();
            self.registry.unsubscribe(id);
        }
    }

    #[test]
    fn initialize_tolerates_callbacks_under_the_source_lock() {
        let source = Arc::new(LockingSource {
            pending: Mutex::new(Some(true)),
            registry: ManualSignalSource::new(false),
        });
        let mut resolver = DisplayModeResolver::new(Arc::new(InMemoryPreferenceStore::new()), source);
        let changes = resolver.subscribe();

        assert_eq!(resolver.initialize(), EffectiveMode::Dark);

        let published = changes.drain();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].cause, ChangeCause::SystemSignal);
        assert_eq!(published[0].preference, DisplayPreference::System);
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Action {
            Set(DisplayPreference),
            Cycle,
            Signal(bool),
        }

        fn action() -> impl Strategy<Value = Action> {
            prop_oneof![
                prop::sample::select(DisplayPreference::CYCLE.to_vec()).prop_map(Action::Set),
                Just(Action::Cycle),
                any::<bool>().prop_map(Action::Signal),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 300,
                ..ProptestConfig::default()
            })]

            /// Property: the effective mode is always the pure resolution of
            /// preference and last signal, and storage mirrors the preference.
            #[test]
            fn effective_mode_is_always_resolved(
                initial_dark in any::<bool>(),
                actions in prop::collection::vec(action(), 0..40),
            ) {
                let mut h = harness(None, initial_dark);
                h.resolver.initialize();
                let mut touched = false;

                for a in actions {
                    match a {
                        Action::Set(p) => { h.resolver.set_preference(p); touched = true; }
                        Action::Cycle => { h.resolver.cycle(); touched = true; }
                        Action::Signal(dark) => h.source.set_prefers_dark(dark),
                    }
                    let pref = h.resolver.preference();
                    let signal = EffectiveMode::from_prefers_dark(h.source.prefers_dark());
                    prop_assert_eq!(h.resolver.effective_mode(), pref.resolve(signal));
                    if touched {
                        prop_assert_eq!(stored(&h), Some(pref.as_str().to_string()));
                    }
                }
            }

            /// Property: three cycles return to the starting preference.
            #[test]
            fn cycle_has_period_three(start in prop::sample::select(DisplayPreference::CYCLE.to_vec())) {
                let mut h = harness(Some(start.as_str()), false);
                h.resolver.initialize();
                h.resolver.cycle();
                h.resolver.cycle();
                h.resolver.cycle();
                prop_assert_eq!(h.resolver.preference(), start);
            }
        }
    }
}
