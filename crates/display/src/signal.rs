//! The system "prefers dark" signal and subscriptions to it.

use std::sync::{Arc, Mutex, PoisonError};

/// Callback invoked with the new "prefers dark" value.
pub type SignalCallback = Arc<dyn Fn(bool) + Send + Sync>;

/// Handle identifying one registered callback.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// An environment-provided boolean source (the OS/browser color-scheme query).
///
/// Implementations call every registered callback when the value changes.
/// Callbacks may run on any thread and must not be invoked after
/// `unsubscribe` returns.
///
/// Callbacks must be invoked without holding any lock that `prefers_dark`
/// takes, unless the consumer never calls `prefers_dark` while holding a lock
/// its callback takes. [`DisplayModeResolver`](crate::DisplayModeResolver)
/// upholds the latter, so it tolerates either kind of source.
pub trait SystemSignalSource: Send + Sync {
    /// Current value.
    fn prefers_dark(&self) -> bool;

    fn subscribe(&self, callback: SignalCallback) -> ListenerId;

    fn unsubscribe(&self, id: ListenerId);
}

/// Scoped registration: unsubscribes when dropped.
pub struct SignalSubscription {
    source: Arc<dyn SystemSignalSource>,
    id: ListenerId,
}

impl SignalSubscription {
    pub fn register(source: Arc<dyn SystemSignalSource>, callback: SignalCallback) -> Self {
        let id = source.subscribe(callback);
        Self { source, id }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }
}

impl Drop for SignalSubscription {
    fn drop(&mut self) {
        self.source.unsubscribe(self.id);
        tracing::trace!(listener = self.id.0, "system signal listener released");
    }
}

impl core::fmt::Debug for SignalSubscription {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SignalSubscription").field("id", &self.id).finish()
    }
}

#[derive(Default)]
struct ManualState {
    prefers_dark: bool,
    next_id: u64,
    listeners: Vec<(ListenerId, SignalCallback)>,
}

/// In-process signal source driven by [`set_prefers_dark`](Self::set_prefers_dark).
///
/// Used by tests and by the headless shell, where no real OS query exists.
/// Like a media query, it only notifies when the value actually changes.
#[derive(Default)]
pub struct ManualSignalSource {
    state: Mutex<ManualState>,
}

impl ManualSignalSource {
    pub fn new(prefers_dark: bool) -> Self {
        Self {
            state: Mutex::new(ManualState {
                prefers_dark,
                ..ManualState::default()
            }),
        }
    }

    pub fn set_prefers_dark(&self, prefers_dark: bool) {
        let callbacks: Vec<SignalCallback> = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.prefers_dark == prefers_dark {
                return;
            }
            state.prefers_dark = prefers_dark;
            state.listeners.iter().map(|(_, cb)| Arc::clone(cb)).collect()
        };

        // Called outside the lock so a callback may read or unsubscribe.
        for callback in callbacks {
            callback(prefers_dark);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .len()
    }
}

impl SystemSignalSource for ManualSignalSource {
    fn prefers_dark(&self) -> bool {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).prefers_dark
    }

    fn subscribe(&self, callback: SignalCallback) -> ListenerId {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.next_id += 1;
        let id = ListenerId(state.next_id);
        state.listeners.push((id, callback));
        id
    }

    fn unsubscribe(&self, id: ListenerId) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.listeners.retain(|(listener, _)| *listener != id);
    }
}

impl core::fmt::Debug for ManualSignalSource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ManualSignalSource")
            .field("prefers_dark", &self.prefers_dark())
            .field("listeners", &self.listener_count())
            .finish()
    }
}
