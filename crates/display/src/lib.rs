//! Display-mode resolution (light / dark / follow-system).
//!
//! The user's three-valued [`DisplayPreference`] is persisted through a
//! [`PreferenceStore`] and reconciled with a [`SystemSignalSource`] into a
//! single [`EffectiveMode`] by the [`DisplayModeResolver`].

pub mod preference;
pub mod resolver;
pub mod signal;
pub mod storage;

pub use preference::{DisplayPreference, EffectiveMode};
pub use resolver::{ChangeCause, DisplayModeChanged, DisplayModeResolver};
pub use signal::{
    ListenerId, ManualSignalSource, SignalCallback, SignalSubscription, SystemSignalSource,
};
pub use storage::{
    FilePreferenceStore, InMemoryPreferenceStore, PREFERENCE_KEY, PreferenceStore, StorageError,
};
