//! Change notifications: the event contract plus a small pub/sub bus.
//!
//! Publishers (the display-mode resolver) never call into their consumers;
//! consumers hold a [`Subscription`] and drain it when they re-render.

pub mod bus;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
