//! Order events.
//!
//! Publishers hold [`EventProducers`], which are handed to the APIs when they are constructed. Subscribers are
//! registered as [`EventHooks`] and run by [`EventHandlers`].
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventProducers};
