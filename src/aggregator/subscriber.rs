//! Subscriber capability.
//!
//! Anything that reacts to [`Event`]s implements [`Subscriber`]. The
//! controllers implement it directly; ad-hoc closures go through
//! [`SubscriberFn`].

use core::fmt;

use crate::events::Event;

/// A single "handle event" operation, callable from any handler thread.
pub trait Subscriber: Send + Sync {
    fn handle_event(&self, event: Event);
}

/// Adapter that lets a plain closure act as a [`Subscriber`].
pub struct SubscriberFn<F>(pub F);

impl<F> Subscriber for SubscriberFn<F>
where
    F: Fn(Event) + Send + Sync,
{
    fn handle_event(&self, event: Event) {
        (self.0)(event);
    }
}

impl<F> fmt::Debug for SubscriberFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SubscriberFn")
    }
}
