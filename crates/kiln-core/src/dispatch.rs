#![forbid(unsafe_code)]

//! Dispatch handles passed to render functions.
//!
//! A [`Dispatch<A>`] forwards actions to whatever the host wired behind it.
//! Combinators use [`Dispatch::contramap`] so an inner render function can
//! send its own action type while the host only ever sees the outer one.

use std::fmt;
use std::rc::Rc;

/// Cloneable handle that sends actions of type `A` to the host.
pub struct Dispatch<A> {
    send: Rc<dyn Fn(A)>,
}

impl<A> Clone for Dispatch<A> {
    fn clone(&self) -> Self {
        Self {
            send: Rc::clone(&self.send),
        }
    }
}

impl<A> fmt::Debug for Dispatch<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch").finish_non_exhaustive()
    }
}

impl<A: 'static> Dispatch<A> {
    /// Wrap a host callback.
    pub fn new(send: impl Fn(A) + 'static) -> Self {
        Self {
            send: Rc::new(send),
        }
    }

    /// A handle that discards every action.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    /// Send an action.
    pub fn send(&self, action: A) {
        (self.send)(action);
    }

    /// Handle for a narrower action type: each `B` is turned into an `A`
    /// with `lift` before being forwarded.
    #[must_use]
    pub fn contramap<B: 'static>(&self, lift: impl Fn(B) -> A + 'static) -> Dispatch<B> {
        let send = Rc::clone(&self.send);
        Dispatch::new(move |inner| send(lift(inner)))
    }

    /// An event handler that sends `action` each time it is invoked.
    #[must_use]
    pub fn handler(&self, action: A) -> EventHandler
    where
        A: Clone,
    {
        let send = Rc::clone(&self.send);
        EventHandler::new(move || send(action.clone()))
    }
}

/// Zero-argument callback placed into rendered output (a click handler).
#[derive(Clone)]
pub struct EventHandler {
    callback: Rc<dyn Fn()>,
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandler").finish_non_exhaustive()
    }
}

impl EventHandler {
    /// Wrap a callback.
    pub fn new(callback: impl Fn() + 'static) -> Self {
        Self {
            callback: Rc::new(callback),
        }
    }

    /// Invoke the callback.
    pub fn fire(&self) {
        (self.callback)();
    }
}
