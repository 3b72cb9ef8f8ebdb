#![forbid(unsafe_code)]

//! In-memory host.
//!
//! A write commits to the live state immediately. Its acknowledgement can
//! be delayed by a number of executor yields ([`AckMode::Yield`]) so that
//! other dispatches get to run in between, as they would on a real event
//! loop.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::task::{Context, Poll};

use kiln_core::Dispatch;
use kiln_runtime::{Host, HostError, StateHost};
use tracing::trace;

/// When a write is acknowledged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AckMode {
    /// Acknowledge as soon as the write commits.
    #[default]
    Immediate,
    /// Acknowledge after yielding to the executor this many times.
    Yield(usize),
}

struct Inner<S, P, A> {
    state: Option<S>,
    props: P,
    ack: AckMode,
    reject_next: usize,
    history: Vec<S>,
    dispatched: VecDeque<A>,
}

/// Shared handle to an in-memory component instance.
///
/// Clones refer to the same instance.
pub struct MemoryHost<S, P, A> {
    inner: Rc<RefCell<Inner<S, P, A>>>,
}

impl<S, P, A> Clone for MemoryHost<S, P, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: fmt::Debug, P: fmt::Debug, A> fmt::Debug for MemoryHost<S, P, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("MemoryHost")
            .field("state", &inner.state)
            .field("props", &inner.props)
            .field("ack", &inner.ack)
            .field("writes", &inner.history.len())
            .finish_non_exhaustive()
    }
}

impl<S, P, A> MemoryHost<S, P, A>
where
    S: Clone + 'static,
    P: Clone + 'static,
    A: 'static,
{
    /// A mounted instance holding `initial`.
    pub fn new(initial: S, props: P) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                state: Some(initial),
                props,
                ack: AckMode::Immediate,
                reject_next: 0,
                history: Vec::new(),
                dispatched: VecDeque::new(),
            })),
        }
    }

    /// Current live state, `None` after [`MemoryHost::unmount`].
    #[must_use]
    pub fn state(&self) -> Option<S> {
        self.inner.borrow().state.clone()
    }

    /// Overwrite the live state from outside any dispatch.
    pub fn set_state(&self, state: S) {
        self.inner.borrow_mut().state = Some(state);
    }

    /// Replace the props seen by later renders and dispatches.
    pub fn set_props(&self, props: P) {
        self.inner.borrow_mut().props = props;
    }

    /// Tear the instance down. Later reads see `None`; pending and later
    /// writes fail with [`HostError::Unmounted`].
    pub fn unmount(&self) {
        self.inner.borrow_mut().state = None;
    }

    /// Whether the instance still has live state.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.inner.borrow().state.is_some()
    }

    /// Change how writes are acknowledged.
    pub fn set_ack_mode(&self, ack: AckMode) {
        self.inner.borrow_mut().ack = ack;
    }

    /// Reject the next `count` writes.
    pub fn reject_next_writes(&self, count: usize) {
        self.inner.borrow_mut().reject_next = count;
    }

    /// Every committed write, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<S> {
        self.inner.borrow().history.clone()
    }

    /// Take the actions sent through [`Host::dispatcher`] since last call.
    pub fn drain_dispatched(&self) -> Vec<A> {
        self.inner.borrow_mut().dispatched.drain(..).collect()
    }
}

impl<S, P, A> StateHost<S> for MemoryHost<S, P, A>
where
    S: Clone + 'static,
    P: Clone + 'static,
    A: 'static,
{
    fn read_state(&self) -> Option<S> {
        self.state()
    }

    fn write_state(&self, state: S) -> impl Future<Output = kiln_runtime::Result<S>> {
        let inner = Rc::clone(&self.inner);
        async move {
            let yields = {
                let mut guard = inner.borrow_mut();
                if guard.state.is_none() {
                    return Err(HostError::Unmounted);
                }
                if guard.reject_next > 0 {
                    guard.reject_next -= 1;
                    return Err(HostError::rejected("memory host rejected the write"));
                }
                guard.state = Some(state.clone());
                guard.history.push(state.clone());
                match guard.ack {
                    AckMode::Immediate => 0,
                    AckMode::Yield(yields) => yields,
                }
            };
            for _ in 0..yields {
                YieldNow::default().await;
            }
            if inner.borrow().state.is_none() {
                trace!(message = "memory_host.unmounted_before_ack");
                return Err(HostError::Unmounted);
            }
            Ok(state)
        }
    }
}

impl<S, P, A> Host<S, P, A> for MemoryHost<S, P, A>
where
    S: Clone + 'static,
    P: Clone + 'static,
    A: 'static,
{
    fn props(&self) -> P {
        self.inner.borrow().props.clone()
    }

    fn dispatcher(&self) -> Dispatch<A> {
        let weak: Weak<RefCell<Inner<S, P, A>>> = Rc::downgrade(&self.inner);
        Dispatch::new(move |action| {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().dispatched.push_back(action);
            }
        })
    }
}

/// Returns `Pending` once, waking itself, then `Ready`.
#[derive(Debug, Default)]
struct YieldNow {
    yielded: bool,
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            return Poll::Ready(());
        }
        self.yielded = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}
