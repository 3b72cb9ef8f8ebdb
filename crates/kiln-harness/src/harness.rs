#![forbid(unsafe_code)]

//! A mounted component on a single-threaded executor.
//!
//! [`Harness::dispatch`] runs one dispatch to completion.
//! [`Harness::spawn_dispatch`] queues a dispatch without running it, so
//! several can be started and then interleaved by
//! [`Harness::run_until_stalled`]. Scheduling on the local pool is FIFO,
//! which makes interleavings reproducible.

use std::cell::RefCell;
use std::rc::Rc;

use futures::executor::LocalPool;
use futures::task::{LocalSpawnExt, SpawnError};
use kiln_runtime::{ComponentSpec, DispatchOutcome};
use tracing::debug;

use crate::host::MemoryHost;
use crate::node::Node;

/// A component mounted on a [`MemoryHost`].
pub struct Harness<S, P, A, N> {
    component: ComponentSpec<S, P, A, N>,
    host: MemoryHost<S, P, A>,
    pool: LocalPool,
    finished: Rc<RefCell<Vec<DispatchOutcome>>>,
}

impl<S, P, A, N> Harness<S, P, A, N>
where
    S: Clone + 'static,
    P: Clone + 'static,
    A: 'static,
    N: 'static,
{
    /// Mount `component` with its initial state and `props`.
    pub fn mount(component: ComponentSpec<S, P, A, N>, props: P) -> Self {
        let host = MemoryHost::new(component.initial_state(), props);
        Self {
            component,
            host,
            pool: LocalPool::new(),
            finished: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// The instance's host.
    #[must_use]
    pub fn host(&self) -> &MemoryHost<S, P, A> {
        &self.host
    }

    /// The mounted component.
    #[must_use]
    pub fn component(&self) -> &ComponentSpec<S, P, A, N> {
        &self.component
    }

    /// Current live state.
    #[must_use]
    pub fn state(&self) -> Option<S> {
        self.host.state()
    }

    /// Render without children.
    #[must_use]
    pub fn render(&self) -> Vec<N> {
        self.component.render(&self.host, &[])
    }

    /// Render with `children`.
    #[must_use]
    pub fn render_with(&self, children: &[N]) -> Vec<N> {
        self.component.render(&self.host, children)
    }

    /// Run one dispatch to completion, along with anything already spawned.
    pub fn dispatch(&mut self, action: A) -> DispatchOutcome {
        let component = self.component.clone();
        let host = self.host.clone();
        self.pool
            .run_until(async move { component.dispatch(&host, action).await })
    }

    /// Start a dispatch without running it.
    pub fn spawn_dispatch(&mut self, action: A) -> Result<(), SpawnError> {
        let component = self.component.clone();
        let host = self.host.clone();
        let finished = Rc::clone(&self.finished);
        self.pool.spawner().spawn_local(async move {
            let outcome = component.dispatch(&host, action).await;
            finished.borrow_mut().push(outcome);
        })
    }

    /// Run spawned dispatches until none can make progress, returning the
    /// outcomes of those that finished, in finishing order.
    pub fn run_until_stalled(&mut self) -> Vec<DispatchOutcome> {
        self.pool.run_until_stalled();
        self.finished.borrow_mut().drain(..).collect()
    }

    /// Take the actions rendered handlers have sent, without dispatching them.
    pub fn drain_dispatched(&mut self) -> Vec<A> {
        self.host.drain_dispatched()
    }

    /// Dispatch every action sent through the host's dispatcher, including
    /// actions sent while flushing, until the queue stays empty.
    pub fn flush(&mut self) -> Result<Vec<DispatchOutcome>, SpawnError> {
        let mut outcomes = Vec::new();
        loop {
            let queued = self.host.drain_dispatched();
            if queued.is_empty() {
                break;
            }
            debug!(message = "harness.flush", queued = queued.len());
            for action in queued {
                self.spawn_dispatch(action)?;
            }
            outcomes.extend(self.run_until_stalled());
        }
        Ok(outcomes)
    }
}

impl<S, P, A> Harness<S, P, A, Node>
where
    S: Clone + 'static,
    P: Clone + 'static,
    A: 'static,
{
    /// Render, click the element labelled `label` and flush the resulting
    /// dispatches. `Ok(None)` if nothing clickable carries that label.
    pub fn click(&mut self, label: &str) -> Result<Option<Vec<DispatchOutcome>>, SpawnError> {
        let nodes = self.render();
        let Some(handler) = nodes.iter().find_map(|node| node.find_clickable(label)) else {
            debug!(message = "harness.click_missed", label);
            return Ok(None);
        };
        handler.fire();
        self.flush().map(Some)
    }
}
