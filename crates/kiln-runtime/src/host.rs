#![forbid(unsafe_code)]

//! The seam between the runtime and a host UI framework.
//!
//! The live component instance is always passed explicitly, as `&H`. The
//! runtime holds no ambient reference to it.

use std::future::Future;

use kiln_core::Dispatch;

use crate::error::Result;

/// Live, mutable component state owned by the host.
pub trait StateHost<S> {
    /// Current live state, or `None` once the component is torn down.
    fn read_state(&self) -> Option<S>;

    /// Store `state` and resolve once the host has acknowledged the write.
    ///
    /// On success, resolves to the state that is now live.
    fn write_state(&self, state: S) -> impl Future<Output = Result<S>>;
}

/// Everything a component needs from its host instance.
pub trait Host<S, P, A>: StateHost<S> {
    /// Props for the current render or dispatch.
    fn props(&self) -> P;

    /// Handle that feeds actions back into the host's event loop.
    fn dispatcher(&self) -> Dispatch<A>;
}
