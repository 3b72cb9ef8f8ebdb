#![forbid(unsafe_code)]

//! Core: optics, dispatch handles, co-transformers, and the `Spec` algebra.
//!
//! A [`Spec`] pairs an action handler with a render function. Specs are
//! combined with [`Spec::append`] and narrowed or lifted with the
//! combinators in [`combinators`]. Action handlers return a
//! [`CoTransformer`], a suspend/resume description of state updates that a
//! host-side driver executes against the live component state.

pub mod combinators;
pub mod cotransform;
pub mod dispatch;
mod logging;
pub mod optics;
pub mod spec;

pub use cotransform::{CoTransformer, PureRun, Step, Update, Zoom};
pub use dispatch::{Dispatch, EventHandler};
pub use optics::{Identity, Lens, Never, Prism, Unit};
pub use spec::Spec;
