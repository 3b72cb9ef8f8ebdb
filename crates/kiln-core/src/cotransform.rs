#![forbid(unsafe_code)]

//! Co-transformers: action handlers as suspend/resume data.
//!
//! An action handler does not mutate state. It returns a [`CoTransformer`],
//! a chain of [`Step`]s that a driver walks:
//!
//! - [`Step::Done`]: nothing left to do.
//! - [`Step::Update`]: apply `update` to the live state, then call `resume`
//!   with the state that was written, or `None` if the write did not happen
//!   (component torn down, write rejected, variant changed underneath). An
//!   update that yields `None` is not written at all.
//! - [`Step::Await`]: run an asynchronous effect that produces the rest of
//!   the co-transformer.
//!
//! Combinators rewrite co-transformers structurally. [`CoTransformer::zoom`]
//! moves one from an inner state type to an outer one through a [`Zoom`]
//! bridge; [`CoTransformer::chain`] runs two back to back.
//!
//! # Invariants
//!
//! 1. Every emitted update is a `FnOnce` and is applied at most once.
//! 2. A continuation is resumed exactly once, after its update was applied
//!    or abandoned.
//! 3. `zoom` preserves the number and order of emitted updates.
//! 4. `a.chain(b)` emits all of `a`'s updates before any of `b`'s.

use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::LocalBoxFuture;

use crate::logging::trace;
use crate::optics::{Lens, Prism};

/// A state update emitted by an action handler.
///
/// `None` means the update no longer applies to the state it was handed
/// (the zoomed-in part is gone) and nothing should be written.
pub type Update<S> = Box<dyn FnOnce(S) -> Option<S>>;

/// Continuation resumed with the post-update state, or `None`.
pub type Resume<S> = Box<dyn FnOnce(Option<S>) -> CoTransformer<S>>;

/// One step of a co-transformer.
pub enum Step<S> {
    /// Finished.
    Done,
    /// Suspend on a state update.
    Update {
        /// Function from the current live state to the new state.
        update: Update<S>,
        /// Continuation fed with the written state.
        resume: Resume<S>,
    },
    /// Suspend on an asynchronous effect.
    Await(LocalBoxFuture<'static, CoTransformer<S>>),
}

impl<S> fmt::Debug for Step<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Done => write!(f, "Done"),
            Self::Update { .. } => write!(f, "Update(..)"),
            Self::Await(_) => write!(f, "Await(..)"),
        }
    }
}

/// A suspendable sequence of state updates and effects.
///
/// # Example
///
/// ```
/// use kiln_core::{CoTransformer, PureRun};
///
/// // Increment, then double if the increment landed.
/// let co = CoTransformer::modify_then(
///     |n: i32| n + 1,
///     |written| match written {
///         Some(_) => CoTransformer::modify(|n| n * 2),
///         None => CoTransformer::done(),
///     },
/// );
/// assert!(matches!(co.run_pure(4), PureRun::Complete(10)));
/// ```
pub struct CoTransformer<S> {
    step: Step<S>,
}

impl<S> fmt::Debug for CoTransformer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CoTransformer").field(&self.step).finish()
    }
}

impl<S: 'static> Default for CoTransformer<S> {
    fn default() -> Self {
        Self::done()
    }
}

impl<S: 'static> CoTransformer<S> {
    /// A co-transformer that performs no update.
    #[must_use]
    pub fn done() -> Self {
        Self { step: Step::Done }
    }

    /// Wrap a raw step.
    #[must_use]
    pub fn from_step(step: Step<S>) -> Self {
        Self { step }
    }

    /// Unwrap into the next step, for drivers.
    #[must_use]
    pub fn into_step(self) -> Step<S> {
        self.step
    }

    /// Whether there is nothing left to run.
    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self.step, Step::Done)
    }

    /// Emit one update and finish.
    pub fn modify(update: impl FnOnce(S) -> S + 'static) -> Self {
        Self::modify_then(update, |_| Self::done())
    }

    /// Replace the state wholesale and finish.
    pub fn write(state: S) -> Self {
        Self::modify(move |_| state)
    }

    /// Emit one update, then continue with the written state.
    ///
    /// `resume` receives `None` when the update could not be applied; the
    /// usual reaction is to stop emitting.
    pub fn modify_then(
        update: impl FnOnce(S) -> S + 'static,
        resume: impl FnOnce(Option<S>) -> CoTransformer<S> + 'static,
    ) -> Self {
        Self {
            step: Step::Update {
                update: Box::new(move |state| Some(update(state))),
                resume: Box::new(resume),
            },
        }
    }

    /// Run an asynchronous effect that yields the rest of the co-transformer.
    pub fn effect(effect: impl Future<Output = CoTransformer<S>> + 'static) -> Self {
        Self {
            step: Step::Await(effect.boxed_local()),
        }
    }

    /// Run `self` to completion, then `next`.
    #[must_use]
    pub fn chain(self, next: CoTransformer<S>) -> Self {
        match self.step {
            Step::Done => next,
            Step::Update { update, resume } => Self {
                step: Step::Update {
                    update,
                    resume: Box::new(move |written| resume(written).chain(next)),
                },
            },
            Step::Await(pending) => Self::effect(async move { pending.await.chain(next) }),
        }
    }

    /// Chain every co-transformer in order.
    pub fn sequence(items: impl IntoIterator<Item = CoTransformer<S>>) -> Self {
        let mut items: Vec<_> = items.into_iter().collect();
        let mut acc = Self::done();
        while let Some(prev) = items.pop() {
            acc = prev.chain(acc);
        }
        acc
    }

    /// Move this co-transformer to an outer state type.
    ///
    /// Every emitted update is lifted with [`Zoom::lift`]; every resumed
    /// value is narrowed with [`Zoom::lower`].
    pub fn zoom<T, Z>(self, bridge: Z) -> CoTransformer<T>
    where
        T: 'static,
        Z: Zoom<T, S> + Clone + 'static,
    {
        match self.step {
            Step::Done => CoTransformer::done(),
            Step::Update { update, resume } => CoTransformer {
                step: Step::Update {
                    update: bridge.lift(update),
                    resume: Box::new(move |outer| {
                        let inner = bridge.lower(outer);
                        resume(inner).zoom(bridge)
                    }),
                },
            },
            Step::Await(pending) => CoTransformer::effect(async move { pending.await.zoom(bridge) }),
        }
    }

    /// Apply every update to a local value, without a host.
    ///
    /// Stops at the first [`Step::Await`] and hands back what remains.
    pub fn run_pure(self, state: S) -> PureRun<S>
    where
        S: Clone,
    {
        let mut state = state;
        let mut co = self;
        loop {
            match co.step {
                Step::Done => return PureRun::Complete(state),
                Step::Update { update, resume } => match update(state.clone()) {
                    Some(next) => {
                        state = next;
                        co = resume(Some(state.clone()));
                    }
                    None => co = resume(None),
                },
                Step::Await(pending) => {
                    return PureRun::Suspended {
                        state,
                        rest: CoTransformer::from_step(Step::Await(pending)),
                    };
                }
            }
        }
    }
}

impl<S: 'static> FromIterator<CoTransformer<S>> for CoTransformer<S> {
    fn from_iter<I: IntoIterator<Item = CoTransformer<S>>>(iter: I) -> Self {
        Self::sequence(iter)
    }
}

/// Result of [`CoTransformer::run_pure`].
#[derive(Debug)]
pub enum PureRun<S> {
    /// Every step ran.
    Complete(S),
    /// Hit an asynchronous effect.
    Suspended {
        /// State after the updates that did run.
        state: S,
        /// Remaining co-transformer, starting at the effect.
        rest: CoTransformer<S>,
    },
}

impl<S> PureRun<S> {
    /// The state reached so far, discarding any remainder.
    #[must_use]
    pub fn into_state(self) -> S {
        match self {
            Self::Complete(state) | Self::Suspended { state, .. } => state,
        }
    }
}

// ---------------------------------------------------------------------------
// Zoom bridges
// ---------------------------------------------------------------------------

/// Bridge between an outer state and an inner state for [`CoTransformer::zoom`].
pub trait Zoom<Outer, Inner> {
    /// Turn an inner update into an update of the outer state. The lifted
    /// update yields `None` when the outer state no longer holds the inner
    /// part.
    fn lift(&self, update: Update<Inner>) -> Update<Outer>;

    /// Narrow a resumed outer state to the inner state.
    fn lower(&self, outer: Option<Outer>) -> Option<Inner>;
}

/// Zoom through a lens. Inner updates always apply.
pub struct LensZoom<L> {
    lens: Rc<L>,
}

impl<L> LensZoom<L> {
    /// Bridge through `lens`.
    pub fn new(lens: Rc<L>) -> Self {
        Self { lens }
    }
}

impl<L> Clone for LensZoom<L> {
    fn clone(&self) -> Self {
        Self {
            lens: Rc::clone(&self.lens),
        }
    }
}

impl<L> fmt::Debug for LensZoom<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LensZoom").finish_non_exhaustive()
    }
}

impl<O, I, L> Zoom<O, I> for LensZoom<L>
where
    O: 'static,
    I: 'static,
    L: Lens<O, I> + 'static,
{
    fn lift(&self, update: Update<I>) -> Update<O> {
        let lens = Rc::clone(&self.lens);
        Box::new(move |outer: O| -> Option<O> {
            let inner = update(lens.view(&outer))?;
            Some(lens.set(outer, inner))
        })
    }

    fn lower(&self, outer: Option<O>) -> Option<I> {
        outer.map(|o| self.lens.view(&o))
    }
}

/// Zoom through a prism over the state.
///
/// If the outer state is no longer the matched case when the update runs,
/// the lifted update yields `None`: nothing is written and the continuation
/// sees `None`.
pub struct PrismZoom<P> {
    prism: Rc<P>,
}

impl<P> PrismZoom<P> {
    /// Bridge through `prism`.
    pub fn new(prism: Rc<P>) -> Self {
        Self { prism }
    }
}

impl<P> Clone for PrismZoom<P> {
    fn clone(&self) -> Self {
        Self {
            prism: Rc::clone(&self.prism),
        }
    }
}

impl<P> fmt::Debug for PrismZoom<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrismZoom").finish_non_exhaustive()
    }
}

impl<O, I, P> Zoom<O, I> for PrismZoom<P>
where
    O: 'static,
    I: 'static,
    P: Prism<O, I> + 'static,
{
    fn lift(&self, update: Update<I>) -> Update<O> {
        let prism = Rc::clone(&self.prism);
        Box::new(move |outer: O| -> Option<O> {
            match prism.try_match(&outer) {
                Some(inner) => update(inner).map(|inner| prism.build(inner)),
                None => {
                    trace!(message = "cotransform.prism_mismatch", phase = "update");
                    None
                }
            }
        })
    }

    fn lower(&self, outer: Option<O>) -> Option<I> {
        let outer = outer?;
        let inner = self.prism.try_match(&outer);
        if inner.is_none() {
            trace!(message = "cotransform.prism_mismatch", phase = "resume");
        }
        inner
    }
}

/// Zoom onto one element of a `Vec`.
///
/// An update against an index that is out of range yields `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexZoom {
    index: usize,
}

impl IndexZoom {
    /// Bridge onto position `index`.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self { index }
    }

    /// The bridged position.
    #[must_use]
    pub const fn index(self) -> usize {
        self.index
    }
}

impl<S: Clone + 'static> Zoom<Vec<S>, S> for IndexZoom {
    fn lift(&self, update: Update<S>) -> Update<Vec<S>> {
        let index = self.index;
        Box::new(move |mut items: Vec<S>| -> Option<Vec<S>> {
            if index >= items.len() {
                trace!(
                    message = "cotransform.index_out_of_range",
                    index,
                    len = items.len()
                );
                return None;
            }
            items[index] = update(items[index].clone())?;
            Some(items)
        })
    }

    fn lower(&self, outer: Option<Vec<S>>) -> Option<S> {
        outer.and_then(|items| items.into_iter().nth(self.index))
    }
}
