#![forbid(unsafe_code)]

//! [`Spec`]: an action handler paired with a render function.
//!
//! # Composition
//!
//! Specs form a monoid. [`Spec::append`] runs the left handler's updates and
//! then the right handler's, and concatenates the two renders in order.
//! [`Spec::empty`] performs nothing and renders nothing.
//!
//! # Invariants
//!
//! 1. `Spec::empty().append(s)` and `s.append(Spec::empty())` behave as `s`.
//! 2. `a.append(b).append(c)` and `a.append(b.append(c))` emit the same
//!    updates in the same order and render the same nodes in the same order.
//! 3. A `Spec` is immutable; combinators build new ones and share the old
//!    halves by reference count.

use std::fmt;
use std::rc::Rc;

use crate::cotransform::CoTransformer;
use crate::dispatch::Dispatch;

/// Action handler: `(action, props, state) -> co-transformer`.
pub type PerformAction<S, P, A> = Rc<dyn Fn(A, &P, &S) -> CoTransformer<S>>;

/// Render function: `(dispatch, props, state, children) -> nodes`.
pub type Render<S, P, A, N> = Rc<dyn Fn(&Dispatch<A>, &P, &S, &[N]) -> Vec<N>>;

/// Update and render logic for a component with state `S`, props `P`,
/// actions `A`, rendering host nodes `N`.
///
/// Props never carry children; children are handed to the render function
/// as their own argument.
pub struct Spec<S, P, A, N> {
    perform_action: PerformAction<S, P, A>,
    render: Render<S, P, A, N>,
}

impl<S, P, A, N> Clone for Spec<S, P, A, N> {
    fn clone(&self) -> Self {
        Self {
            perform_action: Rc::clone(&self.perform_action),
            render: Rc::clone(&self.render),
        }
    }
}

impl<S, P, A, N> fmt::Debug for Spec<S, P, A, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Spec").finish_non_exhaustive()
    }
}

impl<S, P, A, N> Spec<S, P, A, N>
where
    S: 'static,
    P: 'static,
    A: 'static,
    N: 'static,
{
    /// Pair an action handler with a render function.
    pub fn new(
        perform_action: impl Fn(A, &P, &S) -> CoTransformer<S> + 'static,
        render: impl Fn(&Dispatch<A>, &P, &S, &[N]) -> Vec<N> + 'static,
    ) -> Self {
        Self {
            perform_action: Rc::new(perform_action),
            render: Rc::new(render),
        }
    }

    /// The identity spec: no updates, no nodes.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(
            |_, _, _| CoTransformer::done(),
            |_, _, _, _| Vec::new(),
        )
    }

    /// A spec with the given handler that renders nothing.
    pub fn from_perform_action(
        perform_action: impl Fn(A, &P, &S) -> CoTransformer<S> + 'static,
    ) -> Self {
        Self::new(perform_action, |_, _, _, _| Vec::new())
    }

    /// A spec with the given render function that ignores every action.
    pub fn from_render(
        render: impl Fn(&Dispatch<A>, &P, &S, &[N]) -> Vec<N> + 'static,
    ) -> Self {
        Self::new(|_, _, _| CoTransformer::done(), render)
    }

    /// Run the action handler.
    pub fn perform_action(&self, action: A, props: &P, state: &S) -> CoTransformer<S> {
        (self.perform_action)(action, props, state)
    }

    /// Run the render function.
    pub fn render(&self, dispatch: &Dispatch<A>, props: &P, state: &S, children: &[N]) -> Vec<N> {
        (self.render)(dispatch, props, state, children)
    }

    /// Replace the action handler, keeping the render function.
    #[must_use]
    pub fn with_perform_action(
        self,
        perform_action: impl Fn(A, &P, &S) -> CoTransformer<S> + 'static,
    ) -> Self {
        Self {
            perform_action: Rc::new(perform_action),
            render: self.render,
        }
    }

    /// Replace the render function, keeping the action handler.
    #[must_use]
    pub fn with_render(
        self,
        render: impl Fn(&Dispatch<A>, &P, &S, &[N]) -> Vec<N> + 'static,
    ) -> Self {
        Self {
            perform_action: self.perform_action,
            render: Rc::new(render),
        }
    }

    /// Post-process the rendered nodes, e.g. to wrap them in a container.
    #[must_use]
    pub fn map_render(self, f: impl Fn(Vec<N>) -> Vec<N> + 'static) -> Self {
        let render = self.render;
        Self {
            perform_action: self.perform_action,
            render: Rc::new(
                move |dispatch: &Dispatch<A>, props: &P, state: &S, children: &[N]| {
                    f(render(dispatch, props, state, children))
                },
            ),
        }
    }

    /// Combine two specs: handlers run left then right on the same action,
    /// props and state; renders are concatenated left then right.
    #[must_use]
    pub fn append(self, other: Self) -> Self
    where
        A: Clone,
    {
        let (left_perform, right_perform) = (self.perform_action, other.perform_action);
        let (left_render, right_render) = (self.render, other.render);
        Self::new(
            move |action, props, state| {
                let left = left_perform(action.clone(), props, state);
                left.chain(right_perform(action, props, state))
            },
            move |dispatch, props, state, children| {
                let mut nodes = left_render(dispatch, props, state, children);
                nodes.extend(right_render(dispatch, props, state, children));
                nodes
            },
        )
    }

    /// Fold [`Spec::append`] over `specs`, starting from [`Spec::empty`].
    pub fn concat(specs: impl IntoIterator<Item = Self>) -> Self
    where
        A: Clone,
    {
        let mut specs = specs.into_iter();
        match specs.next() {
            Some(head) => specs.fold(head, Self::append),
            None => Self::empty(),
        }
    }

    /// Delegate every operation to the spec chosen from the current state.
    pub fn with_state(choose: impl Fn(&S) -> Self + 'static) -> Self {
        let choose = Rc::new(choose);
        let render_choose = Rc::clone(&choose);
        Self::new(
            move |action, props, state| choose(state).perform_action(action, props, state),
            move |dispatch, props, state, children| {
                render_choose(state).render(dispatch, props, state, children)
            },
        )
    }
}

impl<S, P, A, N> Default for Spec<S, P, A, N>
where
    S: 'static,
    P: 'static,
    A: 'static,
    N: 'static,
{
    fn default() -> Self {
        Self::empty()
    }
}

impl<S, P, A, N> FromIterator<Spec<S, P, A, N>> for Spec<S, P, A, N>
where
    S: 'static,
    P: 'static,
    A: Clone + 'static,
    N: 'static,
{
    fn from_iter<I: IntoIterator<Item = Spec<S, P, A, N>>>(iter: I) -> Self {
        Self::concat(iter)
    }
}
