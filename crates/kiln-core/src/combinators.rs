#![forbid(unsafe_code)]

//! Combinators that change a [`Spec`]'s state or action type.
//!
//! | Combinator | State | Action |
//! |------------|-------|--------|
//! | [`Spec::focus`] | through a lens | through a prism |
//! | [`Spec::focus_state`] | through a lens | unchanged |
//! | [`Spec::match_action`] | unchanged | through a prism |
//! | [`Spec::split`] | through a prism | unchanged |
//! | [`Spec::foreach`] | `Vec` of states | `(index, action)` |
//! | [`Spec::no_state`] | anything, ignored | anything, never sent |
//!
//! # Mismatches
//!
//! An action the prism does not match, a state in another variant, or an
//! index past the end are not errors. The combinator performs no update and,
//! for `split`, renders nothing. This is what lets unrelated child specs be
//! appended together and each pick out only its own actions.

use std::convert::Infallible;
use std::rc::Rc;

use crate::cotransform::{CoTransformer, IndexZoom, LensZoom, PrismZoom};
use crate::dispatch::Dispatch;
use crate::optics::{Identity, Lens, Never, Prism, Unit};
use crate::spec::Spec;

impl<S, P, A, N> Spec<S, P, A, N>
where
    S: 'static,
    P: 'static,
    A: 'static,
    N: 'static,
{
    /// Run this spec on the part of an outer state picked out by `lens`,
    /// for the outer actions picked out by `prism`.
    ///
    /// Inner updates are rewritten to touch only the focused part. Actions
    /// sent from the inner render are lifted with the prism's `build`.
    pub fn focus<S2, A2, L, Pr>(self, lens: L, prism: Pr) -> Spec<S2, P, A2, N>
    where
        S2: 'static,
        A2: 'static,
        L: Lens<S2, S> + 'static,
        Pr: Prism<A2, A> + 'static,
    {
        let lens = Rc::new(lens);
        let prism = Rc::new(prism);
        let perform_lens = Rc::clone(&lens);
        let perform_prism = Rc::clone(&prism);
        let inner = self.clone();
        Spec::new(
            move |action, props, state| {
                let Some(action) = perform_prism.try_match(&action) else {
                    return CoTransformer::done();
                };
                let focused = perform_lens.view(state);
                inner
                    .perform_action(action, props, &focused)
                    .zoom(LensZoom::new(Rc::clone(&perform_lens)))
            },
            move |dispatch, props, state, children| {
                let prism = Rc::clone(&prism);
                let dispatch = dispatch.contramap(move |action| prism.build(action));
                self.render(&dispatch, props, &lens.view(state), children)
            },
        )
    }

    /// [`Spec::focus`] with the action type left alone.
    pub fn focus_state<S2, L>(self, lens: L) -> Spec<S2, P, A, N>
    where
        S2: 'static,
        A: Clone,
        L: Lens<S2, S> + 'static,
    {
        self.focus(lens, Identity)
    }

    /// [`Spec::focus`] with the state type left alone.
    pub fn match_action<A2, Pr>(self, prism: Pr) -> Spec<S, P, A2, N>
    where
        S: Clone,
        A2: 'static,
        Pr: Prism<A2, A> + 'static,
    {
        self.focus(Identity, prism)
    }

    /// Run this spec only while the outer state is the case `prism` selects.
    ///
    /// In any other case actions are ignored and nothing is rendered. If the
    /// state changes case while the handler is still running, its later
    /// updates are dropped and its continuation is resumed with `None`.
    pub fn split<S2, Pr>(self, prism: Pr) -> Spec<S2, P, A, N>
    where
        S2: 'static,
        Pr: Prism<S2, S> + 'static,
    {
        let prism = Rc::new(prism);
        let perform_prism = Rc::clone(&prism);
        let inner = self.clone();
        Spec::new(
            move |action, props, state| match perform_prism.try_match(state) {
                Some(focused) => inner
                    .perform_action(action, props, &focused)
                    .zoom(PrismZoom::new(Rc::clone(&perform_prism))),
                None => CoTransformer::done(),
            },
            move |dispatch, props, state, children| match prism.try_match(state) {
                Some(focused) => self.render(dispatch, props, &focused, children),
                None => Vec::new(),
            },
        )
    }

    /// Lift a per-position spec over a `Vec` of states.
    ///
    /// `make(i)` builds the spec for position `i`. An action `(i, a)` runs
    /// `make(i)` on element `i`; an out-of-range `i` is ignored. Elements
    /// render in index order with an empty children slice, and their
    /// dispatch tags every action with the element's index.
    pub fn foreach(
        make: impl Fn(usize) -> Spec<S, P, A, N> + 'static,
    ) -> Spec<Vec<S>, P, (usize, A), N>
    where
        S: Clone,
    {
        let make = Rc::new(make);
        let render_make = Rc::clone(&make);
        Spec::new(
            move |(index, action), props, items: &Vec<S>| match items.get(index) {
                Some(item) => make(index)
                    .perform_action(action, props, item)
                    .zoom(IndexZoom::new(index)),
                None => CoTransformer::done(),
            },
            move |dispatch: &Dispatch<(usize, A)>, props, items: &Vec<S>, _children| {
                items
                    .iter()
                    .enumerate()
                    .flat_map(|(index, item)| {
                        let dispatch = dispatch.contramap(move |action| (index, action));
                        render_make(index).render(&dispatch, props, item, &[])
                    })
                    .collect()
            },
        )
    }
}

impl<P, N> Spec<(), P, Infallible, N>
where
    P: 'static,
    N: 'static,
{
    /// Embed a stateless, actionless spec in any state and action context.
    pub fn no_state<S, A>(self) -> Spec<S, P, A, N>
    where
        S: 'static,
        A: 'static,
    {
        self.focus(Unit, Never)
    }
}
