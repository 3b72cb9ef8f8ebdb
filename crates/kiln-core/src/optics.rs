#![forbid(unsafe_code)]

//! Lenses and prisms: first-class accessors used to narrow a [`Spec`].
//!
//! A [`Lens<S, A>`] focuses on a part `A` that is always present inside a
//! whole `S` (a struct field). A [`Prism<S, A>`] focuses on a part that may
//! be absent (an enum variant, an action case).
//!
//! # Laws
//!
//! Every optic handed to a combinator must satisfy these. They are caller
//! contracts and cannot be checked at runtime.
//!
//! - Lens get/set: `l.view(&l.set(s, v)) == v`
//! - Lens set/get: `l.set(s.clone(), l.view(&s)) == s`
//! - Prism build/match: `p.try_match(&p.build(a)) == Some(a)`
//! - Prism match/build: if `p.try_match(&s) == Some(a)` then `p.build(a) == s`
//!
//! [`Spec`]: crate::Spec

use std::convert::Infallible;
use std::fmt;
use std::marker::PhantomData;

/// A total, bidirectional accessor from a whole `S` to a part `A`.
pub trait Lens<S, A> {
    /// Read the part out of the whole.
    fn view(&self, whole: &S) -> A;

    /// Replace the part inside the whole, leaving everything else untouched.
    fn set(&self, whole: S, part: A) -> S;

    /// Apply `f` to the part.
    fn over(&self, whole: S, f: impl FnOnce(A) -> A) -> S {
        let part = self.view(&whole);
        self.set(whole, f(part))
    }

    /// Compose with a lens into the part, giving a lens from `S` to `B`.
    fn then<B, L>(self, next: L) -> ComposeLens<Self, L, A>
    where
        Self: Sized,
        L: Lens<A, B>,
    {
        ComposeLens {
            outer: self,
            inner: next,
            _mid: PhantomData,
        }
    }
}

/// A partial, bidirectional accessor from a whole `S` to a case `A`.
pub trait Prism<S, A> {
    /// Extract the case, or `None` if the whole is some other case.
    fn try_match(&self, whole: &S) -> Option<A>;

    /// Build a whole from the case.
    fn build(&self, part: A) -> S;

    /// Apply `f` to the case if it matches; otherwise return `whole` as is.
    fn over(&self, whole: S, f: impl FnOnce(A) -> A) -> S {
        match self.try_match(&whole) {
            Some(part) => self.build(f(part)),
            None => whole,
        }
    }

    /// Compose with a prism into the case, giving a prism from `S` to `B`.
    fn then<B, P>(self, next: P) -> ComposePrism<Self, P, A>
    where
        Self: Sized,
        P: Prism<A, B>,
    {
        ComposePrism {
            outer: self,
            inner: next,
            _mid: PhantomData,
        }
    }
}

// ---------------------------------------------------------------------------
// Closure-backed optics
// ---------------------------------------------------------------------------

/// Lens built from a getter and a setter. See [`lens`].
#[derive(Clone, Copy)]
pub struct FnLens<G, St> {
    get: G,
    set: St,
}

impl<G, St> fmt::Debug for FnLens<G, St> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnLens").finish_non_exhaustive()
    }
}

/// Build a lens from a getter and a setter.
///
/// ```
/// use kiln_core::optics::{lens, Lens};
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Form { name: String, age: u32 }
///
/// let age = lens(|f: &Form| f.age, |f: Form, age| Form { age, ..f });
/// let form = Form { name: "ada".into(), age: 36 };
/// assert_eq!(age.view(&form), 36);
/// assert_eq!(age.set(form, 37).age, 37);
/// ```
pub fn lens<S, A, G, St>(get: G, set: St) -> FnLens<G, St>
where
    G: Fn(&S) -> A,
    St: Fn(S, A) -> S,
{
    FnLens { get, set }
}

impl<S, A, G, St> Lens<S, A> for FnLens<G, St>
where
    G: Fn(&S) -> A,
    St: Fn(S, A) -> S,
{
    fn view(&self, whole: &S) -> A {
        (self.get)(whole)
    }

    fn set(&self, whole: S, part: A) -> S {
        (self.set)(whole, part)
    }
}

/// Prism built from a matcher and a builder. See [`prism`].
#[derive(Clone, Copy)]
pub struct FnPrism<M, B> {
    matcher: M,
    builder: B,
}

impl<M, B> fmt::Debug for FnPrism<M, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnPrism").finish_non_exhaustive()
    }
}

/// Build a prism from a matcher and a builder.
///
/// ```
/// use kiln_core::optics::{prism, Prism};
///
/// #[derive(Clone, Debug, PartialEq)]
/// enum Action { Rename(String), Delete }
///
/// let rename = prism(
///     |a: &Action| match a {
///         Action::Rename(s) => Some(s.clone()),
///         _ => None,
///     },
///     Action::Rename,
/// );
/// assert_eq!(rename.try_match(&Action::Delete), None);
/// assert_eq!(rename.build("x".into()), Action::Rename("x".into()));
/// ```
pub fn prism<S, A, M, B>(matcher: M, builder: B) -> FnPrism<M, B>
where
    M: Fn(&S) -> Option<A>,
    B: Fn(A) -> S,
{
    FnPrism { matcher, builder }
}

impl<S, A, M, B> Prism<S, A> for FnPrism<M, B>
where
    M: Fn(&S) -> Option<A>,
    B: Fn(A) -> S,
{
    fn try_match(&self, whole: &S) -> Option<A> {
        (self.matcher)(whole)
    }

    fn build(&self, part: A) -> S {
        (self.builder)(part)
    }
}

// ---------------------------------------------------------------------------
// Composition
// ---------------------------------------------------------------------------

/// Two lenses composed through the middle type `M`. See [`Lens::then`].
pub struct ComposeLens<L1, L2, M> {
    outer: L1,
    inner: L2,
    _mid: PhantomData<fn() -> M>,
}

impl<L1: fmt::Debug, L2: fmt::Debug, M> fmt::Debug for ComposeLens<L1, L2, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComposeLens")
            .field("outer", &self.outer)
            .field("inner", &self.inner)
            .finish()
    }
}

impl<S, M, B, L1, L2> Lens<S, B> for ComposeLens<L1, L2, M>
where
    L1: Lens<S, M>,
    L2: Lens<M, B>,
{
    fn view(&self, whole: &S) -> B {
        self.inner.view(&self.outer.view(whole))
    }

    fn set(&self, whole: S, part: B) -> S {
        let mid = self.outer.view(&whole);
        let mid = self.inner.set(mid, part);
        self.outer.set(whole, mid)
    }
}

/// Two prisms composed through the middle type `M`. See [`Prism::then`].
pub struct ComposePrism<P1, P2, M> {
    outer: P1,
    inner: P2,
    _mid: PhantomData<fn() -> M>,
}

impl<P1: fmt::Debug, P2: fmt::Debug, M> fmt::Debug for ComposePrism<P1, P2, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComposePrism")
            .field("outer", &self.outer)
            .field("inner", &self.inner)
            .finish()
    }
}

impl<S, M, B, P1, P2> Prism<S, B> for ComposePrism<P1, P2, M>
where
    P1: Prism<S, M>,
    P2: Prism<M, B>,
{
    fn try_match(&self, whole: &S) -> Option<B> {
        self.outer
            .try_match(whole)
            .and_then(|mid| self.inner.try_match(&mid))
    }

    fn build(&self, part: B) -> S {
        self.outer.build(self.inner.build(part))
    }
}

// ---------------------------------------------------------------------------
// Stock optics
// ---------------------------------------------------------------------------

/// The identity optic: a lens and a prism from `S` to itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Identity;

impl<S: Clone> Lens<S, S> for Identity {
    fn view(&self, whole: &S) -> S {
        whole.clone()
    }

    fn set(&self, _whole: S, part: S) -> S {
        part
    }
}

impl<S: Clone> Prism<S, S> for Identity {
    fn try_match(&self, whole: &S) -> Option<S> {
        Some(whole.clone())
    }

    fn build(&self, part: S) -> S {
        part
    }
}

/// Lens from any state to `()`. Setting leaves the whole untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Unit;

impl<S> Lens<S, ()> for Unit {
    fn view(&self, _whole: &S) {}

    fn set(&self, whole: S, _part: ()) -> S {
        whole
    }
}

/// Prism from any action to [`Infallible`]. Never matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Never;

impl<A> Prism<A, Infallible> for Never {
    fn try_match(&self, _whole: &A) -> Option<Infallible> {
        None
    }

    fn build(&self, part: Infallible) -> A {
        match part {}
    }
}

/// Prism into the `Some` case of an `Option`. See [`some`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SomePrism;

/// Prism selecting `Some(x)` from an `Option<T>`.
#[must_use]
pub fn some() -> SomePrism {
    SomePrism
}

impl<T: Clone> Prism<Option<T>, T> for SomePrism {
    fn try_match(&self, whole: &Option<T>) -> Option<T> {
        whole.clone()
    }

    fn build(&self, part: T) -> Option<T> {
        Some(part)
    }
}

/// Lens onto the first field of a pair. See [`first`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct First;

/// Lens onto the first field of a pair.
#[must_use]
pub fn first() -> First {
    First
}

impl<A: Clone, B> Lens<(A, B), A> for First {
    fn view(&self, whole: &(A, B)) -> A {
        whole.0.clone()
    }

    fn set(&self, whole: (A, B), part: A) -> (A, B) {
        (part, whole.1)
    }
}

/// Lens onto the second field of a pair. See [`second`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Second;

/// Lens onto the second field of a pair.
#[must_use]
pub fn second() -> Second {
    Second
}

impl<A, B: Clone> Lens<(A, B), B> for Second {
    fn view(&self, whole: &(A, B)) -> B {
        whole.1.clone()
    }

    fn set(&self, whole: (A, B), part: B) -> (A, B) {
        (whole.0, part)
    }
}
