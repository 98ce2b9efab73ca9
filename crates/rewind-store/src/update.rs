#![forbid(unsafe_code)]

//! Write requests and the function types a store hands to its creator.

use std::fmt;
use std::rc::Rc;

use crate::Store;

/// A single write against a [`Store`].
///
/// `Replace` swaps the whole state; `Mutate` edits it in place. A mutation
/// closure runs against a private copy of the state, so it may read the
/// store it is writing to.
pub enum Update<S> {
    /// Replace the state wholesale.
    Replace(S),
    /// Edit the state in place.
    Mutate(Box<dyn FnOnce(&mut S)>),
}

impl<S> Update<S> {
    /// Build a replacing update.
    #[must_use]
    pub fn replace(state: S) -> Self {
        Self::Replace(state)
    }

    /// Build an in-place update.
    #[must_use]
    pub fn mutate(f: impl FnOnce(&mut S) + 'static) -> Self {
        Self::Mutate(Box::new(f))
    }

    /// Apply the update to `state`.
    pub fn apply(self, state: &mut S) {
        match self {
            Self::Replace(next) => *state = next,
            Self::Mutate(f) => f(state),
        }
    }

    /// Short label used in log fields.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Replace(_) => "replace",
            Self::Mutate(_) => "mutate",
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for Update<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace(state) => f.debug_tuple("Replace").field(state).finish(),
            Self::Mutate(_) => f.debug_tuple("Mutate").finish_non_exhaustive(),
        }
    }
}

/// Write entry point of a store.
pub type SetState<S> = Rc<dyn Fn(Update<S>)>;

/// Read entry point of a store. Returns a clone of the current state.
pub type GetState<S> = Rc<dyn Fn() -> S>;

/// Fallible read entry point. Returns `None` once the store is gone.
pub type TryGetState<S> = Rc<dyn Fn() -> Option<S>>;

/// A type-erased state creator, as accepted by [`create_store`](crate::create_store).
///
/// Middleware that decorates creators (for example to observe every write a
/// nested store performs) trades in this type.
pub type BoxedCreator<S> = Box<dyn FnOnce(SetState<S>, GetState<S>, &Store<S>) -> S>;
