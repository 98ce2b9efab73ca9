#![forbid(unsafe_code)]

//! Raw-apply capability handed to the history store.
//!
//! [`Replay`] holds the primary store's *raw* setter, the one given to the
//! middleware before any interception was installed. Writing a snapshot
//! through it never reaches the interceptor, so undo and redo cannot record
//! themselves as new history.
//!
//! Both closures hold only weak references to the primary store; replay
//! against a dropped store reads `None` and writes nothing.

use std::fmt;
use std::rc::Rc;

use rewind_store::{SetState, TryGetState, Update};

use crate::options::{Merge, Partialize};

pub(crate) struct Replay<S, U> {
    raw_set: SetState<S>,
    get: TryGetState<S>,
    partialize: Partialize<S, U>,
    merge: Merge<S, U>,
}

impl<S, U> fmt::Debug for Replay<S, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Replay").finish_non_exhaustive()
    }
}

impl<S: 'static, U: 'static> Replay<S, U> {
    pub(crate) fn new(
        raw_set: SetState<S>,
        get: TryGetState<S>,
        partialize: Partialize<S, U>,
        merge: Merge<S, U>,
    ) -> Self {
        Self {
            raw_set,
            get,
            partialize,
            merge,
        }
    }

    /// Snapshot of the primary state as it is right now, or `None` once
    /// the primary store has been dropped.
    pub(crate) fn snapshot(&self) -> Option<U> {
        (self.get)().map(|state| (self.partialize)(&state))
    }

    /// Write `snapshot` back into the primary store, bypassing capture.
    pub(crate) fn apply(&self, snapshot: U) {
        let merge = Rc::clone(&self.merge);
        (self.raw_set)(Update::mutate(move |state: &mut S| merge(state, snapshot)));
    }
}
