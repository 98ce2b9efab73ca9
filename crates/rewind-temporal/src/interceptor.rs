#![forbid(unsafe_code)]

//! Capture of before/after snapshot pairs around primary-store writes.
//!
//! The same [`Interceptor`] wraps both write entry points: the `set` handed
//! to the application's creator and the store's `set_state` slot. Each
//! wrapped call reads the state fresh through `get` before and after the
//! write, so a listener that writes again in between is seen as it
//! happened.

use std::fmt;
use std::rc::Rc;

use rewind_store::{GetState, SetState, Update};
use tracing::{debug, trace};

use crate::gate::ChangeGate;
use crate::history::TemporalStore;
use crate::options::{HandleSet, Partialize};

pub(crate) struct Interceptor<S, U: Clone> {
    get: GetState<S>,
    partialize: Partialize<S, U>,
    gate: ChangeGate<U>,
    recorder: HandleSet<U>,
    temporal: TemporalStore<S, U>,
}

impl<S, U: Clone> fmt::Debug for Interceptor<S, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interceptor")
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

impl<S: Clone + 'static, U: Clone + 'static> Interceptor<S, U> {
    pub(crate) fn new(
        get: GetState<S>,
        partialize: Partialize<S, U>,
        gate: ChangeGate<U>,
        recorder: HandleSet<U>,
        temporal: TemporalStore<S, U>,
    ) -> Self {
        Self {
            get,
            partialize,
            gate,
            recorder,
            temporal,
        }
    }

    /// Wrap `target` so every call through the result is captured.
    pub(crate) fn wrap(self: &Rc<Self>, target: SetState<S>) -> SetState<S> {
        let this = Rc::clone(self);
        Rc::new(move |update: Update<S>| this.intercept(&target, update))
    }

    fn intercept(&self, target: &SetState<S>, update: Update<S>) {
        if !self.temporal.is_tracking() {
            trace!(target: "rewind.temporal", kind = update.kind(), "paused; write passed through");
            target(update);
            return;
        }

        let past = self.snapshot();
        target(update);
        let current = self.snapshot();

        let verdict = self.gate.evaluate(&past, &current);
        if verdict.is_record() {
            (self.recorder)(past, current);
        } else {
            debug!(target: "rewind.temporal", reason = verdict.as_str(), "entry skipped");
        }
    }

    fn snapshot(&self) -> U {
        (self.partialize)(&(self.get)())
    }
}
