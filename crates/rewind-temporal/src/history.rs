#![forbid(unsafe_code)]

//! Handle to the history store and its operations.
//!
//! [`TemporalStore`] wraps the observable `Store<TemporalState<U>>` created
//! by the middleware. Reads go to the store directly. Writes go through the
//! setter the history creator received, so a creator decorated with
//! `wrap_temporal` observes every history change, including undo and redo.
//!
//! # Replay
//!
//! ```text
//!   undo_steps(n)
//!     │ 1. snapshot current primary state (partialized)
//!     │ 2. move n entries past -> future (TemporalState::step_back)
//!     │ 3. raw-apply the target snapshot  ──► primary store (no capture)
//!     └ 4. publish the new stacks         ──► history store listeners
//! ```
//!
//! Step 4 writes only the two stacks, so a primary-store listener that
//! pauses tracking during step 3 is not overwritten.

use std::fmt;
use std::rc::Rc;

use im::Vector;
use rewind_store::{SetState, Store, Subscription, Update};
use tracing::debug;

use crate::replay::Replay;
use crate::state::TemporalState;

/// Handle to a primary store's undo/redo history.
///
/// Obtained from [`TemporalExt::temporal`] or
/// [`TemporalStore::from_store`]. Cloning the handle is cheap and every clone
/// drives the same history.
pub struct TemporalStore<S, U: Clone> {
    store: Store<TemporalState<U>>,
    set: SetState<TemporalState<U>>,
    replay: Rc<Replay<S, U>>,
}

impl<S, U: Clone> Clone for TemporalStore<S, U> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            set: Rc::clone(&self.set),
            replay: Rc::clone(&self.replay),
        }
    }
}

impl<S, U: Clone + 'static> fmt::Debug for TemporalStore<S, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemporalStore")
            .field("state", &self.store.get_state())
            .finish_non_exhaustive()
    }
}

impl<S: Clone + 'static, U: Clone + 'static> TemporalStore<S, U> {
    pub(crate) fn new(
        store: Store<TemporalState<U>>,
        set: SetState<TemporalState<U>>,
        replay: Rc<Replay<S, U>>,
    ) -> Self {
        Self { store, set, replay }
    }

    /// Fetch the history attached to `store` by the temporal middleware.
    ///
    /// Returns `None` if the store was not built with
    /// [`temporal`](crate::temporal) for this snapshot type.
    #[must_use]
    pub fn from_store(store: &Store<S>) -> Option<Self> {
        store.extension::<Self>()
    }

    /// The underlying observable history store.
    #[must_use]
    pub fn store(&self) -> &Store<TemporalState<U>> {
        &self.store
    }

    /// A clone of the whole history state.
    #[must_use]
    pub fn state(&self) -> TemporalState<U> {
        self.store.get_state()
    }

    /// Snapshots available for undo, most recent last.
    #[must_use]
    pub fn past_states(&self) -> Vector<U> {
        self.store.with_state(|s| s.past_states().clone())
    }

    /// Snapshots available for redo, next redo last.
    #[must_use]
    pub fn future_states(&self) -> Vector<U> {
        self.store.with_state(|s| s.future_states().clone())
    }

    /// Whether writes are currently recorded.
    #[must_use]
    pub fn is_tracking(&self) -> bool {
        self.store.with_state(TemporalState::is_tracking)
    }

    /// Current stack limit.
    #[must_use]
    pub fn limit(&self) -> Option<usize> {
        self.store.with_state(TemporalState::limit)
    }

    /// Check if undo is available.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.store.with_state(TemporalState::can_undo)
    }

    /// Check if redo is available.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.store.with_state(TemporalState::can_redo)
    }

    /// Subscribe to history changes, independently of the primary store.
    pub fn subscribe(
        &self,
        listener: impl Fn(&TemporalState<U>, &TemporalState<U>) + 'static,
    ) -> Subscription {
        self.store.subscribe(listener)
    }

    // ====================================================================
    // Operations
    // ====================================================================

    /// Step back one entry.
    pub fn undo(&self) {
        self.undo_steps(1);
    }

    /// Step back up to `steps` entries, stopping at the oldest.
    ///
    /// No-op when there is nothing to undo, `steps` is zero, or the primary
    /// store has been dropped.
    pub fn undo_steps(&self, steps: usize) {
        if steps == 0 || !self.can_undo() {
            return;
        }
        let Some(current) = self.replay.snapshot() else {
            debug!(target: "rewind.temporal", steps, "undo skipped; primary store dropped");
            return;
        };
        let mut state = self.state();
        let Some(target) = state.step_back(steps, current) else {
            return;
        };
        self.replay.apply(target);
        self.publish_stacks(&state);
        debug!(
            target: "rewind.temporal",
            steps,
            past_depth = state.past_states().len(),
            future_depth = state.future_states().len(),
            "undo"
        );
    }

    /// Step forward one entry.
    pub fn redo(&self) {
        self.redo_steps(1);
    }

    /// Step forward up to `steps` entries, stopping at the newest.
    ///
    /// No-op when there is nothing to redo, `steps` is zero, or the primary
    /// store has been dropped.
    pub fn redo_steps(&self, steps: usize) {
        if steps == 0 || !self.can_redo() {
            return;
        }
        let Some(current) = self.replay.snapshot() else {
            debug!(target: "rewind.temporal", steps, "redo skipped; primary store dropped");
            return;
        };
        let mut state = self.state();
        let Some(target) = state.step_forward(steps, current) else {
            return;
        };
        self.replay.apply(target);
        self.publish_stacks(&state);
        debug!(
            target: "rewind.temporal",
            steps,
            past_depth = state.past_states().len(),
            future_depth = state.future_states().len(),
            "redo"
        );
    }

    /// Move `delta` entries through history: back when negative, forward
    /// when positive.
    pub fn jump(&self, delta: isize) {
        match delta.signum() {
            -1 => self.undo_steps(delta.unsigned_abs()),
            1 => self.redo_steps(delta.unsigned_abs()),
            _ => {}
        }
    }

    /// Empty both stacks. Leaves the primary state, tracking flag, limit
    /// and save callback untouched.
    pub fn clear(&self) {
        (self.set)(Update::mutate(|s: &mut TemporalState<U>| s.clear()));
        debug!(target: "rewind.temporal", "history cleared");
    }

    /// Stop recording. Writes still reach the primary store.
    pub fn pause(&self) {
        (self.set)(Update::mutate(|s: &mut TemporalState<U>| {
            s.set_tracking(false);
        }));
        debug!(target: "rewind.temporal", "tracking paused");
    }

    /// Resume recording.
    pub fn resume(&self) {
        (self.set)(Update::mutate(|s: &mut TemporalState<U>| {
            s.set_tracking(true);
        }));
        debug!(target: "rewind.temporal", "tracking resumed");
    }

    /// Replace the save callback.
    pub fn set_on_save(&self, on_save: impl Fn(&U, &U) + 'static) {
        let on_save: Rc<dyn Fn(&U, &U)> = Rc::new(on_save);
        (self.set)(Update::mutate(move |s: &mut TemporalState<U>| {
            s.set_on_save(Some(on_save));
        }));
    }

    /// Remove the save callback.
    pub fn clear_on_save(&self) {
        (self.set)(Update::mutate(|s: &mut TemporalState<U>| s.set_on_save(None)));
    }

    /// Change the limit. Stacks deeper than the new limit lose their oldest
    /// entries.
    pub fn set_limit(&self, limit: Option<usize>) {
        (self.set)(Update::mutate(move |s: &mut TemporalState<U>| {
            let evicted = s.set_limit(limit);
            if evicted > 0 {
                debug!(target: "rewind.temporal", evicted, "limit lowered; entries evicted");
            }
        }));
    }

    /// Default recorder: push `past` unless paused, firing `on_save` first.
    pub(crate) fn record(&self, past: U, current: U) {
        let (tracking, on_save) = self
            .store
            .with_state(|s| (s.is_tracking(), s.on_save().cloned()));
        if !tracking {
            debug!(target: "rewind.temporal", reason = "paused", "entry dropped");
            return;
        }
        if let Some(on_save) = on_save {
            on_save(&past, &current);
        }
        (self.set)(Update::mutate(move |s: &mut TemporalState<U>| {
            let evicted = s.record(past);
            debug!(
                target: "rewind.temporal",
                past_depth = s.past_states().len(),
                evicted,
                "entry recorded"
            );
        }));
    }

    fn publish_stacks(&self, from: &TemporalState<U>) {
        let past = from.past_states().clone();
        let future = from.future_states().clone();
        (self.set)(Update::mutate(move |s: &mut TemporalState<U>| {
            s.replace_stacks(past, future);
        }));
    }
}

/// Reach a store's history from the store itself.
pub trait TemporalExt {
    /// Primary state type.
    type State;

    /// The history attached by [`temporal`](crate::temporal), if the store
    /// was built with it for snapshot type `U`.
    fn temporal<U: Clone + 'static>(&self) -> Option<TemporalStore<Self::State, U>>;
}

impl<S: Clone + 'static> TemporalExt for Store<S> {
    type State = S;

    fn temporal<U: Clone + 'static>(&self) -> Option<TemporalStore<S, U>> {
        TemporalStore::from_store(self)
    }
}
