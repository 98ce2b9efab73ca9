#![forbid(unsafe_code)]

//! History stacks held by the temporal store.
//!
//! [`TemporalState`] is the value stored inside the history store. The
//! current primary state is never on either stack: `past_states` holds what
//! came before it, `future_states` what was undone from it. Both stacks keep
//! the most recently pushed entry at the back.
//!
//! ```text
//! record(C)  (primary moved C -> D)
//! ┌──────────────────────────────────────────┐
//! │ Past:    [A, B, C]                       │
//! │ Future:  []                  current: D  │
//! └──────────────────────────────────────────┘
//!
//! step_back(2, D)
//! ┌──────────────────────────────────────────┐
//! │ Past:    [A]                             │
//! │ Future:  [D, C]              current: B  │
//! └──────────────────────────────────────────┘
//!
//! record(B)  (new branch, clears future)
//! ┌──────────────────────────────────────────┐
//! │ Past:    [A, B]                          │
//! │ Future:  []                  current: E  │
//! └──────────────────────────────────────────┘
//! ```
//!
//! Stacks are `im::Vector`s, so cloning the whole state (which every read
//! through the observable store does) shares structure with the source.

use std::fmt;
use std::rc::Rc;

use im::Vector;

/// Callback fired with `(past, current)` right before an entry is recorded.
pub type OnSave<U> = Rc<dyn Fn(&U, &U)>;

/// Undo/redo stacks plus the tracking flag, limit and save callback.
///
/// # Invariants
///
/// 1. `past_states.len() <= limit` and `future_states.len() <= limit` after
///    any transition, when a limit is set.
/// 2. `record` always empties `future_states`.
/// 3. A snapshot moved between the stacks is moved, never copied into both.
#[derive(Clone)]
pub struct TemporalState<U: Clone> {
    past_states: Vector<U>,
    future_states: Vector<U>,
    is_tracking: bool,
    limit: Option<usize>,
    on_save: Option<OnSave<U>>,
}

impl<U: Clone> fmt::Debug for TemporalState<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemporalState")
            .field("past_depth", &self.past_states.len())
            .field("future_depth", &self.future_states.len())
            .field("is_tracking", &self.is_tracking)
            .field("limit", &self.limit)
            .field("on_save", &self.on_save.is_some())
            .finish()
    }
}

impl<U: Clone> Default for TemporalState<U> {
    fn default() -> Self {
        Self::new(None)
    }
}

impl<U: Clone> TemporalState<U> {
    /// Empty, tracking history with the given limit.
    #[must_use]
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            past_states: Vector::new(),
            future_states: Vector::new(),
            is_tracking: true,
            limit,
            on_save: None,
        }
    }

    /// Seed the past stack (oldest first). Trimmed to the limit.
    #[must_use]
    pub fn with_past_states(mut self, states: impl IntoIterator<Item = U>) -> Self {
        self.past_states = states.into_iter().collect();
        self.enforce_limit();
        self
    }

    /// Seed the future stack (next redo last). Trimmed to the limit.
    #[must_use]
    pub fn with_future_states(mut self, states: impl IntoIterator<Item = U>) -> Self {
        self.future_states = states.into_iter().collect();
        self.enforce_limit();
        self
    }

    /// Start tracking or paused.
    #[must_use]
    pub fn with_tracking(mut self, tracking: bool) -> Self {
        self.is_tracking = tracking;
        self
    }

    /// Set the save callback.
    #[must_use]
    pub fn with_on_save(mut self, on_save: Option<OnSave<U>>) -> Self {
        self.on_save = on_save;
        self
    }

    // ====================================================================
    // Query
    // ====================================================================

    /// Snapshots available for undo, most recent last.
    #[must_use]
    pub fn past_states(&self) -> &Vector<U> {
        &self.past_states
    }

    /// Snapshots available for redo, next redo last.
    #[must_use]
    pub fn future_states(&self) -> &Vector<U> {
        &self.future_states
    }

    /// Whether mutations are currently recorded.
    #[must_use]
    pub fn is_tracking(&self) -> bool {
        self.is_tracking
    }

    /// Maximum depth of each stack, if bounded.
    #[must_use]
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// The save callback, if set.
    #[must_use]
    pub fn on_save(&self) -> Option<&OnSave<U>> {
        self.on_save.as_ref()
    }

    /// Check if undo is available.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.past_states.is_empty()
    }

    /// Check if redo is available.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.future_states.is_empty()
    }

    // ====================================================================
    // Transitions
    // ====================================================================

    /// Push `past` as a new entry and drop the future (new branch).
    ///
    /// Returns how many entries the limit evicted.
    pub(crate) fn record(&mut self, past: U) -> usize {
        self.future_states.clear();
        self.past_states.push_back(past);
        self.enforce_limit()
    }

    /// Move up to `steps` entries from past to future.
    ///
    /// `current` is the live snapshot being left behind; it lands on the
    /// future stack first, followed by the skipped-over entries. Returns the
    /// snapshot to apply, or `None` if nothing moved.
    pub(crate) fn step_back(&mut self, steps: usize, current: U) -> Option<U> {
        let target = Self::transfer(
            &mut self.past_states,
            &mut self.future_states,
            steps,
            current,
        )?;
        self.enforce_limit();
        Some(target)
    }

    /// Mirror of [`step_back`](Self::step_back).
    pub(crate) fn step_forward(&mut self, steps: usize, current: U) -> Option<U> {
        let target = Self::transfer(
            &mut self.future_states,
            &mut self.past_states,
            steps,
            current,
        )?;
        self.enforce_limit();
        Some(target)
    }

    fn transfer(
        from: &mut Vector<U>,
        to: &mut Vector<U>,
        steps: usize,
        current: U,
    ) -> Option<U> {
        if steps == 0 || from.is_empty() {
            return None;
        }
        let keep = from.len().saturating_sub(steps);
        // Oldest first; the front is the last one stepped over.
        let mut taken = from.split_off(keep);
        let target = taken.pop_front()?;
        to.push_back(current);
        while let Some(snapshot) = taken.pop_back() {
            to.push_back(snapshot);
        }
        Some(target)
    }

    /// Empty both stacks. Tracking, limit and callback are kept.
    pub(crate) fn clear(&mut self) {
        self.past_states.clear();
        self.future_states.clear();
    }

    /// Overwrite both stacks, keeping tracking, limit and callback as they
    /// are now.
    pub(crate) fn replace_stacks(&mut self, past: Vector<U>, future: Vector<U>) {
        self.past_states = past;
        self.future_states = future;
        self.enforce_limit();
    }

    pub(crate) fn set_tracking(&mut self, tracking: bool) {
        self.is_tracking = tracking;
    }

    pub(crate) fn set_on_save(&mut self, on_save: Option<OnSave<U>>) {
        self.on_save = on_save;
    }

    /// Change the limit, evicting the oldest entries if the stacks are now
    /// too deep. Returns the number evicted.
    pub(crate) fn set_limit(&mut self, limit: Option<usize>) -> usize {
        self.limit = limit;
        self.enforce_limit()
    }

    fn enforce_limit(&mut self) -> usize {
        let Some(limit) = self.limit else {
            return 0;
        };
        let mut evicted = 0;
        while self.past_states.len() > limit {
            self.past_states.pop_front();
            evicted += 1;
        }
        while self.future_states.len() > limit {
            self.future_states.pop_front();
            evicted += 1;
        }
        evicted
    }
}
