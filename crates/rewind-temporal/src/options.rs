#![forbid(unsafe_code)]

//! Policy record handed to [`temporal`](crate::temporal).
//!
//! Every policy is optional and has a default:
//!
//! | Policy          | Default                                   |
//! |-----------------|-------------------------------------------|
//! | `partialize`    | identity (`U = S`)                        |
//! | `merge`         | replace the whole state (`U = S`)         |
//! | `equality`      | none: every tracked write is recorded     |
//! | `diff`          | none                                      |
//! | `limit`         | unbounded                                 |
//! | `on_save`       | none                                      |
//! | `handle_set`    | the default recorder, unmodified          |
//! | `wrap_temporal` | the history creator, unmodified           |
//!
//! Tracking a subset of the state needs both halves: `partialize` to cut the
//! snapshot out, and `merge` to write it back when history is replayed.

use std::fmt;
use std::rc::Rc;

use rewind_store::BoxedCreator;

use crate::config::HistoryConfig;
use crate::gate::ChangeGate;
use crate::state::{OnSave, TemporalState};

/// Cuts the tracked snapshot out of the full state.
pub type Partialize<S, U> = Rc<dyn Fn(&S) -> U>;

/// Writes a snapshot back into the full state during replay.
pub type Merge<S, U> = Rc<dyn Fn(&mut S, U)>;

/// Records a significant `(past, current)` pair.
pub type HandleSet<U> = Rc<dyn Fn(U, U)>;

/// Decorates the recorder once, at setup.
pub type HandleSetHook<U> = Box<dyn FnOnce(HandleSet<U>) -> HandleSet<U>>;

/// Decorates the history store creator once, at setup.
pub type WrapTemporal<U> =
    Box<dyn FnOnce(BoxedCreator<TemporalState<U>>) -> BoxedCreator<TemporalState<U>>>;

/// Configuration for the temporal middleware.
pub struct TemporalOptions<S, U: Clone = S> {
    pub(crate) partialize: Partialize<S, U>,
    pub(crate) merge: Merge<S, U>,
    pub(crate) gate: ChangeGate<U>,
    pub(crate) limit: Option<usize>,
    pub(crate) tracking: bool,
    pub(crate) on_save: Option<OnSave<U>>,
    pub(crate) past_states: Vec<U>,
    pub(crate) future_states: Vec<U>,
    pub(crate) handle_set: Option<HandleSetHook<U>>,
    pub(crate) wrap_temporal: Option<WrapTemporal<U>>,
}

impl<S, U: Clone> fmt::Debug for TemporalOptions<S, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemporalOptions")
            .field("gate", &self.gate)
            .field("limit", &self.limit)
            .field("tracking", &self.tracking)
            .field("on_save", &self.on_save.is_some())
            .field("past_states", &self.past_states.len())
            .field("future_states", &self.future_states.len())
            .field("handle_set", &self.handle_set.is_some())
            .field("wrap_temporal", &self.wrap_temporal.is_some())
            .finish()
    }
}

impl<S: Clone + 'static> TemporalOptions<S, S> {
    /// Track the whole state.
    #[must_use]
    pub fn new() -> Self {
        Self::partialized(S::clone, |state: &mut S, snapshot: S| *state = snapshot)
    }
}

impl<S: Clone + 'static> Default for TemporalOptions<S, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: 'static, U: Clone + 'static> TemporalOptions<S, U> {
    /// Track a subset of the state.
    ///
    /// `partialize` produces the snapshot; `merge` writes a snapshot back
    /// into the full state when undo/redo replays it. Fields outside the
    /// snapshot are left as they are.
    #[must_use]
    pub fn partialized(
        partialize: impl Fn(&S) -> U + 'static,
        merge: impl Fn(&mut S, U) + 'static,
    ) -> Self {
        Self {
            partialize: Rc::new(partialize),
            merge: Rc::new(merge),
            gate: ChangeGate::default(),
            limit: None,
            tracking: true,
            on_save: None,
            past_states: Vec::new(),
            future_states: Vec::new(),
            handle_set: None,
            wrap_temporal: None,
        }
    }

    /// Skip writes whose snapshots the function considers equal.
    #[must_use]
    pub fn with_equality(mut self, equality: impl Fn(&U, &U) -> bool + 'static) -> Self {
        self.gate = self.gate.with_equality(equality);
        self
    }

    /// Skip writes for which the diff function returns `None`.
    #[must_use]
    pub fn with_diff<D>(mut self, diff: impl Fn(&U, &U) -> Option<D> + 'static) -> Self {
        self.gate = self.gate.with_diff(diff);
        self
    }

    /// Bound each stack to `limit` entries. `0` disables history.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Called with `(past, current)` right before each entry is recorded.
    #[must_use]
    pub fn with_on_save(mut self, on_save: impl Fn(&U, &U) + 'static) -> Self {
        self.on_save = Some(Rc::new(on_save));
        self
    }

    /// Start with tracking on (`true`, the default) or paused.
    #[must_use]
    pub fn with_tracking(mut self, tracking: bool) -> Self {
        self.tracking = tracking;
        self
    }

    /// Seed the past stack, oldest first.
    #[must_use]
    pub fn with_past_states(mut self, states: impl IntoIterator<Item = U>) -> Self {
        self.past_states = states.into_iter().collect();
        self
    }

    /// Seed the future stack, next redo last.
    #[must_use]
    pub fn with_future_states(mut self, states: impl IntoIterator<Item = U>) -> Self {
        self.future_states = states.into_iter().collect();
        self
    }

    /// Decorate the recorder. The hook receives the default recorder and
    /// returns the one the interceptor will call.
    #[must_use]
    pub fn with_handle_set(
        mut self,
        hook: impl FnOnce(HandleSet<U>) -> HandleSet<U> + 'static,
    ) -> Self {
        self.handle_set = Some(Box::new(hook));
        self
    }

    /// Decorate the creator of the history store before it is instantiated.
    #[must_use]
    pub fn with_wrap_temporal(
        mut self,
        wrap: impl FnOnce(BoxedCreator<TemporalState<U>>) -> BoxedCreator<TemporalState<U>>
        + 'static,
    ) -> Self {
        self.wrap_temporal = Some(Box::new(wrap));
        self
    }

    /// Apply the data-only settings from a [`HistoryConfig`].
    #[must_use]
    pub fn with_config(mut self, config: &HistoryConfig) -> Self {
        self.limit = config.limit;
        self.tracking = config.tracking;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::Verdict;

    #[derive(Clone, Debug, PartialEq)]
    struct Doc {
        title: String,
        cursor: usize,
    }

    #[test]
    fn defaults() {
        let options = TemporalOptions::<i32>::new();
        assert_eq!(options.gate.evaluate(&1, &1), Verdict::Record);
        assert_eq!(options.limit, None);
        assert!(options.tracking);
        assert!(options.on_save.is_none());
        assert!(options.handle_set.is_none());
        assert!(options.wrap_temporal.is_none());
    }

    #[test]
    fn identity_partialize_and_replace_merge() {
        let options = TemporalOptions::<Doc>::default();
        let doc = Doc {
            title: "a".into(),
            cursor: 3,
        };
        assert_eq!((options.partialize)(&doc), doc);

        let mut target = Doc {
            title: "b".into(),
            cursor: 0,
        };
        (options.merge)(&mut target, doc.clone());
        assert_eq!(target, doc);
    }

    #[test]
    fn partialized_merge_keeps_untracked_fields() {
        let options = TemporalOptions::partialized(
            |doc: &Doc| doc.title.clone(),
            |doc: &mut Doc, title: String| doc.title = title,
        );
        let mut doc = Doc {
            title: "new".into(),
            cursor: 7,
        };
        (options.merge)(&mut doc, "old".into());
        assert_eq!(doc.title, "old");
        assert_eq!(doc.cursor, 7);
    }

    #[test]
    fn diff_is_reduced_to_presence() {
        let options = TemporalOptions::<i32>::new().with_diff(|a: &i32, b: &i32| {
            (a != b).then(|| format!("{a} -> {b}"))
        });
        assert_eq!(options.gate.evaluate(&1, &2), Verdict::Record);
        assert_eq!(options.gate.evaluate(&1, &1), Verdict::Unchanged);
    }

    #[test]
    fn seeded_stacks_accept_any_iterator() {
        let options = TemporalOptions::<i32>::new()
            .with_past_states(1..=3)
            .with_future_states([9]);
        assert_eq!(options.past_states, vec![1, 2, 3]);
        assert_eq!(options.future_states, vec![9]);
    }

    #[test]
    fn config_overrides_limit_and_tracking() {
        let config = HistoryConfig {
            limit: Some(12),
            tracking: false,
        };
        let options = TemporalOptions::<i32>::new()
            .with_limit(3)
            .with_config(&config);
        assert_eq!(options.limit, Some(12));
        assert!(!options.tracking);
    }

    #[test]
    fn debug_lists_configured_hooks() {
        let options = TemporalOptions::<i32>::new()
            .with_limit(5)
            .with_handle_set(|recorder| recorder);
        let s = format!("{options:?}");
        assert!(s.contains("limit: Some(5)"));
        assert!(s.contains("handle_set: true"));
        assert!(s.contains("wrap_temporal: false"));
    }

    #[test]
    fn debug_for_partialized_options() {
        let options = TemporalOptions::partialized(
            |doc: &Doc| doc.title.clone(),
            |doc: &mut Doc, title: String| doc.title = title,
        )
        .with_equality(|a: &String, b: &String| a == b)
        .with_past_states(vec!["draft".to_string()]);
        let s = format!("{options:?}");
        assert!(s.contains("equality: true"));
        assert!(s.contains("past_states: 1"));
    }
}
