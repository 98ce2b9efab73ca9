#![forbid(unsafe_code)]

//! Significance check for a before/after snapshot pair.
//!
//! The gate runs after the write has been applied. It does not look at the
//! tracking flag: the interceptor checks that before capturing anything, so
//! no snapshot work happens while paused.
//!
//! Equality and diff are independent short-circuits, evaluated in that
//! order. Equality reporting "same" suppresses the entry even if a diff
//! function would have produced a delta.

use std::fmt;
use std::rc::Rc;

/// `true` when two snapshots should be treated as the same state.
pub type Equality<U> = Rc<dyn Fn(&U, &U) -> bool>;

/// `true` when a diff function produced a delta for the pair.
pub(crate) type DeltaTest<U> = Rc<dyn Fn(&U, &U) -> bool>;

/// Outcome of [`ChangeGate::evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The pair is significant; record it.
    Record,
    /// The equality function judged the snapshots equal.
    Equal,
    /// The diff function produced no delta.
    Unchanged,
}

impl Verdict {
    /// Whether the pair should be recorded.
    #[must_use]
    pub fn is_record(self) -> bool {
        matches!(self, Self::Record)
    }

    /// Stable label for log fields.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Record => "record",
            Self::Equal => "equal",
            Self::Unchanged => "unchanged",
        }
    }
}

/// Equality and diff policies applied to each captured pair.
///
/// With neither configured every pair is recorded, including writes that
/// changed nothing.
pub struct ChangeGate<U> {
    equality: Option<Equality<U>>,
    diff: Option<DeltaTest<U>>,
}

impl<U> Clone for ChangeGate<U> {
    fn clone(&self) -> Self {
        Self {
            equality: self.equality.clone(),
            diff: self.diff.clone(),
        }
    }
}

impl<U> fmt::Debug for ChangeGate<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeGate")
            .field("equality", &self.equality.is_some())
            .field("diff", &self.diff.is_some())
            .finish()
    }
}

impl<U> Default for ChangeGate<U> {
    fn default() -> Self {
        Self {
            equality: None,
            diff: None,
        }
    }
}

impl<U: 'static> ChangeGate<U> {
    /// A gate that records everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Suppress pairs the function considers equal.
    #[must_use]
    pub fn with_equality(mut self, equality: impl Fn(&U, &U) -> bool + 'static) -> Self {
        self.equality = Some(Rc::new(equality));
        self
    }

    /// Suppress pairs for which the diff function returns `None`.
    ///
    /// The delta itself is not kept; only its presence matters.
    #[must_use]
    pub fn with_diff<D>(mut self, diff: impl Fn(&U, &U) -> Option<D> + 'static) -> Self {
        self.diff = Some(Rc::new(move |past: &U, current: &U| {
            diff(past, current).is_some()
        }));
        self
    }

    /// Decide whether `(past, current)` is worth an entry.
    pub fn evaluate(&self, past: &U, current: &U) -> Verdict {
        if self.equality.as_ref().is_some_and(|eq| eq(past, current)) {
            return Verdict::Equal;
        }
        if self.diff.as_ref().is_some_and(|diff| !diff(past, current)) {
            return Verdict::Unchanged;
        }
        Verdict::Record
    }
}
