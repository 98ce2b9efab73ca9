#![forbid(unsafe_code)]

//! Observable state container with a replaceable write entry point.
//!
//! # Design
//!
//! [`Store<S>`] keeps a value of type `S` in shared, reference-counted
//! storage (`Rc<RefCell<..>>`). Every committed write bumps the version and
//! notifies live listeners with `(next, previous)` in registration order.
//!
//! A store is built from a *creator*: a closure that receives the store's
//! raw `set`, its `get` and the store handle itself, and returns the initial
//! state. Middleware wraps creators to interpose on writes:
//!
//! ```text
//!  create_store(creator)
//!        │
//!        ▼
//!  creator(raw set, get, &store) ──► initial state
//!        │
//!        └─► may call store.wrap_set_state(..) to intercept set_state()
//! ```
//!
//! Two write paths exist side by side and never change after setup:
//!
//! - the **raw** setter handed to the creator, which commits directly;
//! - [`Store::set_state`], which goes through whatever interceptor was
//!   installed with [`Store::wrap_set_state`] (the raw setter if none).
//!
//! # Performance
//!
//! | Operation      | Complexity                               |
//! |----------------|------------------------------------------|
//! | `get_state()`  | O(clone of S)                            |
//! | `set_state()`  | O(clone of S) + O(L) where L = listeners |
//! | `subscribe()`  | O(1) amortized                           |
//!
//! # Failure Modes
//!
//! - **Read before init**: reading the store from inside its own creator,
//!   before the creator returns, panics. There is no state yet.
//! - **Write from `with_state`**: writing to the store from inside a
//!   [`Store::with_state`] closure panics (RefCell borrow rules). Writes from
//!   listeners and from `Update::Mutate` closures are fine.
//! - **Dropped store**: a setter obtained from a store that has since been
//!   dropped ignores writes; a getter panics, a [`Store::try_getter`]
//!   returns `None`.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, debug_span, trace};
use web_time::Instant;

use crate::update::{GetState, SetState, TryGetState, Update};

type ListenerRc<S> = Rc<dyn Fn(&S, &S)>;
type ListenerWeak<S> = Weak<dyn Fn(&S, &S)>;

const READ_BEFORE_INIT: &str = "store read before its creator returned";
const READ_AFTER_DROP: &str = "store getter used after the store was dropped";

struct StoreInner<S> {
    /// `None` only while the creator is running.
    state: Option<S>,
    version: u64,
    /// Dead entries are pruned on notify.
    listeners: Vec<ListenerWeak<S>>,
    /// Installed write interceptor. `None` routes `set_state` to `commit`.
    set_state: Option<SetState<S>>,
    extensions: HashMap<TypeId, Rc<dyn Any>>,
}

/// A shared, observable state container.
///
/// Cloning a `Store` creates a new handle to the **same** state, listeners
/// and extensions.
///
/// # Invariants
///
/// 1. `version` increments by exactly 1 on each committed write.
/// 2. Listeners are notified in registration order, after the new state is
///    visible through `get_state()`.
/// 3. No borrow of the store is held while user closures or listeners run.
pub struct Store<S> {
    inner: Rc<RefCell<StoreInner<S>>>,
}

impl<S> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for Store<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Store")
            .field("state", &inner.state)
            .field("version", &inner.version)
            .field("subscriber_count", &inner.listeners.len())
            .field("intercepted", &inner.set_state.is_some())
            .finish()
    }
}

/// Build a store from a creator.
///
/// The creator runs exactly once, synchronously. It receives the raw setter,
/// a getter and the store handle; its return value becomes the initial
/// state. Neither the setter nor the getter keeps the store alive.
pub fn create_store<S, F>(creator: F) -> Store<S>
where
    S: Clone + 'static,
    F: FnOnce(SetState<S>, GetState<S>, &Store<S>) -> S,
{
    let store = Store::uninit();
    let initial = creator(store.raw_setter(), store.getter(), &store);
    store.inner.borrow_mut().state = Some(initial);
    debug!(target: "rewind.store", "store created");
    store
}

impl<S: Clone + 'static> Store<S> {
    /// Create a store holding `initial`, with no middleware.
    #[must_use]
    pub fn new(initial: S) -> Self {
        create_store(move |_, _, _| initial)
    }

    fn uninit() -> Self {
        Self {
            inner: Rc::new(RefCell::new(StoreInner {
                state: None,
                version: 0,
                listeners: Vec::new(),
                set_state: None,
                extensions: HashMap::new(),
            })),
        }
    }

    /// Get a clone of the current state.
    ///
    /// # Panics
    ///
    /// Panics if called from inside the store's creator.
    #[must_use]
    pub fn get_state(&self) -> S {
        match &self.inner.borrow().state {
            Some(state) => state.clone(),
            None => panic!("{READ_BEFORE_INIT}"),
        }
    }

    /// Access the current state by reference without cloning.
    ///
    /// # Panics
    ///
    /// Panics if called from inside the store's creator, or if `f` writes
    /// to this store.
    pub fn with_state<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        let inner = self.inner.borrow();
        match &inner.state {
            Some(state) => f(state),
            None => panic!("{READ_BEFORE_INIT}"),
        }
    }

    /// Write through the installed entry point.
    ///
    /// Without an interceptor this commits directly.
    pub fn set_state(&self, update: Update<S>) {
        let installed = self.inner.borrow().set_state.clone();
        match installed {
            Some(set) => set(update),
            None => self.commit(update),
        }
    }

    /// A setter that routes through [`Store::set_state`].
    #[must_use]
    pub fn setter(&self) -> SetState<S> {
        let weak = Rc::downgrade(&self.inner);
        Rc::new(move |update| match weak.upgrade() {
            Some(inner) => Store { inner }.set_state(update),
            None => trace!(target: "rewind.store", "write to dropped store ignored"),
        })
    }

    /// A getter that reads the current state.
    ///
    /// The getter panics if invoked after the store is dropped.
    #[must_use]
    pub fn getter(&self) -> GetState<S> {
        let weak = Rc::downgrade(&self.inner);
        Rc::new(move || match weak.upgrade() {
            Some(inner) => Store { inner }.get_state(),
            None => panic!("{READ_AFTER_DROP}"),
        })
    }

    /// Like [`Store::getter`], but yields `None` after the store is dropped.
    #[must_use]
    pub fn try_getter(&self) -> TryGetState<S> {
        let weak = Rc::downgrade(&self.inner);
        Rc::new(move || weak.upgrade().map(|inner| Store { inner }.get_state()))
    }

    /// Replace the `set_state` entry point with a wrapper around the
    /// current one.
    ///
    /// `wrap` receives the entry point in effect now (the raw setter if
    /// nothing was installed) and returns its replacement. Wrappers stack:
    /// the latest installed runs first.
    pub fn wrap_set_state(&self, wrap: impl FnOnce(SetState<S>) -> SetState<S>) {
        let current = self.inner.borrow().set_state.clone();
        let current = current.unwrap_or_else(|| self.raw_setter());
        let next = wrap(current);
        self.inner.borrow_mut().set_state = Some(next);
        debug!(target: "rewind.store", "set_state entry point wrapped");
    }

    /// Subscribe to committed writes. The listener receives
    /// `(next, previous)`.
    ///
    /// Returns a [`Subscription`] guard. Dropping the guard unsubscribes the
    /// listener.
    pub fn subscribe(&self, listener: impl Fn(&S, &S) + 'static) -> Subscription {
        let strong: ListenerRc<S> = Rc::new(listener);
        let weak = Rc::downgrade(&strong);
        self.inner.borrow_mut().listeners.push(weak);
        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Number of committed writes so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Number of registered listeners (including dropped ones not yet
    /// pruned).
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    /// Attach a value to the store, keyed by its type.
    ///
    /// Returns `true` if a value of the same type was replaced.
    pub fn insert_extension<E: Any>(&self, extension: E) -> bool {
        self.inner
            .borrow_mut()
            .extensions
            .insert(TypeId::of::<E>(), Rc::new(extension))
            .is_some()
    }

    /// Fetch a clone of the attached value of type `E`, if any.
    #[must_use]
    pub fn extension<E: Any + Clone>(&self) -> Option<E> {
        self.inner
            .borrow()
            .extensions
            .get(&TypeId::of::<E>())
            .and_then(|ext| ext.downcast_ref::<E>())
            .cloned()
    }

    fn raw_setter(&self) -> SetState<S> {
        let weak = Rc::downgrade(&self.inner);
        Rc::new(move |update| match weak.upgrade() {
            Some(inner) => Store { inner }.commit(update),
            None => trace!(target: "rewind.store", "write to dropped store ignored"),
        })
    }

    /// Apply `update` and notify listeners.
    fn commit(&self, update: Update<S>) {
        let kind = update.kind();
        let previous = self.get_state();
        let mut next = previous.clone();
        update.apply(&mut next);
        let version = {
            let mut inner = self.inner.borrow_mut();
            inner.state = Some(next.clone());
            inner.version += 1;
            inner.version
        };
        trace!(target: "rewind.store", kind, version, "state committed");
        self.notify(&next, &previous);
    }

    /// Notify live listeners and prune dead ones.
    fn notify(&self, next: &S, previous: &S) {
        // Collect first so no borrow is held during the calls.
        let listeners: Vec<ListenerRc<S>> = {
            let mut inner = self.inner.borrow_mut();
            inner.listeners.retain(|w| w.strong_count() > 0);
            inner.listeners.iter().filter_map(Weak::upgrade).collect()
        };

        if listeners.is_empty() {
            return;
        }

        let start = Instant::now();
        let span = debug_span!(
            "store.notify",
            listeners = listeners.len() as u64,
            duration_us = tracing::field::Empty
        );
        let _enter = span.enter();

        for listener in &listeners {
            listener(next, previous);
        }

        span.record("duration_us", start.elapsed().as_micros() as u64);
    }
}

/// RAII guard for a listener.
///
/// Dropping the `Subscription` drops the strong `Rc` holding the listener,
/// so the weak entry in the store fails to upgrade on the next write.
pub struct Subscription {
    _guard: Box<dyn Any>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
