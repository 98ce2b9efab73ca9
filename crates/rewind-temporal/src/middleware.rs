#![forbid(unsafe_code)]

//! The `temporal` creator decorator.
//!
//! Setup runs once, inside `create_store`, in this order:
//!
//! ```text
//!  1. seed TemporalState from the options
//!  2. build the history creator, let wrap_temporal decorate it, instantiate
//!  3. attach the TemporalStore handle to the primary store's extensions
//!  4. build the recorder, let handle_set decorate it
//!  5. intercept store.set_state and the creator-scoped set
//!  6. run the application's creator with the intercepted set
//! ```
//!
//! The raw `set` the decorator receives from `create_store` is kept aside
//! for replay and never exposed to the application.

use std::cell::OnceCell;
use std::rc::Rc;

use rewind_store::{BoxedCreator, GetState, SetState, Store, create_store};
use tracing::{debug, warn};

use crate::history::TemporalStore;
use crate::interceptor::Interceptor;
use crate::options::{HandleSet, TemporalOptions, WrapTemporal};
use crate::replay::Replay;
use crate::state::TemporalState;

/// Add undo/redo history to a store creator.
///
/// `config` is the application's creator. It receives an intercepted `set`
/// whose writes are recorded; the store's own `set_state` is intercepted the
/// same way. The history handle is reachable afterwards through
/// [`TemporalExt::temporal`](crate::TemporalExt::temporal).
///
/// ```
/// use rewind_store::{Update, create_store};
/// use rewind_temporal::{TemporalExt, TemporalOptions, temporal};
///
/// let store = create_store(temporal(|_set, _get, _store| 0_i32, TemporalOptions::new()));
/// store.set_state(Update::replace(1));
///
/// let history = store.temporal::<i32>().unwrap();
/// history.undo();
/// assert_eq!(store.get_state(), 0);
/// ```
pub fn temporal<S, U, F>(
    config: F,
    options: TemporalOptions<S, U>,
) -> impl FnOnce(SetState<S>, GetState<S>, &Store<S>) -> S
where
    S: Clone + 'static,
    U: Clone + 'static,
    F: FnOnce(SetState<S>, GetState<S>, &Store<S>) -> S,
{
    move |set: SetState<S>, get: GetState<S>, store: &Store<S>| {
        let TemporalOptions {
            partialize,
            merge,
            gate,
            limit,
            tracking,
            on_save,
            past_states,
            future_states,
            handle_set,
            wrap_temporal,
        } = options;

        let replay = Rc::new(Replay::new(
            Rc::clone(&set),
            store.try_getter(),
            Rc::clone(&partialize),
            merge,
        ));
        let seed = TemporalState::new(limit)
            .with_past_states(past_states)
            .with_future_states(future_states)
            .with_tracking(tracking)
            .with_on_save(on_save);

        let (history, history_set) = instantiate_history(seed, wrap_temporal);
        let temporal_store = TemporalStore::new(history, history_set, replay);
        store.insert_extension(temporal_store.clone());

        let target = temporal_store.clone();
        let recorder: HandleSet<U> =
            Rc::new(move |past: U, current: U| target.record(past, current));
        let recorder = match handle_set {
            Some(hook) => hook(recorder),
            None => recorder,
        };

        let interceptor = Rc::new(Interceptor::new(
            Rc::clone(&get),
            partialize,
            gate,
            recorder,
            temporal_store,
        ));
        let slot = Rc::clone(&interceptor);
        store.wrap_set_state(move |current| slot.wrap(current));

        debug!(target: "rewind.temporal", ?limit, tracking, "temporal middleware installed");
        config(interceptor.wrap(set), get, store)
    }
}

type HistoryParts<U> = (Store<TemporalState<U>>, SetState<TemporalState<U>>);

/// Create the history store and recover the `set` its creator was given.
fn instantiate_history<U: Clone + 'static>(
    seed: TemporalState<U>,
    wrap_temporal: Option<WrapTemporal<U>>,
) -> HistoryParts<U> {
    let captured: Rc<OnceCell<SetState<TemporalState<U>>>> = Rc::new(OnceCell::new());
    let capture = Rc::clone(&captured);
    let creator: BoxedCreator<TemporalState<U>> = Box::new(
        move |set: SetState<TemporalState<U>>,
              _get: GetState<TemporalState<U>>,
              _store: &Store<TemporalState<U>>| {
            let _ = capture.set(set);
            seed
        },
    );
    let creator = match wrap_temporal {
        Some(wrap) => wrap(creator),
        None => creator,
    };

    let history = create_store(creator);
    let set = match captured.get() {
        Some(set) => Rc::clone(set),
        None => {
            warn!(
                target: "rewind.temporal",
                "wrapped history creator never ran the inner creator; writing through set_state"
            );
            history.setter()
        }
    };
    (history, set)
}
