#![forbid(unsafe_code)]

//! rewind public facade crate.
//!
//! Re-exports the observable store from `rewind-store` and the undo/redo
//! middleware from `rewind-temporal`, plus a prelude for day-to-day use.
//!
//! ```
//! use rewind::prelude::*;
//!
//! let store = create_store(temporal(
//!     |_set, _get, _store| vec![String::from("first")],
//!     TemporalOptions::new().with_limit(50),
//! ));
//! store.set_state(Update::mutate(|v: &mut Vec<String>| v.push("second".into())));
//!
//! let history = store.temporal::<Vec<String>>().unwrap();
//! history.undo();
//! assert_eq!(store.get_state(), vec!["first"]);
//! history.redo();
//! assert_eq!(store.get_state(), vec!["first", "second"]);
//! ```

// --- Store re-exports ------------------------------------------------------

pub use rewind_store::{
    BoxedCreator, GetState, SetState, Store, Subscription, Update, create_store,
};

// --- Temporal re-exports ---------------------------------------------------

pub use rewind_temporal::{
    ChangeGate, Equality, HandleSet, HandleSetHook, HistoryConfig, Merge, OnSave, Partialize,
    TemporalExt, TemporalOptions, TemporalState, TemporalStore, Vector, Verdict, WrapTemporal,
    temporal,
};

#[cfg(feature = "config")]
pub use rewind_temporal::ConfigError;

pub mod prelude {
    pub use crate::{
        GetState, HistoryConfig, SetState, Store, TemporalExt, TemporalOptions, TemporalStore,
        Update, create_store, temporal,
    };

    pub use crate::{history, store};
}

pub use rewind_store as store;
pub use rewind_temporal as history;
