#![forbid(unsafe_code)]

//! Undo/redo history for [`rewind_store`] stores.
//!
//! [`temporal`] decorates a store creator. Every write through the store
//! (either the `set` its creator receives or `Store::set_state`) is captured
//! as a before/after snapshot pair, filtered by a [`ChangeGate`] and, when
//! significant, pushed onto a bounded past stack. [`TemporalStore`] moves
//! through that history and replays snapshots into the store without
//! recording the replay itself.
//!
//! ```
//! use rewind_store::{Update, create_store};
//! use rewind_temporal::{TemporalExt, TemporalOptions, temporal};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Editor {
//!     text: String,
//!     cursor: usize,
//! }
//!
//! // Only the text is tracked; the cursor is left alone on undo.
//! let options = TemporalOptions::partialized(
//!     |e: &Editor| e.text.clone(),
//!     |e: &mut Editor, text: String| e.text = text,
//! )
//! .with_equality(|a: &String, b: &String| a == b)
//! .with_limit(100);
//!
//! let store = create_store(temporal(
//!     |_set, _get, _store| Editor { text: String::new(), cursor: 0 },
//!     options,
//! ));
//! store.set_state(Update::mutate(|e: &mut Editor| e.text.push_str("hi")));
//! store.set_state(Update::mutate(|e: &mut Editor| e.cursor = 2));
//!
//! let history = store.temporal::<String>().unwrap();
//! assert_eq!(history.past_states().len(), 1);
//! history.undo();
//! assert_eq!(store.get_state(), Editor { text: String::new(), cursor: 2 });
//! ```
//!
//! # Logging
//!
//! Recording decisions, evictions and history operations are emitted as
//! `tracing` events with target `rewind.temporal`.

mod config;
mod gate;
mod history;
mod interceptor;
mod middleware;
mod options;
mod replay;
mod state;

#[cfg(feature = "config")]
pub use config::ConfigError;
pub use config::HistoryConfig;
pub use gate::{ChangeGate, Equality, Verdict};
pub use history::{TemporalExt, TemporalStore};
pub use middleware::temporal;
pub use options::{HandleSet, HandleSetHook, Merge, Partialize, TemporalOptions, WrapTemporal};
pub use state::{OnSave, TemporalState};

pub use im::Vector;
