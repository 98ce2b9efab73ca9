#![forbid(unsafe_code)]

//! Observable state container for `rewind`.
//!
//! A [`Store`] owns one value, hands out clones through `get_state`, commits
//! writes described by [`Update`], and notifies listeners after each write.
//! Stores are built from creators so middleware can see the raw setter
//! before the application does:
//!
//! ```
//! use rewind_store::{Update, create_store};
//!
//! let store = create_store(|_set, _get, _store| 0_i32);
//! let _sub = store.subscribe(|next, prev| assert_eq!(*next, *prev + 1));
//! store.set_state(Update::mutate(|n: &mut i32| *n += 1));
//! assert_eq!(store.get_state(), 1);
//! ```

mod store;
mod update;

pub use store::{Store, Subscription, create_store};
pub use update::{BoxedCreator, GetState, SetState, TryGetState, Update};
