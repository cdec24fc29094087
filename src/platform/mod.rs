//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Time (`Clock`): `Instant` natively, `Date.now()` in the browser
//! - Storage (`KeyValueStore`): in-memory natively, LocalStorage on web

pub mod storage;
pub mod time;

#[cfg(target_arch = "wasm32")]
pub use storage::LocalStorage;
pub use storage::{KeyValueStore, MemoryStore, StorageError};
pub use time::{Clock, ManualClock, SystemClock};
