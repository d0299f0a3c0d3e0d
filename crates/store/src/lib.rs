//! Regional cart state engine.
//!
//! Owns the in-memory partitioned cart and everything around it:
//!
//! - [`store::CartStore`] - all mutation/query operations, write-through
//!   persistence, event notification, memoized stats
//! - [`persistence::PersistenceAdapter`] - (de)serializes the whole cart
//!   into one durable storage slot, with quota-safe degradation
//! - [`debounce::QuantityDebouncer`] - trailing-edge collapsing of rapid
//!   quantity edits
//! - [`region::RegionProvider`] - supplies the active (province, city) pair
//! - [`events`] - the typed outcome channel presentation layers bind to
//!
//! The engine is a single-writer client cache: operations complete
//! synchronously against the in-memory map, and each mutation re-serializes
//! the full current state, so the latest write always wins. Public
//! entrypoints are serialized behind a mutex; the debouncer's delayed
//! callbacks are the only deferred mutation path and re-validate state at
//! fire time.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod debounce;
pub mod error;
pub mod events;
pub mod persistence;
pub mod region;
pub mod storage;
pub mod store;

pub use config::StoreConfig;
pub use debounce::{QuantityDebouncer, StepDirection};
pub use error::{CartError, ConfigError, PersistenceError, StorageError};
pub use events::{CartEvent, SubscriptionId};
pub use persistence::{PartitionedCart, PersistenceAdapter};
pub use region::{RegionProvider, StaticRegionProvider};
pub use storage::{MemorySlot, StorageSlot};
pub use store::CartStore;
