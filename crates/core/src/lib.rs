//! Regional Cart Core - pure domain types for the regional cart engine.
//!
//! This crate provides the types shared by every component of the regional
//! cart system:
//! - `store` - The cart state engine (partitioned cart, persistence, debounce)
//! - Presentation layers that bind to the engine's events
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no timers,
//! no storage access. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Product snapshots, cart items, region keys, and cart stats
//! - [`guards`] - Pure predicates gating quantity mutations
//! - [`stats`] - Derived cart statistics and display formatting

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod guards;
pub mod stats;
pub mod types;

pub use stats::{CartStats, calculate_stats, format_amount};
pub use types::*;
