// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Wiring up a cross-platform filesystem watcher (`notify`) over the
//!   resolved [`WatchSet`](crate::resolve::WatchSet).
//! - Filtering raw events down to content writes and debouncing bursts into
//!   single [`ChangeSignal`]s.
//!
//! It does **not** know about command execution; it only turns filesystem
//! changes into triggers on the shared change channel.

pub mod debounce;
pub mod watcher;

pub use debounce::{ChangeSignal, Debouncer, DEBOUNCE_WINDOW, is_write_event, spawn_debouncer};
pub use watcher::{WatcherHandle, spawn_watcher};
