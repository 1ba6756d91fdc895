// src/engine/mod.rs

//! Run-loop coordination for watchrun.
//!
//! The [`Coordinator`] owns the "run once, then rerun on every change signal
//! until terminated" loop. It serializes runs (at most one command chain is
//! in flight at any instant) and reacts to:
//! - change signals from the debouncer
//! - root-scope cancellation from the signal handler
//! - the change channel closing (structural shutdown)

pub mod runtime;

pub use runtime::Coordinator;
