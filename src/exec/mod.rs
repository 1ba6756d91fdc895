// src/exec/mod.rs

//! Process execution layer.
//!
//! [`runner`] runs one invocation of the command chain under a cancellable
//! scope, racing process completion against the next change signal so a
//! mid-run change cancels and restarts the command without losing the
//! triggering event.

pub mod runner;

pub use runner::{RunEnd, run_once};
