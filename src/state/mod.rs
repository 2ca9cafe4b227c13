// src/state/mod.rs

//! Per-invocation run state.
//!
//! A [`RunState`] is created fresh for every task invocation (and for every
//! dependency executed within it) and handed explicitly to the code that
//! updates it. Nothing here is process-wide.

pub mod run_state;

pub use run_state::RunState;
