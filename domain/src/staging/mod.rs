//! Transient per-run staging state.

pub mod outcome;
