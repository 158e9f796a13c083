//! Progress reporting while a prompt is dispatched

pub mod reporter;
