//! Dispatch policy and the settings it is resolved from.

pub mod dispatch_policy;
pub mod setting_key;
