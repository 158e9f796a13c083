//! Row identifiers.
//!
//! Durable rows are keyed by SQLite `INTEGER PRIMARY KEY` values. Each table
//! gets its own newtype so a prompt id can never be passed where a model id
//! is expected.

use serde::{Deserialize, Serialize};

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

row_id!(
    /// Identifier of a row in `models`.
    ModelId
);
row_id!(
    /// Identifier of a row in `prompts`.
    PromptId
);
row_id!(
    /// Identifier of a row in `results`.
    ResultId
);

/// Identifier of one dispatch run.
///
/// Runs are never persisted; the id only lets the staging area tell a
/// late write from a previous run apart from one belonging to the current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(u64);

impl RunId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The run that follows this one.
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "run-{}", self.0)
    }
}
