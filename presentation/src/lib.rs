//! Presentation layer for chatlist
//!
//! This crate contains CLI definitions, output formatters,
//! export rendering and progress reporters.

pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use cli::commands::{
    AskArgs, Cli, Command, ExportFormat, ModelsCommand, PromptsCommand, ResultsCommand,
    SettingsCommand,
};
pub use output::console::ConsoleFormatter;
pub use progress::reporter::{ProgressReporter, SimpleProgress};
