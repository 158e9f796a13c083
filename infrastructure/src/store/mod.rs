//! SQLite persistence
//!
//! [`SqliteChatStore`] is the only component that touches the database. It
//! implements the chat, catalog and history store ports over one connection.

mod schema;
mod sqlite;

pub use sqlite::SqliteChatStore;
