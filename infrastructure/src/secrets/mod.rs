//! Secret resolution adapters.

mod env;

pub use env::EnvSecretResolver;
