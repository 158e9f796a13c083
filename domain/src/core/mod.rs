//! Core domain concepts shared across all subdomains.
//!
//! - [`ids`]: typed row identifiers and the transient run identifier
//! - [`error::DomainError`]: domain-level validation errors

pub mod error;
pub mod ids;
