//! Shared error-context plumbing used across all merchbell crates.

pub mod error;

pub use error::FromMessage;
