//! Shared domain types for the Pulselens project.

pub mod config;
pub mod frame;
pub mod result;
pub mod spectrum;

mod errors;

pub use errors::{PulseError, Result};
