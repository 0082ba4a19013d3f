//! Shared types for the Hubstaff client workspace

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
