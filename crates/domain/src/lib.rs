//! Shared types for the brain service: errors, the conversation message
//! model, configuration, retry policy, and structured trace events.

pub mod config;
pub mod error;
pub mod message;
pub mod retry;
pub mod trace;

pub use error::{Error, Result};
pub use message::{Message, Role};
