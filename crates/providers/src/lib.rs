//! The generation capability: turns a user message plus prior history into
//! reply text.
//!
//! The gateway only sees the [`Generator`] trait.  Two HTTP adapters are
//! provided (Anthropic Messages API and OpenAI-compatible chat
//! completions); [`build_generator`] picks one from config.

pub mod anthropic;
pub mod factory;
pub mod openai_compat;
pub mod prompt;
pub mod traits;
pub(crate) mod util;

pub use factory::{build_generator, UnavailableGenerator};
pub use traits::{GenerationRequest, Generator};
