//! Request-independent chat runtime: turn orchestration and counters.

pub mod metrics;
pub mod turn;

pub use turn::{run_chat_turn, TurnError, TurnInput};
